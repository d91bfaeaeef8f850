//! Interactive shell.
//!
//! [`Shell`] is the CLI's screen router. It owns the loopback network, the
//! identity and whichever view is on screen, turns input lines into view
//! calls, follows navigation signals and renders what changed as plain
//! output lines. It does no I/O itself so that tests can drive it directly.

use huddle_app::{
    IdentityProvider, LobbyConfig, LobbyView, MemoryIdentityStore, MessageKind, NameEntry,
    RoomView, Route, SessionConfig, ViewSignal,
};
use huddle_core::{channel::Channel, env::Environment};
use huddle_harness::{ClientId, SimNetwork};
use tracing::{debug, info};

use crate::{
    commands::{self, Command},
    error::CliError,
};

/// Upper bound on flush/pump rounds per input.
const SETTLE_ROUNDS: usize = 8;

/// What the shell produced for one input or tick.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Output {
    /// Lines to show, in order.
    pub lines: Vec<String>,
    /// The user asked to quit.
    pub quit: bool,
}

impl Output {
    fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }
}

#[derive(Debug)]
enum Screen<E> {
    Lobby(LobbyView<E>),
    Room {
        view: RoomView<E>,
        /// Timeline entries already printed.
        rendered: usize,
        /// Error banner last printed.
        shown_error: Option<String>,
        /// Connection state last printed.
        shown_connected: bool,
    },
    NameEntry,
    Closed,
}

/// Screen router for the CLI.
#[derive(Debug)]
pub struct Shell<E> {
    env: E,
    network: SimNetwork,
    client: ClientId,
    identity: IdentityProvider<MemoryIdentityStore>,
    session_config: SessionConfig,
    lobby_config: LobbyConfig,
    screen: Screen<E>,
}

impl<E: Environment> Shell<E> {
    /// Start a shell connected to a fresh loopback server.
    ///
    /// Opens on the lobby, or on name entry when `name` is missing or blank.
    pub fn new(
        env: E,
        name: Option<&str>,
        session_config: SessionConfig,
        lobby_config: LobbyConfig,
    ) -> Result<(Self, Output), CliError> {
        let mut network = SimNetwork::default();
        let client = network.add_client();
        network.channel(client)?.connect();
        let socket_id = network.connect(client)?;
        info!(%socket_id, "connected to loopback server");

        let mut identity = IdentityProvider::new(MemoryIdentityStore::default());
        if let Some(name) = name {
            identity.set_name(name);
        }

        let mut shell = Self {
            env,
            network,
            client,
            identity,
            session_config,
            lobby_config,
            screen: Screen::Closed,
        };
        let mut out = Output::default();
        let start = if shell.identity.display_name().is_some() {
            Route::Root
        } else {
            Route::NameEntry
        };
        shell.navigate(start, &mut out)?;
        Ok((shell, out))
    }

    /// Handle one line of input.
    pub fn handle_line(&mut self, line: &str) -> Result<Output, CliError> {
        let mut out = Output::default();
        let command = commands::parse(line);
        debug!(?command, "input");

        let signals = match command {
            Command::Quit => {
                out.quit = true;
                return Ok(out);
            },
            Command::Help => {
                out.lines.extend(commands::HELP.iter().map(|line| (*line).to_string()));
                Vec::new()
            },
            Command::Unknown { input } => {
                out.line(format!("unknown command: {input} (try /help)"));
                Vec::new()
            },
            Command::InvalidArgs { error, .. } => {
                out.line(error);
                Vec::new()
            },
            Command::Name { name: None } => {
                self.navigate(Route::NameEntry, &mut out)?;
                Vec::new()
            },
            Command::Name { name: Some(name) } => self.submit_name(&name),
            Command::Message { content } => self.plain_text(&content, &mut out)?,
            command => self.screen_command(command, &mut out)?,
        };

        self.follow(signals, &mut out)?;
        self.settle(&mut out)?;
        Ok(out)
    }

    /// Periodic housekeeping: deliver pending traffic and expire timeouts.
    pub fn tick(&mut self) -> Result<Output, CliError> {
        let mut out = Output::default();
        self.settle(&mut out)?;
        Ok(out)
    }

    /// Leave whatever screen is open.
    pub fn shutdown(&mut self) -> Result<(), CliError> {
        self.close_screen()?;
        self.network.flush();
        Ok(())
    }

    /// Current display name.
    pub fn display_name(&self) -> Option<String> {
        self.identity.display_name()
    }

    /// Route of the screen on display.
    pub fn route(&self) -> Option<Route> {
        match &self.screen {
            Screen::Lobby(_) => Some(Route::Root),
            Screen::Room { view, .. } => Some(Route::Room(view.session().room_id().to_string())),
            Screen::NameEntry => Some(Route::NameEntry),
            Screen::Closed => None,
        }
    }

    fn submit_name(&mut self, input: &str) -> Vec<ViewSignal> {
        let mut entry = NameEntry::new(&self.identity);
        entry.set_draft(input);
        match entry.submit(&mut self.identity) {
            Some(route) => {
                // Only name entry moves on; elsewhere the new name applies
                // to the next room joined.
                if matches!(self.screen, Screen::NameEntry) {
                    vec![ViewSignal::Navigate(route)]
                } else {
                    Vec::new()
                }
            },
            None => Vec::new(),
        }
    }

    fn plain_text(
        &mut self,
        content: &str,
        out: &mut Output,
    ) -> Result<Vec<ViewSignal>, CliError> {
        if matches!(self.screen, Screen::NameEntry) {
            let signals = self.submit_name(content);
            if signals.is_empty() {
                out.line("name must not be empty");
            }
            return Ok(signals);
        }

        match &mut self.screen {
            Screen::Room { view, .. } => {
                let channel = self.network.channel(self.client)?;
                Ok(view.send(channel, content))
            },
            Screen::Lobby(_) | Screen::NameEntry | Screen::Closed => {
                if !content.is_empty() {
                    out.line("not in a room; /create or /join <code> first");
                }
                Ok(Vec::new())
            },
        }
    }

    fn screen_command(
        &mut self,
        command: Command,
        out: &mut Output,
    ) -> Result<Vec<ViewSignal>, CliError> {
        let channel = self.network.channel(self.client)?;
        let signals = match (&mut self.screen, command) {
            (Screen::Lobby(lobby), Command::CreateRoom) => {
                out.line("creating room...");
                lobby.create_room(channel)
            },
            (Screen::Lobby(lobby), Command::JoinRoom { code }) => lobby.join_room(&code),
            (Screen::Room { .. }, Command::CreateRoom | Command::JoinRoom { .. }) => {
                out.line("leave this room first (/leave)");
                Vec::new()
            },
            (Screen::Room { view, .. }, Command::Leave) => view.leave(channel),
            (Screen::Room { view, .. }, Command::Kick { member_id }) => {
                let session = view.session();
                if session.can_kick(&member_id) {
                    view.kick(channel, &member_id)
                } else {
                    if session.session().self_id.as_deref() == Some(member_id.as_str()) {
                        out.line("you cannot remove yourself");
                    } else {
                        out.line("only the room owner can remove other members");
                    }
                    Vec::new()
                }
            },
            (Screen::Room { view, .. }, Command::Members) => {
                let session = view.session();
                for member in session.members().iter() {
                    let mut line = format!("{} ({})", member.display_name, member.id);
                    if session.session().owner_id.as_deref() == Some(member.id.as_str()) {
                        line.push_str(" [owner]");
                    }
                    if session.session().self_id.as_deref() == Some(member.id.as_str()) {
                        line.push_str(" [you]");
                    }
                    out.line(line);
                }
                Vec::new()
            },
            (Screen::Room { view, shown_error, .. }, Command::Dismiss) => {
                view.dismiss_error();
                *shown_error = None;
                Vec::new()
            },
            (_, command) => {
                out.line(format!("not available here: {command:?}"));
                Vec::new()
            },
        };
        Ok(signals)
    }

    /// Deliver traffic until the network is quiet, following any navigation
    /// it causes, then render the room.
    fn settle(&mut self, out: &mut Output) -> Result<(), CliError> {
        for _ in 0..SETTLE_ROUNDS {
            let signals = self.pump()?;
            let navigated = !signals.is_empty();
            self.follow(signals, out)?;
            if self.network.flush() == 0 && !navigated {
                break;
            }
        }
        self.render(out);
        Ok(())
    }

    fn pump(&mut self) -> Result<Vec<ViewSignal>, CliError> {
        let channel = self.network.channel(self.client)?;
        Ok(match &mut self.screen {
            Screen::Lobby(lobby) => lobby.pump(channel),
            Screen::Room { view, .. } => view.pump(channel),
            Screen::NameEntry | Screen::Closed => Vec::new(),
        })
    }

    fn follow(&mut self, signals: Vec<ViewSignal>, out: &mut Output) -> Result<(), CliError> {
        for signal in signals {
            match signal {
                ViewSignal::Navigate(route) => self.navigate(route, out)?,
                ViewSignal::Alert(text) => out.line(format!("!! {text}")),
                ViewSignal::CreateFailed(error) => out.line(format!("!! {error}")),
            }
        }
        Ok(())
    }

    fn navigate(&mut self, mut route: Route, out: &mut Output) -> Result<(), CliError> {
        loop {
            self.render(out);
            self.close_screen()?;
            info!(%route, "navigate");

            let channel = self.network.channel(self.client)?;
            match route {
                Route::Root => {
                    self.screen = Screen::Lobby(LobbyView::mount(
                        channel,
                        self.env.clone(),
                        self.lobby_config.clone(),
                    ));
                    out.line("lobby: /create a room or /join <code>");
                    return Ok(());
                },
                Route::NameEntry => {
                    self.screen = Screen::NameEntry;
                    let current = NameEntry::new(&self.identity);
                    if current.draft().is_empty() {
                        out.line("enter your display name:");
                    } else {
                        out.line(format!(
                            "enter your display name (currently {}):",
                            current.draft()
                        ));
                    }
                    return Ok(());
                },
                Route::Room(room_id) => {
                    match RoomView::mount(
                        channel,
                        self.env.clone(),
                        &self.identity,
                        &room_id,
                        self.session_config.clone(),
                    ) {
                        Ok(view) => {
                            out.line(format!("room {room_id}"));
                            let shown_connected = view.session().session().connected;
                            self.screen = Screen::Room {
                                view,
                                rendered: 0,
                                shown_error: None,
                                shown_connected,
                            };
                            return Ok(());
                        },
                        Err(error) => {
                            out.line(error.to_string());
                            route = error.redirect();
                        },
                    }
                },
            }
        }
    }

    fn close_screen(&mut self) -> Result<(), CliError> {
        let channel = self.network.channel(self.client)?;
        match std::mem::replace(&mut self.screen, Screen::Closed) {
            Screen::Lobby(lobby) => lobby.unmount(channel),
            Screen::Room { view, .. } => view.unmount(channel),
            Screen::NameEntry | Screen::Closed => {},
        }
        Ok(())
    }

    /// Print timeline entries, connection changes and errors not shown yet.
    fn render(&mut self, out: &mut Output) {
        let Screen::Room { view, rendered, shown_error, shown_connected } = &mut self.screen
        else {
            return;
        };
        let session = view.session();
        let timeline = session.timeline();

        let connected = session.session().connected;
        if connected != *shown_connected {
            let locale = self.session_config.locale;
            let status = if connected { locale.connected() } else { locale.disconnected() };
            out.line(format!("** {status}"));
            *shown_connected = connected;
        }

        for message in timeline.messages().iter().skip(*rendered) {
            let line = match message.kind {
                MessageKind::System => format!("-- {}", message.text),
                _ if timeline.is_own(message) => {
                    format!("<{} (you)> {}", message.sender, message.text)
                },
                _ => format!("<{}> {}", message.sender, message.text),
            };
            out.line(line);
        }
        *rendered = timeline.len();

        let error = &session.session().last_error;
        if error != shown_error {
            if let Some(error) = error {
                out.line(format!("error: {error} (/dismiss)"));
            }
            shown_error.clone_from(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use huddle_harness::SimEnv;
    use huddle_proto::{ClientMessage, RoomPresence};

    use super::*;

    fn shell() -> Shell<SimEnv> {
        let (shell, _) = Shell::new(
            SimEnv::with_seed(7),
            Some("Alice"),
            SessionConfig::default(),
            LobbyConfig::default(),
        )
        .unwrap();
        shell
    }

    /// Puts a second connection into "R1" first so that it owns the room.
    fn seat_owner(shell: &mut Shell<SimEnv>) -> (ClientId, String) {
        shell.network.broker_mut().open_room("R1");
        let bob = shell.network.add_client();
        shell.network.channel(bob).unwrap().connect();
        let bob_sock = shell.network.connect(bob).unwrap();
        shell.network.channel(bob).unwrap().emit(ClientMessage::Join(RoomPresence {
            room_id: "R1".into(),
            sender: "Bob".into(),
        }));
        shell.network.flush();
        (bob, bob_sock)
    }

    #[test]
    fn non_owner_kick_is_not_sent() {
        let mut shell = shell();
        let (_, bob_sock) = seat_owner(&mut shell);
        shell.handle_line("/join R1").unwrap();

        let out = shell.handle_line(&format!("/kick {bob_sock}")).unwrap();
        assert_eq!(out.lines, vec!["only the room owner can remove other members"]);
        assert_eq!(shell.network.broker().members("R1").len(), 2);
        assert_eq!(shell.network.broker().owner("R1"), Some(bob_sock.as_str()));
    }

    #[test]
    fn connection_changes_are_shown() {
        let mut shell = shell();
        seat_owner(&mut shell);
        shell.handle_line("/join R1").unwrap();

        shell.network.disconnect(shell.client, "ping timeout").unwrap();
        assert_eq!(shell.tick().unwrap().lines, vec!["** Mất kết nối"]);
        assert!(shell.tick().unwrap().lines.is_empty());

        shell.network.connect(shell.client).unwrap();
        let out = shell.tick().unwrap();
        assert_eq!(out.lines.first().map(String::as_str), Some("** Đã kết nối"));
        assert_eq!(shell.route(), Some(Route::Room("R1".into())));
    }

    #[test]
    fn entering_a_connected_room_prints_no_status() {
        let mut shell = shell();
        let out = shell.handle_line("/create").unwrap();
        assert!(out.lines.iter().all(|line| !line.starts_with("**")));
    }
}
