//! Channel-bound views.
//!
//! Views are the thin layer between a [`Channel`] and the controllers. At
//! mount they register one handler per event kind they care about; the
//! handlers do nothing except push the delivery into an unbounded queue owned
//! by the view. [`RoomView::pump`] and [`LobbyView::pump`] drain that queue
//! on the caller's thread, feed the controller, execute the resulting `Emit`
//! actions on the channel and hand everything else back as [`ViewSignal`]s.
//!
//! Deliveries from a connection epoch older than the newest one seen are
//! dropped before they reach the controller.
//!
//! A view must be torn down with `unmount`, which removes every handler it
//! registered. Dropping a view without unmounting leaves dead handlers on the
//! channel.

use huddle_core::channel::{Channel, ChannelEvent, ConnectionEpoch, Delivery, HandlerId};
use huddle_core::env::Environment;
use huddle_proto::EventKind;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::{
    action::AppAction,
    config::{LobbyConfig, SessionConfig},
    identity::{IdentityProvider, IdentityStore},
    lobby::{Lobby, LobbyError},
    route::Route,
    session::{RoomSession, SessionError},
    state::JoinState,
};

/// Event kinds a room view listens to.
const ROOM_EVENTS: [EventKind; 9] = [
    EventKind::Connect,
    EventKind::Disconnect,
    EventKind::RoomJoined,
    EventKind::MemberJoined,
    EventKind::MemberLeft,
    EventKind::Kick,
    EventKind::RoomError,
    EventKind::Exception,
    EventKind::Message,
];

/// Event kinds a lobby view listens to.
const LOBBY_EVENTS: [EventKind; 1] = [EventKind::RoomCreated];

/// What the UI has to do after a view processed something.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewSignal {
    /// Switch screens.
    Navigate(Route),
    /// Show a blocking notification.
    Alert(String),
    /// Room creation failed.
    CreateFailed(LobbyError),
}

/// Why a room view could not be mounted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MountError {
    /// No display name is set.
    #[error("display name is required before joining a room")]
    IdentityRequired,

    /// Room id was blank.
    #[error("room id must not be empty")]
    EmptyRoomId,
}

impl MountError {
    /// Where the UI should go instead.
    pub fn redirect(&self) -> Route {
        match self {
            Self::IdentityRequired => Route::NameEntry,
            Self::EmptyRoomId => Route::Root,
        }
    }
}

impl From<SessionError> for MountError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::IdentityRequired => Self::IdentityRequired,
            SessionError::EmptyRoomId => Self::EmptyRoomId,
        }
    }
}

/// Queue fed by channel handlers.
#[derive(Debug)]
struct Inbox {
    rx: mpsc::UnboundedReceiver<Delivery>,
    handlers: Vec<HandlerId>,
    latest_epoch: ConnectionEpoch,
}

impl Inbox {
    fn subscribe<C: Channel>(channel: &mut C, kinds: &[EventKind]) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handlers = kinds
            .iter()
            .map(|&kind| {
                let tx = tx.clone();
                channel.on(
                    kind,
                    Box::new(move |delivery: &Delivery| {
                        // Receiver gone means the view was dropped.
                        let _ = tx.send(delivery.clone());
                    }),
                )
            })
            .collect();
        Self { rx, handlers, latest_epoch: channel.epoch() }
    }

    /// Next delivery from the current epoch.
    fn next(&mut self) -> Option<ChannelEvent> {
        while let Ok(delivery) = self.rx.try_recv() {
            if delivery.epoch < self.latest_epoch {
                debug!(
                    kind = %delivery.event.kind(),
                    epoch = %delivery.epoch,
                    latest = %self.latest_epoch,
                    "dropping stale delivery"
                );
                continue;
            }
            self.latest_epoch = delivery.epoch;
            trace!(kind = %delivery.event.kind(), epoch = %delivery.epoch, "delivery");
            return Some(delivery.event);
        }
        None
    }

    /// Discard everything queued. Returns the number discarded.
    fn clear(&mut self) -> usize {
        let mut discarded = 0;
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }

    fn unsubscribe<C: Channel>(mut self, channel: &mut C) {
        for id in self.handlers.drain(..) {
            channel.off(id);
        }
        self.rx.close();
    }
}

/// Run controller actions: emits go to the channel, the rest to the UI.
fn execute<C: Channel>(channel: &mut C, actions: Vec<AppAction>) -> Vec<ViewSignal> {
    let mut signals = Vec::new();
    for action in actions {
        match action {
            AppAction::Emit(message) => {
                let kind = message.kind();
                if !channel.emit(message) {
                    debug!(%kind, "emit dropped, channel disconnected");
                }
            },
            AppAction::Navigate(route) => signals.push(ViewSignal::Navigate(route)),
            AppAction::Alert(text) => signals.push(ViewSignal::Alert(text)),
            AppAction::CreateFailed(error) => signals.push(ViewSignal::CreateFailed(error)),
        }
    }
    signals
}

/// A room screen bound to a channel.
#[derive(Debug)]
pub struct RoomView<E> {
    session: RoomSession<E>,
    inbox: Inbox,
}

impl<E: Environment> RoomView<E> {
    /// Mount the room screen.
    ///
    /// The identity check happens before anything touches the channel, so a
    /// refused mount never connects, subscribes or emits.
    ///
    /// # Errors
    ///
    /// - `IdentityRequired` if no display name is set
    /// - `EmptyRoomId` if `room_id` is blank
    pub fn mount<C: Channel, S: IdentityStore>(
        channel: &mut C,
        env: E,
        identity: &IdentityProvider<S>,
        room_id: &str,
        config: SessionConfig,
    ) -> Result<Self, MountError> {
        let display_name = identity.display_name();
        let mut session = RoomSession::mount(env, config, room_id, display_name.as_deref())?;

        channel.connect();
        let inbox = Inbox::subscribe(channel, &ROOM_EVENTS);
        let actions = session.start(channel.self_id());
        execute(channel, actions);

        Ok(Self { session, inbox })
    }

    /// Process everything queued since the last pump.
    ///
    /// Stops at the first event that ends the session and discards the rest.
    pub fn pump<C: Channel>(&mut self, channel: &mut C) -> Vec<ViewSignal> {
        let mut signals = Vec::new();
        while let Some(event) = self.inbox.next() {
            let actions = self.session.handle(event);
            signals.extend(execute(channel, actions));

            if self.session.state() == JoinState::Left {
                let discarded = self.inbox.clear();
                if discarded > 0 {
                    debug!(discarded, "discarding events queued after leaving room");
                }
                break;
            }
        }
        signals
    }

    /// Send a chat message.
    pub fn send<C: Channel>(&mut self, channel: &mut C, text: &str) -> Vec<ViewSignal> {
        let actions = self.session.send_message(text);
        execute(channel, actions)
    }

    /// Ask the server to remove a member.
    pub fn kick<C: Channel>(&mut self, channel: &mut C, target: &str) -> Vec<ViewSignal> {
        let actions = self.session.kick_member(target);
        execute(channel, actions)
    }

    /// Leave on user request.
    pub fn leave<C: Channel>(&mut self, channel: &mut C) -> Vec<ViewSignal> {
        let actions = self.session.leave();
        execute(channel, actions)
    }

    /// Clear the advisory error.
    pub fn dismiss_error(&mut self) {
        self.session.dismiss_error();
    }

    /// Controller state for rendering.
    pub fn session(&self) -> &RoomSession<E> {
        &self.session
    }

    /// Tear down: best-effort `room:leave` unless already left, then remove
    /// every handler this view registered.
    pub fn unmount<C: Channel>(mut self, channel: &mut C) {
        let actions = self.session.unmount();
        execute(channel, actions);
        self.inbox.unsubscribe(channel);
        debug!(room_id = %self.session.room_id(), "room view unmounted");
    }
}

/// The lobby screen bound to a channel.
#[derive(Debug)]
pub struct LobbyView<E> {
    lobby: Lobby<E>,
    inbox: Inbox,
}

impl<E: Environment> LobbyView<E> {
    /// Mount the lobby screen.
    pub fn mount<C: Channel>(channel: &mut C, env: E, config: LobbyConfig) -> Self {
        channel.connect();
        let inbox = Inbox::subscribe(channel, &LOBBY_EVENTS);
        Self { lobby: Lobby::new(env, config), inbox }
    }

    /// Request a new room.
    pub fn create_room<C: Channel>(&mut self, channel: &mut C) -> Vec<ViewSignal> {
        let actions = self.lobby.create_room();
        execute(channel, actions)
    }

    /// Go to a room by code.
    pub fn join_room(&self, code: &str) -> Vec<ViewSignal> {
        let actions = self.lobby.join_room(code);
        // join_room never emits.
        actions
            .into_iter()
            .filter_map(|action| match action {
                AppAction::Navigate(route) => Some(ViewSignal::Navigate(route)),
                _ => None,
            })
            .collect()
    }

    /// Process queued events, then check the creation timeout.
    pub fn pump<C: Channel>(&mut self, channel: &mut C) -> Vec<ViewSignal> {
        let mut signals = Vec::new();
        while let Some(event) = self.inbox.next() {
            let actions = self.lobby.handle(&event);
            signals.extend(execute(channel, actions));
        }
        let actions = self.lobby.tick();
        signals.extend(execute(channel, actions));
        signals
    }

    /// Controller state for rendering.
    pub fn lobby(&self) -> &Lobby<E> {
        &self.lobby
    }

    /// Remove every handler this view registered.
    pub fn unmount<C: Channel>(self, channel: &mut C) {
        self.inbox.unsubscribe(channel);
        debug!("lobby view unmounted");
    }
}
