//! Room session state machine.
//!
//! [`RoomSession`] owns everything a mounted room view knows: the session
//! header, the member list and the message timeline. It consumes channel
//! events and user intents and returns [`AppAction`]s; it never touches the
//! channel itself.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────┐ connect ┌─────────┐ room:joined ┌────────┐
//! │ Unjoined │────────>│ Joining │────────────>│ Joined │
//! └──────────┘         └─────────┘<────────────└────────┘
//!       │                   │       reconnect       │
//!       │                   │                       │
//!       │   room:kick / leave / unmount (any state) │
//!       └───────────────────┴─────────┬─────────────┘
//!                                     ↓
//!                                ┌────────┐
//!                                │  Left  │
//!                                └────────┘
//! ```
//!
//! Disconnection is an overlay, not a state: it clears `connected` and the
//! transport identity and leaves [`JoinState`] untouched. The server forgets
//! membership across a transport drop, so every reconnect re-sends
//! `room:join` and moves back to `Joining` until the next acknowledgment.
//!
//! Once `Left`, every further event is ignored.

use huddle_core::{channel::ChannelEvent, env::Environment};
use huddle_proto::{
    ClientMessage, KickMember, Kicked, MemberChange, MemberId, OutboundMessage, RoomId,
    RoomJoined, RoomPresence, ServerMessage,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    action::AppAction,
    config::SessionConfig,
    route::Route,
    state::{JoinState, Member, Members, Session},
    timeline::Timeline,
};

/// Errors that prevent a session from starting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No display name is set; collect one first.
    #[error("display name is required before joining a room")]
    IdentityRequired,

    /// Room id was blank.
    #[error("room id must not be empty")]
    EmptyRoomId,
}

/// State machine for one mounted room view.
#[derive(Debug)]
pub struct RoomSession<E> {
    env: E,
    config: SessionConfig,
    session: Session,
    state: JoinState,
    display_name: String,
    members: Members,
    timeline: Timeline,
    /// Id the self entry in `members` was recorded under.
    self_member: Option<MemberId>,
}

impl<E: Environment> RoomSession<E> {
    /// Create a session for `room_id`.
    ///
    /// # Errors
    ///
    /// - `IdentityRequired` if `display_name` is missing or blank; the caller
    ///   should route to [`Route::NameEntry`]
    /// - `EmptyRoomId` if `room_id` is blank
    pub fn mount(
        env: E,
        config: SessionConfig,
        room_id: impl Into<RoomId>,
        display_name: Option<&str>,
    ) -> Result<Self, SessionError> {
        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(SessionError::IdentityRequired)?
            .to_string();

        let room_id: RoomId = room_id.into();
        let room_id = room_id.trim().to_string();
        if room_id.is_empty() {
            return Err(SessionError::EmptyRoomId);
        }

        debug!(%room_id, %display_name, "room session mounted");
        Ok(Self {
            env,
            config,
            session: Session::new(room_id),
            state: JoinState::Unjoined,
            timeline: Timeline::new(display_name.clone()),
            display_name,
            members: Members::new(),
            self_member: None,
        })
    }

    /// Start the join handshake if the channel is already connected.
    pub fn start(&mut self, current_self_id: Option<&str>) -> Vec<AppAction> {
        match current_self_id {
            Some(self_id) => self.on_connected(self_id.to_string()),
            None => Vec::new(),
        }
    }

    /// Process a channel event.
    pub fn handle(&mut self, event: ChannelEvent) -> Vec<AppAction> {
        if self.state == JoinState::Left {
            debug!(kind = %event.kind(), "ignoring event after leaving room");
            return Vec::new();
        }

        match event {
            ChannelEvent::Connected { self_id } => self.on_connected(self_id),
            ChannelEvent::Disconnected { reason } => {
                self.on_disconnected(&reason);
                Vec::new()
            },
            ChannelEvent::Server(message) => self.on_server(message),
        }
    }

    /// Send a chat message. Blank text is ignored.
    pub fn send_message(&mut self, text: &str) -> Vec<AppAction> {
        let text = text.trim();
        if text.is_empty() || self.state == JoinState::Left {
            return Vec::new();
        }

        let message = self.timeline.append_local(&self.env, text);
        vec![AppAction::Emit(ClientMessage::Message(OutboundMessage {
            room_id: self.session.room_id.clone(),
            text: message.text,
            sender: self.display_name.clone(),
            client_id: Some(message.id),
        }))]
    }

    /// Ask the server to remove a member.
    ///
    /// Emitted for any caller; the server decides whether the local user is
    /// allowed to kick. Use [`Self::can_kick`] to decide whether to offer the
    /// control at all.
    pub fn kick_member(&mut self, target: &str) -> Vec<AppAction> {
        if self.state == JoinState::Left {
            return Vec::new();
        }
        debug!(room_id = %self.session.room_id, %target, "requesting kick");
        vec![AppAction::Emit(ClientMessage::KickMember(KickMember {
            room_id: self.session.room_id.clone(),
            target_socket_id: target.to_string(),
        }))]
    }

    /// Leave the room on user request and go back to the lobby.
    pub fn leave(&mut self) -> Vec<AppAction> {
        let mut actions = self.unmount();
        if !actions.is_empty() {
            actions.push(AppAction::Navigate(Route::Root));
        }
        actions
    }

    /// Leave the room because the view is going away.
    ///
    /// Emits a best-effort `room:leave`; nothing is awaited.
    pub fn unmount(&mut self) -> Vec<AppAction> {
        if self.state == JoinState::Left {
            return Vec::new();
        }
        info!(room_id = %self.session.room_id, from = ?self.state, "leaving room");
        self.state = JoinState::Left;
        vec![AppAction::Emit(ClientMessage::Leave(self.presence()))]
    }

    /// Clear the advisory error.
    pub fn dismiss_error(&mut self) {
        self.session.last_error = None;
    }

    /// Whether the local user owns the room on the current connection.
    pub fn is_owner(&self) -> bool {
        match (&self.session.owner_id, &self.session.self_id) {
            (Some(owner), Some(self_id)) => owner == self_id,
            _ => false,
        }
    }

    /// Whether to offer a kick control for `member_id`.
    pub fn can_kick(&self, member_id: &str) -> bool {
        self.is_owner() && self.session.self_id.as_deref() != Some(member_id)
    }

    /// Session header fields.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current lifecycle state.
    pub fn state(&self) -> JoinState {
        self.state
    }

    /// Room members in insertion order.
    pub fn members(&self) -> &Members {
        &self.members
    }

    /// Message timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Local display name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Room id.
    pub fn room_id(&self) -> &str {
        &self.session.room_id
    }

    fn presence(&self) -> RoomPresence {
        RoomPresence { room_id: self.session.room_id.clone(), sender: self.display_name.clone() }
    }

    fn on_connected(&mut self, self_id: MemberId) -> Vec<AppAction> {
        info!(room_id = %self.session.room_id, %self_id, from = ?self.state, "joining room");
        self.session.connected = true;
        self.session.self_id = Some(self_id);
        self.session.last_error = None;
        self.state = JoinState::Joining;
        vec![AppAction::Emit(ClientMessage::Join(self.presence()))]
    }

    fn on_disconnected(&mut self, reason: &str) {
        warn!(room_id = %self.session.room_id, %reason, "disconnected");
        self.session.connected = false;
        self.session.self_id = None;
    }

    fn on_server(&mut self, message: ServerMessage) -> Vec<AppAction> {
        match message {
            ServerMessage::RoomJoined(ack) => {
                self.on_joined(ack);
                Vec::new()
            },
            ServerMessage::MemberJoined(change) => {
                self.on_member_joined(change);
                Vec::new()
            },
            ServerMessage::MemberLeft(change) => {
                self.on_member_left(&change);
                Vec::new()
            },
            ServerMessage::Kick(kicked) => self.on_kicked(&kicked),
            ServerMessage::RoomError(error) => {
                warn!(room_id = %self.session.room_id, message = %error.message, "room error");
                self.session.last_error = Some(error.message);
                Vec::new()
            },
            ServerMessage::Exception(exception) => {
                let message = exception
                    .message
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| self.config.locale.unknown_error().to_string());
                warn!(room_id = %self.session.room_id, %message, "server exception");
                self.session.last_error = Some(message);
                Vec::new()
            },
            ServerMessage::Message(payload) => {
                self.timeline.append_remote(&self.env, payload);
                Vec::new()
            },
            ServerMessage::RoomCreated(created) => {
                debug!(room_id = %created.room_id, "ignoring room:created inside a room");
                Vec::new()
            },
        }
    }

    fn on_joined(&mut self, ack: RoomJoined) {
        if ack.room_id != self.session.room_id {
            warn!(
                room_id = %self.session.room_id,
                acked = %ack.room_id,
                "ignoring join acknowledgment for another room"
            );
            return;
        }

        if let Some(owner_id) = ack.owner_id.filter(|owner| !owner.is_empty()) {
            self.session.owner_id = Some(owner_id);
        }

        if let Some(self_id) = self.session.self_id.clone() {
            if let Some(previous) = self.self_member.replace(self_id.clone())
                && previous != self_id
            {
                self.members.remove(&previous);
            }
            self.members.insert(Member { id: self_id, display_name: self.display_name.clone() });
        }

        info!(
            room_id = %self.session.room_id,
            owner = ?self.session.owner_id,
            is_owner = self.is_owner(),
            "joined room"
        );
        self.state = JoinState::Joined;
    }

    fn on_member_joined(&mut self, change: MemberChange) {
        debug!(room_id = %self.session.room_id, member = %change.member_id, "member joined");
        let announcement = self.config.locale.member_joined(&change.sender);
        self.timeline.append_system(&self.env, announcement);
        self.members.insert(Member { id: change.member_id, display_name: change.sender });
    }

    fn on_member_left(&mut self, change: &MemberChange) {
        debug!(room_id = %self.session.room_id, member = %change.member_id, "member left");
        let announcement = self.config.locale.member_left(&change.sender);
        self.timeline.append_system(&self.env, announcement);
        self.members.remove(&change.member_id);
    }

    fn on_kicked(&mut self, kicked: &Kicked) -> Vec<AppAction> {
        warn!(
            room_id = %self.session.room_id,
            reason = kicked.reason.as_deref().unwrap_or(""),
            from = ?self.state,
            "removed from room"
        );
        self.state = JoinState::Left;
        vec![
            AppAction::Navigate(Route::Root),
            AppAction::Alert(self.config.locale.kicked().to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use huddle_harness::SimEnv;
    use huddle_proto::{ChatMessage, InboundMessage, RoomError, ServerException};

    use super::*;

    fn mounted(name: &str) -> RoomSession<SimEnv> {
        RoomSession::mount(SimEnv::with_seed(7), SessionConfig::default(), "R1", Some(name))
            .unwrap()
    }

    fn joined(name: &str, self_id: &str, owner: Option<&str>) -> RoomSession<SimEnv> {
        let mut session = mounted(name);
        session.start(Some(self_id));
        session.handle(ChannelEvent::Server(ServerMessage::RoomJoined(RoomJoined {
            room_id: "R1".into(),
            owner_id: owner.map(Into::into),
        })));
        session
    }

    fn server(message: ServerMessage) -> ChannelEvent {
        ChannelEvent::Server(message)
    }

    fn member_joined(id: &str, name: &str) -> ChannelEvent {
        server(ServerMessage::MemberJoined(MemberChange {
            member_id: id.into(),
            sender: name.into(),
        }))
    }

    fn joins(actions: &[AppAction]) -> usize {
        actions
            .iter()
            .filter(|a| matches!(a, AppAction::Emit(ClientMessage::Join(_))))
            .count()
    }

    #[test]
    fn mount_without_identity_is_refused() {
        let result = RoomSession::mount(SimEnv::with_seed(1), SessionConfig::default(), "R1", None);
        assert_eq!(result.unwrap_err(), SessionError::IdentityRequired);

        let result =
            RoomSession::mount(SimEnv::with_seed(1), SessionConfig::default(), "R1", Some("  "));
        assert_eq!(result.unwrap_err(), SessionError::IdentityRequired);
    }

    #[test]
    fn mount_with_blank_room_is_refused() {
        let result =
            RoomSession::mount(SimEnv::with_seed(1), SessionConfig::default(), " ", Some("Alice"));
        assert_eq!(result.unwrap_err(), SessionError::EmptyRoomId);
    }

    #[test]
    fn start_while_disconnected_waits() {
        let mut session = mounted("Alice");
        assert!(session.start(None).is_empty());
        assert_eq!(session.state(), JoinState::Unjoined);
    }

    #[test]
    fn start_while_connected_joins() {
        let mut session = mounted("Alice");
        let actions = session.start(Some("s1"));
        assert_eq!(
            actions,
            vec![AppAction::Emit(ClientMessage::Join(RoomPresence {
                room_id: "R1".into(),
                sender: "Alice".into(),
            }))]
        );
        assert_eq!(session.state(), JoinState::Joining);
        assert!(session.session().connected);
    }

    #[test]
    fn connect_event_joins() {
        let mut session = mounted("Alice");
        let actions = session.handle(ChannelEvent::Connected { self_id: "s1".into() });
        assert_eq!(joins(&actions), 1);
        assert_eq!(session.state(), JoinState::Joining);
    }

    #[test]
    fn joined_ack_sets_owner_and_self_entry() {
        let session = joined("Alice", "s1", Some("s1"));
        assert_eq!(session.state(), JoinState::Joined);
        assert!(session.is_owner());
        assert_eq!(
            session.members().get("s1"),
            Some(&Member { id: "s1".into(), display_name: "Alice".into() })
        );
    }

    #[test]
    fn not_owner_when_ids_differ() {
        let session = joined("Bob", "s2", Some("s1"));
        assert!(!session.is_owner());
        assert!(!session.can_kick("s1"));
    }

    #[test]
    fn owner_cannot_kick_self() {
        let session = joined("Alice", "s1", Some("s1"));
        assert!(session.can_kick("s2"));
        assert!(!session.can_kick("s1"));
    }

    #[test]
    fn ack_for_other_room_is_ignored() {
        let mut session = mounted("Alice");
        session.start(Some("s1"));
        session.handle(server(ServerMessage::RoomJoined(RoomJoined {
            room_id: "R2".into(),
            owner_id: Some("s1".into()),
        })));
        assert_eq!(session.state(), JoinState::Joining);
        assert_eq!(session.session().owner_id, None);
        assert!(session.members().is_empty());
    }

    #[test]
    fn empty_owner_id_is_not_recorded() {
        let session = joined("Alice", "s1", Some(""));
        assert_eq!(session.session().owner_id, None);
    }

    #[test]
    fn member_events_announce_and_update_map() {
        let mut session = joined("Alice", "s1", None);
        session.handle(member_joined("s2", "Bob"));
        assert!(session.members().contains("s2"));
        assert_eq!(session.timeline().messages()[0].text, "Bob đã tham gia phòng");

        session.handle(server(ServerMessage::MemberLeft(MemberChange {
            member_id: "s2".into(),
            sender: "Bob".into(),
        })));
        assert!(!session.members().contains("s2"));
        assert_eq!(session.timeline().messages()[1].text, "Bob đã rời phòng");
        assert_eq!(session.state(), JoinState::Joined);
    }

    #[test]
    fn english_announcements() {
        let mut session = RoomSession::mount(
            SimEnv::with_seed(1),
            SessionConfig { locale: crate::locale::Locale::English },
            "R1",
            Some("Alice"),
        )
        .unwrap();
        session.start(Some("s1"));
        session.handle(member_joined("s2", "Bob"));
        assert_eq!(session.timeline().messages()[0].text, "Bob joined the room");
    }

    #[test]
    fn reconnect_rejoins_once_and_replaces_self_entry() {
        let mut session = joined("Alice", "s1", Some("s1"));

        assert!(session.handle(ChannelEvent::Disconnected { reason: "ping timeout".into() }).is_empty());
        assert!(!session.session().connected);
        assert_eq!(session.session().self_id, None);
        assert!(!session.is_owner());
        assert_eq!(session.state(), JoinState::Joined);

        let actions = session.handle(ChannelEvent::Connected { self_id: "s9".into() });
        assert_eq!(joins(&actions), 1);
        assert_eq!(actions.len(), 1);
        assert_eq!(session.state(), JoinState::Joining);

        session.handle(server(ServerMessage::RoomJoined(RoomJoined {
            room_id: "R1".into(),
            owner_id: None,
        })));
        assert!(session.members().contains("s9"));
        assert!(!session.members().contains("s1"));
        // Ownership was recorded against the old connection id.
        assert!(!session.is_owner());
    }

    #[test]
    fn kick_in_any_state_leaves_with_one_navigation() {
        let kick = || server(ServerMessage::Kick(Kicked { reason: Some("bye".into()) }));

        let mut unjoined = mounted("Alice");
        let mut joining = mounted("Alice");
        joining.start(Some("s1"));
        let mut joined_session = joined("Alice", "s1", None);

        for session in [&mut unjoined, &mut joining, &mut joined_session] {
            let actions = session.handle(kick());
            assert_eq!(session.state(), JoinState::Left);
            let navigations = actions
                .iter()
                .filter(|a| matches!(a, AppAction::Navigate(Route::Root)))
                .count();
            assert_eq!(navigations, 1);
            assert!(actions.iter().any(|a| matches!(a, AppAction::Alert(_))));

            // Terminal: nothing further is processed.
            assert!(session.handle(kick()).is_empty());
            assert!(session.handle(member_joined("s3", "Cy")).is_empty());
            assert!(session.unmount().is_empty());
        }
        assert!(!joined_session.members().contains("s3"));
    }

    #[test]
    fn errors_are_advisory() {
        let mut session = joined("Alice", "s1", None);
        session.handle(server(ServerMessage::RoomError(RoomError { message: "room full".into() })));
        assert_eq!(session.session().last_error.as_deref(), Some("room full"));
        assert_eq!(session.state(), JoinState::Joined);

        session.dismiss_error();
        assert_eq!(session.session().last_error, None);

        session.handle(server(ServerMessage::Exception(ServerException { message: None })));
        assert_eq!(session.session().last_error.as_deref(), Some("Lỗi không xác định"));
    }

    #[test]
    fn reconnect_clears_error() {
        let mut session = joined("Alice", "s1", None);
        session.handle(server(ServerMessage::RoomError(RoomError { message: "oops".into() })));
        session.handle(ChannelEvent::Disconnected { reason: "x".into() });
        session.handle(ChannelEvent::Connected { self_id: "s2".into() });
        assert_eq!(session.session().last_error, None);
    }

    #[test]
    fn send_then_echo_keeps_one_message() {
        let mut session = joined("Alice", "s1", None);
        let actions = session.send_message("hello");
        let [AppAction::Emit(ClientMessage::Message(outbound))] = actions.as_slice() else {
            panic!("expected one outbound message, got {actions:?}");
        };
        assert_eq!(outbound.text, "hello");
        assert_eq!(outbound.sender, "Alice");
        assert_eq!(outbound.room_id, "R1");
        assert!(outbound.client_id.is_some());

        session.handle(server(ServerMessage::Message(InboundMessage::Structured(ChatMessage {
            id: None,
            text: "hello".into(),
            sender: Some("Alice".into()),
            timestamp: None,
            client_id: None,
        }))));

        let messages = session.timeline().messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "hello");
        assert_eq!(messages[0].sender, "Alice");
    }

    #[test]
    fn blank_message_is_ignored() {
        let mut session = joined("Alice", "s1", None);
        assert!(session.send_message("   ").is_empty());
        assert!(session.timeline().is_empty());
    }

    #[test]
    fn send_trims_text() {
        let mut session = joined("Alice", "s1", None);
        session.send_message("  hi  ");
        assert_eq!(session.timeline().messages()[0].text, "hi");
    }

    #[test]
    fn kick_member_emits_for_non_owner_too() {
        let mut session = joined("Bob", "s2", Some("s1"));
        assert_eq!(
            session.kick_member("s1"),
            vec![AppAction::Emit(ClientMessage::KickMember(KickMember {
                room_id: "R1".into(),
                target_socket_id: "s1".into(),
            }))]
        );
    }

    #[test]
    fn leave_emits_and_navigates_home() {
        let mut session = joined("Alice", "s1", None);
        let actions = session.leave();
        assert_eq!(
            actions,
            vec![
                AppAction::Emit(ClientMessage::Leave(RoomPresence {
                    room_id: "R1".into(),
                    sender: "Alice".into(),
                })),
                AppAction::Navigate(Route::Root),
            ]
        );
        assert_eq!(session.state(), JoinState::Left);
        assert!(session.leave().is_empty());
        assert!(session.send_message("late").is_empty());
    }
}
