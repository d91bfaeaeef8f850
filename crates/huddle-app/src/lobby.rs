//! Lobby controller.
//!
//! Creating a room is a round trip: `room:create` goes out, and the server
//! answers once with `room:created`. Joining by code is purely local; it
//! just navigates to the room route and lets the room session do the rest.

use std::time::{Duration, Instant};

use huddle_core::{channel::ChannelEvent, env::Environment};
use huddle_proto::{ClientMessage, RoomCreated, ServerMessage};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{action::AppAction, config::LobbyConfig, route::Route};

/// User-visible lobby failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobbyError {
    /// The server never confirmed room creation.
    #[error("room creation timed out after {}s", waited.as_secs())]
    CreateTimedOut {
        /// How long the request was outstanding.
        waited: Duration,
    },
}

/// Room creation and join-by-code flow.
#[derive(Debug)]
pub struct Lobby<E> {
    env: E,
    config: LobbyConfig,
    pending_since: Option<Instant>,
    last_error: Option<LobbyError>,
}

impl<E: Environment> Lobby<E> {
    /// Idle lobby.
    pub fn new(env: E, config: LobbyConfig) -> Self {
        Self { env, config, pending_since: None, last_error: None }
    }

    /// Ask the server for a new room. Ignored while a request is pending.
    pub fn create_room(&mut self) -> Vec<AppAction> {
        if self.pending_since.is_some() {
            debug!("room creation already pending");
            return Vec::new();
        }
        info!("creating room");
        self.pending_since = Some(self.env.now());
        self.last_error = None;
        vec![AppAction::Emit(ClientMessage::CreateRoom)]
    }

    /// Process a channel event. Only `room:created` matters here.
    pub fn handle(&mut self, event: &ChannelEvent) -> Vec<AppAction> {
        let ChannelEvent::Server(ServerMessage::RoomCreated(RoomCreated { room_id })) = event
        else {
            return Vec::new();
        };

        if self.pending_since.take().is_none() {
            debug!(%room_id, "ignoring unsolicited room:created");
            return Vec::new();
        }
        info!(%room_id, "room created");
        vec![AppAction::Navigate(Route::Room(room_id.clone()))]
    }

    /// Expire a pending creation request.
    pub fn tick(&mut self) -> Vec<AppAction> {
        let (Some(started), Some(timeout)) = (self.pending_since, self.config.create_timeout)
        else {
            return Vec::new();
        };

        let waited = self.env.now().saturating_duration_since(started);
        if waited < timeout {
            return Vec::new();
        }

        warn!(?waited, "room creation timed out");
        let error = LobbyError::CreateTimedOut { waited };
        self.pending_since = None;
        self.last_error = Some(error.clone());
        vec![AppAction::CreateFailed(error)]
    }

    /// Go to a room by code. Blank codes are ignored.
    pub fn join_room(&self, code: &str) -> Vec<AppAction> {
        let code = code.trim();
        if code.is_empty() {
            return Vec::new();
        }
        vec![AppAction::Navigate(Route::Room(code.to_string()))]
    }

    /// Whether a creation request is outstanding.
    pub fn is_creating(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Most recent failure, cleared by the next creation attempt.
    pub fn last_error(&self) -> Option<&LobbyError> {
        self.last_error.as_ref()
    }
}
