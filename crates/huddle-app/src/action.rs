//! Controller actions
//!
//! Actions produced by the session and lobby state machines for the view
//! layer to execute.

use huddle_proto::ClientMessage;

use crate::{lobby::LobbyError, route::Route};

/// Actions produced by the controllers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Send an event over the channel.
    Emit(ClientMessage),

    /// Navigate to another screen.
    Navigate(Route),

    /// Show a blocking notification.
    Alert(String),

    /// Room creation gave up waiting for the server.
    CreateFailed(LobbyError),
}
