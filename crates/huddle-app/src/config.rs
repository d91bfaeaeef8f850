//! Controller configuration.

use std::time::Duration;

use crate::locale::Locale;

/// Room session configuration.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Language used for system messages and notifications.
    pub locale: Locale,
}

/// Lobby configuration.
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// How long to wait for `room:created` before giving up. `None` waits
    /// forever.
    pub create_timeout: Option<Duration>,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self { create_timeout: Some(Duration::from_secs(10)) }
    }
}
