//! Protocol error types.

use thiserror::Error;

/// Convenience alias for protocol results.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding events.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Event name is not part of the protocol.
    #[error("unknown event `{0}`")]
    UnknownEvent(String),

    /// Event exists but flows in the other direction.
    #[error("event `{event}` cannot be sent by the {sender}")]
    WrongDirection {
        /// Event name on the wire.
        event: &'static str,
        /// Side that attempted to send it (`client` or `server`).
        sender: &'static str,
    },

    /// Payload did not match the event's schema.
    #[error("invalid payload for `{event}`: {source}")]
    InvalidPayload {
        /// Event name on the wire.
        event: &'static str,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Payload could not be serialized.
    #[error("failed to encode `{event}`: {source}")]
    Encode {
        /// Event name on the wire.
        event: &'static str,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}
