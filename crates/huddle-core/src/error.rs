//! Channel error types.

use huddle_proto::ProtocolError;
use thiserror::Error;

/// Errors raised by channel implementations when asked to do something the
/// current connection state does not allow.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// A connection was offered but nobody called `connect()`.
    #[error("channel is not trying to connect")]
    NotConnecting,

    /// A connection was offered while one is already up.
    #[error("channel is already connected")]
    AlreadyConnected,

    /// An inbound event arrived while the channel is down.
    #[error("channel is not connected")]
    NotConnected,

    /// Raw inbound event could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
