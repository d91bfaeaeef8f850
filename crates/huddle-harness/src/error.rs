//! Harness errors.

use huddle_core::error::ChannelError;
use thiserror::Error;

use crate::network::ClientId;

/// Errors from driving the simulated network.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// No client with this id was added.
    #[error("unknown client {0}")]
    UnknownClient(ClientId),

    /// The client's channel rejected the operation.
    #[error("client {client}: {source}")]
    Channel {
        /// Client whose channel failed.
        client: ClientId,
        /// Underlying channel error.
        #[source]
        source: ChannelError,
    },
}
