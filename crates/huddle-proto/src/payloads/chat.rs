//! Chat message payloads.

use serde::{Deserialize, Serialize};

use crate::RoomId;

/// Chat message sent by this client (`message`, client→server).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    /// Room the message belongs to.
    pub room_id: RoomId,
    /// Message body.
    pub text: String,
    /// Display name of the local user.
    pub sender: String,
    /// Client-generated correlation id, echoed back by servers that support
    /// it so the sender can recognise its own message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Structured chat message as relayed by the server.
///
/// Every field except `text` is optional; the receiver substitutes defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Message body.
    pub text: String,
    /// Display name of the author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    /// Correlation id copied from the originating [`OutboundMessage`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Chat message received from the server (`message`, server→client).
///
/// Servers send either a bare string, which is an anonymous system notice,
/// or a [`ChatMessage`] object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InboundMessage {
    /// Bare text notice.
    Text(String),
    /// Structured message.
    Structured(ChatMessage),
}

impl From<OutboundMessage> for ChatMessage {
    /// The relayed form of an outbound message, as an echoing server sends it.
    fn from(message: OutboundMessage) -> Self {
        Self {
            id: None,
            text: message.text,
            sender: Some(message.sender),
            timestamp: None,
            client_id: message.client_id,
        }
    }
}
