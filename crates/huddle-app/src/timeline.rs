//! Message timeline.
//!
//! Append-only, insertion-ordered log of the messages shown in a room.
//! Messages are never re-sorted by timestamp, edited or removed.
//!
//! # Echo suppression
//!
//! The server relays every chat message to all room members, including its
//! author. Locally sent messages are appended optimistically, so the relayed
//! copy has to be dropped on arrival:
//!
//! - If the relayed message carries a correlation id, it is dropped only when
//!   the id matches one of our outstanding local sends.
//! - Otherwise it is dropped when its sender equals the local display name.
//!   Two sessions sharing a display name therefore hide each other's
//!   messages when the server does not relay correlation ids.
//!
//! Messages from any other sender are always appended.

use std::collections::VecDeque;

use huddle_core::env::Environment;
use huddle_proto::InboundMessage;
use tracing::trace;

/// Id and sender used for messages that do not carry their own.
pub const SERVER: &str = "server";

/// Outstanding correlation ids remembered for echo matching.
const PENDING_ECHO_LIMIT: usize = 256;

/// Where a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Relayed by the server from another member.
    Remote,
    /// Sent by this client, appended before the server saw it.
    Local,
    /// Announcement generated by the client or a bare server notice.
    System,
}

/// A message in the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message id. Not unique: server notices all share [`SERVER`].
    pub id: String,
    /// Message body.
    pub text: String,
    /// Display name of the author.
    pub sender: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Origin of the message.
    pub kind: MessageKind,
}

/// Ordered message log for one room view.
#[derive(Debug, Clone)]
pub struct Timeline {
    display_name: String,
    messages: Vec<Message>,
    pending_echoes: VecDeque<String>,
}

impl Timeline {
    /// Empty timeline for the given local display name.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            messages: Vec::new(),
            pending_echoes: VecDeque::new(),
        }
    }

    /// Append a message received from the server.
    ///
    /// Returns `false` if the message was suppressed as an echo.
    pub fn append_remote<E: Environment>(&mut self, env: &E, payload: InboundMessage) -> bool {
        let (message, client_id) = match payload {
            InboundMessage::Text(text) => (
                Message {
                    id: SERVER.to_string(),
                    text,
                    sender: SERVER.to_string(),
                    timestamp: env.unix_millis(),
                    kind: MessageKind::System,
                },
                None,
            ),
            InboundMessage::Structured(chat) => (
                Message {
                    id: chat.id.unwrap_or_else(|| SERVER.to_string()),
                    text: chat.text,
                    sender: chat.sender.unwrap_or_else(|| SERVER.to_string()),
                    timestamp: chat.timestamp.unwrap_or_else(|| env.unix_millis()),
                    kind: MessageKind::Remote,
                },
                chat.client_id,
            ),
        };

        if self.is_echo(&message.sender, client_id.as_deref()) {
            trace!(sender = %message.sender, "suppressed echo of local message");
            return false;
        }

        self.messages.push(message);
        true
    }

    /// Append a message typed by the local user.
    ///
    /// The returned message's id doubles as the correlation id to send with
    /// the outbound event.
    pub fn append_local<E: Environment>(&mut self, env: &E, text: impl Into<String>) -> Message {
        let mut bytes = [0u8; 8];
        env.random_bytes(&mut bytes);
        let id = format!("local-{}", hex::encode(bytes));

        if self.pending_echoes.len() == PENDING_ECHO_LIMIT {
            self.pending_echoes.pop_front();
        }
        self.pending_echoes.push_back(id.clone());

        let message = Message {
            id,
            text: text.into(),
            sender: self.display_name.clone(),
            timestamp: env.unix_millis(),
            kind: MessageKind::Local,
        };
        self.messages.push(message.clone());
        message
    }

    /// Append a client-generated announcement.
    pub fn append_system<E: Environment>(&mut self, env: &E, text: impl Into<String>) {
        self.messages.push(Message {
            id: SERVER.to_string(),
            text: text.into(),
            sender: SERVER.to_string(),
            timestamp: env.unix_millis(),
            kind: MessageKind::System,
        });
    }

    /// All messages in insertion order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the timeline is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Local display name used for echo suppression.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Whether a message should be rendered as the local user's own.
    pub fn is_own(&self, message: &Message) -> bool {
        message.sender == self.display_name
    }

    fn is_echo(&mut self, sender: &str, client_id: Option<&str>) -> bool {
        if sender != self.display_name {
            return false;
        }
        let Some(client_id) = client_id else {
            return true;
        };
        match self.pending_echoes.iter().position(|pending| pending == client_id) {
            Some(index) => {
                self.pending_echoes.remove(index);
                true
            },
            None => false,
        }
    }
}
