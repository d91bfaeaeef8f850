//! Event names.
//!
//! Every event on the channel is identified by a string name. [`EventKind`]
//! is the closed set of names this client knows about, including the two
//! channel-local lifecycle events (`connect`, `disconnect`) that never travel
//! over the wire but are delivered through the same subscription mechanism.

use std::fmt;

use crate::errors::ProtocolError;

/// Known event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// Transport connected (channel-local).
    Connect,
    /// Transport disconnected (channel-local).
    Disconnect,
    /// Client asks to join a room.
    RoomJoin,
    /// Server acknowledges a join.
    RoomJoined,
    /// Client leaves a room.
    RoomLeave,
    /// Another member joined.
    MemberJoined,
    /// Another member left.
    MemberLeft,
    /// Owner asks the server to remove a member.
    KickMember,
    /// This client was removed from the room.
    Kick,
    /// Advisory room-level error.
    RoomError,
    /// Chat message, both directions.
    Message,
    /// Client asks the server to allocate a room.
    RoomCreate,
    /// Server allocated a room.
    RoomCreated,
    /// Generic server-side exception.
    Exception,
}

impl EventKind {
    /// Every known event, in protocol table order.
    pub const ALL: [Self; 14] = [
        Self::Connect,
        Self::Disconnect,
        Self::RoomJoin,
        Self::RoomJoined,
        Self::RoomLeave,
        Self::MemberJoined,
        Self::MemberLeft,
        Self::KickMember,
        Self::Kick,
        Self::RoomError,
        Self::Message,
        Self::RoomCreate,
        Self::RoomCreated,
        Self::Exception,
    ];

    /// Event name on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::RoomJoin => "room:join",
            Self::RoomJoined => "room:joined",
            Self::RoomLeave => "room:leave",
            Self::MemberJoined => "room:member_joined",
            Self::MemberLeft => "room:member_left",
            Self::KickMember => "room:kick_member",
            Self::Kick => "room:kick",
            Self::RoomError => "room:error",
            Self::Message => "message",
            Self::RoomCreate => "room:create",
            Self::RoomCreated => "room:created",
            Self::Exception => "exception",
        }
    }

    /// Look up an event by its wire name.
    pub fn from_name(name: &str) -> Result<Self, ProtocolError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| ProtocolError::UnknownEvent(name.to_string()))
    }

    /// True for `connect` and `disconnect`, which the transport raises itself.
    pub const fn is_lifecycle(self) -> bool {
        matches!(self, Self::Connect | Self::Disconnect)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
