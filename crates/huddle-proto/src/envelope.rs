//! Named-event envelopes and the typed messages they carry.
//!
//! [`Envelope`] is what a socket-style transport moves: an event name and a
//! JSON payload. [`ClientMessage::encode`] and [`ServerMessage::decode`] are
//! the two directions the client actually uses; the opposite pair exists so
//! test brokers can speak the same wire format.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    errors::{ProtocolError, Result},
    event::EventKind,
    payloads::{
        InboundMessage, KickMember, Kicked, MemberChange, OutboundMessage, RoomCreated, RoomError,
        RoomJoined, RoomPresence, ServerException,
    },
};

/// An event name paired with its raw payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event name on the wire.
    pub event: String,
    /// Payload, `null` for events without one.
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Build an envelope from an event kind and payload.
    pub fn new(kind: EventKind, data: Value) -> Self {
        Self { event: kind.as_str().to_string(), data }
    }
}

/// Events the client sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// `room:join`
    Join(RoomPresence),
    /// `room:leave`
    Leave(RoomPresence),
    /// `room:kick_member`
    KickMember(KickMember),
    /// `message`
    Message(OutboundMessage),
    /// `room:create`
    CreateRoom,
}

impl ClientMessage {
    /// Event kind of this message.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Join(_) => EventKind::RoomJoin,
            Self::Leave(_) => EventKind::RoomLeave,
            Self::KickMember(_) => EventKind::KickMember,
            Self::Message(_) => EventKind::Message,
            Self::CreateRoom => EventKind::RoomCreate,
        }
    }

    /// Serialize into a wire envelope.
    pub fn encode(&self) -> Result<Envelope> {
        let kind = self.kind();
        let data = match self {
            Self::Join(p) | Self::Leave(p) => to_value(kind, p)?,
            Self::KickMember(p) => to_value(kind, p)?,
            Self::Message(p) => to_value(kind, p)?,
            Self::CreateRoom => Value::Null,
        };
        Ok(Envelope::new(kind, data))
    }

    /// Parse a wire envelope sent by a client.
    pub fn decode(envelope: &Envelope) -> Result<Self> {
        let kind = EventKind::from_name(&envelope.event)?;
        let data = &envelope.data;
        match kind {
            EventKind::RoomJoin => Ok(Self::Join(from_value(kind, data)?)),
            EventKind::RoomLeave => Ok(Self::Leave(from_value(kind, data)?)),
            EventKind::KickMember => Ok(Self::KickMember(from_value(kind, data)?)),
            EventKind::Message => Ok(Self::Message(from_value(kind, data)?)),
            EventKind::RoomCreate => Ok(Self::CreateRoom),
            other => Err(ProtocolError::WrongDirection { event: other.as_str(), sender: "client" }),
        }
    }
}

/// Events the server sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// `room:joined`
    RoomJoined(RoomJoined),
    /// `room:member_joined`
    MemberJoined(MemberChange),
    /// `room:member_left`
    MemberLeft(MemberChange),
    /// `room:kick`
    Kick(Kicked),
    /// `room:error`
    RoomError(RoomError),
    /// `message`
    Message(InboundMessage),
    /// `room:created`
    RoomCreated(RoomCreated),
    /// `exception`
    Exception(ServerException),
}

impl ServerMessage {
    /// Event kind of this message.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::RoomJoined(_) => EventKind::RoomJoined,
            Self::MemberJoined(_) => EventKind::MemberJoined,
            Self::MemberLeft(_) => EventKind::MemberLeft,
            Self::Kick(_) => EventKind::Kick,
            Self::RoomError(_) => EventKind::RoomError,
            Self::Message(_) => EventKind::Message,
            Self::RoomCreated(_) => EventKind::RoomCreated,
            Self::Exception(_) => EventKind::Exception,
        }
    }

    /// Serialize into a wire envelope.
    pub fn encode(&self) -> Result<Envelope> {
        let kind = self.kind();
        let data = match self {
            Self::RoomJoined(p) => to_value(kind, p)?,
            Self::MemberJoined(p) | Self::MemberLeft(p) => to_value(kind, p)?,
            Self::Kick(p) => to_value(kind, p)?,
            Self::RoomError(p) => to_value(kind, p)?,
            Self::Message(p) => to_value(kind, p)?,
            Self::RoomCreated(p) => to_value(kind, p)?,
            Self::Exception(p) => to_value(kind, p)?,
        };
        Ok(Envelope::new(kind, data))
    }

    /// Parse a wire envelope sent by the server.
    pub fn decode(envelope: &Envelope) -> Result<Self> {
        Self::decode_parts(&envelope.event, &envelope.data)
    }

    /// Parse an event name and payload sent by the server.
    pub fn decode_parts(event: &str, data: &Value) -> Result<Self> {
        let kind = EventKind::from_name(event)?;
        match kind {
            EventKind::RoomJoined => Ok(Self::RoomJoined(from_value(kind, data)?)),
            EventKind::MemberJoined => Ok(Self::MemberJoined(from_value(kind, data)?)),
            EventKind::MemberLeft => Ok(Self::MemberLeft(from_value(kind, data)?)),
            EventKind::Kick => Ok(Self::Kick(Kicked { reason: text_field(data, "reason") })),
            EventKind::RoomError => Ok(Self::RoomError(from_value(kind, data)?)),
            EventKind::Message => Ok(Self::Message(from_value(kind, data)?)),
            EventKind::RoomCreated => Ok(Self::RoomCreated(from_value(kind, data)?)),
            EventKind::Exception => {
                Ok(Self::Exception(ServerException { message: text_field(data, "message") }))
            },
            other => Err(ProtocolError::WrongDirection { event: other.as_str(), sender: "server" }),
        }
    }
}

fn to_value<T: Serialize>(kind: EventKind, payload: &T) -> Result<Value> {
    serde_json::to_value(payload)
        .map_err(|source| ProtocolError::Encode { event: kind.as_str(), source })
}

fn from_value<T: DeserializeOwned>(kind: EventKind, data: &Value) -> Result<T> {
    T::deserialize(data)
        .map_err(|source| ProtocolError::InvalidPayload { event: kind.as_str(), source })
}

/// String field of an object payload, `None` for any other shape.
///
/// `room:kick` and `exception` must take effect whatever the payload looks
/// like, so their single optional field is read without schema checks.
fn text_field(data: &Value, field: &str) -> Option<String> {
    data.get(field).and_then(Value::as_str).map(str::to_string)
}
