//! Wire format for the Huddle room protocol.
//!
//! The transport carries named events, each with an optional JSON payload. An
//! [`Envelope`] pairs the event name with its raw payload; [`ClientMessage`]
//! and [`ServerMessage`] are the typed views of the events each side is
//! allowed to send.
//!
//! Payload field names are camelCase on the wire. Inbound chat messages are
//! deliberately loose: the server may send a bare string or a structured
//! object with any of its fields missing, and the receiver fills in defaults.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod errors;
pub mod event;
pub mod payloads;

pub use envelope::{ClientMessage, Envelope, ServerMessage};
pub use errors::{ProtocolError, Result};
pub use event::EventKind;
pub use payloads::{
    ChatMessage, InboundMessage, KickMember, Kicked, MemberChange, OutboundMessage, RoomCreated,
    RoomError, RoomJoined, RoomPresence, ServerException,
};

/// Room identifier. Rooms are addressed by the code users share with each
/// other, so this is free-form text assigned by the server.
pub type RoomId = String;

/// Connection identifier assigned by the transport to each connected client.
pub type MemberId = String;
