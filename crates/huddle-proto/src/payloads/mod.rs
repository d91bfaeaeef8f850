//! Event payload types.
//!
//! Payloads are grouped by concern: room lifecycle and membership in
//! [`room`], chat traffic in [`chat`].

pub mod chat;
pub mod room;

pub use chat::{ChatMessage, InboundMessage, OutboundMessage};
pub use room::{
    KickMember, Kicked, MemberChange, RoomCreated, RoomError, RoomJoined, RoomPresence,
    ServerException,
};
