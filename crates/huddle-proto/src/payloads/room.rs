//! Room lifecycle and membership payloads.

use serde::{Deserialize, Serialize};

use crate::{MemberId, RoomId};

/// Join or leave request.
///
/// # Protocol Flow
///
/// Sent as `room:join` whenever the transport (re)connects while a room view
/// is mounted, since the server forgets membership across a transport drop.
/// Sent as `room:leave` when the view is left; the server never acknowledges
/// a leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPresence {
    /// Room being joined or left.
    pub room_id: RoomId,
    /// Display name of the local user.
    pub sender: String,
}

/// Join acknowledgment (`room:joined`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoined {
    /// Room that was joined.
    pub room_id: RoomId,
    /// Connection id of the room owner, when the server knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<MemberId>,
}

/// Another member joined or left (`room:member_joined`, `room:member_left`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberChange {
    /// Connection id of the member.
    pub member_id: MemberId,
    /// Display name of the member.
    pub sender: String,
}

/// Owner request to remove a member (`room:kick_member`).
///
/// The server decides whether the requester is allowed to kick; the client
/// sends this for whoever asks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KickMember {
    /// Room the target is in.
    pub room_id: RoomId,
    /// Connection id of the member to remove.
    pub target_socket_id: MemberId,
}

/// This client was removed from its room (`room:kick`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kicked {
    /// Server-provided reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Advisory room error (`room:error`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomError {
    /// Human-readable description.
    pub message: String,
}

/// Generic server exception (`exception`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerException {
    /// Human-readable description, if the server sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Room allocation result (`room:created`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreated {
    /// Code of the new room.
    pub room_id: RoomId,
}
