//! Observable room state.
//!
//! These are the view-model types a renderer reads: the [`Session`] header
//! fields, the [`JoinState`] of the room, and the [`Members`] list.

use std::collections::HashMap;

use huddle_proto::{MemberId, RoomId};

/// Room membership lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinState {
    /// Mounted, join not yet requested.
    Unjoined,
    /// `room:join` sent, waiting for `room:joined`.
    Joining,
    /// Acknowledged by the server.
    Joined,
    /// Left, kicked or unmounted. Terminal.
    Left,
}

/// Per-room session fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Room this session belongs to. Never changes.
    pub room_id: RoomId,
    /// Identity assigned by the transport for the current connection.
    pub self_id: Option<MemberId>,
    /// Room owner as reported by the last join acknowledgment.
    pub owner_id: Option<MemberId>,
    /// Whether the transport is up.
    pub connected: bool,
    /// Latest advisory error.
    pub last_error: Option<String>,
}

impl Session {
    /// Fresh session for a room.
    pub fn new(room_id: impl Into<RoomId>) -> Self {
        Self {
            room_id: room_id.into(),
            self_id: None,
            owner_id: None,
            connected: false,
            last_error: None,
        }
    }
}

/// A room member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Connection id.
    pub id: MemberId,
    /// Display name.
    pub display_name: String,
}

/// Members keyed by id, iterated in insertion order.
///
/// Overwriting an existing id keeps its position; removing and re-adding
/// moves it to the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Members {
    order: Vec<MemberId>,
    by_id: HashMap<MemberId, Member>,
}

impl Members {
    /// Empty member list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a member.
    pub fn insert(&mut self, member: Member) {
        if !self.by_id.contains_key(&member.id) {
            self.order.push(member.id.clone());
        }
        self.by_id.insert(member.id.clone(), member);
    }

    /// Remove a member by id.
    pub fn remove(&mut self, id: &str) -> Option<Member> {
        let member = self.by_id.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(member)
    }

    /// Look up a member.
    pub fn get(&self, id: &str) -> Option<&Member> {
        self.by_id.get(id)
    }

    /// Whether a member with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether there are no members.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, name: &str) -> Member {
        Member { id: id.into(), display_name: name.into() }
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut members = Members::new();
        members.insert(member("a", "Ann"));
        members.insert(member("b", "Ben"));
        members.insert(member("a", "Annie"));

        let names: Vec<_> = members.iter().map(|m| m.display_name.as_str()).collect();
        assert_eq!(names, ["Annie", "Ben"]);
    }

    #[test]
    fn readd_moves_to_end() {
        let mut members = Members::new();
        members.insert(member("a", "Ann"));
        members.insert(member("b", "Ben"));
        assert!(members.remove("a").is_some());
        members.insert(member("a", "Ann"));

        let ids: Vec<_> = members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut members = Members::new();
        assert!(members.remove("ghost").is_none());
        assert!(members.is_empty());
    }
}
