//! Navigation targets.

use std::fmt;

use huddle_proto::RoomId;

/// Where the UI should go next.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// Landing page with the lobby. Leaving or being kicked ends up here.
    Root,
    /// Display name entry.
    NameEntry,
    /// Chat view for one room.
    Room(RoomId),
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("/"),
            Self::NameEntry => f.write_str("/name"),
            Self::Room(room_id) => write!(f, "/chat/{room_id}"),
        }
    }
}
