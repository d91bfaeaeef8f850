//! Application layer for Huddle
//!
//! Pure state machines for the client side of a chat room, plus the thin
//! views that bind them to a [`huddle_core::channel::Channel`]. The same
//! controllers run in the CLI, in unit tests and in the simulation harness.
//!
//! # Components
//!
//! - [`IdentityProvider`]: display name resolution and the name entry flow
//! - [`Timeline`]: append-only message log with echo suppression
//! - [`RoomSession`]: join handshake, membership, ownership, kick, reconnect
//! - [`Lobby`]: room creation and join-by-code
//! - [`RoomView`] / [`LobbyView`]: channel subscriptions scoped to a screen
//!
//! Controllers return [`AppAction`]s; views execute the `Emit` ones and
//! return the rest as [`ViewSignal`]s for the UI.

mod action;
mod config;
mod identity;
mod lobby;
mod locale;
mod route;
mod session;
mod state;
mod timeline;
mod view;

pub use action::AppAction;
pub use config::{LobbyConfig, SessionConfig};
pub use identity::{IdentityProvider, IdentityStore, MemoryIdentityStore, NameEntry};
pub use lobby::{Lobby, LobbyError};
pub use locale::{Locale, UnknownLocale};
pub use route::Route;
pub use session::{RoomSession, SessionError};
pub use state::{JoinState, Member, Members, Session};
pub use timeline::{Message, MessageKind, SERVER, Timeline};
pub use view::{LobbyView, MountError, RoomView, ViewSignal};
