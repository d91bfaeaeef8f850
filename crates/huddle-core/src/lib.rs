//! Huddle client core
//!
//! The pieces every Huddle controller depends on but none of them own: the
//! transport channel contract and the environment that supplies time and
//! randomness.
//!
//! # Architecture
//!
//! Controllers in `huddle-app` are deterministic state machines. They never
//! read the clock, generate randomness, or touch the network themselves.
//! Time and randomness come from an [`env::Environment`] passed in by the
//! caller; network effects are returned as actions and executed against a
//! [`channel::Channel`] by a thin binding layer.
//!
//! Keeping the channel behind a trait means the same controllers run against
//! a real socket, the [`memory::MemoryChannel`] used in tests, and the
//! simulation harness.
//!
//! # Components
//!
//! - [`channel`]: Channel contract, deliveries, connection epochs
//! - [`memory`]: In-process channel implementation
//! - [`mod@env`]: Environment abstraction (time, RNG)
//! - [`error`]: Channel error types

pub mod channel;
pub mod env;
pub mod error;
pub mod memory;
