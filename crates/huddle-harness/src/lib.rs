//! Deterministic simulation harness for Huddle clients.
//!
//! Everything a test needs to run real controllers without a real server:
//!
//! - [`SimEnv`]: seeded RNG and a virtual clock that only moves when told to
//! - [`SimBroker`]: in-process model of the room server
//! - [`SimNetwork`]: a set of [`huddle_core::memory::MemoryChannel`]s wired
//!   to one broker
//!
//! Nothing here spawns tasks or sleeps; a test drives the network step by
//! step, so the same seed always yields the same run.

pub mod broker;
pub mod error;
pub mod network;
pub mod sim_env;

pub use broker::{Routed, SimBroker};
pub use error::HarnessError;
pub use network::{ClientId, SimNetwork};
pub use sim_env::SimEnv;
