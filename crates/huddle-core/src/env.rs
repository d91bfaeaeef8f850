//! Environment abstraction.
//!
//! Controllers take time and randomness from an [`Environment`] so that tests
//! and the simulation harness can substitute a virtual clock and a seeded RNG.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use rand::RngCore;

/// Source of time and randomness.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Monotonic time, used for timeouts.
    fn now(&self) -> Instant;

    /// Wall-clock time in milliseconds since the Unix epoch, used for message
    /// timestamps.
    fn unix_millis(&self) -> u64;

    /// Fill `buffer` with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);
}

/// Production environment backed by the system clock and thread RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn unix_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        rand::thread_rng().fill_bytes(buffer);
    }
}
