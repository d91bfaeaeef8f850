//! Simulated environment.
//!
//! Clones share one RNG and one clock, so a controller and the test driving
//! it observe the same time.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use huddle_core::env::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Wall-clock reading at virtual time zero (2023-11-14T22:13:20Z).
const START_UNIX_MILLIS: u64 = 1_700_000_000_000;

#[derive(Debug)]
struct SimState {
    rng: ChaCha8Rng,
    origin: Instant,
    elapsed: Duration,
}

/// Deterministic [`Environment`]: seeded RNG, virtual clock.
#[derive(Debug, Clone)]
pub struct SimEnv {
    state: Arc<Mutex<SimState>>,
}

impl SimEnv {
    /// Environment with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                rng: ChaCha8Rng::seed_from_u64(seed),
                origin: Instant::now(),
                elapsed: Duration::ZERO,
            })),
        }
    }

    /// Move the virtual clock forward.
    pub fn advance(&self, by: Duration) {
        self.lock().elapsed += by;
    }

    /// Virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        // Nothing can leave the state half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Instant {
        let state = self.lock();
        state.origin + state.elapsed
    }

    fn unix_millis(&self) -> u64 {
        START_UNIX_MILLIS + self.lock().elapsed.as_millis() as u64
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.lock().rng.fill_bytes(buffer);
    }
}
