//! Simulated upload progress.
//!
//! The relay gives no progress feedback, so while a request is in flight
//! the value creeps from [`PROGRESS_FLOOR`] towards [`PROGRESS_CEILING`] in
//! random steps. Only [`ProgressSimulator::complete`] reaches 100.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Value set when a simulation starts.
pub const PROGRESS_FLOOR: u8 = 8;
/// The simulation never goes past this on its own.
pub const PROGRESS_CEILING: u8 = 92;
pub const PROGRESS_COMPLETE: u8 = 100;
pub const MIN_STEP: u8 = 2;
pub const MAX_STEP: u8 = 8;
pub const TICK_INTERVAL: Duration = Duration::from_millis(260);

/// One simulation step, clamped to the ceiling.
pub fn advance(current: u8, step: u8) -> u8 {
    current.saturating_add(step).min(PROGRESS_CEILING)
}

type SharedRng = Arc<Mutex<Box<dyn RngCore + Send>>>;

/// Drives a progress value on a background ticker.
pub struct ProgressSimulator {
    value: Arc<watch::Sender<u8>>,
    rng: SharedRng,
    ticker: Option<JoinHandle<()>>,
}

impl ProgressSimulator {
    pub fn new(rng: impl RngCore + Send + 'static) -> Self {
        let (value, _) = watch::channel(0);
        Self {
            value: Arc::new(value),
            rng: Arc::new(Mutex::new(Box::new(rng))),
            ticker: None,
        }
    }

    /// Deterministic steps, for tests.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Sets the floor value and starts ticking. Replaces a running ticker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        self.stop();
        self.value.send_replace(PROGRESS_FLOOR);

        let value = Arc::clone(&self.value);
        let rng = Arc::clone(&self.rng);
        self.ticker = Some(tokio::spawn(async move {
            let mut interval =
                tokio::time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
            loop {
                interval.tick().await;
                let Ok(step) = rng.lock().map(|mut rng| rng.gen_range(MIN_STEP..=MAX_STEP))
                else {
                    break;
                };
                value.send_modify(|v| *v = advance(*v, step));
            }
        }));
    }

    /// Stops ticking and keeps the current value.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    /// Stops ticking and jumps to 100.
    pub fn complete(&mut self) {
        self.stop();
        self.value.send_replace(PROGRESS_COMPLETE);
    }

    /// Stops ticking and resets to 0.
    pub fn clear(&mut self) {
        self.stop();
        self.value.send_replace(0);
    }

    pub fn current(&self) -> u8 {
        *self.value.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.value.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for ProgressSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}
