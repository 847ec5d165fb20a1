//! Exponential reconnect backoff with full jitter.

use std::time::Duration;

use rand::Rng;

/// Reconnect delay schedule.
///
/// The ceiling starts at `initial`, is multiplied by `multiplier` after every
/// failed attempt and never exceeds `max`. Each actual delay is drawn
/// uniformly from `[0, ceiling]`.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    ceiling: Duration,
    attempts: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            initial,
            max,
            multiplier,
            ceiling: initial.min(max),
            attempts: 0,
        }
    }

    /// Failed attempts since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The current upper bound for the next delay.
    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    /// Returns the delay before the next attempt and grows the ceiling.
    pub fn next_delay(&mut self) -> Duration {
        let ceiling = self.ceiling;
        self.attempts = self.attempts.saturating_add(1);
        let grown = ceiling.as_secs_f64() * self.multiplier;
        self.ceiling = Duration::from_secs_f64(grown.min(self.max.as_secs_f64()));

        let millis = ceiling.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
    }

    /// Returns to the initial delay after a successful session.
    pub fn reset(&mut self) {
        self.ceiling = self.initial.min(self.max);
        self.attempts = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60), 2.0)
    }
}
