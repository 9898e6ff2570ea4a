//! Clock and random implementations.

use crate::infrastructure::ports::{ClockPort, RandomPort};
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

/// System clock - uses real time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// System random - uses real randomness.
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPort for SystemRandom {
    fn gen_index(&self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..upper)
    }

    fn gen_suffix(&self, len: usize) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect()
    }
}

/// Fixed clock for testing.
#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Replays a fixed sequence of indices, cycling when exhausted.
#[cfg(test)]
pub struct SequenceRandom {
    indices: std::sync::Mutex<std::collections::VecDeque<usize>>,
}

#[cfg(test)]
impl SequenceRandom {
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            indices: std::sync::Mutex::new(indices.into_iter().collect()),
        }
    }
}

#[cfg(test)]
impl RandomPort for SequenceRandom {
    fn gen_index(&self, upper: usize) -> usize {
        let mut guard = self.indices.lock().unwrap_or_else(|e| e.into_inner());
        let next = guard.pop_front().unwrap_or(0);
        guard.push_back(next);
        next % upper.max(1)
    }

    fn gen_suffix(&self, len: usize) -> String {
        "x".repeat(len)
    }
}
