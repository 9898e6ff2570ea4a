//! Testability ports for injecting time and randomness.

use chrono::{DateTime, Utc};

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[cfg_attr(test, mockall::automock)]
pub trait RandomPort: Send + Sync {
    /// Uniform index in `0..upper`.
    fn gen_index(&self, upper: usize) -> usize;
    /// Lowercase alphanumeric string of `len` characters.
    fn gen_suffix(&self, len: usize) -> String;
}
