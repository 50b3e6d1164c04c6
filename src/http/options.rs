//! Timeout and redirect budget options.

use std::time::Duration;

/// Per-socket read/write timeout. Zero means no timeout is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timeout(Duration);

impl Timeout {
    pub fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn as_millis(&self) -> u128 {
        self.0.as_millis()
    }

    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }

    pub fn as_micros(&self) -> u128 {
        self.0.as_micros()
    }

    pub fn is_set(&self) -> bool {
        !self.0.is_zero()
    }

    /// The duration, or `None` when unset.
    pub fn duration(&self) -> Option<Duration> {
        self.is_set().then_some(self.0)
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

/// How many redirects may still be followed.
///
/// Zero or negative stops redirect following.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Redirects(i64);

impl Redirects {
    pub fn new(count: i64) -> Self {
        Self(count)
    }

    pub fn remaining(&self) -> i64 {
        self.0
    }

    pub fn is_set(&self) -> bool {
        self.0 > 0
    }

    /// Spend one redirect. Returns `false`, leaving the budget alone, when
    /// nothing is left.
    pub fn take(&mut self) -> bool {
        if self.is_set() {
            self.0 -= 1;
            true
        } else {
            false
        }
    }
}

impl From<i64> for Redirects {
    fn from(count: i64) -> Self {
        Self(count)
    }
}
