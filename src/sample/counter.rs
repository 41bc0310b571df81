//! Exact arithmetic on OS resource counters.
//!
//! Counters arrive from the OS as 64-bit cumulative values (CPU time, byte
//! counts). Sums and differences are kept in a 128-bit value so adding the
//! counters of every process on the host, or kernel + user time of one
//! process, can never lose precision or wrap.

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign},
    time::Duration,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CounterValue(u128);

impl CounterValue {
    pub const ZERO: CounterValue = CounterValue(0);

    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u128 {
        self.0
    }

    /// `self - other`, or `None` when `other` is larger.
    ///
    /// A lower cumulative reading than before is a counter discontinuity
    /// (restart, pid reuse, provider glitch); the caller decides what it means.
    pub fn checked_sub(self, other: CounterValue) -> Option<CounterValue> {
        self.0.checked_sub(other.0).map(CounterValue)
    }

    /// Rate of this amount spread over `interval`, in units per second.
    pub fn per_second(self, interval: Duration) -> Option<CounterValue> {
        let millis = interval.as_millis();
        if millis == 0 {
            return None;
        }
        let scaled = self.0.checked_mul(1000)?;
        Some(CounterValue(scaled / millis))
    }

    /// Share of `whole` in hundredths of a percent, rounded half up.
    ///
    /// `4000 / 8300` gives `4819`, i.e. 48.19%. A zero `whole` yields 0.
    pub fn share_hundredths(self, whole: CounterValue) -> u128 {
        if whole.0 == 0 {
            return 0;
        }
        match self.0.checked_mul(20_000) {
            Some(twice) => (twice / whole.0 + 1) / 2,
            // Only reachable far beyond any 64-bit counter.
            None => (self.as_f64() / whole.as_f64() * 10_000.0).round() as u128,
        }
    }

    /// Lossy conversion, for rendering only.
    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }
}

impl From<u64> for CounterValue {
    fn from(value: u64) -> Self {
        CounterValue(value as u128)
    }
}

impl From<u32> for CounterValue {
    fn from(value: u32) -> Self {
        CounterValue(value as u128)
    }
}

impl Add for CounterValue {
    type Output = CounterValue;

    fn add(self, rhs: CounterValue) -> CounterValue {
        CounterValue(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for CounterValue {
    fn add_assign(&mut self, rhs: CounterValue) {
        *self = *self + rhs;
    }
}

impl Sum for CounterValue {
    fn sum<I: Iterator<Item = CounterValue>>(iter: I) -> Self {
        iter.fold(CounterValue::ZERO, Add::add)
    }
}

impl fmt::Display for CounterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
