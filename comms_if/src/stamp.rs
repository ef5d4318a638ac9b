//! # Timestamps
//!
//! All messages carry a [`Stamp`] set by their producer. The DBW interface never reads the wall
//! clock to timestamp data, it only compares stamps produced upstream.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of nanoseconds in a second
pub const NANOS_PER_SEC: u32 = 1_000_000_000;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A point in time, split into whole seconds and nanoseconds.
///
/// `nanosec` is always less than [`NANOS_PER_SEC`] for stamps built with the constructors on this
/// type, which makes the derived ordering chronological.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stamp {
    /// Whole seconds, may be negative.
    pub sec: i32,

    /// Nanoseconds past `sec`.
    pub nanosec: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Stamp {
    /// Build a stamp, carrying any whole seconds in `nanosec` over into `sec`.
    pub fn new(sec: i32, nanosec: u32) -> Self {
        Self {
            sec: sec + (nanosec / NANOS_PER_SEC) as i32,
            nanosec: nanosec % NANOS_PER_SEC,
        }
    }

    /// The stamp as a number of seconds.
    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + self.nanosec as f64 / NANOS_PER_SEC as f64
    }

    /// Signed number of seconds from `earlier` to `self`.
    ///
    /// Negative if `earlier` is actually later than `self`.
    pub fn secs_since(&self, earlier: &Stamp) -> f64 {
        (self.sec as i64 - earlier.sec as i64) as f64
            + (self.nanosec as i64 - earlier.nanosec as i64) as f64 / NANOS_PER_SEC as f64
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_secs_since() {
        let a = Stamp::new(10, 500_000_000);
        let b = Stamp::new(11, 250_000_000);

        assert!((b.secs_since(&a) - 0.75).abs() < 1e-12);
        assert!((a.secs_since(&b) + 0.75).abs() < 1e-12);
        assert_eq!(a.secs_since(&a), 0.0);
    }

    #[test]
    fn test_ordering() {
        assert!(Stamp::new(1, 999_999_999) < Stamp::new(2, 0));
        assert!(Stamp::new(-1, 0) < Stamp::new(0, 0));
        assert_eq!(Stamp::new(0, 1_500_000_000), Stamp::new(1, 500_000_000));
    }

    #[test]
    fn test_as_secs() {
        assert!((Stamp::new(3, 250_000_000).as_secs_f64() - 3.25).abs() < 1e-12);
        assert!((Stamp::new(-2, 500_000_000).as_secs_f64() + 1.5).abs() < 1e-12);
    }
}
