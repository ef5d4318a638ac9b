//! Rate limited logging
//!
//! A [`LogThrottle`] lets each call site emit at most one record per period. Call sites are keyed
//! by a static string, which the [`warn_throttle!`] and [`error_throttle!`] macros build from the
//! file and line of the invocation. The current time is always supplied by the caller.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default period between two records from the same call site.
pub const DEFAULT_THROTTLE_PERIOD: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tracks when each call site last logged.
#[derive(Debug)]
pub struct LogThrottle {
    period: Duration,
    last_emit: Mutex<HashMap<&'static str, Instant>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LogThrottle {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_emit: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` if `site` may log at `now`, and if so records `now` as its last emission.
    ///
    /// A site which has never logged may always log. Times earlier than the last emission are
    /// treated as no time having passed.
    pub fn check(&self, site: &'static str, now: Instant) -> bool {
        let mut last_emit = self.last_emit.lock();

        match last_emit.get(site) {
            Some(last) if now.saturating_duration_since(*last) < self.period => false,
            _ => {
                last_emit.insert(site, now);
                true
            }
        }
    }
}

impl Default for LogThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE_PERIOD)
    }
}

// ---------------------------------------------------------------------------
// MACROS
// ---------------------------------------------------------------------------

/// Log a warning at most once per throttle period from this call site.
///
/// Usage: `warn_throttle!(throttle, now, "format {}", args)` where `throttle` is a
/// [`LogThrottle`] and `now` an `Instant`.
#[macro_export]
macro_rules! warn_throttle {
    ($throttle:expr, $now:expr, $($arg:tt)+) => {
        if $throttle.check(concat!(file!(), ":", line!()), $now) {
            log::warn!($($arg)+);
        }
    };
}

/// Log an error at most once per throttle period from this call site.
#[macro_export]
macro_rules! error_throttle {
    ($throttle:expr, $now:expr, $($arg:tt)+) => {
        if $throttle.check(concat!(file!(), ":", line!()), $now) {
            log::error!($($arg)+);
        }
    };
}
