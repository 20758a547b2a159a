//! ## sparring-core::time
//! **Per-case time anchor**
//!
//! Every offset in a test case (`connectTime`, `writeTime`,
//! `disconnectTime`, `connectionTimeout`) is resolved against a single
//! anchor taken when the case starts, so timelines never drift against each
//! other no matter how long individual steps take.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct CaseClock {
    anchor: Instant,
}

impl CaseClock {
    /// Anchors a new clock at the current instant.
    pub fn start() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }

    #[inline]
    pub fn anchor(&self) -> Instant {
        self.anchor
    }

    /// Time since the anchor.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.anchor.elapsed()
    }

    /// Absolute instant `offset` after the anchor.
    #[inline]
    pub fn at(&self, offset: Duration) -> Instant {
        self.anchor + offset
    }
}

/// Converts a configured number of seconds to a `Duration`.
///
/// Negative or non-finite values map to zero; values too large to represent
/// saturate at one year, far past any sensible case ceiling.
pub fn seconds(value: f64) -> Duration {
    const CEILING: Duration = Duration::from_secs(365 * 24 * 60 * 60);
    if !value.is_finite() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(value)
        .map(|d| d.min(CEILING))
        .unwrap_or(CEILING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn offsets_resolve_against_anchor() {
        let clock = CaseClock::start();
        let at = clock.at(Duration::from_millis(250));
        assert_eq!(at - clock.anchor(), Duration::from_millis(250));
    }

    #[test]
    fn seconds_handles_fractions_and_garbage() {
        assert_eq!(seconds(1.5), Duration::from_millis(1500));
        assert_eq!(seconds(0.0), Duration::ZERO);
        assert_eq!(seconds(-3.0), Duration::ZERO);
        assert_eq!(seconds(f64::NAN), Duration::ZERO);
        assert_eq!(seconds(f64::INFINITY), Duration::ZERO);
    }

    proptest! {
        #[test]
        fn seconds_is_monotonic(a in 0.0f64..1e9, b in 0.0f64..1e9) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(seconds(lo) <= seconds(hi));
        }
    }
}
