//! Progress of a search run.

use std::fmt;

use serde::Serialize;

/// A progress snapshot: `current` out of `max`.
///
/// `current` only moves on a successful build. A finished run reports
/// `current < max` when combinations were skipped, failed or repeated an
/// image set already built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Progress {
    pub max: u64,
    pub current: u64,
}

impl Progress {
    /// Completion in percent; 100 when `max` is zero.
    pub fn percent(&self) -> f64 {
        if self.max == 0 {
            return 100.0;
        }
        self.current as f64 * 100.0 / self.max as f64
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current, self.max)
    }
}

/// Monotonic counter of successful builds against a fixed denominator.
///
/// The denominator is set once at construction. Only successes advance the
/// counter, and the reported value never exceeds the denominator.
#[derive(Debug)]
pub(crate) struct ProgressCounter {
    max: u64,
    processed: u64,
}

impl ProgressCounter {
    pub(crate) fn new(max: u64) -> Self {
        Self { max, processed: 0 }
    }

    /// Records one success and returns the new snapshot.
    pub(crate) fn advance(&mut self) -> Progress {
        self.processed = self.processed.saturating_add(1);
        self.snapshot()
    }

    pub(crate) fn snapshot(&self) -> Progress {
        Progress {
            max: self.max,
            current: self.processed.min(self.max),
        }
    }

    /// Successful builds so far, unclamped.
    pub(crate) fn processed(&self) -> u64 {
        self.processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_is_clamped() {
        let mut counter = ProgressCounter::new(2);
        assert_eq!(counter.snapshot(), Progress { max: 2, current: 0 });
        counter.advance();
        counter.advance();
        assert_eq!(counter.advance(), Progress { max: 2, current: 2 });
        assert_eq!(counter.processed(), 3);
    }

    #[test]
    fn test_percent_and_display() {
        let p = Progress { max: 4, current: 1 };
        assert_eq!(p.percent(), 25.0);
        assert_eq!(p.to_string(), "1/4");
        assert_eq!(Progress::default().percent(), 100.0);
    }
}
