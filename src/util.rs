//! Timing helpers for re-roots and headless runs.

use std::time::{Duration, Instant};

/// Guard that logs how long its scope took when dropped.
///
/// ```ignore
/// let _timer = Timed::debug("set_start");
/// // ... expand ...
/// // logs "set_start took 1.234ms" at debug level
/// ```
pub struct Timed {
    label: &'static str,
    start: Instant,
    level: log::Level,
}

impl Timed {
    pub fn info(label: &'static str) -> Self {
        Self::at(label, log::Level::Info)
    }

    pub fn debug(label: &'static str) -> Self {
        Self::at(label, log::Level::Debug)
    }

    fn at(label: &'static str, level: log::Level) -> Self {
        log::trace!("{label}...");
        Self {
            label,
            start: Instant::now(),
            level,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timed {
    fn drop(&mut self) {
        log::log!(self.level, "{} took {:.3?}", self.label, self.start.elapsed());
    }
}

/// Running totals over per-step durations.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepTimings {
    count: u32,
    total: Duration,
    max: Duration,
}

impl StepTimings {
    pub fn record(&mut self, elapsed: Duration) {
        self.count += 1;
        self.total += elapsed;
        self.max = self.max.max(elapsed);
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn mean(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total / self.count
        }
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_timings() {
        let mut timings = StepTimings::default();
        assert_eq!(timings.mean(), Duration::ZERO);
        timings.record(Duration::from_millis(2));
        timings.record(Duration::from_millis(6));
        assert_eq!(timings.count(), 2);
        assert_eq!(timings.mean(), Duration::from_millis(4));
        assert_eq!(timings.max(), Duration::from_millis(6));
    }
}
