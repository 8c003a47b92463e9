//! [`AlarmMonitor`] – "not approaching the target" detector.
//!
//! Every control step the supervisor reports the current distance to the
//! target.  The monitor remembers the best (smallest) distance seen in the
//! episode and when it was achieved.  If no new best has been recorded for
//! longer than the configured timeout, the way is considered blocked.
//!
//! Tracking monotonic improvement instead of instantaneous speed makes the
//! alarm insensitive to sensor noise and to local oscillation: it only fires
//! on sustained lack of progress.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use pilot_kernel::alarm::{AlarmMonitor, AlarmVerdict};
//!
//! let mut alarm = AlarmMonitor::new(Duration::from_secs(30));
//! alarm.reset(Duration::ZERO);
//!
//! assert_eq!(alarm.observe(5.0, Duration::from_secs(1)), AlarmVerdict::Improving);
//! assert_eq!(alarm.observe(5.0, Duration::from_secs(20)), AlarmVerdict::Holding);
//! assert_eq!(alarm.observe(5.0, Duration::from_secs(32)), AlarmVerdict::Stalled);
//! ```

use std::time::Duration;

/// Outcome of feeding one distance sample to the [`AlarmMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmVerdict {
    /// A new best distance was recorded.
    Improving,
    /// No improvement, but still within the timeout.
    Holding,
    /// No improvement for longer than the timeout.
    Stalled,
}

/// Tracks best-distance-so-far and raises a stall after a timeout.
#[derive(Debug, Clone)]
pub struct AlarmMonitor {
    timeout: Duration,
    best_distance: f64,
    best_distance_at: Duration,
}

impl AlarmMonitor {
    /// Create a monitor with the given no-progress `timeout`.
    ///
    /// The best distance starts at `+∞`; call [`reset`][Self::reset] when a
    /// navigation episode is accepted.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            best_distance: f64::INFINITY,
            best_distance_at: Duration::ZERO,
        }
    }

    /// Start a new episode at time `now`.
    pub fn reset(&mut self, now: Duration) {
        self.best_distance = f64::INFINITY;
        self.best_distance_at = now;
    }

    /// Feed the distance observed at time `now`.
    pub fn observe(&mut self, distance: f64, now: Duration) -> AlarmVerdict {
        if distance < self.best_distance {
            self.best_distance = distance;
            self.best_distance_at = now;
            return AlarmVerdict::Improving;
        }
        if now.saturating_sub(self.best_distance_at) > self.timeout {
            AlarmVerdict::Stalled
        } else {
            AlarmVerdict::Holding
        }
    }

    /// Smallest distance observed in the current episode.
    pub fn best_distance(&self) -> f64 {
        self.best_distance
    }

    /// Time at which the best distance was observed.
    pub fn best_distance_at(&self) -> Duration {
        self.best_distance_at
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn fresh_monitor_has_infinite_best() {
        let alarm = AlarmMonitor::new(secs(30));
        assert!(alarm.best_distance().is_infinite());
    }

    #[test]
    fn first_observation_always_improves() {
        let mut alarm = AlarmMonitor::new(secs(30));
        alarm.reset(secs(0));
        assert_eq!(alarm.observe(100.0, secs(1)), AlarmVerdict::Improving);
        assert_eq!(alarm.best_distance(), 100.0);
        assert_eq!(alarm.best_distance_at(), secs(1));
    }

    #[test]
    fn best_distance_never_increases() {
        let mut alarm = AlarmMonitor::new(secs(30));
        alarm.reset(secs(0));
        let mut previous = f64::INFINITY;
        for (i, d) in [5.0, 4.0, 4.5, 3.0, 3.5, 3.0, 2.0].into_iter().enumerate() {
            alarm.observe(d, secs(i as u64));
            assert!(alarm.best_distance() <= previous);
            previous = alarm.best_distance();
        }
        assert_eq!(alarm.best_distance(), 2.0);
    }

    #[test]
    fn stall_only_after_timeout_without_improvement() {
        let mut alarm = AlarmMonitor::new(secs(30));
        alarm.reset(secs(0));
        alarm.observe(5.0, secs(0));
        assert_eq!(alarm.observe(5.0, secs(30)), AlarmVerdict::Holding);
        assert_eq!(alarm.observe(5.0, secs(31)), AlarmVerdict::Stalled);
    }

    #[test]
    fn improvement_restarts_window() {
        let mut alarm = AlarmMonitor::new(secs(30));
        alarm.reset(secs(0));
        alarm.observe(5.0, secs(0));
        assert_eq!(alarm.observe(4.9, secs(29)), AlarmVerdict::Improving);
        assert_eq!(alarm.observe(4.9, secs(58)), AlarmVerdict::Holding);
        assert_eq!(alarm.observe(4.9, secs(60)), AlarmVerdict::Stalled);
    }

    #[test]
    fn reset_restores_infinite_best() {
        let mut alarm = AlarmMonitor::new(secs(30));
        alarm.reset(secs(0));
        alarm.observe(1.0, secs(1));
        alarm.reset(secs(2));
        assert!(alarm.best_distance().is_infinite());
        assert_eq!(alarm.best_distance_at(), secs(2));
    }
}
