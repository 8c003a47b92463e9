//! Supervisor tuning supplied by the caller at bring-up.
//!
//! The kernel never reads files; outer layers deserialize a
//! [`NavigatorConfig`] from wherever they keep configuration and pass it to
//! [`Navigator::new`][crate::navigator::Navigator::new].

use std::time::Duration;

use pilot_types::PilotError;
use serde::{Deserialize, Serialize};

fn default_alarm_timeout_secs() -> f64 {
    30.0
}
fn default_watchdog_period_ms() -> u64 {
    1000
}
fn default_end_event_distance() -> f64 {
    0.0
}

/// Navigation supervisor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigatorConfig {
    /// No-progress window after which the way is declared blocked.
    #[serde(default = "default_alarm_timeout_secs")]
    pub alarm_timeout_secs: f64,

    /// Period the motion watchdog is armed with on entering `NAVIGATING`.
    #[serde(default = "default_watchdog_period_ms")]
    pub watchdog_period_ms: u64,

    /// Distance to a final goal below which the "navigation ended"
    /// notification is sent ahead of arrival.  `0` disables the early
    /// notification.
    #[serde(default = "default_end_event_distance")]
    pub end_event_distance: f64,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            alarm_timeout_secs: default_alarm_timeout_secs(),
            watchdog_period_ms: default_watchdog_period_ms(),
            end_event_distance: default_end_event_distance(),
        }
    }
}

impl NavigatorConfig {
    pub fn alarm_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.alarm_timeout_secs.max(0.0)).unwrap_or(Duration::MAX)
    }

    pub fn watchdog_period(&self) -> Duration {
        Duration::from_millis(self.watchdog_period_ms)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::Config`] for a non-positive or non-finite alarm
    /// timeout, a zero watchdog period, or a negative end-event distance.
    pub fn validate(&self) -> Result<(), PilotError> {
        if !self.alarm_timeout_secs.is_finite() || self.alarm_timeout_secs <= 0.0 {
            return Err(PilotError::Config(format!(
                "alarm_timeout_secs must be positive, got {}",
                self.alarm_timeout_secs
            )));
        }
        if self.watchdog_period_ms == 0 {
            return Err(PilotError::Config(
                "watchdog_period_ms must be non-zero".to_string(),
            ));
        }
        if !self.end_event_distance.is_finite() || self.end_event_distance < 0.0 {
            return Err(PilotError::Config(format!(
                "end_event_distance must be non-negative, got {}",
                self.end_event_distance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = NavigatorConfig::default();
        assert_eq!(cfg.alarm_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.watchdog_period(), Duration::from_millis(1000));
        assert_eq!(cfg.end_event_distance, 0.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: NavigatorConfig = serde_json::from_str(r#"{"alarm_timeout_secs": 5.0}"#).unwrap();
        assert_eq!(cfg.alarm_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.watchdog_period_ms, 1000);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = NavigatorConfig::default();
        cfg.alarm_timeout_secs = 0.0;
        assert!(matches!(cfg.validate(), Err(PilotError::Config(_))));

        let mut cfg = NavigatorConfig::default();
        cfg.watchdog_period_ms = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = NavigatorConfig::default();
        cfg.end_event_distance = -1.0;
        assert!(cfg.validate().is_err());
    }
}
