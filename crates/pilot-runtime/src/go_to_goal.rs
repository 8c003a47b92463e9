//! [`GoToGoalFollower`] – a minimal point-to-point path follower.
//!
//! Each step the follower steers toward the goal with a PID on heading error
//! and drives forward at a speed scaled by how well the robot is aligned
//! (`cos(error)`, clipped at zero so it never reverses) and by how close it
//! is (linear ramp inside `slowdown_radius`).  Obstacles are not considered;
//! the supervisor's stall alarm catches a blocked path.

use std::time::Duration;

use pilot_hal::PidController;
use pilot_kernel::{PathFollower, StepContext};
use pilot_types::{PilotError, geometry::wrap_to_pi};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Tuning for [`GoToGoalFollower`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoToGoalConfig {
    /// Cruise speed (m/s).
    pub max_linear: f64,
    /// Turn-rate limit (rad/s).
    pub max_angular: f64,
    pub heading_kp: f64,
    pub heading_ki: f64,
    pub heading_kd: f64,
    /// Distance (m) inside which forward speed ramps down linearly.
    pub slowdown_radius: f64,
}

impl Default for GoToGoalConfig {
    fn default() -> Self {
        Self {
            max_linear: 0.5,
            max_angular: 1.0,
            heading_kp: 2.0,
            heading_ki: 0.0,
            heading_kd: 0.1,
            slowdown_radius: 0.5,
        }
    }
}

/// Rotate-toward-and-drive follower.
#[derive(Debug, Clone)]
pub struct GoToGoalFollower {
    config: GoToGoalConfig,
    heading_pid: PidController,
    dt: f64,
}

impl GoToGoalFollower {
    /// `period` is the control period the supervisor is stepped at.
    pub fn new(config: GoToGoalConfig, period: Duration) -> Self {
        let mut heading_pid =
            PidController::new(config.heading_kp, config.heading_ki, config.heading_kd);
        heading_pid.set_output_limits(-config.max_angular, config.max_angular);
        Self {
            config,
            heading_pid,
            dt: period.as_secs_f64(),
        }
    }

    /// `(linear, angular)` command for the given heading error and distance.
    fn command(&mut self, heading_error: f64, distance: f64) -> (f64, f64) {
        let angular = self.heading_pid.update(heading_error, self.dt);
        let alignment = heading_error.cos().max(0.0);
        let ramp = if self.config.slowdown_radius > 0.0 {
            (distance / self.config.slowdown_radius).min(1.0)
        } else {
            1.0
        };
        (self.config.max_linear * alignment * ramp, angular)
    }
}

impl PathFollower for GoToGoalFollower {
    fn name(&self) -> &str {
        "go-to-goal"
    }

    fn step(&mut self, ctx: &StepContext<'_>) -> Result<(), PilotError> {
        let goal = ctx.params.target.point();
        let dx = goal.x - ctx.pose.x;
        let dy = goal.y - ctx.pose.y;
        let distance = dx.hypot(dy);
        let heading_error = wrap_to_pi(dy.atan2(dx) - ctx.pose.heading);
        let (linear, angular) = self.command(heading_error, distance);
        trace!(distance, heading_error, linear, angular, "go-to-goal command");
        ctx.robot.change_speeds(linear, angular)
    }

    fn reset(&mut self) {
        self.heading_pid.reset();
    }
}
