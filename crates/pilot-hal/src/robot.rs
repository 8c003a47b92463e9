//! The [`RobotInterface`] contract between the navigation supervisor and the
//! host robot platform.
//!
//! Platforms implement this trait once; the supervisor and every path
//! follower only ever talk to the trait, so drivers can be swapped without
//! touching navigation logic.
//!
//! All methods take `&self`: the implementation owns whatever
//! synchronisation it needs for pose and motion access, because the
//! supervisor may call it from the control-loop task while a command caller
//! holds the same `Arc`.

use std::time::Duration;

use pilot_types::{PilotError, Pose2D, Twist2D};

/// Platform services consumed by the navigation supervisor.
pub trait RobotInterface: Send + Sync {
    /// Return the current absolute pose and world-frame velocity.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::PoseUnavailable`] when no valid estimate exists
    /// (localisation lost, odometry stale, …).
    fn current_pose_and_speeds(&self) -> Result<(Pose2D, Twist2D), PilotError>;

    /// Command a linear (m/s) and angular (rad/s) velocity.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::HardwareFault`] if the drive rejects the command.
    fn change_speeds(&self, linear: f64, angular: f64) -> Result<(), PilotError>;

    /// Halt all motion immediately.  Must be safe to call redundantly.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::HardwareFault`] if the stop could not be
    /// delivered.
    fn stop(&self) -> Result<(), PilotError>;

    /// Arm the motion watchdog.  The platform decides what happens if it is
    /// not fed within `period`.
    fn start_watchdog(&self, period: Duration) -> Result<(), PilotError>;

    /// Disarm the motion watchdog.
    fn stop_watchdog(&self) -> Result<(), PilotError>;

    /// A new navigation episode began.
    fn send_navigation_start_event(&self) {}

    /// The current (final) goal was reached or is about to be.
    fn send_navigation_end_event(&self) {}

    /// Navigation stopped because the supervisor entered `NAV_ERROR`.
    fn send_navigation_end_due_to_error_event(&self) {}

    /// No progress toward the goal within the alarm timeout.
    fn send_way_seems_blocked_event(&self) {}
}
