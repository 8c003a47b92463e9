//! [`PathFollower`] – the pluggable path-following strategy.
//!
//! The supervisor decides *whether* the robot should keep moving; a
//! `PathFollower` decides *how*.  It is invoked exactly once per control step
//! while `NAVIGATING`, and only when the goal is neither reached nor stalled.
//! Implementations command motion through the robot handle in the
//! [`StepContext`].
//!
//! Errors returned (and panics raised) by [`PathFollower::step`] are absorbed
//! by the supervisor: they are logged and recorded as the last fault, and the
//! state machine does not change state.

use pilot_hal::RobotInterface;
use pilot_types::{NavigationParams, PilotError, Pose2D, Twist2D};

/// Everything a follower may look at during one control step.
pub struct StepContext<'a> {
    /// The robot, for issuing motion commands.
    pub robot: &'a dyn RobotInterface,
    /// Pose read at the start of this step.
    pub pose: Pose2D,
    /// World- and robot-frame velocity read at the start of this step.
    pub velocity: Velocities,
    /// The active (absolute) goal.
    pub params: &'a NavigationParams,
    /// Distance to the goal computed by the supervisor this step.
    pub target_distance: f64,
}

/// World and robot-frame velocity read in one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocities {
    pub world: Twist2D,
    pub local: Twist2D,
}

/// A path-following algorithm driven by the navigation supervisor.
pub trait PathFollower: Send {
    /// Name used in log messages.
    fn name(&self) -> &str;

    /// Run one control step toward `ctx.params.target`.
    ///
    /// # Errors
    ///
    /// Any error is logged and recorded by the supervisor; navigation
    /// continues and the next step calls the follower again.
    fn step(&mut self, ctx: &StepContext<'_>) -> Result<(), PilotError>;

    /// Forget per-episode state.  Called whenever a new goal is accepted.
    fn reset(&mut self) {}
}

/// Follower that never moves the robot.
///
/// Useful when an external component commands motion and only the
/// supervisor's goal/stall bookkeeping is wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleFollower;

impl PathFollower for IdleFollower {
    fn name(&self) -> &str {
        "idle"
    }

    fn step(&mut self, _ctx: &StepContext<'_>) -> Result<(), PilotError> {
        Ok(())
    }
}
