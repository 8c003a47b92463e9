//! `pilot-hal` – the robot-facing edge of Pilot.
//!
//! # Modules
//!
//! - [`robot`] – [`RobotInterface`][robot::RobotInterface]: the contract the
//!   host platform implements so the navigation supervisor can read the pose,
//!   command motion, arm the motion watchdog and emit notifications.
//! - [`sim`] – [`SimRobot`][sim::SimRobot]: an in-process unicycle
//!   simulation that implements the contract and logs recent calls, for
//!   headless tests and the CLI demo.
//! - [`pid`] – [`PidController`][pid::PidController]: a generic feedback
//!   controller used by path followers.

pub mod pid;
pub mod robot;
pub mod sim;

pub use pid::PidController;
pub use robot::RobotInterface;
pub use sim::{DEFAULT_CALL_LOG_CAPACITY, RobotCall, SimRobot};
