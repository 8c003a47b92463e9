//! `pilot-kernel` – the reactive navigation supervisor.
//!
//! The kernel sits between a caller that hands out navigation goals and a
//! [`pilot_hal::RobotInterface`] that moves the robot.  Its job is to decide,
//! every control step, whether the robot should keep following its path,
//! has arrived, or must be stopped because something went wrong.
//!
//! # Components
//!
//! - [`navigator`] – [`Navigator`], the command surface and step orchestrator.
//! - [`state`] – the four-state machine (`IDLE`, `NAVIGATING`, `SUSPENDED`,
//!   `NAV_ERROR`).
//! - [`alarm`] – best-distance-so-far stall detection.
//! - [`resolver`] – relative → absolute goal conversion.
//! - [`follower`] – the pluggable [`PathFollower`] strategy.
//! - [`clock`] – injectable time source.
//! - [`config`] – [`NavigatorConfig`].

pub mod alarm;
pub mod clock;
pub mod config;
pub mod follower;
pub mod navigator;
pub mod resolver;
pub mod state;

pub use alarm::{AlarmMonitor, AlarmVerdict};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::NavigatorConfig;
pub use follower::{IdleFollower, PathFollower, StepContext, Velocities};
pub use navigator::{Navigator, NavigatorSnapshot};
pub use resolver::TargetResolver;
pub use state::{Command, NavStateMachine};
