//! `pilot-types` – shared vocabulary of the Pilot navigation stack.
//!
//! # Modules
//!
//! - [`geometry`] – planar poses, velocities and segments.
//! - [`params`] – [`NavigationParams`][params::NavigationParams], the goal
//!   descriptor handed to the supervisor.

pub mod geometry;
pub mod params;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use geometry::{Point2D, Pose2D, Segment2D, Twist2D};
pub use params::{NavTarget, NavigationParams};

/// Supervisor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NavState {
    #[default]
    Idle,
    Navigating,
    Suspended,
    NavError,
}

impl fmt::Display for NavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NavState::Idle => "IDLE",
            NavState::Navigating => "NAVIGATING",
            NavState::Suspended => "SUSPENDED",
            NavState::NavError => "NAV_ERROR",
        };
        f.write_str(s)
    }
}

/// Notifications the supervisor emits through the robot interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavEvent {
    NavigationStarted,
    NavigationEnded,
    NavigationEndedDueToError,
    WaySeemsBlocked,
}

/// How a navigation episode finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeOutcome {
    /// The goal was reached (including intermediary waypoints).
    Reached,
    /// A `cancel` command ended the episode.
    Cancelled,
    /// The episode ended in `NAV_ERROR`.
    Failed,
}

/// Category of a failure the supervisor absorbed instead of propagating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    /// The pose/velocity query failed while navigating.
    PoseQuery,
    /// No progress toward the target within the alarm timeout.
    Stall,
    /// The path follower returned an error or panicked.
    Follower,
    /// A stop / watchdog call on the robot failed.
    Robot,
    /// A relative target could not be resolved at acceptance time.
    TargetResolution,
}

/// Structured record of the most recent absorbed failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavFault {
    pub kind: FaultKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl NavFault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// Error type shared by the supervisor, the robot interface and followers.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PilotError {
    #[error("Pose unavailable: {0}")]
    PoseUnavailable(String),

    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Invalid navigation parameters: {0}")]
    InvalidParams(String),

    #[error("Path follower fault: {0}")]
    FollowerFault(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
