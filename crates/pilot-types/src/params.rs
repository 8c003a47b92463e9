//! Navigation goal descriptors.
//!
//! A [`NavigationParams`] value is created by a client, handed to the
//! supervisor by value and owned by it for the whole navigation episode.  The
//! goal itself is the tagged [`NavTarget`] value: either a full pose or a
//! heading-free position.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PilotError;
use crate::geometry::{Point2D, Pose2D};

/// Default acceptance radius around the target, in metres.
pub const DEFAULT_ALLOWED_DISTANCE: f64 = 0.5;

/// What the robot is asked to reach.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NavTarget {
    /// A full pose; the heading travels with the goal.
    Pose(Pose2D),
    /// A position only; the final heading is irrelevant.
    Position(Point2D),
}

impl NavTarget {
    /// The point the goal-reached check measures against.
    pub fn point(&self) -> Point2D {
        match *self {
            NavTarget::Pose(p) => p.position(),
            NavTarget::Position(p) => p,
        }
    }

    /// Heading carried by the goal, if any.
    pub fn heading(&self) -> Option<f64> {
        match *self {
            NavTarget::Pose(p) => Some(p.heading),
            NavTarget::Position(_) => None,
        }
    }

    /// Re-express a target given in the frame of `origin` in the frame
    /// `origin` is expressed in.
    pub fn relative_to(&self, origin: Pose2D) -> Self {
        match *self {
            NavTarget::Pose(p) => NavTarget::Pose(origin.compose(p)),
            NavTarget::Position(p) => NavTarget::Position(origin.transform_point(p)),
        }
    }

    fn is_finite(&self) -> bool {
        match *self {
            NavTarget::Pose(p) => p.is_finite(),
            NavTarget::Position(p) => p.is_finite(),
        }
    }
}

impl Default for NavTarget {
    fn default() -> Self {
        NavTarget::Pose(Pose2D::identity())
    }
}

/// A navigation goal and its acceptance policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationParams {
    pub target: NavTarget,
    /// Distance below which the goal counts as reached.
    pub target_allowed_distance: f64,
    /// `target` is expressed in the robot frame at acceptance time.
    pub target_is_relative: bool,
    /// Reaching this goal neither stops the robot nor ends the navigation.
    pub target_is_intermediary_waypoint: bool,
}

impl Default for NavigationParams {
    fn default() -> Self {
        Self {
            target: NavTarget::default(),
            target_allowed_distance: DEFAULT_ALLOWED_DISTANCE,
            target_is_relative: false,
            target_is_intermediary_waypoint: false,
        }
    }
}

impl NavigationParams {
    /// Absolute goal with the default acceptance radius.
    pub fn to(target: NavTarget) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Absolute pose goal.
    pub fn to_pose(x: f64, y: f64, heading: f64) -> Self {
        Self::to(NavTarget::Pose(Pose2D::new(x, y, heading)))
    }

    /// Absolute position goal.
    pub fn to_position(x: f64, y: f64) -> Self {
        Self::to(NavTarget::Position(Point2D::new(x, y)))
    }

    pub fn with_allowed_distance(mut self, distance: f64) -> Self {
        self.target_allowed_distance = distance;
        self
    }

    pub fn relative(mut self) -> Self {
        self.target_is_relative = true;
        self
    }

    pub fn intermediary(mut self) -> Self {
        self.target_is_intermediary_waypoint = true;
        self
    }

    /// Check that the goal can be navigated to.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::InvalidParams`] for non-finite coordinates or a
    /// negative / non-finite acceptance radius.
    pub fn validate(&self) -> Result<(), PilotError> {
        if !self.target.is_finite() {
            return Err(PilotError::InvalidParams(format!(
                "target {:?} has non-finite coordinates",
                self.target
            )));
        }
        if !self.target_allowed_distance.is_finite() || self.target_allowed_distance < 0.0 {
            return Err(PilotError::InvalidParams(format!(
                "target_allowed_distance {} must be finite and non-negative",
                self.target_allowed_distance
            )));
        }
        Ok(())
    }

    /// Human-readable multi-line dump of the goal.
    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "YES" } else { "NO" }
}

impl fmt::Display for NavigationParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            NavTarget::Pose(p) => writeln!(
                f,
                "navparams.target = ({:.3},{:.3},{:.3} deg)",
                p.x,
                p.y,
                p.heading.to_degrees()
            )?,
            NavTarget::Position(p) => writeln!(f, "navparams.target = ({:.3},{:.3})", p.x, p.y)?,
        }
        writeln!(
            f,
            "navparams.targetAllowedDistance = {:.3}",
            self.target_allowed_distance
        )?;
        writeln!(f, "navparams.targetIsRelative = {}", yes_no(self.target_is_relative))?;
        writeln!(
            f,
            "navparams.targetIsIntermediaryWaypoint = {}",
            yes_no(self.target_is_intermediary_waypoint)
        )
    }
}
