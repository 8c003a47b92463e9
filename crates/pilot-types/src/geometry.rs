//! Planar geometry primitives shared by every Pilot crate.
//!
//! All quantities are expressed in SI units: metres for positions, radians
//! for angles, metres per second and radians per second for velocities.
//! Headings are measured counter-clockwise from the world +X axis.
//!
//! # Example
//!
//! ```rust
//! use pilot_types::geometry::Pose2D;
//!
//! // Robot at (2, 0) facing +Y; a point 1 m straight ahead of it.
//! let robot = Pose2D::new(2.0, 0.0, std::f64::consts::FRAC_PI_2);
//! let ahead = robot.compose(Pose2D::new(1.0, 0.0, 0.0));
//!
//! assert!((ahead.x - 2.0).abs() < 1e-9);
//! assert!((ahead.y - 1.0).abs() < 1e-9);
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Angles
// ────────────────────────────────────────────────────────────────────────────

/// Normalise `angle` into the half-open interval `(-π, π]`.
pub fn wrap_to_pi(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Point2D
// ────────────────────────────────────────────────────────────────────────────

/// A position in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Pose2D> for Point2D {
    fn from(pose: Pose2D) -> Self {
        Self::new(pose.x, pose.y)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose2D
// ────────────────────────────────────────────────────────────────────────────

/// A rigid-body pose in the plane: position plus heading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    /// Heading in radians.
    pub heading: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }

    /// The origin pose.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Compose `self ⊕ other`.
    ///
    /// `other` is expressed in the frame of `self`; the result is `other`
    /// expressed in the frame `self` is expressed in.  The offset is rotated
    /// by `self.heading`, translated by `self`'s position, and the headings
    /// are summed (and wrapped to `(-π, π]`).
    pub fn compose(self, other: Self) -> Self {
        let (sin, cos) = self.heading.sin_cos();
        Self::new(
            self.x + cos * other.x - sin * other.y,
            self.y + sin * other.x + cos * other.y,
            wrap_to_pi(self.heading + other.heading),
        )
    }

    /// Transform a point expressed in this pose's frame into the parent frame.
    pub fn transform_point(self, p: Point2D) -> Point2D {
        let (sin, cos) = self.heading.sin_cos();
        Point2D::new(self.x + cos * p.x - sin * p.y, self.y + sin * p.x + cos * p.y)
    }

    /// Position component of this pose.
    pub fn position(self) -> Point2D {
        Point2D::from(self)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.heading.is_finite()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Twist2D
// ────────────────────────────────────────────────────────────────────────────

/// Planar velocity: linear components plus yaw rate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Twist2D {
    pub vx: f64,
    pub vy: f64,
    /// Yaw rate in rad/s.
    pub omega: f64,
}

impl Twist2D {
    pub fn new(vx: f64, vy: f64, omega: f64) -> Self {
        Self { vx, vy, omega }
    }

    /// Rotate the linear part by `angle` radians.  The yaw rate is frame
    /// independent in the plane and is left untouched.
    pub fn rotated(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos * self.vx - sin * self.vy, sin * self.vx + cos * self.vy, self.omega)
    }

    /// Express a world-frame velocity in the frame of a robot at `heading`.
    pub fn to_local(self, heading: f64) -> Self {
        self.rotated(-heading)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Segment2D
// ────────────────────────────────────────────────────────────────────────────

/// A closed line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment2D {
    pub start: Point2D,
    pub end: Point2D,
}

impl Segment2D {
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    /// Shortest distance from `p` to any point of the segment.
    ///
    /// A degenerate segment (`start == end`) behaves as a single point.
    pub fn distance(&self, p: Point2D) -> f64 {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let len2 = dx * dx + dy * dy;
        if len2 <= f64::EPSILON {
            return p.distance(self.start);
        }
        let t = (((p.x - self.start.x) * dx + (p.y - self.start.y) * dy) / len2).clamp(0.0, 1.0);
        p.distance(Point2D::new(self.start.x + t * dx, self.start.y + t * dy))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
