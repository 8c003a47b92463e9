//! In-process simulated robot for CI testing without physical hardware.
//!
//! [`SimRobot`] implements [`RobotInterface`] on top of a unicycle kinematic
//! model and records the commands it receives as [`RobotCall`]s, so tests
//! can assert on the exact stop / watchdog / notification sequence the
//! supervisor produced.  The log keeps the most recent
//! [`DEFAULT_CALL_LOG_CAPACITY`] calls unless configured otherwise.  Faults
//! can be injected with [`SimRobot::fail_pose_queries`].
//!
//! The simulation is advanced explicitly with [`SimRobot::advance`]; nothing
//! moves on its own.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use pilot_hal::{RobotInterface, SimRobot};
//!
//! let robot = SimRobot::new();
//! robot.change_speeds(1.0, 0.0).expect("sim drive must succeed");
//! robot.advance(Duration::from_secs(2));
//!
//! let (pose, _) = robot.current_pose_and_speeds().unwrap();
//! assert!((pose.x - 2.0).abs() < 1e-9);
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use pilot_types::{NavEvent, PilotError, Pose2D, Twist2D, geometry::wrap_to_pi};
use tracing::{debug, warn};

use crate::robot::RobotInterface;

// ────────────────────────────────────────────────────────────────────────────
// Call log
// ────────────────────────────────────────────────────────────────────────────

/// Number of calls a [`SimRobot`] retains by default.
pub const DEFAULT_CALL_LOG_CAPACITY: usize = 4096;

/// One command received by the simulated robot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RobotCall {
    ChangeSpeeds { linear: f64, angular: f64 },
    Stop,
    StartWatchdog(Duration),
    StopWatchdog,
    /// The armed watchdog was not fed in time and halted the robot.
    WatchdogExpired,
    Event(NavEvent),
}

// ────────────────────────────────────────────────────────────────────────────
// Internal state
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct SimState {
    pose: Pose2D,
    linear: f64,
    angular: f64,
    max_linear: f64,
    max_angular: f64,
    pose_failure: bool,
    watchdog_period: Option<Duration>,
    since_last_feed: Duration,
    calls: VecDeque<RobotCall>,
    call_capacity: usize,
}

impl SimState {
    fn log(&mut self, call: RobotCall) {
        if self.call_capacity == 0 {
            return;
        }
        if self.calls.len() == self.call_capacity {
            self.calls.pop_front();
        }
        self.calls.push_back(call);
    }

    fn halt(&mut self) {
        self.linear = 0.0;
        self.angular = 0.0;
    }

    fn world_twist(&self) -> Twist2D {
        let (sin, cos) = self.pose.heading.sin_cos();
        Twist2D::new(self.linear * cos, self.linear * sin, self.angular)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimRobot
// ────────────────────────────────────────────────────────────────────────────

/// A simulated differential-drive robot.  Always succeeds unless a fault has
/// been injected.
#[derive(Debug)]
pub struct SimRobot {
    state: Mutex<SimState>,
}

impl Default for SimRobot {
    fn default() -> Self {
        Self::new()
    }
}

impl SimRobot {
    /// A robot parked at the origin with 1 m/s and 1 rad/s speed caps.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                pose: Pose2D::identity(),
                linear: 0.0,
                angular: 0.0,
                max_linear: 1.0,
                max_angular: 1.0,
                pose_failure: false,
                watchdog_period: None,
                since_last_feed: Duration::ZERO,
                calls: VecDeque::new(),
                call_capacity: DEFAULT_CALL_LOG_CAPACITY,
            }),
        }
    }

    /// Start at `pose` instead of the origin.
    pub fn with_pose(self, pose: Pose2D) -> Self {
        self.lock().pose = pose;
        self
    }

    /// Clamp commanded speeds to `[-max, max]`.
    pub fn with_speed_limits(self, max_linear: f64, max_angular: f64) -> Self {
        {
            let mut s = self.lock();
            s.max_linear = max_linear.abs();
            s.max_angular = max_angular.abs();
        }
        self
    }

    /// Retain at most `capacity` calls, dropping the oldest first.  Zero
    /// disables recording.
    pub fn with_call_log_capacity(self, capacity: usize) -> Self {
        {
            let mut s = self.lock();
            s.call_capacity = capacity;
            while s.calls.len() > capacity {
                s.calls.pop_front();
            }
        }
        self
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Teleport the robot.  Commanded speeds are kept.
    pub fn set_pose(&self, pose: Pose2D) {
        self.lock().pose = pose;
    }

    /// Make every subsequent pose query fail (or succeed again).
    pub fn fail_pose_queries(&self, fail: bool) {
        self.lock().pose_failure = fail;
    }

    /// Integrate the unicycle model forward by `dt`.
    ///
    /// If the watchdog is armed and has not been fed for longer than its
    /// period, the robot is halted before integrating.
    pub fn advance(&self, dt: Duration) {
        let mut s = self.lock();
        if let Some(period) = s.watchdog_period {
            s.since_last_feed += dt;
            if s.since_last_feed > period && (s.linear != 0.0 || s.angular != 0.0) {
                warn!(?period, "sim watchdog expired; halting robot");
                s.halt();
                s.log(RobotCall::WatchdogExpired);
            }
        }
        let secs = dt.as_secs_f64();
        let heading = s.pose.heading;
        let (linear, angular) = (s.linear, s.angular);
        s.pose.x += linear * heading.cos() * secs;
        s.pose.y += linear * heading.sin() * secs;
        s.pose.heading = wrap_to_pi(heading + angular * secs);
    }

    /// Current pose, bypassing fault injection.
    pub fn pose(&self) -> Pose2D {
        self.lock().pose
    }

    /// Currently commanded `(linear, angular)` speeds.
    pub fn commanded_speeds(&self) -> (f64, f64) {
        let s = self.lock();
        (s.linear, s.angular)
    }

    /// `true` while the watchdog is armed.
    pub fn watchdog_armed(&self) -> bool {
        self.lock().watchdog_period.is_some()
    }

    /// Snapshot of the retained calls, oldest first.
    pub fn calls(&self) -> Vec<RobotCall> {
        self.lock().calls.iter().copied().collect()
    }

    /// Number of retained calls equal to `call`.
    pub fn count(&self, call: RobotCall) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    /// Number of retained `stop()` calls.
    pub fn stop_count(&self) -> usize {
        self.count(RobotCall::Stop)
    }

    /// Notifications received, oldest first.
    pub fn events(&self) -> Vec<NavEvent> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                RobotCall::Event(e) => Some(*e),
                _ => None,
            })
            .collect()
    }

    fn record_event(&self, event: NavEvent) {
        debug!(?event, "sim robot notification");
        self.lock().log(RobotCall::Event(event));
    }
}

impl RobotInterface for SimRobot {
    fn current_pose_and_speeds(&self) -> Result<(Pose2D, Twist2D), PilotError> {
        let mut s = self.lock();
        if s.pose_failure {
            return Err(PilotError::PoseUnavailable(
                "simulated localisation fault".to_string(),
            ));
        }
        s.since_last_feed = Duration::ZERO;
        Ok((s.pose, s.world_twist()))
    }

    fn change_speeds(&self, linear: f64, angular: f64) -> Result<(), PilotError> {
        let mut s = self.lock();
        s.linear = linear.clamp(-s.max_linear, s.max_linear);
        s.angular = angular.clamp(-s.max_angular, s.max_angular);
        s.since_last_feed = Duration::ZERO;
        s.log(RobotCall::ChangeSpeeds { linear, angular });
        Ok(())
    }

    fn stop(&self) -> Result<(), PilotError> {
        let mut s = self.lock();
        s.halt();
        s.log(RobotCall::Stop);
        Ok(())
    }

    fn start_watchdog(&self, period: Duration) -> Result<(), PilotError> {
        let mut s = self.lock();
        s.watchdog_period = Some(period);
        s.since_last_feed = Duration::ZERO;
        s.log(RobotCall::StartWatchdog(period));
        Ok(())
    }

    fn stop_watchdog(&self) -> Result<(), PilotError> {
        let mut s = self.lock();
        s.watchdog_period = None;
        s.log(RobotCall::StopWatchdog);
        Ok(())
    }

    fn send_navigation_start_event(&self) {
        self.record_event(NavEvent::NavigationStarted);
    }

    fn send_navigation_end_event(&self) {
        self.record_event(NavEvent::NavigationEnded);
    }

    fn send_navigation_end_due_to_error_event(&self) {
        self.record_event(NavEvent::NavigationEndedDueToError);
    }

    fn send_way_seems_blocked_event(&self) {
        self.record_event(NavEvent::WaySeemsBlocked);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
