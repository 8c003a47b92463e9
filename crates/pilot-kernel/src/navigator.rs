//! [`Navigator`] – the reactive navigation supervisor.
//!
//! The navigator owns the four-state machine, the active goal, the
//! progress alarm and the path follower.  Callers drive it with commands
//! ([`navigate`][Navigator::navigate], [`cancel`][Navigator::cancel],
//! [`suspend`][Navigator::suspend], [`resume`][Navigator::resume],
//! [`reset_error`][Navigator::reset_error]) and with a periodic
//! [`step`][Navigator::step].
//!
//! All public operations serialise on one internal lock, so commands issued
//! from a UI thread never interleave with a control step running on another
//! thread.  Failures inside a step (pose query, stall, follower) are never
//! propagated to the caller of `step`; they drive the state machine and are
//! kept as the [last fault][Navigator::last_fault].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use pilot_hal::SimRobot;
//! use pilot_kernel::{IdleFollower, Navigator, NavigatorConfig};
//! use pilot_types::{NavState, NavigationParams, Pose2D};
//!
//! let robot = Arc::new(SimRobot::new());
//! let nav = Navigator::new(robot.clone(), Box::new(IdleFollower), NavigatorConfig::default());
//!
//! nav.navigate(NavigationParams::to_position(1.0, 0.0)).unwrap();
//! nav.step();
//! assert_eq!(nav.state(), NavState::Navigating);
//!
//! robot.set_pose(Pose2D::new(0.9, 0.0, 0.0));
//! nav.step();
//! assert_eq!(nav.state(), NavState::Idle);
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pilot_hal::RobotInterface;
use pilot_types::{
    EpisodeOutcome, FaultKind, NavFault, NavState, NavigationParams, PilotError, Pose2D,
    Segment2D, Twist2D,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::alarm::{AlarmMonitor, AlarmVerdict};
use crate::clock::{Clock, SystemClock};
use crate::config::NavigatorConfig;
use crate::follower::{PathFollower, StepContext, Velocities};
use crate::resolver::TargetResolver;
use crate::state::{Command, NavStateMachine};

// ────────────────────────────────────────────────────────────────────────────
// Snapshot
// ────────────────────────────────────────────────────────────────────────────

/// Point-in-time view of the supervisor, for status displays and logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigatorSnapshot {
    pub state: NavState,
    pub previous_state: NavState,
    pub params: Option<NavigationParams>,
    pub episode: u64,
    pub outcome: Option<EpisodeOutcome>,
    /// Best distance to the goal this episode; `+∞` before the first step.
    pub best_distance: f64,
    pub end_event_sent: bool,
    pub pose: Pose2D,
    pub velocity: Twist2D,
    pub follower: String,
    pub last_fault: Option<NavFault>,
}

// ────────────────────────────────────────────────────────────────────────────
// Internal state
// ────────────────────────────────────────────────────────────────────────────

struct NavCore {
    machine: NavStateMachine,
    params: Option<NavigationParams>,
    alarm: AlarmMonitor,
    end_event_sent: bool,
    last_pose: Option<Pose2D>,
    pose: Pose2D,
    velocity: Velocities,
    episode: u64,
    outcome: Option<EpisodeOutcome>,
    last_fault: Option<NavFault>,
    follower: Box<dyn PathFollower>,
}

impl NavCore {
    fn end_episode(&mut self, outcome: EpisodeOutcome) {
        if self.episode > 0 && self.outcome.is_none() {
            self.outcome = Some(outcome);
        }
    }

    fn record(&mut self, kind: FaultKind, message: impl Into<String>) {
        self.last_fault = Some(NavFault::new(kind, message));
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Navigator
// ────────────────────────────────────────────────────────────────────────────

/// Reactive navigation supervisor.  `Send + Sync`; share it behind an `Arc`.
pub struct Navigator {
    robot: Arc<dyn RobotInterface>,
    clock: Arc<dyn Clock>,
    config: NavigatorConfig,
    core: Mutex<NavCore>,
}

impl Navigator {
    /// Create a supervisor in `IDLE` using the wall clock.
    pub fn new(
        robot: Arc<dyn RobotInterface>,
        follower: Box<dyn PathFollower>,
        config: NavigatorConfig,
    ) -> Self {
        Self::with_clock(robot, follower, config, Arc::new(SystemClock::new()))
    }

    /// Create a supervisor reading time from `clock`.
    pub fn with_clock(
        robot: Arc<dyn RobotInterface>,
        follower: Box<dyn PathFollower>,
        config: NavigatorConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let alarm = AlarmMonitor::new(config.alarm_timeout());
        Self {
            robot,
            clock,
            config,
            core: Mutex::new(NavCore {
                machine: NavStateMachine::new(),
                params: None,
                alarm,
                end_event_sent: false,
                last_pose: None,
                pose: Pose2D::identity(),
                velocity: Velocities::default(),
                episode: 0,
                outcome: None,
                last_fault: None,
                follower,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, NavCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    // ── Commands ────────────────────────────────────────────────────────────

    /// Accept a new goal and enter `NAVIGATING`, from any state.
    ///
    /// A relative goal is converted to absolute coordinates against the pose
    /// read now.  The previous goal, if any, is discarded.  Returns the
    /// episode number assigned to the goal.
    ///
    /// # Errors
    ///
    /// * [`PilotError::InvalidParams`] – the goal is rejected and nothing
    ///   changes.
    /// * The pose query error when a relative goal cannot be resolved.  The
    ///   robot is stopped and the supervisor enters `NAV_ERROR`.
    pub fn navigate(&self, params: NavigationParams) -> Result<u64, PilotError> {
        debug!("navigate() called");
        params.validate().inspect_err(|e| warn!(error = %e, "navigation goal rejected"))?;

        let mut guard = self.lock();
        let core = &mut *guard;
        core.end_event_sent = false;

        let params = match TargetResolver::resolve(self.robot.as_ref(), params) {
            Ok(p) => p,
            Err(e) => {
                self.emergency_stop(
                    core,
                    FaultKind::TargetResolution,
                    format!("cannot resolve relative target: {e}"),
                );
                return Err(e);
            }
        };

        core.machine.on_command(Command::Navigate);
        core.alarm.reset(self.clock.now());
        core.last_pose = None;
        core.episode += 1;
        core.outcome = None;
        core.follower.reset();
        info!(
            episode = core.episode,
            target = ?params.target,
            allowed_distance = params.target_allowed_distance,
            waypoint = params.target_is_intermediary_waypoint,
            "navigation goal accepted"
        );
        core.params = Some(params);
        Ok(core.episode)
    }

    /// Stop the robot and go to `IDLE`, from any state.  Idempotent.
    pub fn cancel(&self) {
        debug!("cancel() called");
        let mut guard = self.lock();
        let core = &mut *guard;
        core.machine.on_command(Command::Cancel);
        core.end_episode(EpisodeOutcome::Cancelled);
        self.stop_robot(core);
    }

    /// Pause an active navigation.  No effect outside `NAVIGATING`.
    ///
    /// The robot is stopped on the next step.
    pub fn suspend(&self) {
        debug!("suspend() called");
        let mut core = self.lock();
        if core.machine.on_command(Command::Suspend).is_none() {
            debug!(state = %core.machine.current(), "suspend ignored");
        }
    }

    /// Continue a suspended navigation.  No effect outside `SUSPENDED`.
    pub fn resume(&self) {
        debug!("resume() called");
        let mut core = self.lock();
        if core.machine.on_command(Command::Resume).is_none() {
            debug!(state = %core.machine.current(), "resume ignored");
        }
    }

    /// Clear `NAV_ERROR` back to `IDLE`.  No effect in other states.
    pub fn reset_error(&self) {
        debug!("reset_error() called");
        let mut core = self.lock();
        if core.machine.on_command(Command::ResetError).is_none() {
            debug!(state = %core.machine.current(), "reset_error ignored");
        }
    }

    // ── Control step ────────────────────────────────────────────────────────

    /// Run one control cycle.  Call periodically.
    pub fn step(&self) {
        let mut guard = self.lock();
        let core = &mut *guard;
        let started_in = core.machine.current();
        match started_in {
            NavState::Idle | NavState::Suspended => self.step_stopped(core),
            NavState::NavError => self.step_error(core),
            NavState::Navigating => self.step_navigating(core),
        }
        core.machine.commit_step(started_in);
    }

    fn step_stopped(&self, core: &mut NavCore) {
        if !core.machine.was_navigating() {
            return;
        }
        info!(state = %core.machine.current(), "navigation stopped");
        self.stop_robot(core);
        let result = self.robot.stop_watchdog();
        Self::check(core, "stop_watchdog", result);
    }

    fn step_error(&self, core: &mut NavCore) {
        if !core.machine.was_navigating() {
            return;
        }
        self.robot.send_navigation_end_due_to_error_event();
        error!("navigation aborted with error");
        self.stop_robot(core);
        let result = self.robot.stop_watchdog();
        Self::check(core, "stop_watchdog", result);
    }

    fn step_navigating(&self, core: &mut NavCore) {
        if !core.machine.was_navigating() {
            info!(follower = core.follower.name(), "navigation started");
            if let Some(params) = &core.params {
                debug!("{}", params.as_text());
            }
            let result = self.robot.start_watchdog(self.config.watchdog_period());
            Self::check(core, "start_watchdog", result);
        }
        if core.machine.previous() == NavState::Idle {
            self.robot.send_navigation_start_event();
        }

        let (pose, world) = match self.robot.current_pose_and_speeds() {
            Ok(v) => v,
            Err(e) => {
                self.emergency_stop(
                    core,
                    FaultKind::PoseQuery,
                    format!("error querying robot pose and speeds: {e}"),
                );
                return;
            }
        };
        let velocity = Velocities {
            world,
            local: world.to_local(pose.heading),
        };
        core.pose = pose;
        core.velocity = velocity;

        let Some(params) = core.params.clone() else {
            self.emergency_stop(core, FaultKind::TargetResolution, "navigating without a goal");
            return;
        };

        // Distance to the segment travelled since the last step, so fast
        // motion cannot skip over the goal between two samples.
        let last = core.last_pose.unwrap_or(pose);
        core.last_pose = Some(pose);
        let target = params.target.point();
        let target_distance = Segment2D::new(last.position(), pose.position()).distance(target);
        let is_waypoint = params.target_is_intermediary_waypoint;

        if !is_waypoint && !core.end_event_sent && target_distance < self.config.end_event_distance
        {
            core.end_event_sent = true;
            debug!(target_distance, "approaching goal; sending end event early");
            self.robot.send_navigation_end_event();
        }

        if target_distance < params.target_allowed_distance {
            if !is_waypoint {
                self.stop_robot(core);
            }
            core.machine.finish();
            core.end_episode(EpisodeOutcome::Reached);
            info!(
                x = target.x,
                y = target.y,
                waypoint = is_waypoint,
                "navigation target reached"
            );
            if !is_waypoint && !core.end_event_sent {
                core.end_event_sent = true;
                self.robot.send_navigation_end_event();
            }
            return;
        }

        if core.alarm.observe(target_distance, self.clock.now()) == AlarmVerdict::Stalled {
            warn!(
                best_distance = core.alarm.best_distance(),
                timeout_secs = core.alarm.timeout().as_secs_f64(),
                "timeout approaching the target; the way seems blocked"
            );
            let message = format!(
                "no progress toward the target for {:.1} s",
                core.alarm.timeout().as_secs_f64()
            );
            self.emergency_stop(core, FaultKind::Stall, message);
            self.robot.send_way_seems_blocked_event();
            return;
        }

        let ctx = StepContext {
            robot: self.robot.as_ref(),
            pose,
            velocity,
            params: &params,
            target_distance,
        };
        let follower = &mut core.follower;
        match panic::catch_unwind(AssertUnwindSafe(|| follower.step(&ctx))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(follower = core.follower.name(), error = %e, "path follower step failed");
                core.record(FaultKind::Follower, e.to_string());
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(follower = core.follower.name(), %message, "path follower panicked");
                core.record(FaultKind::Follower, format!("panic: {message}"));
            }
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────────────

    /// Enter `NAV_ERROR`, stop the robot and record the fault.
    fn emergency_stop(&self, core: &mut NavCore, kind: FaultKind, message: impl Into<String>) {
        let message = message.into();
        error!(?kind, %message, "emergency stop");
        core.machine.fail();
        core.params = None;
        core.end_episode(EpisodeOutcome::Failed);
        self.stop_robot(core);
        core.record(kind, message);
    }

    fn stop_robot(&self, core: &mut NavCore) {
        let result = self.robot.stop();
        Self::check(core, "stop", result);
    }

    fn check(core: &mut NavCore, op: &str, result: Result<(), PilotError>) {
        if let Err(e) = result {
            error!(op, error = %e, "robot command failed");
            core.record(FaultKind::Robot, format!("{op}: {e}"));
        }
    }

    // ── Diagnostics ─────────────────────────────────────────────────────────

    pub fn state(&self) -> NavState {
        self.lock().machine.current()
    }

    /// State at the start of the previous step.
    pub fn previous_state(&self) -> NavState {
        self.lock().machine.previous()
    }

    /// The active absolute goal, if any.
    pub fn params(&self) -> Option<NavigationParams> {
        self.lock().params.clone()
    }

    /// Human-readable dump of the active goal.
    pub fn params_as_text(&self) -> Option<String> {
        self.lock().params.as_ref().map(NavigationParams::as_text)
    }

    /// Number of goals accepted so far.
    pub fn episode(&self) -> u64 {
        self.lock().episode
    }

    /// How the current episode ended; `None` while it is still running.
    pub fn outcome(&self) -> Option<EpisodeOutcome> {
        self.lock().outcome
    }

    pub fn last_fault(&self) -> Option<NavFault> {
        self.lock().last_fault.clone()
    }

    pub fn best_distance(&self) -> f64 {
        self.lock().alarm.best_distance()
    }

    pub fn snapshot(&self) -> NavigatorSnapshot {
        let core = self.lock();
        NavigatorSnapshot {
            state: core.machine.current(),
            previous_state: core.machine.previous(),
            params: core.params.clone(),
            episode: core.episode,
            outcome: core.outcome,
            best_distance: core.alarm.best_distance(),
            end_event_sent: core.end_event_sent,
            pose: core.pose,
            velocity: core.velocity.world,
            follower: core.follower.name().to_string(),
            last_fault: core.last_fault.clone(),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::follower::IdleFollower;
    use pilot_hal::{RobotCall, SimRobot};
    use pilot_types::{NavEvent, NavTarget};
    use std::f64::consts::FRAC_PI_2;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Follower that counts its invocations and optionally misbehaves.
    struct ScriptedFollower {
        calls: Arc<AtomicUsize>,
        mode: Mode,
    }

    #[derive(Clone, Copy)]
    enum Mode {
        Drive,
        Fail,
        Panic,
    }

    impl PathFollower for ScriptedFollower {
        fn name(&self) -> &str {
            "scripted"
        }

        fn step(&mut self, ctx: &StepContext<'_>) -> Result<(), PilotError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.mode {
                Mode::Drive => ctx.robot.change_speeds(0.5, 0.0),
                Mode::Fail => Err(PilotError::FollowerFault("no path".into())),
                Mode::Panic => panic!("follower bug"),
            }
        }
    }

    struct Rig {
        robot: Arc<SimRobot>,
        clock: Arc<ManualClock>,
        nav: Navigator,
        follower_calls: Arc<AtomicUsize>,
    }

    fn rig_with(mode: Mode, config: NavigatorConfig) -> Rig {
        let robot = Arc::new(SimRobot::new());
        let clock = Arc::new(ManualClock::new());
        let follower_calls = Arc::new(AtomicUsize::new(0));
        let follower = ScriptedFollower {
            calls: follower_calls.clone(),
            mode,
        };
        let nav = Navigator::with_clock(robot.clone(), Box::new(follower), config, clock.clone());
        Rig {
            robot,
            clock,
            nav,
            follower_calls,
        }
    }

    fn rig() -> Rig {
        rig_with(Mode::Drive, NavigatorConfig::default())
    }

    fn follower_calls(rig: &Rig) -> usize {
        rig.follower_calls.load(Ordering::SeqCst)
    }

    fn drive_into_error(rig: &Rig) {
        rig.nav.navigate(NavigationParams::to_position(5.0, 0.0)).unwrap();
        rig.nav.step();
        rig.robot.fail_pose_queries(true);
        rig.nav.step();
        assert_eq!(rig.nav.state(), NavState::NavError);
        rig.robot.fail_pose_queries(false);
    }

    #[test]
    fn starts_idle_and_idle_steps_do_nothing() {
        let rig = rig();
        assert_eq!(rig.nav.state(), NavState::Idle);
        rig.nav.step();
        rig.nav.step();
        assert!(rig.robot.calls().is_empty());
        assert_eq!(rig.nav.episode(), 0);
    }

    #[test]
    fn cancel_from_every_state_stops_and_goes_idle() {
        for target in [
            NavState::Idle,
            NavState::Navigating,
            NavState::Suspended,
            NavState::NavError,
        ] {
            let rig = rig();
            match target {
                NavState::Idle => {}
                NavState::Navigating => {
                    rig.nav.navigate(NavigationParams::to_position(5.0, 0.0)).unwrap();
                    rig.nav.step();
                }
                NavState::Suspended => {
                    rig.nav.navigate(NavigationParams::to_position(5.0, 0.0)).unwrap();
                    rig.nav.step();
                    rig.nav.suspend();
                }
                NavState::NavError => drive_into_error(&rig),
            }
            assert_eq!(rig.nav.state(), target);
            let stops = rig.robot.stop_count();
            rig.nav.cancel();
            assert_eq!(rig.nav.state(), NavState::Idle, "from {target}");
            assert_eq!(rig.robot.stop_count(), stops + 1, "from {target}");
        }
    }

    #[test]
    fn cancel_is_idempotent() {
        let rig = rig();
        rig.nav.cancel();
        rig.nav.cancel();
        assert_eq!(rig.nav.state(), NavState::Idle);
        assert_eq!(rig.robot.stop_count(), 2);
    }

    #[test]
    fn first_step_arms_watchdog_and_announces_start() {
        let rig = rig();
        rig.nav.navigate(NavigationParams::to_position(5.0, 0.0)).unwrap();
        rig.nav.step();
        let calls = rig.robot.calls();
        assert!(calls.contains(&RobotCall::StartWatchdog(Duration::from_millis(1000))));
        assert_eq!(rig.robot.events(), vec![NavEvent::NavigationStarted]);
        assert_eq!(follower_calls(&rig), 1);
        assert_eq!(rig.robot.commanded_speeds(), (0.5, 0.0));

        rig.nav.step();
        assert_eq!(rig.robot.count(RobotCall::StartWatchdog(Duration::from_millis(1000))), 1);
        assert_eq!(rig.robot.count(RobotCall::Event(NavEvent::NavigationStarted)), 1);
        assert_eq!(follower_calls(&rig), 2);
    }

    #[test]
    fn best_distance_is_monotone_and_reset_on_navigate() {
        let rig = rig();
        rig.nav.navigate(NavigationParams::to_position(10.0, 0.0)).unwrap();
        assert!(rig.nav.best_distance().is_infinite());

        let mut previous = f64::INFINITY;
        for x in [0.0, 1.0, 0.5, 2.0, 1.5] {
            rig.robot.set_pose(Pose2D::new(x, 0.0, 0.0));
            rig.nav.step();
            let best = rig.nav.best_distance();
            assert!(best <= previous);
            previous = best;
        }
        assert!((previous - 8.0).abs() < 1e-9);

        rig.nav.navigate(NavigationParams::to_position(10.0, 0.0)).unwrap();
        assert!(rig.nav.best_distance().is_infinite());
    }

    #[test]
    fn relative_goal_is_resolved_once() {
        let rig = rig();
        rig.robot.set_pose(Pose2D::new(2.0, 0.0, FRAC_PI_2));
        rig.nav
            .navigate(NavigationParams::to_pose(1.0, 0.0, 0.0).relative())
            .unwrap();
        let params = rig.nav.params().unwrap();
        assert!(!params.target_is_relative);
        let NavTarget::Pose(p) = params.target else {
            panic!("expected pose target");
        };
        assert!((p.x - 2.0).abs() < 1e-9);
        assert!((p.y - 1.0).abs() < 1e-9);
        assert!((p.heading - FRAC_PI_2).abs() < 1e-9);

        // Moving the robot does not move the goal.
        rig.robot.set_pose(Pose2D::new(0.0, 0.0, 0.0));
        rig.nav.step();
        assert_eq!(rig.nav.params().unwrap().target, NavTarget::Pose(p));
    }

    #[test]
    fn goal_crossed_between_samples_is_detected() {
        let rig = rig();
        rig.nav
            .navigate(NavigationParams::to_position(1.0, 0.01).with_allowed_distance(0.05))
            .unwrap();
        rig.nav.step();
        assert_eq!(rig.nav.state(), NavState::Navigating);

        rig.robot.set_pose(Pose2D::new(2.0, 0.0, 0.0));
        rig.nav.step();
        assert_eq!(rig.nav.state(), NavState::Idle);
        assert_eq!(rig.robot.stop_count(), 1);
        assert_eq!(
            rig.robot.events(),
            vec![NavEvent::NavigationStarted, NavEvent::NavigationEnded]
        );
        assert_eq!(rig.nav.outcome(), Some(EpisodeOutcome::Reached));
        // Arrival happens before the follower would run.
        assert_eq!(follower_calls(&rig), 1);
        assert_eq!(rig.robot.count(RobotCall::StopWatchdog), 0);

        // The IDLE entry edge stops once more and releases the watchdog.
        rig.nav.step();
        assert_eq!(rig.robot.stop_count(), 2);
        assert_eq!(rig.robot.count(RobotCall::StopWatchdog), 1);
        assert!(!rig.robot.watchdog_armed());

        rig.nav.step();
        assert_eq!(rig.robot.stop_count(), 2);
        assert_eq!(rig.robot.count(RobotCall::StopWatchdog), 1);
    }

    #[test]
    fn stationary_robot_stalls_after_timeout() {
        let rig = rig_with(Mode::Drive, NavigatorConfig::default());
        rig.nav
            .navigate(NavigationParams::to_position(5.0, 0.0).with_allowed_distance(0.1))
            .unwrap();
        rig.nav.step();
        for _ in 0..30 {
            rig.clock.advance(Duration::from_secs(1));
            rig.nav.step();
            assert_eq!(rig.nav.state(), NavState::Navigating);
        }
        rig.clock.advance(Duration::from_secs(1));
        rig.nav.step();

        assert_eq!(rig.nav.state(), NavState::NavError);
        assert_eq!(rig.robot.count(RobotCall::Event(NavEvent::WaySeemsBlocked)), 1);
        assert_eq!(rig.robot.commanded_speeds(), (0.0, 0.0));
        assert_eq!(rig.nav.last_fault().unwrap().kind, FaultKind::Stall);
        assert_eq!(rig.nav.outcome(), Some(EpisodeOutcome::Failed));

        rig.nav.step();
        rig.nav.step();
        assert_eq!(rig.robot.count(RobotCall::Event(NavEvent::WaySeemsBlocked)), 1);
        assert_eq!(
            rig.robot.count(RobotCall::Event(NavEvent::NavigationEndedDueToError)),
            1
        );
        assert_eq!(rig.robot.count(RobotCall::StopWatchdog), 1);
    }

    #[test]
    fn intermediary_waypoint_arrival_does_not_stop_the_robot() {
        let rig = rig();
        rig.nav
            .navigate(NavigationParams::to_position(1.0, 0.0).intermediary())
            .unwrap();
        rig.nav.step();
        rig.robot.set_pose(Pose2D::new(1.0, 0.0, 0.0));
        rig.nav.step();
        assert_eq!(rig.nav.state(), NavState::Idle);
        assert_eq!(rig.robot.stop_count(), 0);
        assert_eq!(rig.robot.commanded_speeds(), (0.5, 0.0));
        assert_eq!(rig.robot.count(RobotCall::Event(NavEvent::NavigationEnded)), 0);
        assert_eq!(rig.nav.outcome(), Some(EpisodeOutcome::Reached));
    }

    #[test]
    fn idle_after_waypoint_without_next_goal_stops_the_robot() {
        let rig = rig();
        rig.nav
            .navigate(NavigationParams::to_position(1.0, 0.0).intermediary())
            .unwrap();
        rig.nav.step();
        rig.robot.set_pose(Pose2D::new(1.0, 0.0, 0.0));
        rig.nav.step();
        for _ in 0..10 {
            rig.nav.step();
        }

        assert_eq!(rig.nav.state(), NavState::Idle);
        assert_eq!(rig.robot.stop_count(), 1);
        assert_eq!(rig.robot.commanded_speeds(), (0.0, 0.0));
        assert_eq!(rig.robot.count(RobotCall::StopWatchdog), 1);
        assert!(!rig.robot.watchdog_armed());
    }

    #[test]
    fn next_goal_before_idle_step_keeps_the_robot_moving() {
        let rig = rig();
        rig.nav
            .navigate(NavigationParams::to_position(1.0, 0.0).intermediary())
            .unwrap();
        rig.nav.step();
        rig.robot.set_pose(Pose2D::new(1.0, 0.0, 0.0));
        rig.nav.step();
        rig.nav.navigate(NavigationParams::to_position(3.0, 0.0)).unwrap();
        rig.nav.step();

        assert_eq!(rig.nav.state(), NavState::Navigating);
        assert_eq!(rig.robot.stop_count(), 0);
        assert_eq!(rig.robot.count(RobotCall::StopWatchdog), 0);
        assert!(rig.robot.watchdog_armed());
    }

    #[test]
    fn early_end_event_is_sent_once() {
        let config = NavigatorConfig {
            end_event_distance: 1.0,
            ..NavigatorConfig::default()
        };
        let rig = rig_with(Mode::Drive, config);
        rig.nav
            .navigate(NavigationParams::to_position(2.0, 0.0).with_allowed_distance(0.1))
            .unwrap();
        rig.robot.set_pose(Pose2D::new(1.5, 0.0, 0.0));
        rig.nav.step();
        assert_eq!(rig.nav.state(), NavState::Navigating);
        assert_eq!(rig.robot.count(RobotCall::Event(NavEvent::NavigationEnded)), 1);

        rig.robot.set_pose(Pose2D::new(2.0, 0.0, 0.0));
        rig.nav.step();
        assert_eq!(rig.nav.state(), NavState::Idle);
        assert_eq!(rig.robot.count(RobotCall::Event(NavEvent::NavigationEnded)), 1);
    }

    #[test]
    fn relative_goal_with_failing_pose_query_enters_error() {
        let rig = rig();
        rig.robot.fail_pose_queries(true);
        let result = rig.nav.navigate(NavigationParams::to_position(1.0, 0.0).relative());
        assert!(matches!(result, Err(PilotError::PoseUnavailable(_))));
        assert_eq!(rig.nav.state(), NavState::NavError);
        assert_eq!(rig.robot.stop_count(), 1);
        assert!(rig.nav.params().is_none());
        assert_eq!(
            rig.nav.last_fault().unwrap().kind,
            FaultKind::TargetResolution
        );
    }

    #[test]
    fn relative_goal_with_failing_pose_query_while_navigating() {
        let rig = rig();
        rig.nav.navigate(NavigationParams::to_position(5.0, 0.0)).unwrap();
        rig.nav.step();
        rig.robot.fail_pose_queries(true);
        let result = rig.nav.navigate(NavigationParams::to_position(1.0, 0.0).relative());
        assert!(matches!(result, Err(PilotError::PoseUnavailable(_))));
        assert_eq!(rig.nav.state(), NavState::NavError);
        assert_eq!(rig.robot.stop_count(), 1);
        assert_eq!(rig.nav.outcome(), Some(EpisodeOutcome::Failed));

        rig.nav.step();
        assert_eq!(
            rig.robot.count(RobotCall::Event(NavEvent::NavigationEndedDueToError)),
            1
        );
        assert_eq!(rig.robot.count(RobotCall::StopWatchdog), 1);
        assert!(!rig.robot.watchdog_armed());
        assert_eq!(follower_calls(&rig), 1);
    }

    #[test]
    fn pose_failure_while_navigating_enters_error() {
        let rig = rig();
        rig.nav.navigate(NavigationParams::to_position(5.0, 0.0)).unwrap();
        rig.nav.step();
        rig.robot.fail_pose_queries(true);
        rig.nav.step();

        assert_eq!(rig.nav.state(), NavState::NavError);
        assert_eq!(rig.robot.stop_count(), 1);
        assert_eq!(follower_calls(&rig), 1);
        assert_eq!(rig.nav.last_fault().unwrap().kind, FaultKind::PoseQuery);

        rig.nav.step();
        assert_eq!(
            rig.robot.count(RobotCall::Event(NavEvent::NavigationEndedDueToError)),
            1
        );
        assert_eq!(rig.robot.count(RobotCall::StopWatchdog), 1);
    }

    #[test]
    fn follower_error_keeps_navigating() {
        let rig = rig_with(Mode::Fail, NavigatorConfig::default());
        rig.nav.navigate(NavigationParams::to_position(5.0, 0.0)).unwrap();
        rig.nav.step();
        assert_eq!(rig.nav.state(), NavState::Navigating);
        let fault = rig.nav.last_fault().unwrap();
        assert_eq!(fault.kind, FaultKind::Follower);
        assert!(fault.message.contains("no path"));

        rig.nav.step();
        assert_eq!(follower_calls(&rig), 2);
    }

    #[test]
    fn follower_panic_is_contained() {
        let rig = rig_with(Mode::Panic, NavigatorConfig::default());
        rig.nav.navigate(NavigationParams::to_position(5.0, 0.0)).unwrap();
        rig.nav.step();
        assert_eq!(rig.nav.state(), NavState::Navigating);
        let fault = rig.nav.last_fault().unwrap();
        assert_eq!(fault.kind, FaultKind::Follower);
        assert!(fault.message.contains("follower bug"));

        rig.nav.cancel();
        assert_eq!(rig.nav.state(), NavState::Idle);
    }

    #[test]
    fn suspend_stops_on_next_step_and_resume_rearms_watchdog() {
        let rig = rig();
        rig.nav.navigate(NavigationParams::to_position(5.0, 0.0)).unwrap();
        rig.nav.step();
        rig.nav.suspend();
        assert_eq!(rig.nav.state(), NavState::Suspended);
        assert_eq!(rig.robot.stop_count(), 0);

        rig.nav.step();
        assert_eq!(rig.robot.stop_count(), 1);
        assert_eq!(rig.robot.count(RobotCall::StopWatchdog), 1);

        rig.clock.advance(Duration::from_secs(5));
        rig.nav.resume();
        rig.nav.step();
        assert_eq!(rig.nav.state(), NavState::Navigating);
        assert_eq!(rig.robot.count(RobotCall::StartWatchdog(Duration::from_millis(1000))), 2);
        assert_eq!(rig.robot.count(RobotCall::Event(NavEvent::NavigationStarted)), 1);
    }

    #[test]
    fn time_spent_suspended_counts_toward_stall() {
        let rig = rig();
        rig.nav.navigate(NavigationParams::to_position(5.0, 0.0)).unwrap();
        rig.nav.step();
        rig.nav.suspend();
        rig.nav.step();

        rig.clock.advance(Duration::from_secs(31));
        rig.nav.resume();
        rig.nav.step();

        assert_eq!(rig.nav.state(), NavState::NavError);
        assert_eq!(rig.robot.count(RobotCall::Event(NavEvent::WaySeemsBlocked)), 1);
        assert_eq!(rig.nav.last_fault().unwrap().kind, FaultKind::Stall);
    }

    #[test]
    fn commands_outside_their_state_are_ignored() {
        let rig = rig();
        rig.nav.suspend();
        rig.nav.resume();
        rig.nav.reset_error();
        assert_eq!(rig.nav.state(), NavState::Idle);
        assert!(rig.robot.calls().is_empty());
    }

    #[test]
    fn reset_error_returns_to_idle() {
        let rig = rig();
        drive_into_error(&rig);
        rig.nav.reset_error();
        assert_eq!(rig.nav.state(), NavState::Idle);
        rig.nav.navigate(NavigationParams::to_position(1.0, 0.0)).unwrap();
        assert_eq!(rig.nav.state(), NavState::Navigating);
    }

    #[test]
    fn invalid_goal_leaves_state_untouched() {
        let rig = rig();
        rig.nav.navigate(NavigationParams::to_position(5.0, 0.0)).unwrap();
        let before = rig.nav.params();
        let result = rig
            .nav
            .navigate(NavigationParams::to_position(1.0, 0.0).with_allowed_distance(-1.0));
        assert!(matches!(result, Err(PilotError::InvalidParams(_))));
        assert_eq!(rig.nav.state(), NavState::Navigating);
        assert_eq!(rig.nav.params(), before);
        assert_eq!(rig.nav.episode(), 1);
    }

    #[test]
    fn episode_counter_and_outcomes() {
        let rig = rig();
        assert_eq!(rig.nav.navigate(NavigationParams::to_position(0.1, 0.0)).unwrap(), 1);
        assert_eq!(rig.nav.episode(), 1);
        assert_eq!(rig.nav.outcome(), None);
        rig.nav.step();
        assert_eq!(rig.nav.outcome(), Some(EpisodeOutcome::Reached));

        rig.nav.navigate(NavigationParams::to_position(5.0, 0.0)).unwrap();
        assert_eq!(rig.nav.episode(), 2);
        rig.nav.cancel();
        assert_eq!(rig.nav.outcome(), Some(EpisodeOutcome::Cancelled));
    }

    #[test]
    fn params_text_and_snapshot() {
        let rig = rig();
        assert!(rig.nav.params_as_text().is_none());
        rig.nav
            .navigate(NavigationParams::to_position(1.0, 2.0).with_allowed_distance(0.25))
            .unwrap();
        let text = rig.nav.params_as_text().unwrap();
        assert!(text.contains("navparams.target = (1.000,2.000)"));
        assert!(text.contains("0.250"));

        rig.nav.step();
        let snap = rig.nav.snapshot();
        assert_eq!(snap.state, NavState::Navigating);
        assert_eq!(snap.episode, 1);
        assert_eq!(snap.follower, "scripted");
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["state"], "NAVIGATING");
    }

    #[test]
    fn commands_from_another_thread_serialise_with_steps() {
        let rig = rig();
        let nav = Arc::new(rig.nav);
        let stepper = {
            let nav = nav.clone();
            std::thread::spawn(move || {
                for _ in 0..500 {
                    nav.step();
                }
            })
        };
        for i in 0..200 {
            if i % 2 == 0 {
                nav.navigate(NavigationParams::to_position(5.0, 0.0)).unwrap();
            } else {
                nav.cancel();
            }
        }
        stepper.join().unwrap();
        nav.cancel();
        nav.step();
        assert_eq!(nav.state(), NavState::Idle);
        assert_eq!(rig.robot.commanded_speeds(), (0.0, 0.0));
    }

    #[test]
    fn works_with_idle_follower() {
        let robot = Arc::new(SimRobot::new());
        let nav = Navigator::new(robot.clone(), Box::new(IdleFollower), NavigatorConfig::default());
        nav.navigate(NavigationParams::to_position(3.0, 0.0)).unwrap();
        nav.step();
        assert_eq!(robot.count(RobotCall::ChangeSpeeds { linear: 0.5, angular: 0.0 }), 0);
        assert_eq!(nav.snapshot().follower, "idle");
    }
}
