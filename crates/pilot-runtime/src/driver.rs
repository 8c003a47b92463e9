//! [`NavDriver`] – the periodic control loop around a [`Navigator`].
//!
//! The navigator itself never spawns anything; the driver owns the tokio
//! task that calls [`Navigator::step`] at a fixed period and, after every
//! step, advances the active [`WaypointMission`] if there is one.
//!
//! Shutdown is signalled through a `watch` channel.  On shutdown the driver
//! cancels navigation and runs one last step, so the robot is stopped and
//! the watchdog disarmed before the task exits.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::{sync::Arc, time::Duration};
//! use pilot_hal::SimRobot;
//! use pilot_kernel::{IdleFollower, Navigator, NavigatorConfig};
//! use pilot_runtime::NavDriver;
//!
//! # async fn demo() {
//! let robot = Arc::new(SimRobot::new());
//! let nav = Arc::new(Navigator::new(robot, Box::new(IdleFollower), NavigatorConfig::default()));
//! let handle = NavDriver::new(nav, Duration::from_millis(100)).spawn();
//! // ... issue commands ...
//! handle.shutdown().await;
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use pilot_kernel::Navigator;
use pilot_types::PilotError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::mission::{MissionStatus, WaypointMission};

/// Periodic stepper for a shared [`Navigator`].
#[derive(Clone)]
pub struct NavDriver {
    navigator: Arc<Navigator>,
    period: Duration,
    mission: Arc<Mutex<Option<WaypointMission>>>,
}

impl NavDriver {
    pub fn new(navigator: Arc<Navigator>, period: Duration) -> Self {
        Self {
            navigator,
            period,
            mission: Arc::new(Mutex::new(None)),
        }
    }

    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.navigator
    }

    fn mission_slot(&self) -> MutexGuard<'_, Option<WaypointMission>> {
        self.mission.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start `mission`, replacing any mission already in progress.
    ///
    /// # Errors
    ///
    /// Propagates the navigator's rejection of the first leg; the slot is
    /// left empty in that case.
    pub fn start_mission(&self, mut mission: WaypointMission) -> Result<(), PilotError> {
        let mut slot = self.mission_slot();
        *slot = None;
        mission.start(&self.navigator)?;
        *slot = Some(mission);
        Ok(())
    }

    /// Status of the most recent mission, if one was started.
    pub fn mission_status(&self) -> Option<MissionStatus> {
        self.mission_slot().as_ref().map(WaypointMission::status)
    }

    /// One control cycle: step the navigator, then advance the mission.
    pub fn tick(&self) {
        self.navigator.step();
        if let Some(mission) = self.mission_slot().as_mut() {
            mission.poll(&self.navigator);
        }
    }

    /// Spawn the control loop on the current tokio runtime.
    pub fn spawn(self) -> DriverHandle {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(self.run(rx));
        DriverHandle { shutdown, task }
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_ms = self.period.as_millis() as u64, "navigation driver started");

        loop {
            tokio::select! {
                _ = interval.tick() => self.tick(),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("navigation driver stopping; cancelling navigation");
        self.navigator.cancel();
        self.tick();
        debug!(state = %self.navigator.state(), "navigation driver stopped");
    }
}

/// Handle to a spawned [`NavDriver`] task.
pub struct DriverHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DriverHandle {
    /// Receiver that observes this driver's shutdown signal; other tasks
    /// (e.g. a simulation loop) can stop alongside the driver.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Signal shutdown without waiting.
    pub fn request_shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Signal shutdown and wait for the loop to exit.
    pub async fn shutdown(self) {
        self.request_shutdown();
        if let Err(e) = self.task.await {
            warn!(error = %e, "navigation driver task ended abnormally");
        }
    }
}
