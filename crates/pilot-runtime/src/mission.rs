//! [`WaypointMission`] – chain goals through intermediary waypoints.
//!
//! Every leg but the last is issued as an intermediary waypoint, so the
//! supervisor never stops the robot between legs.  The mission is advanced
//! by polling it after each control step: once the navigator reports that
//! the mission's episode was reached, the next leg is issued immediately.

use pilot_kernel::Navigator;
use pilot_types::{EpisodeOutcome, NavigationParams, PilotError, Point2D};
use serde::Serialize;
use tracing::{info, warn};

/// Progress of a [`WaypointMission`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MissionStatus {
    NotStarted,
    Running { leg: usize, legs: usize },
    Completed,
    Cancelled { leg: usize },
    Failed { leg: usize },
    /// Another goal was issued to the navigator while this leg was active.
    Superseded { leg: usize },
}

impl MissionStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, MissionStatus::Running { .. })
    }
}

/// An ordered list of points visited one after another.
#[derive(Debug, Clone)]
pub struct WaypointMission {
    points: Vec<Point2D>,
    allowed_distance: f64,
    leg: usize,
    episode: Option<u64>,
    status: MissionStatus,
}

impl WaypointMission {
    /// # Errors
    ///
    /// [`PilotError::InvalidParams`] when `points` is empty or a leg would
    /// be rejected by the navigator.
    pub fn new(points: Vec<Point2D>, allowed_distance: f64) -> Result<Self, PilotError> {
        if points.is_empty() {
            return Err(PilotError::InvalidParams(
                "a mission needs at least one waypoint".to_string(),
            ));
        }
        let mission = Self {
            points,
            allowed_distance,
            leg: 0,
            episode: None,
            status: MissionStatus::NotStarted,
        };
        for leg in 0..mission.points.len() {
            mission.leg_params(leg).validate()?;
        }
        Ok(mission)
    }

    pub fn status(&self) -> MissionStatus {
        self.status
    }

    fn leg_params(&self, leg: usize) -> NavigationParams {
        let p = self.points[leg];
        let params =
            NavigationParams::to_position(p.x, p.y).with_allowed_distance(self.allowed_distance);
        if leg + 1 < self.points.len() {
            params.intermediary()
        } else {
            params
        }
    }

    fn issue(&mut self, navigator: &Navigator, leg: usize) -> Result<(), PilotError> {
        let legs = self.points.len();
        self.leg = leg;
        match navigator.navigate(self.leg_params(leg)) {
            Ok(episode) => self.episode = Some(episode),
            Err(e) => {
                self.status = MissionStatus::Failed { leg };
                return Err(e);
            }
        }
        self.status = MissionStatus::Running { leg, legs };
        info!(leg, legs, point = ?self.points[leg], "mission leg issued");
        Ok(())
    }

    /// Issue the first leg.
    ///
    /// # Errors
    ///
    /// Propagates the navigator's rejection of the first goal.
    pub fn start(&mut self, navigator: &Navigator) -> Result<(), PilotError> {
        self.issue(navigator, 0)
    }

    /// Advance the mission according to the navigator's latest outcome.
    pub fn poll(&mut self, navigator: &Navigator) -> MissionStatus {
        if !self.status.is_running() {
            return self.status;
        }
        let snapshot = navigator.snapshot();
        let leg = self.leg;
        if Some(snapshot.episode) != self.episode {
            warn!(leg, "mission superseded by another goal");
            self.status = MissionStatus::Superseded { leg };
            return self.status;
        }
        match snapshot.outcome {
            None => {}
            Some(EpisodeOutcome::Reached) if leg + 1 < self.points.len() => {
                if let Err(e) = self.issue(navigator, leg + 1) {
                    warn!(leg = leg + 1, error = %e, "mission leg rejected");
                }
            }
            Some(EpisodeOutcome::Reached) => {
                info!(legs = self.points.len(), "mission completed");
                self.status = MissionStatus::Completed;
            }
            Some(EpisodeOutcome::Cancelled) => {
                info!(leg, "mission cancelled");
                self.status = MissionStatus::Cancelled { leg };
            }
            Some(EpisodeOutcome::Failed) => {
                warn!(leg, "mission failed");
                self.status = MissionStatus::Failed { leg };
            }
        }
        self.status
    }
}
