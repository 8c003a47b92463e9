//! [`TargetResolver`] – relative → absolute goal conversion.
//!
//! A relative goal is expressed in the robot frame at the moment the goal is
//! accepted.  It is resolved exactly once, against the pose read at that
//! moment, so the absolute goal stays fixed while the robot moves.

use pilot_hal::RobotInterface;
use pilot_types::{NavigationParams, PilotError, Pose2D};
use tracing::debug;

/// Resolves relative navigation goals against the current robot pose.
pub struct TargetResolver;

impl TargetResolver {
    /// Return `params` with an absolute target.
    ///
    /// Absolute goals are returned unchanged without touching the robot.
    ///
    /// # Errors
    ///
    /// Propagates the robot's error when the pose query fails; the goal must
    /// then be rejected.
    pub fn resolve(
        robot: &dyn RobotInterface,
        params: NavigationParams,
    ) -> Result<NavigationParams, PilotError> {
        if !params.target_is_relative {
            return Ok(params);
        }
        let (pose, _) = robot.current_pose_and_speeds()?;
        Ok(Self::resolve_against(pose, params))
    }

    /// Compose a relative goal onto `origin`.
    pub fn resolve_against(origin: Pose2D, mut params: NavigationParams) -> NavigationParams {
        if params.target_is_relative {
            let absolute = params.target.relative_to(origin);
            debug!(relative = ?params.target, ?absolute, ?origin, "resolved relative target");
            params.target = absolute;
            params.target_is_relative = false;
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_hal::{RobotCall, SimRobot};
    use pilot_types::NavTarget;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn composes_relative_pose_onto_current_pose() {
        let robot = SimRobot::new().with_pose(Pose2D::new(2.0, 0.0, FRAC_PI_2));
        let params = NavigationParams::to_pose(1.0, 0.0, 0.0).relative();
        let resolved = TargetResolver::resolve(&robot, params).unwrap();
        assert!(!resolved.target_is_relative);
        match resolved.target {
            NavTarget::Pose(p) => {
                assert!((p.x - 2.0).abs() < 1e-9);
                assert!((p.y - 1.0).abs() < 1e-9);
                assert!((p.heading - FRAC_PI_2).abs() < 1e-9);
            }
            other => panic!("unexpected target {other:?}"),
        }
    }

    #[test]
    fn resolving_matches_external_resolution() {
        let origin = Pose2D::new(-1.0, 3.0, 0.4);
        let relative = NavigationParams::to_pose(0.7, -0.3, 0.2).relative();
        let by_resolver = TargetResolver::resolve_against(origin, relative);
        let by_hand =
            NavigationParams::to(NavTarget::Pose(origin.compose(Pose2D::new(0.7, -0.3, 0.2))));
        assert_eq!(by_resolver, by_hand);
    }

    #[test]
    fn absolute_goal_does_not_query_pose() {
        let robot = SimRobot::new();
        robot.fail_pose_queries(true);
        let params = NavigationParams::to_position(4.0, 4.0);
        let resolved = TargetResolver::resolve(&robot, params.clone()).unwrap();
        assert_eq!(resolved, params);
    }

    #[test]
    fn pose_failure_is_propagated() {
        let robot = SimRobot::new();
        robot.fail_pose_queries(true);
        let params = NavigationParams::to_position(1.0, 0.0).relative();
        assert!(matches!(
            TargetResolver::resolve(&robot, params),
            Err(PilotError::PoseUnavailable(_))
        ));
        assert!(!robot.calls().contains(&RobotCall::Stop));
    }
}
