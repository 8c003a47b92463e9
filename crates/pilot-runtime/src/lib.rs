//! `pilot-runtime` – everything around the supervisor that needs a runtime.
//!
//! # Modules
//!
//! - [`driver`] – [`NavDriver`][driver::NavDriver]: the tokio task that steps
//!   the [`Navigator`][pilot_kernel::Navigator] at a fixed control period and
//!   advances waypoint missions.
//! - [`mission`] – [`WaypointMission`][mission::WaypointMission]: chains
//!   goals through intermediary waypoints without stopping between legs.
//! - [`go_to_goal`] – [`GoToGoalFollower`][go_to_goal::GoToGoalFollower]: a
//!   simple rotate-and-drive path follower.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: console
//!   logging plus optional OTLP span export.

pub mod driver;
pub mod go_to_goal;
pub mod mission;
pub mod telemetry;

pub use driver::{DriverHandle, NavDriver};
pub use go_to_goal::{GoToGoalConfig, GoToGoalFollower};
pub use mission::{MissionStatus, WaypointMission};
pub use telemetry::{LogFormat, TracerProviderGuard, init_tracing};
