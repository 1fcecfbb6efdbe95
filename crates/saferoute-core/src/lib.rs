//! Route safety scoring and live trip progress tracking.
//!
//! Pure, synchronous engines: no I/O, no async. The session layer
//! (`saferoute-session`) feeds samples and ticks into these types.

pub mod errors;
pub mod models;
pub mod safety;
pub mod spatial;
pub mod tracker;
pub mod zones;

pub use errors::RouteError;
pub use models::{
    ManeuverKind, PositionSample, RiskLevel, RiskZone, RoutePlan, SafetyAssessment, Step,
    TripEvent, TripState, ZoneProximity,
};
pub use safety::analyze;
pub use spatial::haversine_distance;
pub use tracker::{RouteProgressTracker, TrackerRules};
pub use zones::RiskZoneIndex;
