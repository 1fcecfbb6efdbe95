//! Core data models shared by the safety analyzer and the trip tracker.

use crate::errors::RouteError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a risk zone, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Full score penalty applied when a route passes through a zone
    /// of this level.
    pub fn base_penalty(&self) -> f64 {
        match self {
            RiskLevel::Low => 5.0,
            RiskLevel::Medium => 10.0,
            RiskLevel::High => 20.0,
            RiskLevel::Critical => 30.0,
        }
    }

    /// Display color (hex) used by map consumers.
    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Low => "#22c55e",
            RiskLevel::Medium => "#eab308",
            RiskLevel::High => "#f97316",
            RiskLevel::Critical => "#ef4444",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::High => "High Risk",
            RiskLevel::Critical => "Critical Risk",
        }
    }
}

/// A named circular geofence with advisory metadata.
///
/// Zones are loaded once at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskZone {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub radius_m: f64,
    pub level: RiskLevel,
    #[serde(default)]
    pub crime_types: Vec<String>,
    #[serde(default)]
    pub incidents_per_month: u32,
    pub advisory: String,
    /// Time window when incidents concentrate, e.g. "22:00-04:00".
    #[serde(default)]
    pub peak_hours: String,
}

/// Maneuver kind for a turn-by-turn step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverKind {
    Straight,
    TurnRight,
    TurnLeft,
    Arrive,
}

/// One turn-by-turn instruction segment of a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub instruction: String,
    pub distance_m: f64,
    pub maneuver: ManeuverKind,
    pub street: String,
    #[serde(default)]
    pub hazard_advisory: Option<String>,
}

/// Geometry and steps of a single candidate route, as produced by the
/// routing collaborator. Vertices are `[lon, lat]` pairs (GeoJSON order).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePlan {
    pub geometry: Vec<[f64; 2]>,
    pub steps: Vec<Step>,
    pub total_distance_m: f64,
    /// Total duration in seconds. `<= 0` means "time unknown" and all
    /// ETA math is skipped.
    pub total_duration_s: f64,
}

impl RoutePlan {
    /// Validate the plan before a tracking session starts.
    pub fn validate(&self) -> Result<(), RouteError> {
        if self.geometry.len() < 2 {
            return Err(RouteError::EmptyGeometry);
        }
        if self.steps.is_empty() {
            return Err(RouteError::EmptySteps);
        }
        Ok(())
    }

    /// Distance of one step for progress math. The final `arrive`
    /// step's stated distance is treated as zero.
    pub fn step_distance_m(&self, index: usize) -> f64 {
        match self.steps.get(index) {
            Some(step) if step.maneuver != ManeuverKind::Arrive => step.distance_m.max(0.0),
            _ => 0.0,
        }
    }

    /// Sum of all step distances.
    pub fn total_step_distance_m(&self) -> f64 {
        (0..self.steps.len()).map(|i| self.step_distance_m(i)).sum()
    }
}

/// One position fix from the platform location service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSample {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub speed_mps: Option<f64>,
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl PositionSample {
    /// Create a sample with only a position.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            speed_mps: None,
            accuracy_m: None,
            timestamp: Utc::now(),
        }
    }

    /// Set reported ground speed in m/s.
    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }
}

/// How close a route comes to one risk zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneProximity {
    pub zone: RiskZone,
    /// Minimum distance from the zone center to the route, in meters.
    pub distance_m: f64,
    /// True when the route enters the zone's radius.
    pub passes_through: bool,
}

/// Computed safety assessment for one candidate route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyAssessment {
    /// 0-100, 100 = no risk exposure.
    pub score: u8,
    pub risk_level: RiskLevel,
    /// Relevant zones, sorted by level descending then distance ascending.
    pub zones: Vec<ZoneProximity>,
    /// Deduplicated advisory strings, capped at 5.
    pub warnings: Vec<String>,
}

/// Live progress snapshot of an in-progress navigation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripState {
    /// 0-based index of the current step. Non-decreasing within a session.
    pub step_index: usize,
    /// Fractional progress within the current step, in [0, 1].
    pub step_progress: f64,
    pub covered_distance_m: f64,
    pub remaining_distance_m: f64,
    /// Derived ETA; `None` when the plan's duration is unknown.
    pub remaining_time_s: Option<f64>,
    /// Instantaneous speed estimate in km/h.
    pub speed_kmh: f64,
    /// Level-triggered: position has drifted off the route geometry.
    pub off_route: bool,
    /// Terminal: no further samples or ticks are applied once set.
    pub arrived: bool,
    /// Suppresses announcement events only, never state transitions.
    pub muted: bool,
    /// Freezes consumption of samples and ticks.
    pub paused: bool,
}

impl TripState {
    pub(crate) fn new(muted: bool) -> Self {
        Self {
            step_index: 0,
            step_progress: 0.0,
            covered_distance_m: 0.0,
            remaining_distance_m: 0.0,
            remaining_time_s: None,
            speed_kmh: 0.0,
            off_route: false,
            arrived: false,
            muted,
            paused: false,
        }
    }
}

/// Edge-triggered event emitted while applying one sample or tick.
///
/// Consumers that want one-shot banners or sounds listen here instead
/// of polling the level-triggered flags on [`TripState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripEvent {
    /// Advanced to a new step; `index` is the new current step.
    StepAdvanced { index: usize },
    /// Final step completed. Terminal for the session.
    Arrived,
    OffRouteEntered,
    OffRouteExited,
    /// The new step's instruction should be announced. Suppressed
    /// while muted.
    AnnouncementDue { instruction: String },
    /// The live feed keeps failing; switch to the simulator.
    /// Emitted at most once per session.
    SimulatorFallback,
}
