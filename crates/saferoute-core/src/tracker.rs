//! Stateful trip progress engine.
//!
//! One tracker owns one [`TripState`]; every sample, tick, or command
//! is applied against the current committed state, never a snapshot
//! captured earlier. The tracker is single-threaded per session: the
//! caller (or the session task) applies one event at a time.

use crate::errors::RouteError;
use crate::models::{PositionSample, RoutePlan, TripEvent, TripState};
use crate::spatial::{haversine_distance, min_vertex_distance};
use rand::Rng;
use serde::{Deserialize, Serialize};

const MPS_TO_KMH: f64 = 3.6;

/// Thresholds and simulator bounds for progress tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerRules {
    /// Advance to the next step when within this distance of the
    /// current step's end (non-final steps only).
    pub step_advance_m: f64,
    /// Arrive when within this distance of the final step's end.
    pub arrival_m: f64,
    /// Off-route when the nearest route vertex is farther than this
    /// (boundary exclusive: exactly this distance is still on-route).
    pub off_route_m: f64,
    /// Per-tick progress increment bounds for the simulator. The lower
    /// bound is strictly positive so a simulated trip always terminates.
    pub tick_progress_min: f64,
    pub tick_progress_max: f64,
    /// Bound on the simulator's random speed jitter, in km/h.
    pub speed_jitter_kmh: f64,
}

impl Default for TrackerRules {
    fn default() -> Self {
        Self {
            step_advance_m: 20.0,
            arrival_m: 15.0,
            off_route_m: 50.0,
            tick_progress_min: 0.05,
            tick_progress_max: 0.15,
            speed_jitter_kmh: 4.0,
        }
    }
}

/// Progress tracker for one navigation session.
///
/// Created when a route is accepted for tracking; discarded when the
/// session ends. Loading a new route means constructing a new tracker.
#[derive(Debug)]
pub struct RouteProgressTracker {
    plan: RoutePlan,
    rules: TrackerRules,
    state: TripState,
    total_step_distance_m: f64,
}

impl RouteProgressTracker {
    /// Validate the plan and create a fresh tracker
    /// (step 0, progress 0, on-route, not arrived).
    pub fn new(plan: RoutePlan, rules: TrackerRules) -> Result<Self, RouteError> {
        plan.validate()?;
        let total_step_distance_m = plan.total_step_distance_m();
        Ok(Self {
            plan,
            rules,
            state: TripState::new(false),
            total_step_distance_m,
        })
    }

    pub fn state(&self) -> &TripState {
        &self.state
    }

    pub fn plan(&self) -> &RoutePlan {
        &self.plan
    }

    pub fn rules(&self) -> &TrackerRules {
        &self.rules
    }

    /// Freeze consumption of samples and ticks. Idempotent.
    pub fn pause(&mut self) {
        self.state.paused = true;
    }

    /// Resume consumption with no discontinuity. Idempotent.
    pub fn resume(&mut self) {
        self.state.paused = false;
    }

    /// Toggle announcement suppression. Affects only whether
    /// [`TripEvent::AnnouncementDue`] fires on step advance.
    pub fn set_muted(&mut self, muted: bool) {
        self.state.muted = muted;
    }

    /// Apply one live position sample. Returns the edge-triggered
    /// events this sample produced (possibly none).
    ///
    /// Ignored entirely while paused or after arrival.
    pub fn apply_sample(&mut self, sample: &PositionSample) -> Vec<TripEvent> {
        if self.state.paused || self.state.arrived {
            return Vec::new();
        }

        let mut events = Vec::new();
        let last_step = self.plan.steps.len() - 1;

        let end_vertex = self.plan.geometry[self.step_end_vertex(self.state.step_index)];
        let distance_to_step_end =
            haversine_distance(sample.lat, sample.lon, end_vertex[1], end_vertex[0]);

        if distance_to_step_end < self.rules.step_advance_m && self.state.step_index < last_step {
            self.advance_step(&mut events);
        } else if self.state.step_index == last_step && distance_to_step_end < self.rules.arrival_m
        {
            self.state.arrived = true;
            self.state.step_progress = 1.0;
            events.push(TripEvent::Arrived);
        } else {
            let step_len = self.plan.step_distance_m(self.state.step_index);
            self.state.step_progress = if step_len <= 0.0 {
                1.0
            } else {
                (1.0 - distance_to_step_end / step_len).clamp(0.0, 1.0)
            };
        }

        // Off-route is orthogonal to step progress. Vertex-only check;
        // exactly the threshold distance is still on-route.
        let nearest_vertex_m = min_vertex_distance(sample.lat, sample.lon, &self.plan.geometry);
        let off_route = nearest_vertex_m > self.rules.off_route_m;
        if off_route != self.state.off_route {
            self.state.off_route = off_route;
            events.push(if off_route {
                TripEvent::OffRouteEntered
            } else {
                TripEvent::OffRouteExited
            });
        }

        self.recompute_derived();

        if let Some(speed_mps) = sample.speed_mps {
            if speed_mps >= 0.0 {
                self.state.speed_kmh = speed_mps * MPS_TO_KMH;
            }
        }

        events
    }

    /// Apply one simulated tick: advance progress by a bounded random
    /// increment and synthesize a plausible speed.
    ///
    /// Ignored entirely while paused or after arrival.
    pub fn apply_tick(&mut self) -> Vec<TripEvent> {
        if self.state.paused || self.state.arrived {
            return Vec::new();
        }

        let mut events = Vec::new();
        let mut rng = rand::rng();
        let increment = rng.random_range(self.rules.tick_progress_min..self.rules.tick_progress_max);
        let last_step = self.plan.steps.len() - 1;

        let progress = self.state.step_progress + increment;
        if progress >= 1.0 {
            if self.state.step_index == last_step {
                self.state.arrived = true;
                self.state.step_progress = 1.0;
                events.push(TripEvent::Arrived);
            } else {
                self.advance_step(&mut events);
            }
        } else {
            self.state.step_progress = progress;
        }

        if self.plan.total_duration_s > 0.0 {
            let average_kmh =
                self.plan.total_distance_m / self.plan.total_duration_s * MPS_TO_KMH;
            let jitter = rng.random_range(-self.rules.speed_jitter_kmh..self.rules.speed_jitter_kmh);
            self.state.speed_kmh = (average_kmh + jitter).max(0.0);
        }

        self.recompute_derived();
        events
    }

    fn advance_step(&mut self, events: &mut Vec<TripEvent>) {
        self.state.step_index += 1;
        self.state.step_progress = 0.0;
        events.push(TripEvent::StepAdvanced {
            index: self.state.step_index,
        });
        if !self.state.muted {
            events.push(TripEvent::AnnouncementDue {
                instruction: self.plan.steps[self.state.step_index].instruction.clone(),
            });
        }
    }

    /// Geometry index marking the end of a step.
    ///
    /// Vertices are allocated to steps proportionally by each step's
    /// share of total step distance. The routing collaborator gives no
    /// per-step vertex mapping, so this is an approximation; it can
    /// mis-locate boundaries on non-uniformly sampled polylines.
    fn step_end_vertex(&self, step_index: usize) -> usize {
        let vertex_count = self.plan.geometry.len();
        if self.total_step_distance_m <= 0.0 {
            return vertex_count - 1;
        }
        let cumulative: f64 = (0..=step_index)
            .map(|i| self.plan.step_distance_m(i))
            .sum();
        let share = (cumulative / self.total_step_distance_m).clamp(0.0, 1.0);
        let index = (share * vertex_count as f64).floor() as usize;
        // At least one vertex of advance per step, never past the end.
        index.max(step_index + 1).min(vertex_count - 1)
    }

    fn recompute_derived(&mut self) {
        let current_len = self.plan.step_distance_m(self.state.step_index);
        let covered: f64 = (0..self.state.step_index)
            .map(|i| self.plan.step_distance_m(i))
            .sum::<f64>()
            + current_len * self.state.step_progress;

        // Fall back to the plan's stated total if the step table sums
        // to zero.
        let total = if self.total_step_distance_m > 0.0 {
            self.total_step_distance_m
        } else {
            self.plan.total_distance_m
        };

        self.state.covered_distance_m = covered;
        self.state.remaining_distance_m = (total - covered).max(0.0);

        let overall = if total > 0.0 {
            (covered / total).clamp(0.0, 1.0)
        } else {
            0.0
        };

        self.state.remaining_time_s = if self.plan.total_duration_s > 0.0 {
            Some((self.plan.total_duration_s * (1.0 - overall)).max(0.0))
        } else {
            None
        };
    }
}
