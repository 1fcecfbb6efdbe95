//! Error types surfaced at session boundaries.
//!
//! Pure geometric and scoring functions never error; validation happens
//! once, before a tracking session starts.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// Route geometry has fewer than two vertices.
    #[error("route geometry must contain at least two vertices")]
    EmptyGeometry,
    /// Route plan has no turn-by-turn steps.
    #[error("route plan contains no steps")]
    EmptySteps,
    /// The upstream routing service returned no route at all.
    #[error("routing service returned no route")]
    NoRouteFound,
}
