//! Route safety scoring against the risk-zone catalog.
//!
//! `analyze` is pure, deterministic, and total: it never errors, and
//! may be called concurrently for multiple candidate routes.

use crate::models::{RiskLevel, RiskZone, SafetyAssessment, ZoneProximity};
use crate::spatial::point_to_route_distance;

/// Fixed buffer around a zone's radius inside which it still affects
/// the score.
pub const RELEVANCE_BUFFER_M: f64 = 200.0;

/// Maximum number of warning strings on an assessment.
const MAX_WARNINGS: usize = 5;

const HIGH_RISK_BANNER: &str =
    "High risk route - consider an alternative before starting";
const STAY_ALERT_BANNER: &str = "Elevated risk along this route - stay alert";

/// Score a route polyline against a set of risk zones.
///
/// Empty geometry or an empty zone set yields a perfect assessment
/// (score 100, low risk, no warnings).
pub fn analyze(geometry: &[[f64; 2]], zones: &[RiskZone]) -> SafetyAssessment {
    let mut proximities: Vec<ZoneProximity> = Vec::new();

    for zone in zones {
        let distance_m = point_to_route_distance(zone.lat, zone.lon, geometry);
        if distance_m <= zone.radius_m + RELEVANCE_BUFFER_M {
            proximities.push(ZoneProximity {
                zone: zone.clone(),
                distance_m,
                passes_through: distance_m <= zone.radius_m,
            });
        }
    }

    // Most severe first; ties broken by how close the route comes.
    proximities.sort_by(|a, b| {
        b.zone
            .level
            .cmp(&a.zone.level)
            .then(a.distance_m.total_cmp(&b.distance_m))
    });

    let score = compute_score(&proximities);
    let risk_level = overall_risk_level(&proximities, score);
    let warnings = build_warnings(&proximities, score);

    SafetyAssessment {
        score,
        risk_level,
        zones: proximities,
        warnings,
    }
}

fn compute_score(proximities: &[ZoneProximity]) -> u8 {
    let mut score = 100.0_f64;
    for prox in proximities {
        let base = prox.zone.level.base_penalty();
        let penalty = if prox.passes_through {
            base
        } else {
            let reach = prox.zone.radius_m + RELEVANCE_BUFFER_M;
            let proximity_factor = (1.0 - prox.distance_m / reach).clamp(0.0, 1.0);
            base * proximity_factor * 0.5
        };
        score = (score - penalty).clamp(0.0, 100.0);
    }
    score.round() as u8
}

fn overall_risk_level(proximities: &[ZoneProximity], score: u8) -> RiskLevel {
    let passes = |level: RiskLevel| {
        proximities
            .iter()
            .any(|p| p.passes_through && p.zone.level == level)
    };

    if proximities.is_empty() || score >= 90 {
        RiskLevel::Low
    } else if passes(RiskLevel::Critical) || score < 50 {
        RiskLevel::Critical
    } else if passes(RiskLevel::High) || score < 70 {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    }
}

fn build_warnings(proximities: &[ZoneProximity], score: u8) -> Vec<String> {
    let mut warnings: Vec<String> = Vec::new();

    if score < 50 {
        warnings.push(HIGH_RISK_BANNER.to_string());
    } else if score < 70 {
        warnings.push(STAY_ALERT_BANNER.to_string());
    }

    for prox in proximities {
        if prox.passes_through && prox.zone.level >= RiskLevel::High {
            let warning = format!("{}: {}", prox.zone.name, prox.zone.advisory);
            if !warnings.contains(&warning) {
                warnings.push(warning);
            }
        }
    }

    warnings.truncate(MAX_WARNINGS);
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskZone;

    // Short straight route near Irvine, ~1.8km.
    fn route() -> Vec<[f64; 2]> {
        vec![
            [-117.8300, 33.6846],
            [-117.8200, 33.6846],
            [-117.8100, 33.6846],
        ]
    }

    fn zone_on_route(id: &str, level: RiskLevel) -> RiskZone {
        RiskZone {
            id: id.into(),
            name: id.into(),
            lat: 33.6846,
            lon: -117.8250,
            radius_m: 200.0,
            level,
            crime_types: Vec::new(),
            incidents_per_month: 10,
            advisory: format!("advisory for {id}"),
            peak_hours: String::new(),
        }
    }

    fn zone_offset(id: &str, level: RiskLevel, offset_m: f64, radius_m: f64) -> RiskZone {
        let (lat, lon) =
            crate::spatial::offset_by_bearing(33.6846, -117.8250, offset_m, 0.0);
        RiskZone {
            lat,
            lon,
            radius_m,
            ..zone_on_route(id, level)
        }
    }

    #[test]
    fn empty_inputs_score_perfect() {
        let empty = analyze(&[], &[zone_on_route("z", RiskLevel::Critical)]);
        assert_eq!(empty.score, 100);
        assert_eq!(empty.risk_level, RiskLevel::Low);
        assert!(empty.zones.is_empty());
        assert!(empty.warnings.is_empty());

        let no_zones = analyze(&route(), &[]);
        assert_eq!(no_zones.score, 100);
        assert_eq!(no_zones.risk_level, RiskLevel::Low);
    }

    #[test]
    fn golden_critical_route_scores_40() {
        let zones = vec![
            zone_on_route("crit", RiskLevel::Critical),
            zone_on_route("high", RiskLevel::High),
            zone_on_route("med", RiskLevel::Medium),
        ];
        let assessment = analyze(&route(), &zones);
        assert_eq!(assessment.score, 40);
        assert_eq!(assessment.risk_level, RiskLevel::Critical);
        assert!(assessment.zones.iter().all(|z| z.passes_through));
    }

    #[test]
    fn golden_high_route_scores_65() {
        let zones = vec![
            zone_on_route("high", RiskLevel::High),
            zone_on_route("med", RiskLevel::Medium),
            zone_on_route("low", RiskLevel::Low),
        ];
        let assessment = analyze(&route(), &zones);
        assert_eq!(assessment.score, 65);
        assert_eq!(assessment.risk_level, RiskLevel::High);
    }

    #[test]
    fn golden_medium_route_scores_85() {
        let zones = vec![
            zone_on_route("med", RiskLevel::Medium),
            zone_on_route("low", RiskLevel::Low),
        ];
        let assessment = analyze(&route(), &zones);
        assert_eq!(assessment.score, 85);
        assert_eq!(assessment.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn single_medium_pass_through_is_still_low_overall() {
        // 100 - 10 = 90, which hits the score >= 90 branch.
        let assessment = analyze(&route(), &[zone_on_route("med", RiskLevel::Medium)]);
        assert_eq!(assessment.score, 90);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
    }

    #[test]
    fn critical_pass_through_overrides_decent_score() {
        let assessment = analyze(&route(), &[zone_on_route("crit", RiskLevel::Critical)]);
        assert_eq!(assessment.score, 70);
        assert_eq!(assessment.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn near_miss_takes_half_proximity_penalty() {
        // Zone center 300m north of the route, radius 200m: relevant
        // (300 <= 400) but not passed through. proximity_factor =
        // 1 - 300/400 = 0.25, penalty = 30 * 0.25 * 0.5 = 3.75 -> 96.
        let zone = zone_offset("crit", RiskLevel::Critical, 300.0, 200.0);
        let assessment = analyze(&route(), &[zone]);
        assert_eq!(assessment.score, 96);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert_eq!(assessment.zones.len(), 1);
        assert!(!assessment.zones[0].passes_through);
    }

    #[test]
    fn zone_outside_buffer_is_ignored() {
        let zone = zone_offset("crit", RiskLevel::Critical, 500.0, 200.0);
        let assessment = analyze(&route(), &[zone]);
        assert_eq!(assessment.score, 100);
        assert!(assessment.zones.is_empty());
    }

    #[test]
    fn closer_zone_never_scores_higher() {
        let near = analyze(
            &route(),
            &[zone_offset("z", RiskLevel::High, 250.0, 200.0)],
        );
        let far = analyze(
            &route(),
            &[zone_offset("z", RiskLevel::High, 380.0, 200.0)],
        );
        assert!(near.score <= far.score);

        // Flipping to pass-through never increases the score either.
        let through = analyze(&route(), &[zone_on_route("z", RiskLevel::High)]);
        assert!(through.score <= near.score);
    }

    #[test]
    fn proximities_sorted_by_level_then_distance() {
        let zones = vec![
            zone_offset("low-near", RiskLevel::Low, 100.0, 200.0),
            zone_offset("crit-far", RiskLevel::Critical, 350.0, 200.0),
            zone_offset("crit-near", RiskLevel::Critical, 250.0, 200.0),
        ];
        let assessment = analyze(&route(), &zones);
        let ids: Vec<&str> = assessment.zones.iter().map(|z| z.zone.id.as_str()).collect();
        assert_eq!(ids, vec!["crit-near", "crit-far", "low-near"]);
    }

    #[test]
    fn warnings_banner_and_cap() {
        let zones: Vec<RiskZone> = (0..6)
            .map(|i| zone_on_route(&format!("crit-{i}"), RiskLevel::Critical))
            .collect();
        let assessment = analyze(&route(), &zones);
        // 100 - 6*30 clamps to 0: high-risk banner first, then per-zone
        // warnings, capped at 5 total.
        assert_eq!(assessment.score, 0);
        assert_eq!(assessment.warnings.len(), 5);
        assert_eq!(assessment.warnings[0], HIGH_RISK_BANNER);
        assert!(assessment.warnings[1].starts_with("crit-"));
    }

    #[test]
    fn stay_alert_banner_below_70() {
        let zones = vec![
            zone_on_route("high", RiskLevel::High),
            zone_on_route("med", RiskLevel::Medium),
            zone_on_route("low", RiskLevel::Low),
        ];
        let assessment = analyze(&route(), &zones);
        assert_eq!(assessment.score, 65);
        assert_eq!(assessment.warnings[0], STAY_ALERT_BANNER);
    }

    #[test]
    fn duplicate_zone_warnings_deduplicated() {
        let a = zone_on_route("same", RiskLevel::High);
        let b = zone_on_route("same", RiskLevel::High);
        let assessment = analyze(&route(), &[a, b]);
        let zone_warnings: Vec<&String> = assessment
            .warnings
            .iter()
            .filter(|w| w.starts_with("same:"))
            .collect();
        assert_eq!(zone_warnings.len(), 1);
    }
}
