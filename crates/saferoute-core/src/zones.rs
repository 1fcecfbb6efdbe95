//! Static catalog of risk zones with pure spatial queries.

use crate::models::{RiskLevel, RiskZone};
use crate::spatial::haversine_distance;

/// Immutable risk-zone catalog. Built once at startup; queries are
/// pure and safe to run concurrently.
#[derive(Debug, Clone)]
pub struct RiskZoneIndex {
    zones: Vec<RiskZone>,
}

impl RiskZoneIndex {
    /// Build an index preserving catalog insertion order.
    pub fn new(zones: Vec<RiskZone>) -> Self {
        Self { zones }
    }

    pub fn zones(&self) -> &[RiskZone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Zones whose center lies within `max_distance_m` of the point,
    /// ascending by center distance.
    pub fn zones_within_radius(
        &self,
        lat: f64,
        lon: f64,
        max_distance_m: f64,
    ) -> Vec<(&RiskZone, f64)> {
        let mut hits: Vec<(&RiskZone, f64)> = self
            .zones
            .iter()
            .map(|zone| (zone, haversine_distance(lat, lon, zone.lat, zone.lon)))
            .filter(|(_, dist)| *dist <= max_distance_m)
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits
    }

    /// First zone, in catalog insertion order, whose radius contains
    /// the point. Deliberately order-based rather than
    /// nearest-by-distance when zones overlap.
    pub fn first_containing_zone(&self, lat: f64, lon: f64) -> Option<&RiskZone> {
        self.zones
            .iter()
            .find(|zone| haversine_distance(lat, lon, zone.lat, zone.lon) <= zone.radius_m)
    }

    /// Display color for a risk level.
    pub fn color_for(level: RiskLevel) -> &'static str {
        level.color()
    }

    /// Display label for a risk level.
    pub fn label_for(level: RiskLevel) -> &'static str {
        level.label()
    }

    /// Small built-in catalog used by the demo CLI and tests.
    pub fn demo_catalog() -> Self {
        Self::new(vec![
            RiskZone {
                id: "dt-core".into(),
                name: "Downtown Core".into(),
                lat: 33.6900,
                lon: -117.8300,
                radius_m: 400.0,
                level: RiskLevel::High,
                crime_types: vec!["robbery".into(), "assault".into()],
                incidents_per_month: 42,
                advisory: "Avoid poorly lit side streets after dark".into(),
                peak_hours: "22:00-04:00".into(),
            },
            RiskZone {
                id: "transit-hub".into(),
                name: "Transit Hub".into(),
                lat: 33.6846,
                lon: -117.8265,
                radius_m: 250.0,
                level: RiskLevel::Medium,
                crime_types: vec!["pickpocketing".into()],
                incidents_per_month: 18,
                advisory: "Keep valuables out of sight near the platforms".into(),
                peak_hours: "17:00-20:00".into(),
            },
            RiskZone {
                id: "riverside".into(),
                name: "Riverside Underpass".into(),
                lat: 33.6780,
                lon: -117.8410,
                radius_m: 180.0,
                level: RiskLevel::Critical,
                crime_types: vec!["assault".into(), "robbery".into()],
                incidents_per_month: 55,
                advisory: "Underpass is unmonitored; use the overground crossing".into(),
                peak_hours: "20:00-06:00".into(),
            },
            RiskZone {
                id: "campus-edge".into(),
                name: "Campus Edge".into(),
                lat: 33.6975,
                lon: -117.8180,
                radius_m: 300.0,
                level: RiskLevel::Low,
                crime_types: vec!["bike theft".into()],
                incidents_per_month: 7,
                advisory: "Lock bikes at monitored racks".into(),
                peak_hours: "12:00-18:00".into(),
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::offset_by_bearing;

    fn zone(id: &str, lat: f64, lon: f64, radius_m: f64, level: RiskLevel) -> RiskZone {
        RiskZone {
            id: id.into(),
            name: id.into(),
            lat,
            lon,
            radius_m,
            level,
            crime_types: Vec::new(),
            incidents_per_month: 0,
            advisory: String::new(),
            peak_hours: String::new(),
        }
    }

    #[test]
    fn zones_within_radius_sorted_ascending() {
        let base = (33.6846, -117.8265);
        let (lat_near, lon_near) = offset_by_bearing(base.0, base.1, 100.0, 0.0);
        let (lat_far, lon_far) = offset_by_bearing(base.0, base.1, 900.0, 0.0);
        let index = RiskZoneIndex::new(vec![
            zone("far", lat_far, lon_far, 50.0, RiskLevel::Low),
            zone("near", lat_near, lon_near, 50.0, RiskLevel::Low),
        ]);

        let hits = index.zones_within_radius(base.0, base.1, 1000.0);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.id, "near");
        assert_eq!(hits[1].0.id, "far");
        assert!(hits[0].1 < hits[1].1);

        // Tighter radius filters the far zone out.
        let hits = index.zones_within_radius(base.0, base.1, 200.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.id, "near");
    }

    #[test]
    fn first_containing_zone_uses_insertion_order() {
        // Two overlapping zones both containing the query point; the
        // second is nearer, but the first inserted wins.
        let point = (33.6846, -117.8265);
        let (lat_a, lon_a) = offset_by_bearing(point.0, point.1, 200.0, 0.0);
        let index = RiskZoneIndex::new(vec![
            zone("first", lat_a, lon_a, 500.0, RiskLevel::Medium),
            zone("nearer", point.0, point.1, 500.0, RiskLevel::High),
        ]);

        let hit = index.first_containing_zone(point.0, point.1).unwrap();
        assert_eq!(hit.id, "first");
    }

    #[test]
    fn first_containing_zone_respects_radius() {
        let index = RiskZoneIndex::new(vec![zone(
            "small",
            33.6846,
            -117.8265,
            100.0,
            RiskLevel::Low,
        )]);
        let (lat, lon) = offset_by_bearing(33.6846, -117.8265, 150.0, 0.0);
        assert!(index.first_containing_zone(lat, lon).is_none());
    }

    #[test]
    fn level_lookups_total_over_all_levels() {
        for level in [
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::Critical,
        ] {
            assert!(RiskZoneIndex::color_for(level).starts_with('#'));
            assert!(!RiskZoneIndex::label_for(level).is_empty());
        }
    }
}
