//! Spatial math for safety scoring and progress tracking.
//!
//! Route geometry uses `[lon, lat]` vertex pairs (GeoJSON order); all
//! distances are in meters. Every function here is total: degenerate
//! input degrades to a direct point distance, never an error.

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points in meters (Haversine).
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Minimum distance in meters from a point to a finite segment.
///
/// The projection parameter is computed in raw lon/lat coordinate
/// space and clamped to [0, 1]; the returned distance is the haversine
/// distance to the clamped projection. A zero-length segment
/// degenerates to the direct distance to its single endpoint.
pub fn point_to_segment_distance(lat: f64, lon: f64, a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let len_sq = dx * dx + dy * dy;

    if len_sq < f64::EPSILON {
        // Segment is essentially a point
        return haversine_distance(lat, lon, a[1], a[0]);
    }

    let t = (((lon - a[0]) * dx + (lat - a[1]) * dy) / len_sq).clamp(0.0, 1.0);
    let proj_lon = a[0] + t * dx;
    let proj_lat = a[1] + t * dy;

    haversine_distance(lat, lon, proj_lat, proj_lon)
}

/// Minimum point-to-segment distance over every consecutive vertex
/// pair of a polyline.
///
/// Empty geometry yields `f64::INFINITY`; a single vertex yields the
/// direct distance to it.
pub fn point_to_route_distance(lat: f64, lon: f64, geometry: &[[f64; 2]]) -> f64 {
    match geometry {
        [] => f64::INFINITY,
        [only] => haversine_distance(lat, lon, only[1], only[0]),
        _ => geometry
            .windows(2)
            .map(|pair| point_to_segment_distance(lat, lon, pair[0], pair[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Minimum distance from a point to any *vertex* of a polyline.
///
/// Coarser than [`point_to_route_distance`]; the tracker uses it for
/// off-route detection (vertex-only check, kept for behavioral parity
/// with the scoring path's segment-based check).
pub fn min_vertex_distance(lat: f64, lon: f64, geometry: &[[f64; 2]]) -> f64 {
    geometry
        .iter()
        .map(|v| haversine_distance(lat, lon, v[1], v[0]))
        .fold(f64::INFINITY, f64::min)
}

/// Offset a position by distance and bearing.
///
/// # Arguments
/// * `lat`, `lon` - Starting position in degrees
/// * `distance_m` - Distance in meters
/// * `bearing_rad` - Bearing in radians (0 = north, π/2 = east)
///
/// # Returns
/// (new_lat, new_lon) in degrees
pub fn offset_by_bearing(lat: f64, lon: f64, distance_m: f64, bearing_rad: f64) -> (f64, f64) {
    if distance_m.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    (lat2.to_degrees(), lon2.to_degrees())
}
