/// Mean Earth radius in meters
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Average walking pace, roughly 4.8 km/h
const WALKING_METERS_PER_MINUTE: f64 = 80.0;

/// Great-circle distance between two (lat, lon) points in meters
pub fn haversine_meters(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Minutes on foot for a distance, rounded up and never below one
pub fn walking_minutes(distance_meters: f64) -> u32 {
    ((distance_meters / WALKING_METERS_PER_MINUTE).ceil() as u32).max(1)
}

/// Rounded distance and walking time between two optional coordinate pairs
pub fn distance_and_walk(
    from: Option<(f64, f64)>,
    to: Option<(f64, f64)>,
) -> (Option<u32>, Option<u32>) {
    match from.zip(to) {
        Some((a, b)) => {
            let meters = haversine_meters(a, b);
            if !meters.is_finite() {
                return (None, None);
            }
            (Some(meters.round() as u32), Some(walking_minutes(meters)))
        }
        None => (None, None),
    }
}
