use serde::{Deserialize, Serialize};

/// Mean earth radius used by the spherical formulas, in meters.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLon {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Great-circle (haversine) distance in meters.
pub fn haversine_distance(p1: LatLon, p2: LatLon) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let dlat = (p2.latitude - p1.latitude).to_radians();
    let dlon = (p2.longitude - p1.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS * c
}

/// Spherical forward problem: the point reached from `origin` after travelling
/// `distance_m` along the great circle with initial `bearing_deg`.
pub fn destination_point(origin: LatLon, bearing_deg: f64, distance_m: f64) -> LatLon {
    let lat = origin.latitude.to_radians();
    let lon = origin.longitude.to_radians();
    let bearing = bearing_deg.to_radians();
    let delta = distance_m / EARTH_RADIUS;

    let dest_lat = (lat.sin() * delta.cos() + lat.cos() * delta.sin() * bearing.cos()).asin();
    let dest_lon = lon
        + (bearing.sin() * delta.sin() * lat.cos()).atan2(delta.cos() - lat.sin() * dest_lat.sin());

    LatLon {
        latitude: dest_lat.to_degrees(),
        longitude: dest_lon.to_degrees(),
    }
}

/// Central angle subtended by an arc of `distance_m`, in degrees.
pub fn central_angle_deg(distance_m: f64) -> f64 {
    (distance_m / EARTH_RADIUS).to_degrees()
}

/// Linear interpolation in lat/lon space. Not a geodesic: scale distortion
/// grows with latitude and with the span being interpolated.
pub fn lerp(start: LatLon, end: LatLon, t: f64) -> LatLon {
    LatLon {
        latitude: start.latitude + t * (end.latitude - start.latitude),
        longitude: start.longitude + t * (end.longitude - start.longitude),
    }
}

/// Elevation angle in degrees from an observer at `from_elev_m` to a target at
/// `to_elev_m`, over the great-circle ground distance.
pub fn elevation_angle_deg(from: LatLon, from_elev_m: f64, to: LatLon, to_elev_m: f64) -> f64 {
    let opp = to_elev_m - from_elev_m;
    let adj = haversine_distance(from, to);
    opp.atan2(adj).to_degrees()
}
