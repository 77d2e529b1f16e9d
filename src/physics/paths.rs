use crate::config::LosConfig;
use crate::geo::{central_angle_deg, destination_point, lerp, LatLon};

/// Generates the radial sampling paths around an antenna.
///
/// Samples are spaced by linear interpolation in lat/lon space between the
/// antenna and the great-circle destination at the horizon. This is a
/// geometric approximation: away from the equator an east-west ray covers
/// fewer ground meters per sample than a north-south one.
#[derive(Debug, Clone, Copy)]
pub struct RadialPathGenerator {
    pub horizon_m: f64,
    pub radius_step_deg: f64,
    pub angle_step_deg: f64,
}

impl RadialPathGenerator {
    pub fn new(config: &LosConfig) -> Self {
        Self {
            horizon_m: config.horizon_km * 1000.0,
            radius_step_deg: config.radius_step_deg,
            angle_step_deg: config.angle_step_deg,
        }
    }

    pub fn ray_count(&self) -> usize {
        (360.0 / self.angle_step_deg).floor() as usize
    }

    pub fn bearing_deg(&self, ray_index: usize) -> f64 {
        ray_index as f64 * self.angle_step_deg
    }

    /// Number of interpolation steps along each ray. Measured on the
    /// due-north ray, whose planar lat/lon span equals the horizon's central
    /// angle, so every bearing gets the same sample count.
    pub fn steps_per_ray(&self) -> usize {
        (central_angle_deg(self.horizon_m) / self.radius_step_deg).floor() as usize
    }

    /// Points per ray, antenna and horizon included.
    pub fn ray_len(&self) -> usize {
        self.steps_per_ray().max(1).saturating_add(1)
    }

    pub fn ray(&self, origin: LatLon, ray_index: usize) -> Vec<LatLon> {
        let end = destination_point(origin, self.bearing_deg(ray_index), self.horizon_m);
        interpolate_path(origin, end, self.steps_per_ray())
    }

    pub fn rays(&self, origin: LatLon) -> Vec<Vec<LatLon>> {
        (0..self.ray_count()).map(|i| self.ray(origin, i)).collect()
    }
}

/// `steps + 1` evenly spaced points from `start` to `end`; zero steps yields
/// just the two endpoints.
pub fn interpolate_path(start: LatLon, end: LatLon, steps: usize) -> Vec<LatLon> {
    if steps == 0 {
        return vec![start, end];
    }
    (0..=steps)
        .map(|i| lerp(start, end, i as f64 / steps as f64))
        .collect()
}
