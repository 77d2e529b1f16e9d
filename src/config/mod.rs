use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{LosError, Result};
use crate::geo::central_angle_deg;

pub const FEET_TO_METERS: f64 = 0.3048;
/// Upper bound on interpolation steps along a single ray.
pub const MAX_STEPS_PER_RAY: f64 = 1_000_000.0;

/// Unit in which antenna mast heights and ground elevations are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightUnit {
    #[default]
    Feet,
    Meters,
}

impl HeightUnit {
    pub fn to_meters(self, value: f64) -> f64 {
        match self {
            HeightUnit::Feet => value * FEET_TO_METERS,
            HeightUnit::Meters => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LosConfig {
    /// Ray length from the antenna, in kilometers.
    pub horizon_km: f64,
    /// Lat/lon distance between consecutive samples, in degrees.
    pub radius_step_deg: f64,
    /// Bearing increment between rays, in degrees.
    pub angle_step_deg: f64,
    /// Samples closest to the antenna that are always clear.
    pub min_los_samples: usize,
    /// Receiver height above the surface model, in meters.
    pub receiver_height_m: f64,
    /// Surface-minus-ground height above which a visible point counts as a building.
    pub building_min_height_m: f64,
    pub antenna_height_unit: HeightUnit,
    pub parallel: bool,
}

impl Default for LosConfig {
    fn default() -> Self {
        Self {
            horizon_km: 5.0,
            radius_step_deg: 0.00001,
            angle_step_deg: 1.0,
            min_los_samples: 12,
            receiver_height_m: 1.5,
            building_min_height_m: 5.0,
            antenna_height_unit: HeightUnit::Feet,
            parallel: true,
        }
    }
}

impl LosConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: LosConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(LosError::Configuration(format!(
                    "{name} must be a positive finite number, got {value}"
                )))
            }
        };

        positive("horizon_km", self.horizon_km)?;
        positive("radius_step_deg", self.radius_step_deg)?;
        positive("angle_step_deg", self.angle_step_deg)?;

        if self.angle_step_deg > 360.0 {
            return Err(LosError::Configuration(format!(
                "angle_step_deg must not exceed 360, got {}",
                self.angle_step_deg
            )));
        }
        let steps = central_angle_deg(self.horizon_km * 1000.0) / self.radius_step_deg;
        if steps > MAX_STEPS_PER_RAY {
            return Err(LosError::Configuration(format!(
                "radius_step_deg {} gives {steps:.0} samples per ray, limit is {MAX_STEPS_PER_RAY}",
                self.radius_step_deg
            )));
        }
        if !self.receiver_height_m.is_finite() || !self.building_min_height_m.is_finite() {
            return Err(LosError::Configuration(
                "receiver and building heights must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
