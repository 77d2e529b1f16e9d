use crate::error::{LosError, Result};
use crate::io::Antenna;

pub const OMNI_BEAM: &str = "OMNI";

/// Angular sector, in degrees, where a directional antenna has coverage.
/// `lower > upper` means the sector wraps through north.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectorBounds {
    pub lower_deg: f64,
    pub upper_deg: f64,
}

impl SectorBounds {
    pub const FULL: SectorBounds = SectorBounds { lower_deg: 0.0, upper_deg: 360.0 };

    pub fn for_antenna(antenna: &Antenna) -> Result<Self> {
        if is_omni(&antenna.beam_name) {
            return Ok(Self::FULL);
        }

        let width = sector_width_deg(&antenna.beam_name).ok_or_else(|| LosError::BeamName {
            antenna_id: antenna.id,
            beam_name: antenna.beam_name.clone(),
        })?;

        Ok(Self::from_azimuth(antenna.azimuth_deg, width))
    }

    /// Centers a sector of `width_deg` on `azimuth_deg`. Each bound is pulled
    /// back into [0, 360) by a single +/-360 adjustment; wider sectors or
    /// azimuths far outside the circle stay out of range.
    pub fn from_azimuth(azimuth_deg: f64, width_deg: f64) -> Self {
        let mut lower_deg = azimuth_deg - width_deg / 2.0;
        let mut upper_deg = azimuth_deg + width_deg / 2.0;

        if lower_deg < 0.0 {
            lower_deg += 360.0;
        }
        if upper_deg >= 360.0 {
            upper_deg -= 360.0;
        }

        Self { lower_deg, upper_deg }
    }

    pub fn wraps(&self) -> bool {
        self.lower_deg > self.upper_deg
    }

    /// Whether a ray at `bearing_deg` lies inside the sector, bounds included.
    pub fn contains(&self, bearing_deg: f64) -> bool {
        if self.wraps() {
            bearing_deg >= self.lower_deg || bearing_deg <= self.upper_deg
        } else {
            bearing_deg >= self.lower_deg && bearing_deg <= self.upper_deg
        }
    }
}

pub fn is_omni(beam_name: &str) -> bool {
    beam_name.trim().eq_ignore_ascii_case(OMNI_BEAM)
}

/// Leading numeral of a beam name, e.g. 65 for "65SECT".
pub fn sector_width_deg(beam_name: &str) -> Option<f64> {
    let name = beam_name.trim();
    let end = name
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(name.len());
    name[..end].parse::<f64>().ok()
}
