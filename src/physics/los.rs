use serde::{Deserialize, Serialize};

use crate::config::LosConfig;
use crate::geo::{elevation_angle_deg, haversine_distance, LatLon};
use crate::io::Antenna;
use crate::physics::sector::SectorBounds;
use crate::terrain::{Elevation, ElevationService};

/// Receiver elevation substituted for a failed surface lookup, in meters. Low
/// enough that the point never shadows later samples.
pub const FAILED_LOOKUP_ELEVATION: f64 = -1000.0;

/// Visibility class of a sample point. Serialized as its sentinel magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "f32", try_from = "f32")]
pub enum LosClass {
    Los,
    LosInBuilding,
    LosOutsideRegion,
    Nlos,
}

impl LosClass {
    pub const fn sentinel(self) -> f32 {
        match self {
            LosClass::Los => 100.0,
            LosClass::LosInBuilding => 50.0,
            LosClass::LosOutsideRegion => 25.0,
            LosClass::Nlos => 0.0,
        }
    }
}

impl From<LosClass> for f32 {
    fn from(class: LosClass) -> f32 {
        class.sentinel()
    }
}

impl TryFrom<f32> for LosClass {
    type Error = String;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        [LosClass::Los, LosClass::LosInBuilding, LosClass::LosOutsideRegion, LosClass::Nlos]
            .into_iter()
            .find(|class| class.sentinel() == value)
            .ok_or_else(|| format!("{value} is not a line-of-sight class"))
    }
}

type SampleRepr = ((f64, f64), LosClass);

/// A classified coordinate, serialized as `[[lat, lon], class]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "SampleRepr", from = "SampleRepr")]
pub struct SamplePoint {
    pub location: LatLon,
    pub class: LosClass,
}

impl From<SamplePoint> for SampleRepr {
    fn from(point: SamplePoint) -> Self {
        ((point.location.latitude, point.location.longitude), point.class)
    }
}

impl From<SampleRepr> for SamplePoint {
    fn from(((latitude, longitude), class): SampleRepr) -> Self {
        SamplePoint { location: LatLon { latitude, longitude }, class }
    }
}

/// Classified samples along one radial path, antenna first.
pub type Ray = Vec<SamplePoint>;

/// Terrain-masking classifier for a single ray.
///
/// Walking outward, the classifier keeps the last visible surface point (the
/// peak). A sample is visible when the straight line from the antenna to the
/// receiver passes above that peak; a visible sample then becomes the new
/// peak. Once a receiver is seen above the antenna at an angle steeper than
/// the downtilt, every later sample on the ray is shadowed.
pub struct HorizonClassifier<'a> {
    pub config: &'a LosConfig,
    pub surface: &'a dyn ElevationService,
    pub ground: &'a dyn ElevationService,
}

impl<'a> HorizonClassifier<'a> {
    pub fn new(
        config: &'a LosConfig,
        surface: &'a dyn ElevationService,
        ground: &'a dyn ElevationService,
    ) -> Self {
        Self { config, surface, ground }
    }

    /// Surface elevation plus receiver height, or the failure sentinel.
    pub fn receiver_elevation(&self, loc: LatLon) -> f64 {
        match self.surface.elevation(loc) {
            Elevation::Value(h) => h + self.config.receiver_height_m,
            Elevation::Unavailable => FAILED_LOOKUP_ELEVATION,
        }
    }

    pub fn classify(
        &self,
        path: &[LatLon],
        antenna: &Antenna,
        bounds: &SectorBounds,
        bearing_deg: f64,
    ) -> Ray {
        let min_los = self.config.min_los_samples;

        if !bounds.contains(bearing_deg) {
            return path
                .iter()
                .enumerate()
                .map(|(index, &location)| SamplePoint {
                    location,
                    class: if index < min_los { LosClass::Los } else { LosClass::LosOutsideRegion },
                })
                .collect();
        }

        let antenna_elev = antenna.elevation_m(self.config.antenna_height_unit);
        let mut tracker = match path.get(min_los.saturating_sub(1)) {
            Some(&start) => PeakTracker {
                elevation: self.receiver_elevation(start),
                location: start,
                reached_downtilt_limit: false,
            },
            // Ray too short to leave the always-clear zone.
            None => {
                return path
                    .iter()
                    .map(|&location| SamplePoint { location, class: LosClass::Los })
                    .collect();
            }
        };

        path.iter()
            .enumerate()
            .map(|(index, &location)| {
                let class = if index < min_los {
                    LosClass::Los
                } else {
                    self.classify_sample(&mut tracker, antenna, antenna_elev, location)
                };
                SamplePoint { location, class }
            })
            .collect()
    }

    fn classify_sample(
        &self,
        tracker: &mut PeakTracker,
        antenna: &Antenna,
        antenna_elev: f64,
        location: LatLon,
    ) -> LosClass {
        if tracker.reached_downtilt_limit {
            return LosClass::Nlos;
        }

        let receiver_elev = self.receiver_elevation(location);

        if receiver_elev > antenna_elev {
            let angle = elevation_angle_deg(antenna.location, antenna_elev, location, receiver_elev);
            if angle > antenna.downtilt_deg || antenna.downtilt_deg <= 0.0 {
                tracker.reached_downtilt_limit = true;
            }
        }

        let ray_height = projected_ray_height(
            antenna.location,
            antenna_elev,
            location,
            receiver_elev,
            tracker.location,
        );

        if tracker.elevation >= ray_height {
            return LosClass::Nlos;
        }

        let surface_elev = receiver_elev - self.config.receiver_height_m;
        tracker.elevation = surface_elev;
        tracker.location = location;

        // Without a bare-ground reading there is no structure to measure.
        match self.ground.elevation(location) {
            Elevation::Value(ground) if surface_elev - ground > self.config.building_min_height_m => {
                LosClass::LosInBuilding
            }
            _ => LosClass::Los,
        }
    }
}

struct PeakTracker {
    elevation: f64,
    location: LatLon,
    reached_downtilt_limit: bool,
}

/// Height of the antenna-to-receiver sight line above the peak location.
///
/// The vertical drop from antenna to receiver is scaled by the peak's
/// distance from the receiver relative to the antenna's distance from it.
pub fn projected_ray_height(
    antenna: LatLon,
    antenna_elev: f64,
    receiver: LatLon,
    receiver_elev: f64,
    peak: LatLon,
) -> f64 {
    let adj = haversine_distance(antenna, receiver);
    if adj <= 0.0 {
        return receiver_elev;
    }
    let peak_adj = haversine_distance(peak, receiver);
    receiver_elev + (antenna_elev - receiver_elev) * peak_adj / adj
}
