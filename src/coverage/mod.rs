use itertools::Itertools;
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Instant;

use crate::config::LosConfig;
use crate::error::{LosError, Result};
use crate::io::Antenna;
use crate::physics::los::{HorizonClassifier, Ray};
use crate::physics::paths::RadialPathGenerator;
use crate::physics::sector::SectorBounds;
use crate::terrain::ElevationService;

/// All classified rays of one antenna, in bearing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntennaGrid {
    pub antenna_id: u32,
    pub rays: Vec<Ray>,
}

/// Antenna id to grid, one entry per antenna.
pub type ResultMap = BTreeMap<u32, AntennaGrid>;

/// Runs the line-of-sight computation for a set of antennas.
///
/// Each antenna is an independent task that fills its own pre-sized output
/// slot; rays inside an antenna are classified in parallel as well. Both
/// elevation services are shared read-only.
pub struct LosEngine {
    config: LosConfig,
    antennas: Option<Vec<Antenna>>,
    surface: Option<Arc<dyn ElevationService>>,
    ground: Option<Arc<dyn ElevationService>>,
    progress: Option<Arc<AtomicU32>>,
    cancel: Option<Arc<AtomicBool>>,
}

impl LosEngine {
    pub fn new(config: LosConfig) -> Self {
        Self {
            config,
            antennas: None,
            surface: None,
            ground: None,
            progress: None,
            cancel: None,
        }
    }

    pub fn with_antennas(mut self, antennas: Vec<Antenna>) -> Self {
        self.antennas = Some(antennas);
        self
    }

    /// Surface model (terrain plus structures).
    pub fn with_surface(mut self, surface: Arc<dyn ElevationService>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Bare-ground model.
    pub fn with_ground(mut self, ground: Arc<dyn ElevationService>) -> Self {
        self.ground = Some(ground);
        self
    }

    /// Counter incremented once per classified ray.
    pub fn with_progress(mut self, progress: Arc<AtomicU32>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// When the flag is raised, the computation stops at the next ray and
    /// returns [`LosError::Cancelled`].
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn config(&self) -> &LosConfig {
        &self.config
    }

    /// Rays the progress counter reaches on success, saturating at `u32::MAX`.
    pub fn total_rays(&self) -> u32 {
        let antennas = self.antennas.as_ref().map_or(0, Vec::len);
        let rays = antennas.saturating_mul(RadialPathGenerator::new(&self.config).ray_count());
        u32::try_from(rays).unwrap_or(u32::MAX)
    }

    pub fn compute(&self) -> Result<ResultMap> {
        self.config.validate()?;
        let antennas = self
            .antennas
            .as_deref()
            .ok_or_else(|| LosError::Configuration("antenna list not supplied".to_string()))?;
        let surface = self
            .surface
            .as_deref()
            .ok_or_else(|| LosError::Configuration("surface elevation service not supplied".to_string()))?;
        let ground = self
            .ground
            .as_deref()
            .ok_or_else(|| LosError::Configuration("ground elevation service not supplied".to_string()))?;

        if let Some(id) = antennas.iter().map(|a| a.id).duplicates().next() {
            return Err(LosError::Configuration(format!("duplicate antenna id {id}")));
        }

        let paths = RadialPathGenerator::new(&self.config);
        let classifier = HorizonClassifier::new(&self.config, surface, ground);
        info!(
            "Computing line of sight for {} antennas: {} rays of {} samples each",
            antennas.len(),
            paths.ray_count(),
            paths.ray_len()
        );
        let t0 = Instant::now();

        let mut slots: Vec<Option<AntennaGrid>> = antennas.iter().map(|_| None).collect();
        if self.config.parallel {
            slots
                .par_iter_mut()
                .zip(antennas.par_iter())
                .try_for_each(|(slot, antenna)| -> Result<()> {
                    *slot = Some(self.antenna_grid(&classifier, &paths, antenna)?);
                    Ok(())
                })?;
        } else {
            for (slot, antenna) in slots.iter_mut().zip(antennas) {
                *slot = Some(self.antenna_grid(&classifier, &paths, antenna)?);
            }
        }

        let results = aggregate(slots);
        info!("Line of sight computed for {} antennas in {:?}", results.len(), t0.elapsed());
        Ok(results)
    }

    fn antenna_grid(
        &self,
        classifier: &HorizonClassifier<'_>,
        paths: &RadialPathGenerator,
        antenna: &Antenna,
    ) -> Result<AntennaGrid> {
        let bounds = SectorBounds::for_antenna(antenna)?;
        debug!(
            "Antenna {}: elevation {:.2} m, azimuth {}, downtilt {}, sector [{}, {}]",
            antenna.id,
            antenna.elevation_m(self.config.antenna_height_unit),
            antenna.azimuth_deg,
            antenna.downtilt_deg,
            bounds.lower_deg,
            bounds.upper_deg
        );

        let classify_ray = |ray_index: usize| -> Result<Ray> {
            if self.cancel.as_ref().is_some_and(|c| c.load(Ordering::Relaxed)) {
                return Err(LosError::Cancelled);
            }
            let path = paths.ray(antenna.location, ray_index);
            let ray = classifier.classify(&path, antenna, &bounds, paths.bearing_deg(ray_index));
            if let Some(p) = &self.progress {
                p.fetch_add(1, Ordering::Relaxed);
            }
            Ok(ray)
        };

        let rays = if self.config.parallel {
            (0..paths.ray_count())
                .into_par_iter()
                .map(classify_ray)
                .collect::<Result<Vec<_>>>()?
        } else {
            (0..paths.ray_count())
                .map(classify_ray)
                .collect::<Result<Vec<_>>>()?
        };

        debug!("Antenna {} done", antenna.id);
        Ok(AntennaGrid {
            antenna_id: antenna.id,
            rays,
        })
    }
}

/// Merges filled per-antenna slots into the result map.
pub fn aggregate(slots: Vec<Option<AntennaGrid>>) -> ResultMap {
    slots
        .into_iter()
        .flatten()
        .map(|grid| (grid.antenna_id, grid))
        .collect()
}
