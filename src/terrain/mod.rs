use std::path::PathBuf;
use std::fs::File;
use std::io::Read;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use anyhow::{Result, Context};
use lru::LruCache;
use crate::geo::LatLon;

pub const SRTM3_SIZE: usize = 1201;
pub const SRTM1_SIZE: usize = 3601;
/// SRTM marker for cells without data.
pub const SRTM_VOID: i16 = -32768;

/// Outcome of a single elevation lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Elevation {
    Value(f64),
    Unavailable,
}

/// Read-only elevation source. Implementations are shared across worker
/// threads and must report failures as [`Elevation::Unavailable`].
pub trait ElevationService: Send + Sync {
    fn elevation(&self, loc: LatLon) -> Elevation;
}

#[derive(Debug, Clone)]
pub struct TerrainTile {
    pub latitude: i32,
    pub longitude: i32,
    pub size: usize,
    pub data: Vec<i16>, // Row-major, big-endian parsed
}

impl TerrainTile {
    /// Returns altitude in meters at local coordinates (0.0 to 1.0) where
    /// (0,0) is top-left (NW) and (1,1) is bottom-right (SE). `None` when any
    /// contributing cell is void.
    pub fn sample(&self, u: f64, v: f64) -> Option<f64> {
        let max_idx = (self.size - 1) as f64;
        let x = (u * max_idx).clamp(0.0, max_idx);
        let y = (v * max_idx).clamp(0.0, max_idx);

        // Bilinear interpolation
        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.size - 1);
        let y1 = (y0 + 1).min(self.size - 1);

        let tx = x - x0 as f64;
        let ty = y - y0 as f64;

        let h00 = self.height(x0, y0)?;
        let h10 = self.height(x1, y0)?;
        let h01 = self.height(x0, y1)?;
        let h11 = self.height(x1, y1)?;

        let h0 = h00 * (1.0 - tx) + h10 * tx;
        let h1 = h01 * (1.0 - tx) + h11 * tx;

        Some(h0 * (1.0 - ty) + h1 * ty)
    }

    #[inline(always)]
    pub fn get_height(&self, x: usize, y: usize) -> i16 {
        self.data[y * self.size + x]
    }

    fn height(&self, x: usize, y: usize) -> Option<f64> {
        match self.get_height(x, y) {
            SRTM_VOID => None,
            h => Some(h as f64),
        }
    }
}

pub struct TerrainLoader {
    pub assets_path: PathBuf,
}

impl TerrainLoader {
    pub fn new(assets_path: PathBuf) -> Self {
        Self { assets_path }
    }

    pub fn tile_filename(lat: i32, lon: i32) -> String {
        format!("{}{:02}{}{:03}.hgt",
            if lat >= 0 { "N" } else { "S" }, lat.abs(),
            if lon >= 0 { "E" } else { "W" }, lon.abs()
        )
    }

    /// Loads the tile whose south-west corner is (`lat`, `lon`). `Ok(None)`
    /// when the raster has no file for that cell.
    pub fn load_tile(&self, lat: i32, lon: i32) -> Result<Option<TerrainTile>> {
        let path = self.assets_path.join(Self::tile_filename(lat, lon));
        if !path.exists() {
            return Ok(None);
        }

        let mut file = File::open(&path).with_context(|| format!("Failed to open {:?}", path))?;
        let metadata = file.metadata()?;
        let size = match metadata.len() {
            2884802 => SRTM3_SIZE,
            25934402 => SRTM1_SIZE,
            len => anyhow::bail!("Unknown HGT file size for {:?}: {}", path, len),
        };

        let mut buffer = Vec::with_capacity(size * size * 2);
        file.read_to_end(&mut buffer)?;

        let data: Vec<i16> = buffer
            .chunks_exact(2)
            .map(|chunk| i16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();

        Ok(Some(TerrainTile {
            latitude: lat,
            longitude: lon,
            size,
            data,
        }))
    }
}

pub type TileSlot = Option<Arc<TerrainTile>>;

/// SRTM `.hgt` elevation service. Decoded tiles (and the knowledge that a
/// tile is absent) are kept in an LRU so concurrent rays share raster reads.
pub struct TerrainManager {
    loader: TerrainLoader,
    cache: Mutex<LruCache<(i32, i32), TileSlot>>,
}

impl TerrainManager {
    pub fn new(loader: TerrainLoader, cache_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            loader,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Cached tile lookup. The cache lock is held across a load so workers
    /// missing the same tile wait for one read instead of repeating it.
    pub fn get_tile(&self, lat: i32, lon: i32) -> Result<TileSlot> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = cache.get(&(lat, lon)) {
            return Ok(slot.clone());
        }

        // Unreadable tiles are remembered as absent so the failure is reported once.
        match self.loader.load_tile(lat, lon) {
            Ok(tile) => {
                let slot = tile.map(Arc::new);
                cache.put((lat, lon), slot.clone());
                Ok(slot)
            }
            Err(e) => {
                cache.put((lat, lon), None);
                Err(e)
            }
        }
    }
}

impl ElevationService for TerrainManager {
    fn elevation(&self, loc: LatLon) -> Elevation {
        if !loc.is_finite() || loc.latitude.abs() > 90.0 {
            return Elevation::Unavailable;
        }
        let lat_deg = loc.latitude.floor() as i32;
        let lon_deg = loc.longitude.floor() as i32;

        match self.get_tile(lat_deg, lon_deg) {
            Ok(Some(tile)) => {
                let u = loc.longitude - lon_deg as f64;
                // Rows run north to south: v = 0 is the tile's top edge at lat_deg + 1.
                let v = (lat_deg as f64 + 1.0) - loc.latitude;
                tile.sample(u, v).map_or(Elevation::Unavailable, Elevation::Value)
            }
            Ok(None) => Elevation::Unavailable,
            Err(e) => {
                log::warn!("Elevation lookup at {:?} failed: {:#}", loc, e);
                Elevation::Unavailable
            }
        }
    }
}
