use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::config::HeightUnit;
use crate::coverage::ResultMap;
use crate::error::{LosError, Result};
use crate::geo::LatLon;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Antenna {
    pub id: u32,
    pub location: LatLon,
    pub height: f64,           // mast height, see HeightUnit
    pub frequency: f64,
    pub erp: f64,              // effective radiated power
    pub beam_name: String,     // "OMNI" or a leading sector width, e.g. "65SECT"
    pub azimuth_deg: f64,
    pub downtilt_deg: f64,     // <= 0 means no tilt limit
    pub bandwidth: f64,
    pub beam_attenuation: f64,
    pub ground_elevation: f64, // at the mast, see HeightUnit
}

impl Antenna {
    /// Elevation of the radiating element above the datum, in meters.
    pub fn elevation_m(&self, unit: HeightUnit) -> f64 {
        unit.to_meters(self.height + self.ground_elevation)
    }
}

// Column order of the antenna file.
const LAT: usize = 0;
const LON: usize = 1;
const HGT: usize = 2;
const FRQ: usize = 3;
const ERP: usize = 4;
const NAME: usize = 5;
const AZ: usize = 6;
const DT: usize = 7;
const BW: usize = 8;
const BA: usize = 9;
const GNDELV: usize = 10;

pub fn load_antennas_from_csv(path: impl AsRef<Path>) -> Result<Vec<Antenna>> {
    let file = File::open(path)?;
    read_antennas(std::io::BufReader::new(file))
}

/// Reads `;`-separated antenna rows without a header. Ids follow file order
/// starting at 1.
pub fn read_antennas<R: Read>(reader: R) -> Result<Vec<Antenna>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut antennas = Vec::new();
    for (idx, record) in csv_reader.records().enumerate() {
        let record = record?;
        let line = record.position().map_or(idx as u64 + 1, |p| p.line());

        let number = |column| parse_number(&record, line, column);

        antennas.push(Antenna {
            id: idx as u32 + 1,
            location: LatLon::new(number(LAT)?, number(LON)?),
            height: number(HGT)?,
            frequency: number(FRQ)?,
            erp: number(ERP)?,
            beam_name: field(&record, line, NAME)?.to_string(),
            azimuth_deg: number(AZ)?,
            downtilt_deg: number(DT)?,
            bandwidth: number(BW)?,
            beam_attenuation: number(BA)?,
            ground_elevation: number(GNDELV)?,
        });
    }

    if antennas.is_empty() {
        return Err(LosError::Configuration("antenna file is empty".to_string()));
    }
    Ok(antennas)
}

fn field(record: &csv::StringRecord, line: u64, column: usize) -> Result<&str> {
    record.get(column).ok_or_else(|| LosError::AntennaRecord {
        line,
        column,
        message: format!("expected 11 columns, found {}", record.len()),
    })
}

fn parse_number(record: &csv::StringRecord, line: u64, column: usize) -> Result<f64> {
    let raw = field(record, line, column)?;
    raw.parse::<f64>().map_err(|e| LosError::AntennaRecord {
        line,
        column,
        message: format!("{raw:?}: {e}"),
    })
}

pub fn dataset_filename(antenna_id: u32) -> String {
    format!("los_dataset_{antenna_id}.json")
}

/// Writes one JSON file per antenna into `output_dir`, creating it if absent.
pub fn save_results(results: &ResultMap, output_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    if !output_dir.exists() {
        log::info!("Creating output directory {}", output_dir.display());
        std::fs::create_dir_all(output_dir)?;
    }

    let mut written = Vec::with_capacity(results.len());
    for (id, grid) in results {
        let path = output_dir.join(dataset_filename(*id));
        let mut writer = BufWriter::new(File::create(&path)?);

        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
        grid.rays.serialize(&mut ser)?;
        writer.flush()?;

        log::info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
