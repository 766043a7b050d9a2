//! CSV import of horizon series and export of dispatch tables.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::domain::{DispatchResult, HorizonRecord, HorizonSeries};
use crate::error::{DispatchError, Result};

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Input row; extra columns (temperature etc.) are ignored.
#[derive(Debug, Deserialize)]
struct HorizonRow {
    // pandas writes the index column with an empty header
    #[serde(alias = "")]
    timestamp: String,
    load_kw: f64,
    solar_pu: f64,
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Read and validate a horizon from CSV with a `timestamp,load_kw,solar_pu` header.
pub fn read_horizon(reader: impl Read) -> Result<HorizonSeries> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();
    for (line, row) in rdr.deserialize::<HorizonRow>().enumerate() {
        let row = row.map_err(|err| DispatchError::Input(format!("row {}: {}", line + 1, err)))?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
            DispatchError::Input(format!(
                "row {}: unrecognised timestamp '{}'",
                line + 1,
                row.timestamp
            ))
        })?;
        records.push(HorizonRecord::new(timestamp, row.load_kw, row.solar_pu));
    }
    HorizonSeries::try_new(records)
}

pub fn read_horizon_file(path: &Path) -> Result<HorizonSeries> {
    let file = File::open(path)
        .map_err(|err| DispatchError::Input(format!("{}: {}", path.display(), err)))?;
    read_horizon(io::BufReader::new(file))
}

/// Write one row per timestep:
/// `timestamp,gen_power,gen_status,bat_soc,bat_charge,bat_discharge,solar_used,load`.
pub fn write_dispatch(result: &DispatchResult, writer: impl Write) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in result.iter() {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_dispatch_file(result: &DispatchResult, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)?;
    write_dispatch(result, io::BufWriter::new(file))
}
