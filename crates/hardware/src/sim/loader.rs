//! Hint files and predictor selection.
//!
//! A hint file is a flat sequence of 96-byte eviction records with no header.
//! Aligned runs write one at the end of the simulation; flexible runs read the
//! one matching their geometry to train the region predictor.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::{info, warn};

use crate::common::{Result, SimError};
use crate::config::{AccessMode, SimConfig};
use crate::core::predict::{
    AlignedPredictor, ExactPredictor, FetchPredictor, RegionHistogram, RegionPredictor,
};
use crate::core::record::EvictionRecord;

/// Reads every record from `reader`. A trailing partial record is dropped
/// with a warning.
pub fn read_hints_from<R: Read>(reader: R) -> io::Result<Vec<EvictionRecord>> {
    let mut reader = BufReader::new(reader);
    let mut records = Vec::new();
    loop {
        match EvictionRecord::read_from(&mut reader) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => break,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                warn!("Ignoring truncated record after {} hints: {}", records.len(), e);
                break;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(records)
}

/// Reads the hint file at `path`.
pub fn read_hints(path: &Path) -> Result<Vec<EvictionRecord>> {
    Ok(read_hints_from(File::open(path)?)?)
}

/// Writes `records` to `path`, replacing any existing file.
pub fn dump_hints(path: &Path, records: &[EvictionRecord]) -> Result<()> {
    let dump_err = |source: io::Error| SimError::HintDump {
        path: path.to_path_buf(),
        source,
    };
    let mut w = BufWriter::new(File::create(path).map_err(dump_err)?);
    for record in records {
        record.write_to(&mut w).map_err(dump_err)?;
    }
    w.flush().map_err(dump_err)
}

/// Chooses the predictor for `config`.
///
/// Aligned runs fetch aligned chunks. Flexible runs train a region predictor
/// from the hint file of the matching aligned run; when there is no hint
/// directory or the file cannot be read they fetch exactly what is accessed.
pub fn build_predictor(config: &SimConfig) -> Box<dyn FetchPredictor> {
    if config.mode == AccessMode::Aligned {
        info!("Using standard aligned mode at {}B", config.max_gran_bytes);
        return Box::new(AlignedPredictor::new(config.max_gran_bytes));
    }

    let Some(dir) = &config.hint_dir else {
        info!("No hint directory given, using unaligned fallback");
        return Box::new(ExactPredictor);
    };

    let path = config.hint_load_path(dir);
    match read_hints(&path) {
        Ok(records) => {
            let histogram = RegionHistogram::from_records(&records, config.bin_size_bytes);
            info!(
                "Using region hints from {} ({} records, {} regions)",
                path.display(),
                records.len(),
                histogram.region_count()
            );
            Box::new(RegionPredictor::new(histogram, config.max_gran_bytes))
        }
        Err(e) => {
            warn!(
                "Could not read hints from {}: {}; using unaligned fallback",
                path.display(),
                e
            );
            Box::new(ExactPredictor)
        }
    }
}
