//! Export of samples and interval tables
//!
//! Reports are read-only diagnostics: an exported interval table cannot be
//! loaded back into a generator.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use serde::Serialize;

use crate::{Error, Result, types::IntervalSummary};

/// Output format, chosen from the file extension by the path helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
}

impl Format {
    /// `.json` selects JSON, anything else CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Csv,
        }
    }
}

#[derive(Serialize)]
struct SampleRow {
    x: f64,
}

/// Write samples as a single-column CSV with header `x`.
///
/// # Errors
///
/// Returns error if writing fails.
pub fn write_samples_csv<W: Write>(writer: W, samples: &[f64]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for &x in samples {
        csv.serialize(SampleRow { x })?;
    }
    csv.flush()?;
    Ok(())
}

/// Write one CSV row per interval.
///
/// # Errors
///
/// Returns error if writing fails.
pub fn write_intervals_csv<W: Write>(writer: W, intervals: &[IntervalSummary]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for iv in intervals {
        csv.serialize(iv)?;
    }
    csv.flush()?;
    Ok(())
}

/// Write any serializable report as pretty-printed JSON.
///
/// # Errors
///
/// Returns error if serialization or writing fails.
pub fn write_json<W: Write, T: Serialize + ?Sized>(mut writer: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// Save samples to `path` (CSV, or a JSON array for `.json`).
///
/// # Errors
///
/// Returns error if the file cannot be created or written.
pub fn export_samples(path: &Path, samples: &[f64]) -> Result<()> {
    let writer = create(path)?;
    match Format::from_path(path) {
        Format::Csv => write_samples_csv(writer, samples),
        Format::Json => write_json(writer, samples),
    }
}

/// Save an interval table to `path` (CSV, or JSON for `.json`).
///
/// # Errors
///
/// Returns error if the file cannot be created or written.
pub fn export_intervals(path: &Path, intervals: &[IntervalSummary]) -> Result<()> {
    let writer = create(path)?;
    match Format::from_path(path) {
        Format::Csv => write_intervals_csv(writer, intervals),
        Format::Json => write_json(writer, intervals),
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|source| Error::Io {
        operation: format!("create {}", path.display()),
        source,
    })?;
    Ok(BufWriter::new(file))
}
