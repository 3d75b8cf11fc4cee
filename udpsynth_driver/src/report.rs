//! Per-primitive batch records and their CSV form.

use std::fs::File;
use std::io;
use std::path::Path;

use serde::Serialize;
use udpsynth_common::ConvertError;
use udpsynth_core::Conversion;

use crate::driver::DriverError;

/// Outcome of one primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Replaced by a generated module.
    Converted,
    /// Left verbatim.
    Failed,
}

/// One row of a batch report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionRecord {
    /// Source file, or a caller-chosen label for in-memory text.
    pub file: String,
    /// Primitive name.
    pub primitive: String,
    /// Line the primitive starts on.
    pub line: usize,
    /// Converted or failed.
    pub status: Status,
    /// `combinational`/`sequential`, or the error kind for failures.
    pub kind: String,
    /// Table rows in the source.
    pub rows: Option<usize>,
    /// Rows the generated module implements.
    pub retained: Option<usize>,
    /// Error message for failures.
    pub message: Option<String>,
    /// Warnings, `; `-separated.
    pub warnings: String,
}

impl ConversionRecord {
    /// Record for a successful conversion.
    #[must_use]
    pub fn converted(file: &str, line: usize, conversion: &Conversion) -> Self {
        Self {
            file: file.to_string(),
            primitive: conversion.name().to_string(),
            line,
            status: Status::Converted,
            kind: conversion.kind.to_string(),
            rows: Some(conversion.module.source_rows),
            retained: Some(conversion.retained_rows),
            message: None,
            warnings: conversion
                .warnings
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        }
    }

    /// Record for a failed conversion. `primitive` is the name the library
    /// scan found, which the error may not know.
    #[must_use]
    pub fn failed(file: &str, primitive: &str, line: usize, error: &ConvertError) -> Self {
        Self {
            file: file.to_string(),
            primitive: primitive.to_string(),
            line,
            status: Status::Failed,
            kind: error.kind_name().to_string(),
            rows: None,
            retained: None,
            message: Some(error.to_string()),
            warnings: String::new(),
        }
    }

    /// Returns true if the primitive was converted.
    #[must_use]
    pub fn is_converted(&self) -> bool {
        self.status == Status::Converted
    }
}

/// Writes `records` as CSV with a header row.
///
/// # Errors
///
/// Returns [`DriverError::Csv`] if a record cannot be serialized and
/// [`DriverError::Io`] if the writer fails.
pub fn write_report_to<W: io::Write>(records: &[ConversionRecord], writer: W) -> Result<(), DriverError> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes `records` as a CSV file at `path`.
///
/// # Errors
///
/// Returns [`DriverError::Io`] if the file cannot be created or written.
pub fn write_report<P: AsRef<Path>>(records: &[ConversionRecord], path: P) -> Result<(), DriverError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_report_to(records, io::BufWriter::new(file))?;
    tracing::info!("wrote {} report rows to {}", records.len(), path.display());
    Ok(())
}
