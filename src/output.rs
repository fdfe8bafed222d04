//! Output formatting and persistence for analyzer results.
//!
//! Supports pretty-printing, JSON logging, and CSV append.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use csv::WriterBuilder;
use std::fmt::Debug;
use std::fs::{self, OpenOptions};

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl Debug) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends one record per item as CSV rows.
///
/// The header row is written when the file is missing or still empty, so an
/// earlier export with no rows does not leave a headerless file behind.
/// Records must serialize to flat rows.
pub fn append_records<T: Serialize>(path: &str, records: &[T]) -> Result<()> {
    if records.is_empty() {
        debug!(path, "No CSV records to append");
        return Ok(());
    }

    let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    debug!(path, needs_header, rows = records.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}
