//! Metric log loading
//!
//! A run's `metrics.json` is read in one shot and parsed eagerly; the first
//! malformed entry aborts the load.

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::MetricRecord;
use crate::error::{Error, Result};

/// File name of the metric log inside each run directory.
pub const METRICS_FILE: &str = "metrics.json";

/// Load and validate every record of a metric log.
///
/// # Errors
///
/// Returns `Read` if the file cannot be read, `Json` if it is not valid
/// JSON, `NotAnArray` if the top level is not an array, and the
/// record-level errors of [`MetricRecord::from_value`].
pub fn load_metric_log(path: impl AsRef<Path>) -> Result<Vec<MetricRecord>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&text)?;
    let Value::Array(entries) = value else {
        return Err(Error::NotAnArray {
            path: path.to_path_buf(),
        });
    };
    records_from_values(&entries)
}

/// Convert already-parsed log entries into records.
///
/// # Errors
///
/// Fails on the first entry that is not a valid record.
pub fn records_from_values(entries: &[Value]) -> Result<Vec<MetricRecord>> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| MetricRecord::from_value(index, entry))
        .collect()
}
