//! Error types for factorvae-report
//!
//! Every failure aborts the pipeline that raised it: a malformed log or a
//! seed mismatch never yields a partial plot.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// factorvae-report error types
#[derive(Error, Debug)]
pub enum Error {
    /// A metric log entry was not a JSON object
    #[error("Got unexpected variable type at record {index}: expected an object, found {found}")]
    UnexpectedRecordType {
        /// Position of the entry in the log array
        index: usize,
        /// JSON kind that was found instead
        found: &'static str,
    },

    /// A metric log entry lacks a field the extraction needs
    #[error("Record {index} is missing required field `{field}`")]
    MissingField {
        /// Position of the entry in the log array
        index: usize,
        /// Name of the missing field
        field: &'static str,
    },

    /// A known field of a metric log entry has the wrong JSON type
    #[error("Record {index} field `{field}` has unexpected type {found}")]
    InvalidField {
        /// Position of the entry in the log array
        index: usize,
        /// Name of the field
        field: &'static str,
        /// JSON kind that was found
        found: &'static str,
    },

    /// The metric log file is not a JSON array
    #[error("Metric log {path} must contain a JSON array of records")]
    NotAnArray {
        /// Path of the offending log
        path: PathBuf,
    },

    /// A run directory name lacks one of the naming markers
    #[error("Invalid run name `{name}`: {reason}")]
    InvalidRunName {
        /// Directory name
        name: String,
        /// What was missing or malformed
        reason: String,
    },

    /// Seeds of the same hyperparameter combination produced different lengths
    #[error("Series length mismatch for `{run}`: expected {expected} points, seed `{seed}` produced {actual}")]
    SeriesLengthMismatch {
        /// Label of the hyperparameter combination
        run: String,
        /// Seed whose series disagreed
        seed: String,
        /// Length of the first seed's series
        expected: usize,
        /// Length of the disagreeing series
        actual: usize,
    },

    /// Seeds of the same hyperparameter combination logged points at different iterations
    #[error("Iteration mismatch for `{run}` at point {position}: expected iteration {expected}, seed `{seed}` has {actual}")]
    IterationMismatch {
        /// Label of the hyperparameter combination
        run: String,
        /// Seed whose iterations disagreed
        seed: String,
        /// Index of the first disagreeing point
        position: usize,
        /// Iteration of the first seed at that point
        expected: u64,
        /// Iteration of the disagreeing seed at that point
        actual: u64,
    },

    /// No seeds were configured
    #[error("At least one seed is required to aggregate runs")]
    NoSeeds,

    /// Configuration values are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Chart rendering failed
    #[error("Plot error: {0}")]
    Plot(String),

    /// Reading a file or directory failed
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that could not be read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap a rendering backend error.
    pub fn plot(err: impl std::fmt::Display) -> Self {
        Self::Plot(err.to_string())
    }
}
