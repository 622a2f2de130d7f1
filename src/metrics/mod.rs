//! Metric extraction from per-run JSON logs
//!
//! ## Log Format
//!
//! ```text
//! metrics.json = [ record, record, ... ]
//! record       = { "its": 1200, "vae_loss": .., "D_loss": .., "recon_loss": .., "tc_loss": .. }
//!              | { "its": 5000, "metric_score": .. }
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use factorvae_report::metrics::{
//!     extract_disentanglement_metric, records_from_values, MetricRecord,
//! };
//!
//! let entries = vec![
//!     serde_json::json!({"its": 500, "recon_loss": 41.0}),
//!     serde_json::json!({"its": 1000, "metric_score": 0.62}),
//! ];
//! let records = records_from_values(&entries)?;
//! let series = extract_disentanglement_metric(&records, 10_000)?;
//!
//! assert_eq!(series.iters(), &[0, 1000]);
//! assert_eq!(series.final_recon_loss(), 41.0);
//! # Ok::<(), factorvae_report::Error>(())
//! ```

mod extract;
mod log;
mod metric_record;

pub use extract::{
    extract_disentanglement_metric, extract_disentanglement_metric_from_path,
    extract_train_metrics, extract_train_metrics_from_path, DisentanglementSeries,
    ExtractOptions, TrainingSeries, DEFAULT_EMIT_EVERY, DEFAULT_WINDOW, NO_RECON_LOSS,
};
pub use log::{load_metric_log, records_from_values, METRICS_FILE};
pub use metric_record::{LossComponent, MetricRecord, MetricRecordBuilder};
