//! # factorvae-report: Seed-Averaged FactorVAE Training Reports
//!
//! Reads the `metrics.json` logs written by FactorVAE and AD-FactorVAE
//! training runs, averages them across seeds per hyperparameter setting,
//! and renders the curves and the method comparison as PNG charts.
//!
//! ## Pipeline
//!
//! - **Extraction** ([`metrics`]): one log to aligned time series
//! - **Aggregation** ([`aggregate`], [`run_id`]): checkpoint root to
//!   seed-averaged series per (gamma, lambda) setting
//! - **Rendering** ([`plot`]): series to charts
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use factorvae_report::aggregate::{Aggregator, RunFilter};
//! use factorvae_report::plot;
//!
//! let filter = RunFilter::new(["seed1", "seed2"], ["4", "6"], ["10"])?;
//! let aggregator = Aggregator::new("checkpoints/ad_factorvae", filter, 100_000);
//!
//! let curves = aggregator.training_curves()?;
//! plot::render_train_loss(Path::new("train_loss.png"), &curves, true)?;
//! # Ok::<(), factorvae_report::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod aggregate;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod plot;
pub mod run_id;

pub use config::ReportConfig;
pub use error::{Error, Result};
pub use run_id::RunId;
