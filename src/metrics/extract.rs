//! Time-series extraction from metric logs
//!
//! Two views of the same log are supported:
//!
//! - **training**: windowed averages of the loss components, emitted every
//!   `emit_every` iterations
//! - **disentanglement**: the evaluation scores in file order, plus the last
//!   reconstruction loss logged on a non-scored record

use std::path::Path;

use serde::Serialize;

use super::{load_metric_log, LossComponent, MetricRecord};
use crate::error::{Error, Result};

/// Default number of raw steps a training point averages over.
pub const DEFAULT_WINDOW: u32 = 10;

/// Default iteration stride between emitted training points.
pub const DEFAULT_EMIT_EVERY: u64 = 1000;

/// Reconstruction loss reported when a log has no non-scored record.
pub const NO_RECON_LOSS: f64 = -1.0;

/// Knobs of the training extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    window: u32,
    emit_every: u64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            emit_every: DEFAULT_EMIT_EVERY,
        }
    }
}

impl ExtractOptions {
    /// Create options with an explicit window and emit stride.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if either value is zero.
    pub fn new(window: u32, emit_every: u64) -> Result<Self> {
        if window == 0 {
            return Err(Error::InvalidConfig("window must be positive".to_string()));
        }
        if emit_every == 0 {
            return Err(Error::InvalidConfig(
                "emit_every must be positive".to_string(),
            ));
        }
        Ok(Self { window, emit_every })
    }

    /// Divisor applied to each window sum.
    #[must_use]
    pub const fn window(&self) -> u32 {
        self.window
    }

    /// Iteration stride between emitted points.
    #[must_use]
    pub const fn emit_every(&self) -> u64 {
        self.emit_every
    }
}

/// Windowed loss curves of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrainingSeries {
    iters: Vec<u64>,
    vae_loss: Vec<f64>,
    d_loss: Vec<f64>,
    recon_loss: Vec<f64>,
    tc_loss: Vec<f64>,
}

impl TrainingSeries {
    /// Assemble a series from aligned columns (vae, D, recon, tc).
    #[must_use]
    pub fn from_columns(iters: Vec<u64>, columns: [Vec<f64>; 4]) -> Self {
        let [vae_loss, d_loss, recon_loss, tc_loss] = columns;
        Self {
            iters,
            vae_loss,
            d_loss,
            recon_loss,
            tc_loss,
        }
    }

    /// Get the emitted iterations.
    #[must_use]
    pub fn iters(&self) -> &[u64] {
        &self.iters
    }

    /// Get the curve of one loss component, aligned with [`Self::iters`].
    #[must_use]
    pub fn component(&self, component: LossComponent) -> &[f64] {
        match component {
            LossComponent::Vae => &self.vae_loss,
            LossComponent::Discriminator => &self.d_loss,
            LossComponent::Reconstruction => &self.recon_loss,
            LossComponent::TotalCorrelation => &self.tc_loss,
        }
    }

    /// Get the reconstruction loss curve.
    #[must_use]
    pub fn recon_loss(&self) -> &[f64] {
        &self.recon_loss
    }

    /// Get the total-correlation loss curve.
    #[must_use]
    pub fn tc_loss(&self) -> &[f64] {
        &self.tc_loss
    }

    /// Number of emitted points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iters.len()
    }

    /// Whether no point was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iters.is_empty()
    }

    fn push(&mut self, its: u64, values: [f64; 4]) {
        self.iters.push(its);
        self.vae_loss.push(values[0]);
        self.d_loss.push(values[1]);
        self.recon_loss.push(values[2]);
        self.tc_loss.push(values[3]);
    }
}

/// Disentanglement score curve of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisentanglementSeries {
    iters: Vec<u64>,
    scores: Vec<f64>,
    final_recon_loss: f64,
}

impl Default for DisentanglementSeries {
    fn default() -> Self {
        Self {
            iters: vec![0],
            scores: vec![0.0],
            final_recon_loss: NO_RECON_LOSS,
        }
    }
}

impl DisentanglementSeries {
    /// Assemble a series from aligned iterations and scores.
    #[must_use]
    pub fn from_parts(iters: Vec<u64>, scores: Vec<f64>, final_recon_loss: f64) -> Self {
        Self {
            iters,
            scores,
            final_recon_loss,
        }
    }

    /// Get the evaluation iterations, starting with the implicit 0.
    #[must_use]
    pub fn iters(&self) -> &[u64] {
        &self.iters
    }

    /// Get the scores, aligned with [`Self::iters`].
    #[must_use]
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Get the reconstruction loss of the last non-scored record.
    #[must_use]
    pub const fn final_recon_loss(&self) -> f64 {
        self.final_recon_loss
    }

    /// Get the last score, the one a run is judged by.
    #[must_use]
    pub fn final_score(&self) -> f64 {
        self.scores.last().copied().unwrap_or(0.0)
    }

    /// Number of points, including the implicit initial one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iters.len()
    }

    /// Whether the series has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iters.is_empty()
    }
}

/// Average the loss components of the training records up to `cutoff`.
///
/// Only records carrying `vae_loss` take part. A record whose `its` is a
/// multiple of `emit_every` closes the window: the sums divided by `window`
/// are emitted at that iteration and the window restarts. The boundary at
/// iteration 0 only restarts the window. Other records add all four
/// components to the window.
///
/// # Errors
///
/// Returns `MissingField` if a windowed record lacks one of the components.
pub fn extract_train_metrics(
    records: &[MetricRecord],
    cutoff: u64,
    options: ExtractOptions,
) -> Result<TrainingSeries> {
    let divisor = f64::from(options.window);
    let mut series = TrainingSeries::default();
    let mut sums = [0.0_f64; 4];

    for record in records.iter().filter(|r| r.is_training_step()) {
        let its = record.its();
        if its > cutoff {
            continue;
        }
        if its % options.emit_every == 0 {
            if its > 0 {
                series.push(its, sums.map(|sum| sum / divisor));
            }
            sums = [0.0; 4];
        } else {
            for (sum, component) in sums.iter_mut().zip(LossComponent::ALL) {
                *sum += record.require(component)?;
            }
        }
    }

    Ok(series)
}

/// Collect the disentanglement scores logged up to `cutoff`.
///
/// The series starts at `(0, 0.0)`; each scored record appends
/// `(its, metric_score)` in file order and each non-scored record replaces
/// the final reconstruction loss.
///
/// # Errors
///
/// Returns `MissingField` if a non-scored record lacks `recon_loss`.
pub fn extract_disentanglement_metric(
    records: &[MetricRecord],
    cutoff: u64,
) -> Result<DisentanglementSeries> {
    let mut series = DisentanglementSeries::default();

    for record in records.iter().filter(|r| r.its() <= cutoff) {
        match record.metric_score() {
            Some(score) => {
                series.iters.push(record.its());
                series.scores.push(score);
            }
            None => {
                series.final_recon_loss = record.require(LossComponent::Reconstruction)?;
            }
        }
    }

    Ok(series)
}

/// Load a metric log and run [`extract_train_metrics`] on it.
///
/// # Errors
///
/// Propagates load and extraction errors.
pub fn extract_train_metrics_from_path(
    path: impl AsRef<Path>,
    cutoff: u64,
    options: ExtractOptions,
) -> Result<TrainingSeries> {
    let records = load_metric_log(path)?;
    extract_train_metrics(&records, cutoff, options)
}

/// Load a metric log and run [`extract_disentanglement_metric`] on it.
///
/// # Errors
///
/// Propagates load and extraction errors.
pub fn extract_disentanglement_metric_from_path(
    path: impl AsRef<Path>,
    cutoff: u64,
) -> Result<DisentanglementSeries> {
    let records = load_metric_log(path)?;
    extract_disentanglement_metric(&records, cutoff)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train(its: u64, value: f64) -> MetricRecord {
        MetricRecord::builder(0, its)
            .losses(value, value, value, value)
            .build()
    }

    #[test]
    fn test_window_divides_by_fixed_size() {
        let records = vec![
            train(0, 9.0),
            train(100, 2.0),
            train(200, 4.0),
            train(1000, 0.0),
        ];
        let series = extract_train_metrics(&records, 5000, ExtractOptions::default()).unwrap();
        assert_eq!(series.iters(), &[1000]);
        assert!((series.recon_loss()[0] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_cutoff_drops_later_records() {
        let records = vec![train(500, 1.0), train(1000, 0.0), train(1500, 1.0), train(2000, 0.0)];
        let series = extract_train_metrics(&records, 1000, ExtractOptions::default()).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_non_training_records_ignored() {
        let records = vec![
            train(500, 10.0),
            MetricRecord::builder(1, 600).metric_score(0.9).build(),
            train(1000, 0.0),
        ];
        let series = extract_train_metrics(&records, 2000, ExtractOptions::default()).unwrap();
        assert!((series.tc_loss()[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_disentanglement_defaults() {
        let series = extract_disentanglement_metric(&[], 10).unwrap();
        assert_eq!(series.iters(), &[0]);
        assert_eq!(series.scores(), &[0.0]);
        assert!((series.final_recon_loss() - NO_RECON_LOSS).abs() < f64::EPSILON);
    }

    #[test]
    fn test_options_reject_zero() {
        assert!(ExtractOptions::new(0, 1000).is_err());
        assert!(ExtractOptions::new(10, 0).is_err());
        assert_eq!(ExtractOptions::new(5, 500).unwrap().window(), 5);
    }
}
