//! Chart rendering with plotters
//!
//! Three charts are produced, each as a PNG:
//!
//! - `train_loss.png`: reconstruction and total-correlation curves, one
//!   panel each
//! - `disentanglement.png`: disentanglement score curves
//! - `comparison.png`: final reconstruction error against final score for
//!   beta-VAE (reference values), FactorVAE and AD-FactorVAE

mod comparison;
mod curves;

use std::ops::Range;

pub use comparison::{render_comparison, ComparisonPoint, BETA_VAE_REFERENCE};
pub use curves::{render_disentanglement, render_train_loss};

/// File name of the loss curve chart.
pub const TRAIN_LOSS_FILE: &str = "train_loss.png";
/// File name of the disentanglement curve chart.
pub const DISENTANGLEMENT_FILE: &str = "disentanglement.png";
/// File name of the method comparison chart.
pub const COMPARISON_FILE: &str = "comparison.png";

const FONT: &str = "sans-serif";

/// Padded y-range covering `values`, `0..1` when there are none.
#[must_use]
pub fn value_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        return 0.0..1.0;
    }
    if (max - min).abs() < f64::EPSILON {
        return (min - 0.5)..(max + 0.5);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

/// X-range from 0 to the last iteration, never empty.
#[must_use]
pub fn iteration_range(iters: impl IntoIterator<Item = u64>) -> Range<u64> {
    0..iters.into_iter().max().unwrap_or(0).max(1)
}
