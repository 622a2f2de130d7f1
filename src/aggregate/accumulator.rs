//! Elementwise accumulation of per-seed series

use crate::error::{Error, Result};

/// Running elementwise sum of equal-length series.
///
/// The first series fixes the length; every later one must match it, so
/// a seed that stopped early is reported instead of silently misaligned.
#[derive(Debug, Clone)]
pub struct SeriesAccumulator {
    run: String,
    sum: Vec<f64>,
    count: usize,
}

impl SeriesAccumulator {
    /// Create an empty accumulator for the combination labelled `run`.
    #[must_use]
    pub fn new(run: impl Into<String>) -> Self {
        Self {
            run: run.into(),
            sum: Vec::new(),
            count: 0,
        }
    }

    /// Add one seed's series.
    ///
    /// # Errors
    ///
    /// Returns `SeriesLengthMismatch` if `series` differs in length from
    /// the first series added.
    pub fn add(&mut self, seed: &str, series: &[f64]) -> Result<()> {
        if self.count == 0 {
            self.sum = series.to_vec();
        } else if series.len() == self.sum.len() {
            for (total, value) in self.sum.iter_mut().zip(series) {
                *total += value;
            }
        } else {
            return Err(Error::SeriesLengthMismatch {
                run: self.run.clone(),
                seed: seed.to_string(),
                expected: self.sum.len(),
                actual: series.len(),
            });
        }
        self.count += 1;
        Ok(())
    }

    /// Number of series added so far.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Get the elementwise sum.
    #[must_use]
    pub fn sum(&self) -> &[f64] {
        &self.sum
    }

    /// Divide the sum by the number of series added.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(self) -> Vec<f64> {
        if self.count == 0 {
            return self.sum;
        }
        let n = self.count as f64;
        self.sum.into_iter().map(|total| total / n).collect()
    }
}

/// Mean of a scalar taken once per seed.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_scalar(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Elementwise mean of several seeds' series.
///
/// # Errors
///
/// Returns `SeriesLengthMismatch` if the series differ in length.
pub fn mean_series<'a, I>(run: &str, series: I) -> Result<Vec<f64>>
where
    I: IntoIterator<Item = (&'a str, &'a [f64])>,
{
    let mut acc = SeriesAccumulator::new(run);
    for (seed, values) in series {
        acc.add(seed, values)?;
    }
    Ok(acc.mean())
}
