//! Seed-averaged aggregation over a checkpoint root
//!
//! ## Layout
//!
//! ```text
//! <root>/
//!   factorvae_ga_4_la_10_iters100000_seed1/metrics.json
//!   factorvae_ga_4_la_10_iters100000_seed2/metrics.json
//!   factorvae_ga_6_la_10_iters100000_seed1/metrics.json
//!   ...
//! ```
//!
//! Directories trained with the first seed anchor one hyperparameter
//! combination each; the other seeds' directories are derived from the
//! anchor by swapping the seed segment. Each combination's series are
//! summed elementwise across seeds and divided by the seed count.

mod accumulator;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

pub use accumulator::{mean_scalar, mean_series, SeriesAccumulator};

use crate::error::{Error, Result};
use crate::metrics::{
    extract_disentanglement_metric_from_path, extract_train_metrics_from_path,
    DisentanglementSeries, ExtractOptions, LossComponent, TrainingSeries, METRICS_FILE,
};
use crate::run_id::{RunId, SEED_MARKER};

/// Path fragment that marks a checkpoint root of vanilla (lambda-free) runs.
pub const VANILLA_MARKER: &str = "vanilla";

/// Whether a checkpoint root holds vanilla runs, judged from its path.
#[must_use]
pub fn is_vanilla_root(root: &Path) -> bool {
    root.to_string_lossy().contains(VANILLA_MARKER)
}

/// Selection of runs by seed and hyperparameter encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunFilter {
    seeds: Vec<String>,
    gammas: Vec<String>,
    lambdas: Vec<String>,
}

impl RunFilter {
    /// Create a filter.
    ///
    /// Seeds may be given as `seed1` or `1`; the marker is added when
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns `NoSeeds` if `seeds` is empty.
    pub fn new<S, G, L>(seeds: S, gammas: G, lambdas: L) -> Result<Self>
    where
        S: IntoIterator,
        S::Item: Into<String>,
        G: IntoIterator,
        G::Item: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        let seeds: Vec<String> = seeds
            .into_iter()
            .map(Into::into)
            .map(|seed: String| {
                if seed.starts_with(SEED_MARKER) {
                    seed
                } else {
                    format!("{SEED_MARKER}{seed}")
                }
            })
            .collect();
        if seeds.is_empty() {
            return Err(Error::NoSeeds);
        }
        Ok(Self {
            seeds,
            gammas: gammas.into_iter().map(Into::into).collect(),
            lambdas: lambdas.into_iter().map(Into::into).collect(),
        })
    }

    /// Get the seeds; the first one anchors each combination.
    #[must_use]
    pub fn seeds(&self) -> &[String] {
        &self.seeds
    }

    /// Get the requested gamma encodings.
    #[must_use]
    pub fn gammas(&self) -> &[String] {
        &self.gammas
    }

    /// Get the requested lambda encodings.
    #[must_use]
    pub fn lambdas(&self) -> &[String] {
        &self.lambdas
    }

    /// Whether `run` anchors a requested combination.
    ///
    /// With `vanilla` set the lambda axis is not filtered.
    #[must_use]
    pub fn accepts(&self, run: &RunId, vanilla: bool) -> bool {
        run.seed() == self.seeds[0]
            && run.matches_gamma(&self.gammas)
            && (vanilla || run.matches_lambda(&self.lambdas))
    }
}

/// Seed-averaged loss curves of one hyperparameter combination.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingAggregate {
    run: RunId,
    seeds: usize,
    series: TrainingSeries,
}

impl TrainingAggregate {
    /// Get the anchor run.
    #[must_use]
    pub const fn run(&self) -> &RunId {
        &self.run
    }

    /// Get the plot label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.run.label()
    }

    /// Number of seeds averaged.
    #[must_use]
    pub const fn seeds(&self) -> usize {
        self.seeds
    }

    /// Get the mean series.
    #[must_use]
    pub const fn series(&self) -> &TrainingSeries {
        &self.series
    }
}

/// Seed-averaged disentanglement curve of one hyperparameter combination.
#[derive(Debug, Clone, Serialize)]
pub struct DisentanglementAggregate {
    run: RunId,
    seeds: usize,
    series: DisentanglementSeries,
}

impl DisentanglementAggregate {
    /// Get the anchor run.
    #[must_use]
    pub const fn run(&self) -> &RunId {
        &self.run
    }

    /// Get the plot label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.run.label()
    }

    /// Number of seeds averaged.
    #[must_use]
    pub const fn seeds(&self) -> usize {
        self.seeds
    }

    /// Get the mean series; its final reconstruction loss is the seed mean.
    #[must_use]
    pub const fn series(&self) -> &DisentanglementSeries {
        &self.series
    }
}

/// End-of-training position of one combination in the comparison plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryPoint {
    /// Label of the combination.
    pub label: String,
    /// Final seed-averaged disentanglement score.
    pub final_score: f64,
    /// Seed-averaged last reconstruction loss.
    pub final_recon_loss: f64,
    /// Numeric gamma value the point is annotated with.
    pub value: f64,
}

/// Summary points of every combination under one checkpoint root.
#[derive(Debug, Clone, Serialize)]
pub struct MethodSummary {
    /// Checkpoint root the points were read from.
    pub root: PathBuf,
    /// Whether lambda filtering was skipped.
    pub vanilla: bool,
    /// One point per combination.
    pub points: Vec<SummaryPoint>,
}

/// Scans one checkpoint root and averages runs across seeds.
///
/// ## Example
///
/// ```rust,no_run
/// use factorvae_report::aggregate::{Aggregator, RunFilter};
///
/// let filter = RunFilter::new(["seed1", "seed2"], ["4", "6"], ["10"])?;
/// let aggregator = Aggregator::new("checkpoints/ad_factorvae", filter, 100_000);
///
/// for curve in aggregator.disentanglement_curves()? {
///     println!("{}: {:.3}", curve.label(), curve.series().final_score());
/// }
/// # Ok::<(), factorvae_report::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Aggregator {
    root: PathBuf,
    filter: RunFilter,
    max_iters: u64,
    options: ExtractOptions,
    vanilla: bool,
}

impl Aggregator {
    /// Create an aggregator; vanilla mode is inferred from the root path.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, filter: RunFilter, max_iters: u64) -> Self {
        let root = root.into();
        let vanilla = is_vanilla_root(&root);
        Self {
            root,
            filter,
            max_iters,
            options: ExtractOptions::default(),
            vanilla,
        }
    }

    /// Set the training extraction options.
    #[must_use]
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Override the vanilla mode inferred from the root path.
    #[must_use]
    pub fn vanilla(mut self, vanilla: bool) -> Self {
        self.vanilla = vanilla;
        self
    }

    /// Get the checkpoint root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether lambda filtering is skipped.
    #[must_use]
    pub const fn is_vanilla(&self) -> bool {
        self.vanilla
    }

    /// Get the run filter.
    #[must_use]
    pub const fn filter(&self) -> &RunFilter {
        &self.filter
    }

    /// Iteration cutoff applied to every log.
    #[must_use]
    pub const fn max_iters(&self) -> u64 {
        self.max_iters
    }

    /// List the anchor runs, one per requested combination, in name order.
    ///
    /// Subdirectories whose names do not parse as run identifiers are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns `Read` if the root cannot be listed.
    pub fn discover(&self) -> Result<Vec<RunId>> {
        let entries = fs::read_dir(&self.root).map_err(|source| Error::Read {
            path: self.root.clone(),
            source,
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => debug!(name = ?raw, "skipping non UTF-8 directory name"),
            }
        }
        names.sort();

        let mut anchors = Vec::new();
        for name in names {
            let run = match RunId::parse(name) {
                Ok(run) => run,
                Err(err) => {
                    debug!(%err, "skipping directory");
                    continue;
                }
            };
            if self.filter.accepts(&run, self.vanilla) {
                anchors.push(run);
            } else {
                debug!(run = %run, "directory not selected");
            }
        }

        debug!(
            root = %self.root.display(),
            anchors = anchors.len(),
            vanilla = self.vanilla,
            "discovered runs"
        );
        Ok(anchors)
    }

    /// Path of the metric log of `run` trained with `seed`.
    #[must_use]
    pub fn metrics_path(&self, run: &RunId, seed: &str) -> PathBuf {
        self.root.join(run.with_seed(seed)).join(METRICS_FILE)
    }

    /// Seed-averaged loss curves for every requested combination.
    ///
    /// Combinations whose logs yield no training point are left out.
    ///
    /// # Errors
    ///
    /// Fails on the first unreadable or malformed log and on seeds with
    /// different series lengths or iteration stamps.
    pub fn training_curves(&self) -> Result<Vec<TrainingAggregate>> {
        let mut curves = Vec::new();

        for run in self.discover()? {
            let mut iters: Option<Vec<u64>> = None;
            let mut columns = LossComponent::ALL.map(|_| SeriesAccumulator::new(run.label()));

            for seed in self.filter.seeds() {
                let path = self.metrics_path(&run, seed);
                let series = extract_train_metrics_from_path(&path, self.max_iters, self.options)?;
                for (column, component) in columns.iter_mut().zip(LossComponent::ALL) {
                    column.add(seed, series.component(component))?;
                }
                if let Some(first) = iters.as_deref() {
                    check_iterations(run.label(), seed, first, series.iters())?;
                } else {
                    iters = Some(series.iters().to_vec());
                }
            }

            let iters = iters.unwrap_or_default();
            if iters.is_empty() {
                warn!(run = run.label(), "no training points below the cutoff");
                continue;
            }

            info!(
                run = run.label(),
                seeds = self.filter.seeds().len(),
                points = iters.len(),
                "averaged training curves"
            );
            curves.push(TrainingAggregate {
                seeds: self.filter.seeds().len(),
                series: TrainingSeries::from_columns(iters, columns.map(SeriesAccumulator::mean)),
                run,
            });
        }

        Ok(curves)
    }

    /// Seed-averaged disentanglement curves for every requested combination.
    ///
    /// # Errors
    ///
    /// Fails on the first unreadable or malformed log and on seeds with
    /// different series lengths or iteration stamps.
    pub fn disentanglement_curves(&self) -> Result<Vec<DisentanglementAggregate>> {
        let mut curves = Vec::new();

        for run in self.discover()? {
            let mut iters: Option<Vec<u64>> = None;
            let mut scores = SeriesAccumulator::new(run.label());
            let mut final_recon = Vec::with_capacity(self.filter.seeds().len());

            for seed in self.filter.seeds() {
                let path = self.metrics_path(&run, seed);
                let series = extract_disentanglement_metric_from_path(&path, self.max_iters)?;
                scores.add(seed, series.scores())?;
                if let Some(first) = iters.as_deref() {
                    check_iterations(run.label(), seed, first, series.iters())?;
                } else {
                    iters = Some(series.iters().to_vec());
                }
                final_recon.push(series.final_recon_loss());
            }

            let series = DisentanglementSeries::from_parts(
                iters.unwrap_or_default(),
                scores.mean(),
                mean_scalar(&final_recon),
            );
            info!(
                run = run.label(),
                seeds = final_recon.len(),
                final_score = series.final_score(),
                final_recon_loss = series.final_recon_loss(),
                "averaged disentanglement curve"
            );
            curves.push(DisentanglementAggregate {
                run,
                seeds: final_recon.len(),
                series,
            });
        }

        Ok(curves)
    }

    /// Final score, final reconstruction loss and gamma of every combination.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::disentanglement_curves`] errors and fails if a
    /// gamma encoding is not numeric.
    pub fn summary(&self) -> Result<MethodSummary> {
        let points = self
            .disentanglement_curves()?
            .into_iter()
            .map(|curve| {
                Ok(SummaryPoint {
                    label: curve.label().to_string(),
                    final_score: curve.series().final_score(),
                    final_recon_loss: curve.series().final_recon_loss(),
                    value: curve.run().gamma_value()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(MethodSummary {
            root: self.root.clone(),
            vanilla: self.vanilla,
            points,
        })
    }
}

/// Seeds of one combination must report their points at the same iterations.
fn check_iterations(run: &str, seed: &str, expected: &[u64], actual: &[u64]) -> Result<()> {
    match expected.iter().zip(actual).position(|(e, a)| e != a) {
        Some(position) => Err(Error::IterationMismatch {
            run: run.to_string(),
            seed: seed.to_string(),
            position,
            expected: expected[position],
            actual: actual[position],
        }),
        None => Ok(()),
    }
}

/// Summaries of several checkpoint roots, in the given order.
///
/// # Errors
///
/// Fails on the first root whose summary fails.
pub fn compare_methods(methods: &[Aggregator]) -> Result<Vec<MethodSummary>> {
    methods.iter().map(Aggregator::summary).collect()
}
