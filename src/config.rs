//! Report configuration
//!
//! Settings come from defaults, an optional JSON file and command line
//! flags, in increasing precedence. Hyperparameter lists accept JSON
//! numbers or strings, so `"gammas": [4, 6.5]` and `"gammas": ["4", "6.5"]`
//! are equivalent.
//!
//! ```json
//! {
//!   "ckpt_dir": "checkpoints/ad_factorvae",
//!   "seeds": ["seed1", "seed2", "seed3"],
//!   "gammas": [4, 6, 10],
//!   "lambdas": [10],
//!   "max_iters": 100000,
//!   "detail": true
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::aggregate::{Aggregator, RunFilter};
use crate::error::{Error, Result};
use crate::metrics::{ExtractOptions, DEFAULT_EMIT_EVERY, DEFAULT_WINDOW};

/// Default iteration cutoff.
pub const DEFAULT_MAX_ITERS: u64 = 100_000;

/// Default directory charts are written to.
pub const DEFAULT_OUTPUT_DIR: &str = "plots";

/// One checkpoint root taking part in a method comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodConfig {
    /// Checkpoint root of the method.
    pub ckpt_dir: PathBuf,
    /// Gamma encodings to select.
    #[serde(default, deserialize_with = "encodings")]
    pub gammas: Vec<String>,
    /// Lambda encodings to select; ignored for vanilla roots.
    #[serde(default, deserialize_with = "encodings")]
    pub lambdas: Vec<String>,
    /// Vanilla override; inferred from `ckpt_dir` when absent.
    #[serde(default)]
    pub vanilla: Option<bool>,
}

/// Settings shared by every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Checkpoint root for the curve reports.
    pub ckpt_dir: Option<PathBuf>,
    /// Seeds averaged over; the first anchors each combination.
    pub seeds: Vec<String>,
    /// Gamma encodings to select.
    #[serde(deserialize_with = "encodings")]
    pub gammas: Vec<String>,
    /// Lambda encodings to select.
    #[serde(deserialize_with = "encodings")]
    pub lambdas: Vec<String>,
    /// Iteration cutoff.
    pub max_iters: u64,
    /// Fixed axis ranges and the compact canvas.
    pub detail: bool,
    /// Divisor of each training window.
    pub window: u32,
    /// Iteration stride between training points.
    pub emit_every: u64,
    /// Directory charts are written to.
    pub output_dir: PathBuf,
    /// Vanilla override for `ckpt_dir`.
    pub vanilla: Option<bool>,
    /// Checkpoint roots for the comparison chart: FactorVAE, then AD-FactorVAE.
    pub methods: Vec<MethodConfig>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            ckpt_dir: None,
            seeds: Vec::new(),
            gammas: Vec::new(),
            lambdas: Vec::new(),
            max_iters: DEFAULT_MAX_ITERS,
            detail: false,
            window: DEFAULT_WINDOW,
            emit_every: DEFAULT_EMIT_EVERY,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            vanilla: None,
            methods: Vec::new(),
        }
    }
}

impl ReportConfig {
    /// Create a builder starting from the defaults.
    #[must_use]
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder::default()
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Read` if the file cannot be read and `Json` if it does not
    /// match the schema.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `NoSeeds` without seeds and `InvalidConfig` for a zero
    /// window, a zero emit stride or a zero cutoff.
    pub fn validate(&self) -> Result<()> {
        if self.seeds.is_empty() {
            return Err(Error::NoSeeds);
        }
        if self.max_iters == 0 {
            return Err(Error::InvalidConfig(
                "max_iters must be positive".to_string(),
            ));
        }
        self.extract_options().map(|_| ())
    }

    /// Training extraction options.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `window` or `emit_every` is zero.
    pub fn extract_options(&self) -> Result<ExtractOptions> {
        ExtractOptions::new(self.window, self.emit_every)
    }

    /// Aggregator over `ckpt_dir`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if no checkpoint root is set, and the
    /// [`Self::validate`] errors.
    pub fn aggregator(&self) -> Result<Aggregator> {
        let root = self
            .ckpt_dir
            .clone()
            .ok_or_else(|| Error::InvalidConfig("ckpt_dir is required".to_string()))?;
        self.build_aggregator(root, &self.gammas, &self.lambdas, self.vanilla)
    }

    /// Aggregators over the comparison methods, in configured order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` unless exactly two methods are configured,
    /// and the [`Self::validate`] errors.
    pub fn method_aggregators(&self) -> Result<Vec<Aggregator>> {
        if self.methods.len() != 2 {
            return Err(Error::InvalidConfig(format!(
                "comparison needs exactly two methods (FactorVAE, AD-FactorVAE), got {}",
                self.methods.len()
            )));
        }
        self.methods
            .iter()
            .map(|m| self.build_aggregator(m.ckpt_dir.clone(), &m.gammas, &m.lambdas, m.vanilla))
            .collect()
    }

    fn build_aggregator(
        &self,
        root: PathBuf,
        gammas: &[String],
        lambdas: &[String],
        vanilla: Option<bool>,
    ) -> Result<Aggregator> {
        self.validate()?;
        let filter = RunFilter::new(self.seeds.iter().cloned(), gammas.to_vec(), lambdas.to_vec())?;
        let aggregator =
            Aggregator::new(root, filter, self.max_iters).with_options(self.extract_options()?);
        Ok(match vanilla {
            Some(vanilla) => aggregator.vanilla(vanilla),
            None => aggregator,
        })
    }
}

/// Builder for `ReportConfig`.
#[derive(Debug, Default)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    /// Set the checkpoint root.
    #[must_use]
    pub fn ckpt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.ckpt_dir = Some(dir.into());
        self
    }

    /// Set the seeds.
    #[must_use]
    pub fn seeds<I: IntoIterator<Item = S>, S: Into<String>>(mut self, seeds: I) -> Self {
        self.config.seeds = seeds.into_iter().map(Into::into).collect();
        self
    }

    /// Set the gamma encodings.
    #[must_use]
    pub fn gammas<I: IntoIterator<Item = S>, S: Into<String>>(mut self, gammas: I) -> Self {
        self.config.gammas = gammas.into_iter().map(Into::into).collect();
        self
    }

    /// Set the lambda encodings.
    #[must_use]
    pub fn lambdas<I: IntoIterator<Item = S>, S: Into<String>>(mut self, lambdas: I) -> Self {
        self.config.lambdas = lambdas.into_iter().map(Into::into).collect();
        self
    }

    /// Set the iteration cutoff.
    #[must_use]
    pub fn max_iters(mut self, max_iters: u64) -> Self {
        self.config.max_iters = max_iters;
        self
    }

    /// Enable fixed axis ranges.
    #[must_use]
    pub fn detail(mut self, detail: bool) -> Self {
        self.config.detail = detail;
        self
    }

    /// Set the training window divisor and emit stride.
    #[must_use]
    pub fn window(mut self, window: u32, emit_every: u64) -> Self {
        self.config.window = window;
        self.config.emit_every = emit_every;
        self
    }

    /// Set the output directory.
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Force or disable vanilla mode for the checkpoint root.
    #[must_use]
    pub fn vanilla(mut self, vanilla: bool) -> Self {
        self.config.vanilla = Some(vanilla);
        self
    }

    /// Append a comparison method.
    #[must_use]
    pub fn method(mut self, method: MethodConfig) -> Self {
        self.config.methods.push(method);
        self
    }

    /// Build the `ReportConfig`.
    #[must_use]
    pub fn build(self) -> ReportConfig {
        self.config
    }
}

fn encodings<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    let values = Vec::<Value>::deserialize(deserializer)?;
    values
        .into_iter()
        .map(|value| match value {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(serde::de::Error::custom(format!(
                "hyperparameter must be a number or string, got {other}"
            ))),
        })
        .collect()
}
