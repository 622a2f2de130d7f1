//! Metric Record - one logged step of a training run

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Loss components written by the FactorVAE trainer on training steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LossComponent {
    /// Full VAE objective.
    Vae,
    /// Discriminator loss.
    Discriminator,
    /// Reconstruction loss.
    Reconstruction,
    /// Total-correlation estimate.
    TotalCorrelation,
}

impl LossComponent {
    /// All components, in log order.
    pub const ALL: [Self; 4] = [
        Self::Vae,
        Self::Discriminator,
        Self::Reconstruction,
        Self::TotalCorrelation,
    ];

    /// JSON key of the component in the metric log.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Vae => "vae_loss",
            Self::Discriminator => "D_loss",
            Self::Reconstruction => "recon_loss",
            Self::TotalCorrelation => "tc_loss",
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Vae => 0,
            Self::Discriminator => 1,
            Self::Reconstruction => 2,
            Self::TotalCorrelation => 3,
        }
    }
}

/// Metric Record represents a single entry of a run's `metrics.json`.
///
/// Training steps carry the four loss components; evaluation checkpoints
/// carry `metric_score`. Any field except `its` may be absent, and a JSON
/// `null` is treated as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    index: usize,
    its: u64,
    losses: [Option<f64>; 4],
    metric_score: Option<f64>,
}

impl MetricRecord {
    /// Create a record with no loss components or score.
    ///
    /// # Arguments
    ///
    /// * `index` - Position of the record in its log
    /// * `its` - Training iteration the record was written at
    #[must_use]
    pub const fn new(index: usize, its: u64) -> Self {
        Self {
            index,
            its,
            losses: [None; 4],
            metric_score: None,
        }
    }

    /// Create a builder for constructing a record with optional fields.
    #[must_use]
    pub const fn builder(index: usize, its: u64) -> MetricRecordBuilder {
        MetricRecordBuilder::new(index, its)
    }

    /// Parse one log entry.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedRecordType` if the entry is not an object,
    /// `MissingField` if `its` is absent and `InvalidField` if a known
    /// field has the wrong JSON type.
    pub fn from_value(index: usize, value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::UnexpectedRecordType {
                index,
                found: json_kind(value),
            });
        };

        let its = match map.get("its") {
            None | Some(Value::Null) => {
                return Err(Error::MissingField { index, field: "its" });
            }
            Some(raw) => raw.as_u64().ok_or(Error::InvalidField {
                index,
                field: "its",
                found: json_kind(raw),
            })?,
        };

        let mut record = Self::new(index, its);
        for component in LossComponent::ALL {
            record.losses[component.slot()] = optional_f64(map, index, component.key())?;
        }
        record.metric_score = optional_f64(map, index, "metric_score")?;
        Ok(record)
    }

    /// Get the position of the record in its log.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Get the iteration number.
    #[must_use]
    pub const fn its(&self) -> u64 {
        self.its
    }

    /// Get a loss component, if logged.
    #[must_use]
    pub const fn loss(&self, component: LossComponent) -> Option<f64> {
        self.losses[component.slot()]
    }

    /// Get a loss component that the caller cannot do without.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` naming the component's JSON key.
    pub fn require(&self, component: LossComponent) -> Result<f64> {
        self.loss(component).ok_or(Error::MissingField {
            index: self.index,
            field: component.key(),
        })
    }

    /// Get the disentanglement score, if this is an evaluation record.
    #[must_use]
    pub const fn metric_score(&self) -> Option<f64> {
        self.metric_score
    }

    /// Whether the record was written by a training step.
    #[must_use]
    pub const fn is_training_step(&self) -> bool {
        self.loss(LossComponent::Vae).is_some()
    }
}

/// Builder for `MetricRecord`.
#[derive(Debug)]
pub struct MetricRecordBuilder {
    record: MetricRecord,
}

impl MetricRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub const fn new(index: usize, its: u64) -> Self {
        Self {
            record: MetricRecord::new(index, its),
        }
    }

    /// Set one loss component.
    #[must_use]
    pub const fn loss(mut self, component: LossComponent, value: f64) -> Self {
        self.record.losses[component.slot()] = Some(value);
        self
    }

    /// Set all four loss components at once (vae, D, recon, tc).
    #[must_use]
    pub const fn losses(mut self, vae: f64, d: f64, recon: f64, tc: f64) -> Self {
        self.record.losses = [Some(vae), Some(d), Some(recon), Some(tc)];
        self
    }

    /// Set the disentanglement score.
    #[must_use]
    pub const fn metric_score(mut self, score: f64) -> Self {
        self.record.metric_score = Some(score);
        self
    }

    /// Build the `MetricRecord`.
    #[must_use]
    pub const fn build(self) -> MetricRecord {
        self.record
    }
}

fn optional_f64(map: &Map<String, Value>, index: usize, field: &'static str) -> Result<Option<f64>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(raw) => raw.as_f64().map(Some).ok_or(Error::InvalidField {
            index,
            field,
            found: json_kind(raw),
        }),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
