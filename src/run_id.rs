//! Run identifiers parsed from checkpoint directory names
//!
//! Training writes one directory per run, named after its hyperparameters:
//!
//! ```text
//! factorvae_dsprites_ga_4_la_10_iters100000_seed1
//! └─prefix─────────┘ └gamma┘└lambda┘└─iters──┘└seed┘
//! ```
//!
//! The lambda segment is absent for vanilla runs. The seed segment is the
//! last `seed` marker plus its digits and may also sit before `_iters`
//! (`..._la_10_seed3_iters100000`); sibling runs of other seeds are found
//! by swapping just that segment.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// Marker preceding the gamma encoding.
pub const GAMMA_MARKER: &str = "_ga_";
/// Marker preceding the lambda encoding.
pub const LAMBDA_MARKER: &str = "_la_";
/// Marker preceding the maximum iteration count.
pub const ITERS_MARKER: &str = "_iters";
/// Marker starting the seed segment.
pub const SEED_MARKER: &str = "seed";

/// Parsed run directory name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunId {
    name: String,
    gamma_start: usize,
    encodings_end: usize,
    seed_start: usize,
    seed_end: usize,
    gamma: String,
    lambda: Option<String>,
    max_iters: u64,
}

impl RunId {
    /// Parse a directory name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRunName` if the seed, gamma or iters marker is
    /// missing, if an encoding is empty, or if no digits follow `_iters`
    /// or `seed`.
    pub fn parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let invalid = |reason: &str| Error::InvalidRunName {
            name: name.clone(),
            reason: reason.to_string(),
        };

        let seed_start = name
            .rfind(SEED_MARKER)
            .ok_or_else(|| invalid("no `seed` marker"))?;
        let seed_digits = name[seed_start + SEED_MARKER.len()..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if seed_digits == 0 {
            return Err(invalid("no digits after `seed`"));
        }
        let seed_end = seed_start + SEED_MARKER.len() + seed_digits;
        let gamma_start = name
            .find(GAMMA_MARKER)
            .ok_or_else(|| invalid("no `_ga_` marker"))?;
        let iters_start = name[gamma_start..]
            .find(ITERS_MARKER)
            .map(|offset| gamma_start + offset)
            .ok_or_else(|| invalid("no `_iters` marker after gamma"))?;

        // A seed written before `_iters` also closes the encodings.
        let encodings_end = if (gamma_start..iters_start).contains(&seed_start) {
            name[..seed_start].trim_end_matches('_').len()
        } else {
            iters_start
        };
        if encodings_end < gamma_start + GAMMA_MARKER.len() {
            return Err(invalid("empty gamma encoding"));
        }
        let encodings = &name[gamma_start + GAMMA_MARKER.len()..encodings_end];
        let (gamma, lambda) = match encodings.find(LAMBDA_MARKER) {
            Some(offset) => (
                &encodings[..offset],
                Some(&encodings[offset + LAMBDA_MARKER.len()..]),
            ),
            None => (encodings, None),
        };
        if gamma.is_empty() {
            return Err(invalid("empty gamma encoding"));
        }
        if lambda.is_some_and(str::is_empty) {
            return Err(invalid("empty lambda encoding"));
        }

        let digits: String = name[iters_start + ITERS_MARKER.len()..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        let max_iters = digits
            .parse::<u64>()
            .map_err(|_| invalid("no iteration count after `_iters`"))?;

        let gamma = gamma.to_string();
        let lambda = lambda.map(str::to_string);
        Ok(Self {
            name,
            gamma_start,
            encodings_end,
            seed_start,
            seed_end,
            gamma,
            lambda,
            max_iters,
        })
    }

    /// Get the full directory name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the text before the gamma marker.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.name[..self.gamma_start]
    }

    /// Get the raw gamma encoding.
    #[must_use]
    pub fn gamma(&self) -> &str {
        &self.gamma
    }

    /// Get the raw lambda encoding, absent for vanilla runs.
    #[must_use]
    pub fn lambda(&self) -> Option<&str> {
        self.lambda.as_deref()
    }

    /// Get the maximum iteration count the run was launched with.
    #[must_use]
    pub const fn max_iters(&self) -> u64 {
        self.max_iters
    }

    /// Get the seed segment, e.g. `seed1`.
    #[must_use]
    pub fn seed(&self) -> &str {
        &self.name[self.seed_start..self.seed_end]
    }

    /// Plot label: the hyperparameter slice, e.g. `ga_4_la_10`.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.name[self.gamma_start + 1..self.encodings_end]
    }

    /// Numeric gamma value, used as the point annotation in comparisons.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRunName` if the encoding is not a number.
    pub fn gamma_value(&self) -> Result<f64> {
        self.gamma.parse().map_err(|_| Error::InvalidRunName {
            name: self.name.clone(),
            reason: format!("gamma `{}` is not numeric", self.gamma),
        })
    }

    /// Directory name of the same configuration trained with `seed`.
    #[must_use]
    pub fn with_seed(&self, seed: &str) -> String {
        format!(
            "{}{seed}{}",
            &self.name[..self.seed_start],
            &self.name[self.seed_end..]
        )
    }

    /// Whether the gamma encoding matches any of `wanted`.
    #[must_use]
    pub fn matches_gamma<S: AsRef<str>>(&self, wanted: &[S]) -> bool {
        wanted.iter().any(|w| encoding_matches(&self.gamma, w.as_ref()))
    }

    /// Whether the lambda encoding matches any of `wanted`.
    ///
    /// A run without lambda never matches.
    #[must_use]
    pub fn matches_lambda<S: AsRef<str>>(&self, wanted: &[S]) -> bool {
        self.lambda
            .as_deref()
            .is_some_and(|lambda| wanted.iter().any(|w| encoding_matches(lambda, w.as_ref())))
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Serialize for RunId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

/// Hyperparameter encodings match on identical text or equal numeric value,
/// so `4` selects a directory encoded as `4.0`.
fn encoding_matches(encoded: &str, wanted: &str) -> bool {
    if encoded == wanted {
        return true;
    }
    match (encoded.parse::<f64>(), wanted.parse::<f64>()) {
        (Ok(a), Ok(b)) => (a - b).abs() < f64::EPSILON,
        _ => false,
    }
}
