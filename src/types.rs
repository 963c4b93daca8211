//! Common Types and Constants
//!
//! Value types passed between the estimator, the updaters and callers.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::sanitize::{ensure_positive, ensure_valid_moments};

// ==================== Constants ====================

/// Numerical stability epsilon
pub const EPSILON: f64 = 1e-10;

/// Samples per Monte Carlo chunk; each chunk draws from its own RNG stream
pub const MONTE_CARLO_CHUNK: usize = 1 << 16;

// ==================== Belief ====================

/// Belief about one fact: at elapsed time `t0`, recall probability is
/// distributed as `Beta(alpha, beta)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Belief {
    /// Beta shape alpha (> 0)
    pub alpha: f64,
    /// Beta shape beta (> 0)
    pub beta: f64,
    /// Reference elapsed time (> 0)
    pub t0: f64,
}

impl Belief {
    /// Create a validated belief
    pub fn new(alpha: f64, beta: f64, t0: f64) -> Result<Self> {
        let belief = Self { alpha, beta, t0 };
        belief.validate()?;
        Ok(belief)
    }

    /// Re-check the invariants (fields are public, so deserialized or
    /// hand-built values may violate them)
    pub fn validate(&self) -> Result<()> {
        ensure_positive("alpha", self.alpha)?;
        ensure_positive("beta", self.beta)?;
        ensure_positive("t0", self.t0)?;
        Ok(())
    }

    /// Beta shapes without the reference time
    pub fn shape(&self) -> BetaPair {
        BetaPair {
            alpha: self.alpha,
            beta: self.beta,
        }
    }

    /// Power-law exponent `k = t / t0` for a query at elapsed time `t`
    pub fn exponent(&self, t: f64) -> Result<f64> {
        ensure_positive("t", t)?;
        let k = t / self.t0;
        if !k.is_finite() || k <= 0.0 {
            return Err(ModelError::numeric(
                "exponent",
                format!("t / t0 = {t} / {} is not a positive finite ratio", self.t0),
            ));
        }
        Ok(k)
    }
}

// ==================== Observation ====================

/// Quiz outcome
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Forgotten,
    Recalled,
}

impl Outcome {
    pub fn is_recalled(self) -> bool {
        matches!(self, Outcome::Recalled)
    }
}

impl TryFrom<f64> for Outcome {
    type Error = ModelError;

    fn try_from(x: f64) -> Result<Self> {
        if x == 1.0 {
            Ok(Outcome::Recalled)
        } else if x == 0.0 {
            Ok(Outcome::Forgotten)
        } else {
            Err(ModelError::domain("x", x))
        }
    }
}

impl From<bool> for Outcome {
    fn from(recalled: bool) -> Self {
        if recalled {
            Outcome::Recalled
        } else {
            Outcome::Forgotten
        }
    }
}

/// A quiz result `x` observed at elapsed time `t` since the last review
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub outcome: Outcome,
    /// Elapsed time, same unit as the belief's `t0`
    pub t: f64,
}

impl Observation {
    /// `x` must be exactly 0 (forgotten) or 1 (recalled)
    pub fn new(x: f64, t: f64) -> Result<Self> {
        let outcome = Outcome::try_from(x)?;
        ensure_positive("t", t)?;
        Ok(Self { outcome, t })
    }

    pub fn recalled(t: f64) -> Result<Self> {
        Self::new(1.0, t)
    }

    pub fn forgotten(t: f64) -> Result<Self> {
        Self::new(0.0, t)
    }
}

// ==================== Moments ====================

/// Mean and variance of a probability
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub mean: f64,
    pub variance: f64,
}

impl Moments {
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }
}

// ==================== Beta pair ====================

/// Beta shape parameters produced by a posterior update
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BetaPair {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaPair {
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        ensure_positive("alpha", alpha)?;
        ensure_positive("beta", beta)?;
        Ok(Self { alpha, beta })
    }

    /// Moment matching: the Beta distribution with the given mean and variance.
    ///
    /// Requires `0 < mean < 1` and `0 < variance < mean * (1 - mean)`; anything
    /// else has no Beta counterpart and is reported as a numeric error.
    pub fn from_moments(mean: f64, variance: f64) -> Result<Self> {
        ensure_valid_moments("moment matching", mean, variance)?;
        let common = mean * (1.0 - mean) / variance - 1.0;
        let pair = Self {
            alpha: mean * common,
            beta: (1.0 - mean) * common,
        };
        if !(pair.alpha > 0.0 && pair.beta > 0.0 && pair.alpha.is_finite() && pair.beta.is_finite())
        {
            return Err(ModelError::numeric(
                "moment matching",
                format!("mean {mean}, variance {variance} give alpha {}, beta {}", pair.alpha, pair.beta),
            ));
        }
        Ok(pair)
    }

    /// Mean of Beta(alpha, beta)
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Variance of Beta(alpha, beta)
    pub fn variance(&self) -> f64 {
        let sum = self.alpha + self.beta;
        self.alpha * self.beta / (sum * sum * (sum + 1.0))
    }

    pub fn moments(&self) -> Moments {
        Moments {
            mean: self.mean(),
            variance: self.variance(),
        }
    }

    /// Attach a reference time, producing the next belief
    pub fn anchored_at(self, t0: f64) -> Result<Belief> {
        Belief::new(self.alpha, self.beta, t0)
    }
}

// ==================== Unit Tests ====================
