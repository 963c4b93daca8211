use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Tolerances and budget for the [`crate::quadrature`] integrators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadratureConfig {
    pub rel_tolerance: f64,
    pub abs_tolerance: f64,
    pub max_subdivisions: usize,
}

impl Default for QuadratureConfig {
    fn default() -> Self {
        Self {
            rel_tolerance: 1e-10,
            abs_tolerance: 0.0,
            max_subdivisions: 500,
        }
    }
}

/// Sample count and seed for the Monte Carlo reference paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub samples: usize,
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            samples: 1_000_000,
            seed: 0x5eed,
        }
    }
}

impl MonteCarloConfig {
    pub fn with_samples(samples: usize, seed: u64) -> Self {
        Self { samples, seed }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub quadrature: QuadratureConfig,
    pub monte_carlo: MonteCarloConfig,
}

impl ModelConfig {
    /// Defaults overridden by `RECALL_QUAD_REL_TOL`, `RECALL_QUAD_ABS_TOL`,
    /// `RECALL_QUAD_MAX_SUBDIVISIONS`, `RECALL_MC_SAMPLES` and `RECALL_MC_SEED`.
    /// Unparsable values are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let quadrature = QuadratureConfig {
            rel_tolerance: env_parse("RECALL_QUAD_REL_TOL")
                .unwrap_or(defaults.quadrature.rel_tolerance),
            abs_tolerance: env_parse("RECALL_QUAD_ABS_TOL")
                .unwrap_or(defaults.quadrature.abs_tolerance),
            max_subdivisions: env_parse("RECALL_QUAD_MAX_SUBDIVISIONS")
                .unwrap_or(defaults.quadrature.max_subdivisions),
        };

        let monte_carlo = MonteCarloConfig {
            samples: env_parse("RECALL_MC_SAMPLES").unwrap_or(defaults.monte_carlo.samples),
            seed: env_parse("RECALL_MC_SEED").unwrap_or(defaults.monte_carlo.seed),
        };

        Self {
            quadrature,
            monte_carlo,
        }
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn validate(&self) -> Result<()> {
        self.quadrature.validate()?;
        self.monte_carlo.validate()
    }
}

impl QuadratureConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.rel_tolerance.is_finite() && self.rel_tolerance >= 0.0) {
            return Err(ModelError::domain("rel_tolerance", self.rel_tolerance));
        }
        if !(self.abs_tolerance.is_finite() && self.abs_tolerance >= 0.0) {
            return Err(ModelError::domain("abs_tolerance", self.abs_tolerance));
        }
        if self.rel_tolerance == 0.0 && self.abs_tolerance == 0.0 {
            return Err(ModelError::domain("tolerance", 0.0));
        }
        if self.max_subdivisions == 0 {
            return Err(ModelError::domain("max_subdivisions", 0.0));
        }
        Ok(())
    }
}

impl MonteCarloConfig {
    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 {
            return Err(ModelError::domain("samples", 0.0));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}
