//! # recall-bayes - Bayesian recall-probability model
//!
//! Pure Rust implementation of a Beta/power-law memory model for
//! spaced-repetition schedulers:
//!
//! - **Belief** - recall probability at reference time `t0` is `Beta(alpha, beta)`
//! - **Forgetting** - recall probability at elapsed time `t` is `p^(t/t0)`
//! - **Prediction** - mean and variance of recall probability at any `t`
//! - **Update** - moment-matched Beta posterior after a quiz at `t`,
//!   re-anchored at `t`
//!
//! ## Module layout
//!
//! - [`special`] - log-Gamma, digamma, log-Beta ratios
//! - [`quadrature`] - adaptive Gauss-Kronrod integration
//! - [`sampling`] - seeded Beta sampler and chunked Monte Carlo reduction
//! - [`recall`] - recall-probability estimator (analytic and Monte Carlo)
//! - [`posterior`] - posterior updater (analytic, quadrature, Monte Carlo)
//! - [`divergence`] - KL divergence between Beta distributions
//! - [`sanitize`] - input validation and result checks
//! - [`config`] / [`error`] / [`logging`] - ambient plumbing
//! - [`types`] - shared value types and constants
//!
//! ## Example
//!
//! ```rust
//! use recall_bayes::{
//!     recall_probability_mean, update_recall, Belief, ModelConfig, Observation, Strategy,
//! };
//!
//! let belief = Belief::new(3.0, 3.0, 24.0).unwrap();
//! let p = recall_probability_mean(&belief, 12.0).unwrap();
//! assert!(p > 0.5);
//!
//! let quiz = Observation::new(1.0, 30.0).unwrap();
//! let next = update_recall(&belief, &quiz, Strategy::Analytic, &ModelConfig::default()).unwrap();
//! assert_eq!(next.t0, 30.0);
//! ```

// ============================================================================
// Module declarations
// ============================================================================

pub mod config;
pub mod divergence;
pub mod error;
pub mod logging;
pub mod posterior;
pub mod quadrature;
pub mod recall;
pub mod sampling;
pub mod sanitize;
pub mod special;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use config::{ModelConfig, MonteCarloConfig, QuadratureConfig};
pub use error::{ModelError, Result};

pub use recall::{
    recall_probability_mean, recall_probability_moments, recall_probability_monte_carlo,
    recall_probability_var, time_to_recall, MonteCarloRecall,
};

pub use posterior::{
    posterior_analytic, posterior_monte_carlo, posterior_quad, update_recall, Strategy,
};

pub use divergence::{kl_div_beta, symmetric_kl};
