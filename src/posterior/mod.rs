//! Posterior Updater
//!
//! After a quiz `(x, t)` the exact posterior on recall probability is not a
//! Beta distribution. Every strategy here computes the first two posterior
//! moments of `q = p^k` (recall probability at the new reference time `t`)
//! and moment-matches a Beta pair:
//!
//! - [`posterior_analytic`] - closed-form Beta-function ratios
//! - [`posterior_quad`] - adaptive Gauss-Kronrod over `p ∈ (0, 1)`
//! - [`posterior_monte_carlo`] - weighted samples, a reference oracle
//!
//! [`update_recall`] dispatches to exactly one strategy and re-anchors the
//! result at `t`. A failing strategy is reported, never retried with another.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ModelConfig;
use crate::error::Result;
use crate::sanitize::ensure_valid_moments;
use crate::types::{Belief, BetaPair, Observation};

pub mod analytic;
pub mod monte_carlo;
pub mod quadrature;

pub use analytic::posterior_analytic;
pub use monte_carlo::posterior_monte_carlo;
pub use quadrature::posterior_quad;

/// How the posterior moments are computed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Analytic,
    Quadrature {
        /// Use the closed-form marginal and the normalized prior density
        analytic_marginal: bool,
    },
    MonteCarlo,
}

/// Update `belief` with `observation` and return the next belief, anchored
/// at the observation time.
pub fn update_recall(
    belief: &Belief,
    observation: &Observation,
    strategy: Strategy,
    config: &ModelConfig,
) -> Result<Belief> {
    let result = match strategy {
        Strategy::Analytic => posterior_analytic(belief, observation),
        Strategy::Quadrature { analytic_marginal } => {
            posterior_quad(belief, observation, analytic_marginal, &config.quadrature)
        }
        Strategy::MonteCarlo => posterior_monte_carlo(belief, observation, &config.monte_carlo),
    };

    match result {
        Ok(pair) => {
            debug!(
                ?strategy,
                outcome = ?observation.outcome,
                t = observation.t,
                prior_alpha = belief.alpha,
                prior_beta = belief.beta,
                prior_t0 = belief.t0,
                alpha = pair.alpha,
                beta = pair.beta,
                "recall belief updated"
            );
            pair.anchored_at(observation.t)
        }
        Err(err) => {
            if !err.is_domain() {
                warn!(?strategy, error = %err, "posterior update failed");
            }
            Err(err)
        }
    }
}

/// Beta pair matching posterior moments computed by `operation`
fn match_moments(operation: &'static str, mean: f64, variance: f64) -> Result<BetaPair> {
    ensure_valid_moments(operation, mean, variance)?;
    BetaPair::from_moments(mean, variance)
}
