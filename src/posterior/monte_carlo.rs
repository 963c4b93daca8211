//! Monte Carlo posterior: importance-weighted prior samples.
//!
//! Reference oracle for the analytic and quadrature strategies; not meant
//! for the production update path.

use crate::config::MonteCarloConfig;
use crate::error::Result;
use crate::sampling::reduce_beta_samples;
use crate::types::{Belief, BetaPair, Observation, Outcome};

use super::match_moments;

/// Moment-matched Beta posterior from `config.samples` weighted prior draws.
///
/// Each draw `p ~ Beta(a, b)` contributes `q = p^k` with weight `q` on
/// success and `1 - q` on failure.
pub fn posterior_monte_carlo(
    belief: &Belief,
    observation: &Observation,
    config: &MonteCarloConfig,
) -> Result<BetaPair> {
    belief.validate()?;
    config.validate()?;
    let k = belief.exponent(observation.t)?;
    let recalled = observation.outcome == Outcome::Recalled;

    let draws = reduce_beta_samples(
        belief.alpha,
        belief.beta,
        config.samples,
        config.seed,
        |p| {
            let ln_q = k * p.ln();
            let q = ln_q.exp();
            let weight = if recalled { q } else { -ln_q.exp_m1() };
            (weight, q)
        },
    );

    match_moments("posterior_monte_carlo", draws.mean(), draws.variance())
}
