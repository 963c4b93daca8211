//! Posterior moments by numerical integration over `p ∈ (0, 1)`.
//!
//! Weight `w(p) = f(p) L(p)` with `q = p^k` and `L = q` on success, `1 - q`
//! on failure. `f` is either the normalized Beta density (marginal taken in
//! closed form) or the bare kernel `p^(a-1) (1-p)^(b-1)` with the marginal
//! `M = ∫ w` integrated as well. The bare kernel underflows for large shapes;
//! that surfaces as a numeric error.
//!
//! The variance is integrated about the mean, `∫ w (q - mean)^2 / M`, never as
//! `E[q^2] - mean^2`. When the mean is above 1/2 the deviation is taken as
//! `r̄ - r` with `r = 1 - q` from `-expm1(k ln p)`, so a posterior mass piled
//! near `q = 1` keeps its spread.

use tracing::debug;

use crate::config::QuadratureConfig;
use crate::error::{ModelError, Result};
use crate::quadrature::integrate_unit_interval;
use crate::sanitize::ensure_finite;
use crate::special::{ln_beta, ln_beta_ratio};
use crate::types::{Belief, BetaPair, Observation, Outcome};

use super::match_moments;

const OPERATION: &str = "posterior_quad";

/// Prior weight and likelihood at one abscissa
#[derive(Clone, Copy)]
struct Weighted {
    /// `f(p) L(p)`
    weight: f64,
    /// `ln q = k ln p`
    ln_q: f64,
}

impl Weighted {
    fn q(self) -> f64 {
        self.ln_q.exp()
    }

    /// `1 - q` without cancellation
    fn r(self) -> f64 {
        -self.ln_q.exp_m1()
    }
}

/// Moment-matched Beta posterior computed by adaptive Gauss-Kronrod
pub fn posterior_quad(
    belief: &Belief,
    observation: &Observation,
    analytic_marginal: bool,
    config: &QuadratureConfig,
) -> Result<BetaPair> {
    belief.validate()?;
    config.validate()?;
    let k = belief.exponent(observation.t)?;
    let (a, b) = (belief.alpha, belief.beta);
    let recalled = observation.outcome == Outcome::Recalled;

    let ln_norm = if analytic_marginal { ln_beta(a, b) } else { 0.0 };
    ensure_finite(OPERATION, &[ln_norm])?;

    // Both logs from whichever of p, 1 - p is held exactly
    let weighted = move |p: f64, u: f64| {
        let ln_p = if p <= 0.5 { p.ln() } else { (-u).ln_1p() };
        let ln_u = if u <= 0.5 { u.ln() } else { (-p).ln_1p() };
        let ln_q = k * ln_p;
        let ln_f = (a - 1.0) * ln_p + (b - 1.0) * ln_u - ln_norm;
        let weight = if recalled {
            (ln_f + ln_q).exp()
        } else {
            ln_f.exp() * -ln_q.exp_m1()
        };
        Weighted { weight, ln_q }
    };
    let integrate = |moment: &dyn Fn(Weighted) -> f64| {
        integrate_unit_interval(|p, u| moment(weighted(p, u)), config)
    };

    let marginal = if analytic_marginal {
        let ln_m1 = ln_beta_ratio(a, b, k);
        ensure_finite(OPERATION, &[ln_m1])?;
        if recalled {
            ln_m1.exp()
        } else {
            -ln_m1.exp_m1()
        }
    } else {
        integrate(&|w: Weighted| w.weight)?.value
    };

    if !(marginal > 0.0 && marginal.is_finite()) {
        return Err(ModelError::numeric(
            OPERATION,
            format!("marginal likelihood {marginal} underflowed"),
        ));
    }

    let first = integrate(&|w: Weighted| w.weight * w.q())?;
    let mean = first.value / marginal;

    let spread = if mean > 0.5 {
        let shortfall = integrate(&|w: Weighted| w.weight * w.r())?.value / marginal;
        integrate(&|w: Weighted| {
            let deviation = shortfall - w.r();
            w.weight * deviation * deviation
        })?
    } else {
        integrate(&|w: Weighted| {
            let deviation = w.q() - mean;
            w.weight * deviation * deviation
        })?
    };

    debug!(
        analytic_marginal,
        marginal,
        subdivisions = first.subdivisions + spread.subdivisions,
        error = first.error.max(spread.error),
        "posterior quadrature converged"
    );

    match_moments(OPERATION, mean, spread.value / marginal)
}
