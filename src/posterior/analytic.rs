//! Closed-form posterior moments.
//!
//! With `m_n = E[q^n] = B(a + nk, b) / B(a, b)` and `K_n = ln m_n`:
//!
//! - recalled: `E[q | x] = m_2 / m_1`, `E[q^2 | x] = m_3 / m_1`
//! - forgotten: `E[q | x] = (m_1 - m_2) / (1 - m_1)`,
//!   `E[q^2 | x] = (m_2 - m_3) / (1 - m_1)`
//!
//! Every difference of moments is formed from differences of `K_n` through
//! `expm1`, and each carries an error bound derived from the bounds on `K_n`.
//! A variance that does not clear its own error bound a hundredfold is a
//! numeric error, not a posterior.

use crate::error::{ModelError, Result};
use crate::sanitize::ensure_finite;
use crate::special::{ln_beta_ratio_estimate, Estimate};
use crate::types::{Belief, BetaPair, Observation, Outcome};

use super::match_moments;

const OPERATION: &str = "posterior_analytic";

/// Smallest accepted ratio of a variance to its rounding-error bound
const SIGNIFICANCE: f64 = 1e2;

/// Moment-matched Beta posterior for recall probability at `observation.t`
pub fn posterior_analytic(belief: &Belief, observation: &Observation) -> Result<BetaPair> {
    belief.validate()?;
    let k = belief.exponent(observation.t)?;
    let (a, b) = (belief.alpha, belief.beta);

    let log_moments = [k, 2.0 * k, 3.0 * k].map(|shift| ln_beta_ratio_estimate(a, b, shift));
    ensure_finite(OPERATION, &log_moments.map(|m| m.value))?;
    // E[q^n] <= 1; anything above is rounding
    let [m1, m2, m3] = log_moments.map(|m| Estimate {
        value: m.value.min(0.0),
        error: m.error,
    });

    let (mean, variance) = match observation.outcome {
        Outcome::Recalled => recalled_moments(m1, m2, m3)?,
        Outcome::Forgotten => forgotten_moments(m1, m2, m3)?,
    };

    match_moments(OPERATION, mean, variance)
}

fn recalled_moments(m1: Estimate, m2: Estimate, m3: Estimate) -> Result<(f64, f64)> {
    let mean = (m2.value - m1.value).exp();

    // m3/m1 - (m2/m1)^2 = mean^2 (exp(K3 + K1 - 2 K2) - 1)
    let excess = m3.value + m1.value - 2.0 * m2.value;
    let excess_error = m3.error
        + m1.error
        + 2.0 * m2.error
        + ROUNDING * (m3.value.abs() + m1.value.abs() + 2.0 * m2.value.abs());
    ensure_significant("variance", excess, excess_error)?;

    Ok((mean, mean * mean * excess.exp_m1()))
}

fn forgotten_moments(m1: Estimate, m2: Estimate, m3: Estimate) -> Result<(f64, f64)> {
    // 1 - m1, m1 - m2 and m2 - m3, each with its relative error
    let (marginal, marginal_rel) = complement(m1.value, m1.error);
    if !(marginal > 0.0) {
        return Err(ModelError::numeric(
            OPERATION,
            format!("marginal likelihood of failure {marginal} is not positive"),
        ));
    }
    let (gap12, gap12_rel) = scaled_complement(m1, m2);
    let (gap23, gap23_rel) = scaled_complement(m2, m3);

    let mean = gap12 / marginal;

    // Var = (m2 - m3)/(1 - m1) - mean^2 = [(m2 - m3)(1 - m1) - (m1 - m2)^2] / (1 - m1)^2
    let cross = gap23 * marginal;
    let square = gap12 * gap12;
    let numerator = cross - square;
    let numerator_error =
        cross * (gap23_rel + marginal_rel) + square * 2.0 * gap12_rel + ROUNDING * (cross + square);
    ensure_significant("variance", numerator, numerator_error)?;

    Ok((mean, numerator / (marginal * marginal)))
}

/// `1 - exp(x)` for `x <= 0` and its relative error given an absolute error in `x`
fn complement(x: f64, error: f64) -> (f64, f64) {
    let value = -x.exp_m1();
    (value, error * x.exp() / value + ROUNDING)
}

/// `exp(hi) - exp(lo)` as `exp(hi) (1 - exp(lo - hi))` with its relative error
fn scaled_complement(hi: Estimate, lo: Estimate) -> (f64, f64) {
    let (value, rel) = complement(lo.value - hi.value, hi.error + lo.error);
    (hi.value.exp() * value, rel + hi.error + ROUNDING)
}

fn ensure_significant(quantity: &str, value: f64, error: f64) -> Result<()> {
    if value > SIGNIFICANCE * error {
        Ok(())
    } else {
        Err(ModelError::numeric(
            OPERATION,
            format!("{quantity} {value} lost to cancellation (error bound {error})"),
        ))
    }
}

const ROUNDING: f64 = 4.0 * f64::EPSILON;
