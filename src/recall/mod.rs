//! Recall-Probability Estimator
//!
//! Model:
//! - At reference time `t0`, recall probability is `p ~ Beta(a, b)`
//! - At elapsed time `t`, recall probability is `p^k` with `k = t / t0`
//!   (power-law decay of the `t0` probability)
//!
//! Formulas:
//! - Mean: `E[p^k] = B(a + k, b) / B(a, b)`
//! - Variance: `E[p^2k] - E[p^k]^2`
//!
//! Both ratios are evaluated as log-Gamma differences and exponentiated once.

use serde::{Deserialize, Serialize};

use crate::config::MonteCarloConfig;
use crate::error::{ModelError, Result};
use crate::sampling::reduce_beta_samples;
use crate::sanitize::{
    clamp_prediction_moments, ensure_finite, ensure_open_unit, ensure_probability,
};
use crate::special::ln_beta_ratio;
use crate::types::{Belief, Moments};

// ==================== Constants ====================

/// Bisection steps in log-time for `time_to_recall`
const MAX_SEARCH_ITERATIONS: usize = 200;

/// Doubling steps allowed while bracketing the target time
const MAX_BRACKET_DOUBLINGS: usize = 1100;

/// Relative width at which the log-time bracket is considered resolved
const SEARCH_TOLERANCE: f64 = 1e-12;

// ==================== Data Structures ====================

/// Monte Carlo estimate of the recall-probability moments
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloRecall {
    pub mean: f64,
    /// Population variance (divides by N)
    pub variance: f64,
    pub samples: usize,
}

// ==================== Analytic ====================

/// Mean recall probability at elapsed time `t`
pub fn recall_probability_mean(belief: &Belief, t: f64) -> Result<f64> {
    belief.validate()?;
    let k = belief.exponent(t)?;

    let ln_mean = ln_beta_ratio(belief.alpha, belief.beta, k);
    ensure_finite("recall_probability_mean", &[ln_mean])?;

    // E[p^k] <= 1; rounding can push the log a few ulps above zero
    ensure_probability("recall_probability_mean", ln_mean.min(0.0).exp())
}

/// Variance of recall probability at elapsed time `t`
pub fn recall_probability_var(belief: &Belief, t: f64) -> Result<f64> {
    recall_probability_moments(belief, t).map(|m| m.variance)
}

/// Mean and variance of recall probability at elapsed time `t`
pub fn recall_probability_moments(belief: &Belief, t: f64) -> Result<Moments> {
    belief.validate()?;
    let k = belief.exponent(t)?;

    let ln_first = ln_beta_ratio(belief.alpha, belief.beta, k);
    let ln_second = ln_beta_ratio(belief.alpha, belief.beta, 2.0 * k);
    ensure_finite("recall_probability_moments", &[ln_first, ln_second])?;
    let (ln_first, ln_second) = (ln_first.min(0.0), ln_second.min(0.0));

    let mean = ln_first.exp();
    // E[q^2] - E[q]^2 = E[q]^2 (exp(ln E[q^2] - 2 ln E[q]) - 1)
    let excess = (ln_second - 2.0 * ln_first).exp_m1();
    let variance = if excess.is_finite() {
        mean * mean * excess
    } else {
        // Mean underflowed; both raw moments are effectively zero
        ln_second.exp() - mean * mean
    };

    let (mean, variance) = clamp_prediction_moments("recall_probability_moments", mean, variance)?;
    Ok(Moments { mean, variance })
}

// ==================== Monte Carlo ====================

/// Monte Carlo reference for the recall-probability moments.
///
/// Draws `config.samples` values `p ~ Beta(a, b)` and reports the sample
/// mean and variance of `p^k`. Statistical error decays as `1/sqrt(N)`; use
/// for validation, not for production predictions.
pub fn recall_probability_monte_carlo(
    belief: &Belief,
    t: f64,
    config: &MonteCarloConfig,
) -> Result<MonteCarloRecall> {
    belief.validate()?;
    config.validate()?;
    let k = belief.exponent(t)?;

    let draws = reduce_beta_samples(
        belief.alpha,
        belief.beta,
        config.samples,
        config.seed,
        |p| (1.0, p.powf(k)),
    );

    let (mean, variance) = clamp_prediction_moments(
        "recall_probability_monte_carlo",
        draws.mean(),
        draws.variance(),
    )?;

    Ok(MonteCarloRecall {
        mean,
        variance,
        samples: draws.count,
    })
}

// ==================== Time To Recall ====================

/// Elapsed time at which the mean recall probability falls to `target`.
///
/// `target = 0.5` gives the half-life of the belief. The mean is strictly
/// decreasing in `t`, so the time is bracketed by doubling/halving from `t0`
/// and then located by bisection on `ln t`.
pub fn time_to_recall(belief: &Belief, target: f64) -> Result<f64> {
    belief.validate()?;
    ensure_open_unit("target", target)?;

    let (a, b) = (belief.alpha, belief.beta);
    let ln_target = target.ln();
    // ln E[p^k] - ln target, decreasing in k
    let gap = |ln_k: f64| ln_beta_ratio(a, b, ln_k.exp()) - ln_target;

    let (mut lo, mut hi) = bracket(&gap)?;

    for _ in 0..MAX_SEARCH_ITERATIONS {
        if hi - lo <= SEARCH_TOLERANCE * hi.abs().max(1.0) {
            let k = (0.5 * (lo + hi)).exp();
            tracing::trace!(target_probability = target, k, "time_to_recall resolved");
            return Ok(belief.t0 * k);
        }

        let mid = 0.5 * (lo + hi);
        let g = gap(mid);
        if !g.is_finite() {
            return Err(ModelError::numeric(
                "time_to_recall",
                format!("non-finite recall mean at k = {}", mid.exp()),
            ));
        }

        if g > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    Err(ModelError::Convergence {
        operation: "time_to_recall",
        iterations: MAX_SEARCH_ITERATIONS,
    })
}

/// Find `ln k` bounds with `gap(lo) > 0 >= gap(hi)`
fn bracket<G>(gap: &G) -> Result<(f64, f64)>
where
    G: Fn(f64) -> f64,
{
    let step = std::f64::consts::LN_2;
    let mut lo = 0.0;
    let mut hi = 0.0;

    if gap(0.0) > 0.0 {
        // Mean at t0 is above target: move later
        for _ in 0..MAX_BRACKET_DOUBLINGS {
            hi += step;
            let g = gap(hi);
            if !g.is_finite() {
                break;
            }
            if g <= 0.0 {
                return Ok((hi - step, hi));
            }
        }
    } else {
        // Mean at t0 is at or below target: move earlier
        for _ in 0..MAX_BRACKET_DOUBLINGS {
            lo -= step;
            let g = gap(lo);
            if !g.is_finite() {
                break;
            }
            if g > 0.0 {
                return Ok((lo, lo + step));
            }
        }
    }

    Err(ModelError::Convergence {
        operation: "time_to_recall",
        iterations: MAX_BRACKET_DOUBLINGS,
    })
}

// ==================== Unit Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    fn belief(a: f64, b: f64, t0: f64) -> Belief {
        Belief::new(a, b, t0).unwrap()
    }

    #[test]
    fn test_mean_at_t0_is_beta_mean() {
        let model = belief(3.3, 4.4, 5.5);
        let mean = recall_probability_mean(&model, 5.5).unwrap();
        assert!((mean - 3.3 / 7.7).abs() < 1e-12);
    }

    #[test]
    fn test_variance_at_t0_is_beta_variance() {
        let model = belief(3.3, 4.4, 5.5);
        let var = recall_probability_var(&model, 5.5).unwrap();
        let expected = 3.3 * 4.4 / (7.7 * 7.7 * 8.7);
        assert!((var - expected).abs() < 1e-12);
    }

    #[test]
    fn test_mean_decreases_with_time() {
        let model = belief(2.0, 2.0, 10.0);
        let mut previous = 1.0;
        for &t in &[0.1, 1.0, 5.0, 10.0, 50.0, 500.0] {
            let mean = recall_probability_mean(&model, t).unwrap();
            assert!(mean < previous, "mean {} at t={} should decrease", mean, t);
            previous = mean;
        }
    }

    #[test]
    fn test_moments_agree_with_separate_calls() {
        let model = belief(34.4, 34.4, 0.5);
        let moments = recall_probability_moments(&model, 2.75).unwrap();
        let mean = recall_probability_mean(&model, 2.75).unwrap();
        let var = recall_probability_var(&model, 2.75).unwrap();
        assert_eq!(moments.mean, mean);
        assert_eq!(moments.variance, var);
        assert!(moments.variance > 0.0 && moments.variance <= 0.25);
    }

    #[test]
    fn test_variance_at_tiny_exponent() {
        // Var[p^k] -> k² (ψ'(a) - ψ'(a + b)) as k -> 0
        let model = belief(3.3, 4.4, 1.0);
        let expected = 2.148_344_332_699_5e-17;
        let var = recall_probability_var(&model, 1e-8).unwrap();
        assert!((var - expected).abs() < 1e-3 * expected, "var {}", var);

        let mean = recall_probability_mean(&model, 1e-8).unwrap();
        assert!(mean < 1.0 && 1.0 - mean < 1e-7, "mean {}", mean);
    }

    #[test]
    fn test_far_future_collapses_to_zero() {
        // E[p^k] underflows; the prediction is 0 with 0 variance, not NaN
        let model = belief(3.0, 300.0, 1.0);
        let moments = recall_probability_moments(&model, 1e6).unwrap();
        assert_eq!(moments.mean, 0.0);
        assert_eq!(moments.variance, 0.0);

        // Polynomial tail: tiny but representable
        let model = belief(3.0, 3.0, 1.0);
        let moments = recall_probability_moments(&model, 1e9).unwrap();
        assert!(moments.mean > 0.0 && moments.mean < 1e-20);
        assert!(moments.variance >= 0.0 && moments.variance < 1e-20);
    }

    #[test]
    fn test_domain_errors() {
        let model = belief(3.0, 3.0, 1.0);
        assert!(recall_probability_mean(&model, 0.0).unwrap_err().is_domain());
        assert!(recall_probability_var(&model, -2.0).unwrap_err().is_domain());
        assert!(recall_probability_mean(&model, f64::NAN).unwrap_err().is_domain());

        let broken = Belief {
            alpha: -1.0,
            beta: 3.0,
            t0: 1.0,
        };
        assert!(recall_probability_mean(&broken, 1.0).unwrap_err().is_domain());
    }

    #[test]
    fn test_monte_carlo_matches_analytic() {
        let model = belief(3.3, 4.4, 5.5);
        let config = MonteCarloConfig::with_samples(100_000, 11);
        let mc = recall_probability_monte_carlo(&model, 11.0, &config).unwrap();
        let mean = recall_probability_mean(&model, 11.0).unwrap();

        assert_eq!(mc.samples, 100_000);
        assert!((mc.mean - mean).abs() / mean < 3e-2);
    }

    #[test]
    fn test_monte_carlo_rejects_zero_samples() {
        let model = belief(3.3, 4.4, 5.5);
        let config = MonteCarloConfig::with_samples(0, 1);
        assert!(recall_probability_monte_carlo(&model, 1.0, &config)
            .unwrap_err()
            .is_domain());
    }

    #[test]
    fn test_half_life_of_symmetric_belief_is_t0() {
        let model = belief(4.0, 4.0, 24.0);
        let half_life = time_to_recall(&model, 0.5).unwrap();
        assert!((half_life - 24.0).abs() < 1e-6, "half-life {}", half_life);
    }

    #[test]
    fn test_time_to_recall_hits_target() {
        let model = belief(3.3, 4.4, 5.5);
        for &target in &[0.9, 0.5, 0.2, 0.01] {
            let t = time_to_recall(&model, target).unwrap();
            let mean = recall_probability_mean(&model, t).unwrap();
            assert!((mean - target).abs() < 1e-8, "target {} got {}", target, mean);
        }
    }

    #[test]
    fn test_lower_target_gives_longer_time() {
        let model = belief(3.0, 2.0, 10.0);
        let t80 = time_to_recall(&model, 0.8).unwrap();
        let t50 = time_to_recall(&model, 0.5).unwrap();
        assert!(t80 < t50);
    }

    #[test]
    fn test_time_to_recall_rejects_bad_target() {
        let model = belief(3.0, 2.0, 10.0);
        assert!(time_to_recall(&model, 0.0).unwrap_err().is_domain());
        assert!(time_to_recall(&model, 1.0).unwrap_err().is_domain());
    }
}
