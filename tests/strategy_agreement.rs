//! Cross-checks between the analytic, quadrature and Monte Carlo paths
//! over a grid of beliefs, elapsed times and outcomes.

mod common;

use recall_bayes::{
    kl_div_beta, posterior_analytic, posterior_monte_carlo, posterior_quad,
    recall_probability_mean, recall_probability_monte_carlo, symmetric_kl, Belief, BetaPair,
    MonteCarloConfig, Observation, QuadratureConfig,
};

use common::{belief_grid, init_logging};

const PRIOR_RATIOS: [f64; 5] = [0.1, 0.99, 1.0, 1.01, 5.5];
const POSTERIOR_RATIOS: [f64; 3] = [0.1, 1.0, 5.5];
const MAX_POSTERIOR_KL: f64 = 1e-4;

fn quizzes(belief: &Belief, ratio: f64) -> [Observation; 2] {
    let t = belief.t0 * ratio;
    [
        Observation::forgotten(t).unwrap(),
        Observation::recalled(t).unwrap(),
    ]
}

#[test]
fn prior_mean_matches_monte_carlo() {
    init_logging();
    let config = MonteCarloConfig::with_samples(100_000, 2024);

    for belief in belief_grid() {
        for &ratio in &PRIOR_RATIOS {
            let t = belief.t0 * ratio;
            let exact = recall_probability_mean(&belief, t).unwrap();
            let sampled = recall_probability_monte_carlo(&belief, t, &config).unwrap();

            let rel = (sampled.mean - exact).abs() / exact;
            assert!(
                rel < 3e-2,
                "{:?} t={} analytic={} mc={} rel={}",
                belief,
                t,
                exact,
                sampled.mean,
                rel
            );
        }
    }
}

#[test]
fn posterior_analytic_matches_monte_carlo() {
    init_logging();
    let config = MonteCarloConfig::with_samples(1_000_000, 2025);

    for belief in belief_grid() {
        for &ratio in &POSTERIOR_RATIOS {
            for quiz in quizzes(&belief, ratio) {
                let exact = posterior_analytic(&belief, &quiz).unwrap();
                let sampled = posterior_monte_carlo(&belief, &quiz, &config).unwrap();
                let kl = symmetric_kl(&exact, &sampled);
                assert!(
                    kl < MAX_POSTERIOR_KL,
                    "{:?} {:?} analytic={:?} mc={:?} kl={}",
                    belief,
                    quiz,
                    exact,
                    sampled,
                    kl
                );
            }
        }
    }
}

#[test]
fn posterior_quadrature_matches_analytic_when_it_succeeds() {
    init_logging();
    let config = QuadratureConfig::default();

    for belief in belief_grid() {
        for &ratio in &POSTERIOR_RATIOS {
            for quiz in quizzes(&belief, ratio) {
                let exact = posterior_analytic(&belief, &quiz).unwrap();
                for analytic_marginal in [true, false] {
                    // Failures are legitimate outcomes; only successes are compared
                    let Ok(pair) = posterior_quad(&belief, &quiz, analytic_marginal, &config) else {
                        continue;
                    };
                    let kl = symmetric_kl(&exact, &pair);
                    assert!(
                        kl < MAX_POSTERIOR_KL,
                        "{:?} {:?} marginal={} kl={}",
                        belief,
                        quiz,
                        analytic_marginal,
                        kl
                    );
                }
            }
        }
    }
}

#[test]
fn posterior_quadrature_matches_monte_carlo() {
    init_logging();
    let quad_config = QuadratureConfig::default();
    let mc_config = MonteCarloConfig::with_samples(1_000_000, 2025);
    let mut compared = 0;

    for belief in belief_grid() {
        for &ratio in &POSTERIOR_RATIOS {
            for quiz in quizzes(&belief, ratio) {
                let sampled = posterior_monte_carlo(&belief, &quiz, &mc_config).unwrap();
                for analytic_marginal in [true, false] {
                    let Ok(pair) = posterior_quad(&belief, &quiz, analytic_marginal, &quad_config) else {
                        continue;
                    };
                    let kl = symmetric_kl(&pair, &sampled);
                    assert!(
                        kl < MAX_POSTERIOR_KL,
                        "{:?} {:?} marginal={} quad={:?} mc={:?} kl={}",
                        belief,
                        quiz,
                        analytic_marginal,
                        pair,
                        sampled,
                        kl
                    );
                    compared += 1;
                }
            }
        }
    }

    // The normalized density never underflows on this grid
    assert!(compared >= belief_grid().len() * POSTERIOR_RATIOS.len() * 2);
}

#[test]
fn narrow_posterior_matches_monte_carlo() {
    // Beta(100, 1) forgotten at k = 0.01: variance ~1e-8 of the raw moments
    let belief = Belief::new(100.0, 1.0, 1.0).unwrap();
    let quiz = Observation::forgotten(0.01).unwrap();
    let sampled = posterior_monte_carlo(
        &belief,
        &quiz,
        &MonteCarloConfig::with_samples(1_000_000, 2027),
    )
    .unwrap();

    match posterior_analytic(&belief, &quiz) {
        Ok(exact) => {
            let kl = symmetric_kl(&exact, &sampled);
            assert!(kl < MAX_POSTERIOR_KL, "analytic={:?} mc={:?} kl={}", exact, sampled, kl);
        }
        Err(err) => assert!(err.is_numeric(), "{}", err),
    }

    for analytic_marginal in [true, false] {
        let pair = posterior_quad(&belief, &quiz, analytic_marginal, &QuadratureConfig::default()).unwrap();
        let kl = symmetric_kl(&pair, &sampled);
        assert!(kl < MAX_POSTERIOR_KL, "marginal={} quad={:?} mc={:?} kl={}", analytic_marginal, pair, sampled, kl);
    }
}

#[test]
fn update_at_reference_time_is_conjugate() {
    let config = QuadratureConfig::default();

    for belief in belief_grid() {
        let (a, b) = (belief.alpha, belief.beta);
        let [failure, success] = quizzes(&belief, 1.0);

        for (quiz, conjugate) in [(success, (a + 1.0, b)), (failure, (a, b + 1.0))] {
            let exact = BetaPair::new(conjugate.0, conjugate.1).unwrap();
            let analytic = posterior_analytic(&belief, &quiz).unwrap();
            assert!((analytic.alpha - exact.alpha).abs() < 1e-9 * exact.alpha);
            assert!((analytic.beta - exact.beta).abs() < 1e-9 * exact.beta);

            for analytic_marginal in [true, false] {
                let pair = posterior_quad(&belief, &quiz, analytic_marginal, &config).unwrap();
                let kl = symmetric_kl(&analytic, &pair);
                assert!(kl < 1e-8, "{:?} {:?} kl={}", belief, quiz, kl);
            }
        }
    }
}

#[test]
fn quiz_outcome_moves_posterior_mean() {
    let belief = Belief::new(3.3, 4.4, 5.5).unwrap();
    let prior_mean = recall_probability_mean(&belief, 5.5).unwrap();

    let success = posterior_analytic(&belief, &Observation::new(1.0, 5.5).unwrap()).unwrap();
    let failure = posterior_analytic(&belief, &Observation::new(0.0, 5.5).unwrap()).unwrap();

    assert!(success.mean() > prior_mean);
    assert!(failure.mean() < prior_mean);
}

#[test]
fn kl_reference_values() {
    assert!((kl_div_beta(1.0, 1.0, 3.0, 3.0) - 0.598803).abs() < 5e-6);
    assert!((kl_div_beta(3.0, 3.0, 1.0, 1.0) - 0.267864).abs() < 5e-6);
    assert_eq!(kl_div_beta(3.3, 4.4, 3.3, 4.4), 0.0);
}

#[test]
fn monte_carlo_is_reproducible() {
    let belief = Belief::new(3.3, 4.4, 5.5).unwrap();
    let quiz = Observation::recalled(11.0).unwrap();
    let config = MonteCarloConfig::with_samples(300_000, 99);

    let first = posterior_monte_carlo(&belief, &quiz, &config).unwrap();
    let second = posterior_monte_carlo(&belief, &quiz, &config).unwrap();
    assert_eq!(first, second);

    let prior_first = recall_probability_monte_carlo(&belief, 11.0, &config).unwrap();
    let prior_second = recall_probability_monte_carlo(&belief, 11.0, &config).unwrap();
    assert_eq!(prior_first, prior_second);
}
