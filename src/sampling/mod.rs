//! Beta Sampling
//!
//! Seeded sampler used by the Monte Carlo reference paths.
//!
//! - Beta(alpha, beta) = X / (X + Y) with X ~ Gamma(alpha), Y ~ Gamma(beta)
//! - Gamma via Marsaglia-Tsang, with the `U^(1/shape)` boost for shape < 1
//! - Standard normals via Box-Muller
//!
//! Monte Carlo work is split into chunks of [`MONTE_CARLO_CHUNK`] samples.
//! Chunk `i` draws from `ChaCha8Rng::seed_from_u64(seed)` on stream `i`, so
//! every chunk has an independent stream, the result does not depend on how
//! rayon schedules the chunks, and the same seed reproduces the same moments.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::types::MONTE_CARLO_CHUNK;

// ==================== Constants ====================

/// Smallest uniform draw fed to a logarithm or a negative power
const MIN_UNIFORM: f64 = 1e-300;

/// Rejection-loop cap for one Gamma draw
const MAX_GAMMA_ITERATIONS: usize = 1000;

// ==================== Sampler ====================

/// Beta/Gamma sampler over a ChaCha8 stream
pub struct BetaSampler {
    rng: ChaCha8Rng,
}

impl BetaSampler {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Sampler on stream `stream` of `seed`
    pub fn with_stream(seed: u64, stream: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        Self { rng }
    }

    /// Sample from Beta(alpha, beta); both shapes must be positive
    pub fn sample_beta(&mut self, alpha: f64, beta: f64) -> f64 {
        let x = self.sample_gamma(alpha);
        let y = self.sample_gamma(beta);

        let sum = x + y;
        if sum > 0.0 && sum.is_finite() {
            x / sum
        } else if alpha >= beta {
            // Both draws underflowed; tiny shapes put all mass near 0 and 1
            1.0
        } else {
            0.0
        }
    }

    /// Sample from Gamma(shape, 1) using Marsaglia-Tsang
    ///
    /// Reference: Marsaglia, G., & Tsang, W. W. (2000).
    /// "A simple method for generating gamma variables."
    pub fn sample_gamma(&mut self, shape: f64) -> f64 {
        if shape <= 0.0 {
            return 0.0;
        }

        // Gamma(a) = Gamma(a + 1) * U^(1/a)
        if shape < 1.0 {
            let u: f64 = self.rng.gen::<f64>().max(MIN_UNIFORM);
            return self.sample_gamma(1.0 + shape) * u.powf(1.0 / shape);
        }

        let d = shape - 1.0 / 3.0;
        let c = 1.0 / (9.0 * d).sqrt();

        for _ in 0..MAX_GAMMA_ITERATIONS {
            let x = self.sample_normal();
            let v_term = 1.0 + c * x;

            if v_term <= 0.0 {
                continue;
            }

            let v = v_term * v_term * v_term;
            let u: f64 = self.rng.gen::<f64>().max(MIN_UNIFORM);
            let x2 = x * x;

            // Squeeze
            if u < 1.0 - 0.0331 * x2 * x2 {
                return d * v;
            }

            if u.ln() < 0.5 * x2 + d * (1.0 - v + v.ln()) {
                return d * v;
            }
        }

        // Acceptance rate exceeds 95% for shape >= 1
        d
    }

    /// Standard normal via Box-Muller
    pub fn sample_normal(&mut self) -> f64 {
        let u1: f64 = self.rng.gen::<f64>().max(MIN_UNIFORM);
        let u2: f64 = self.rng.gen();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

// ==================== Chunked Reduction ====================

/// Running weighted mean and spread of a sampled quantity `q`.
///
/// Weighted Welford update per sample; chunks combine with the pairwise
/// correction `δ² W_a W_b / W`. The spread is accumulated about the running
/// mean, so a tiny variance around a mean near 1 is not cancelled away.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WeightedMoments {
    pub count: usize,
    /// `Σw`
    pub weight: f64,
    /// `Σwq / Σw`
    pub center: f64,
    /// `Σw (q - center)²`
    pub spread: f64,
}

impl WeightedMoments {
    pub fn push(&mut self, weight: f64, q: f64) {
        self.count += 1;
        if weight == 0.0 {
            return;
        }
        self.weight += weight;
        let delta = q - self.center;
        self.center += delta * weight / self.weight;
        self.spread += weight * delta * (q - self.center);
    }

    pub fn merge(mut self, other: Self) -> Self {
        let total = self.weight + other.weight;
        if other.weight > 0.0 && total > 0.0 {
            let delta = other.center - self.center;
            self.center += delta * other.weight / total;
            self.spread += other.spread + delta * delta * self.weight * other.weight / total;
            self.weight = total;
        }
        self.count += other.count;
        self
    }

    /// Weighted mean of `q`; NaN when no sample carried weight
    pub fn mean(&self) -> f64 {
        if self.weight > 0.0 {
            self.center
        } else {
            f64::NAN
        }
    }

    /// Weighted (population) variance of `q`
    pub fn variance(&self) -> f64 {
        self.spread / self.weight
    }
}

/// Draw `samples` values `p ~ Beta(alpha, beta)` in parallel and accumulate
/// the `(weight, value)` pair returned by `observe(p)` into [`WeightedMoments`].
///
/// Chunk moments are merged in chunk order, so the result is bit-for-bit
/// reproducible for a given seed.
pub fn reduce_beta_samples<F>(
    alpha: f64,
    beta: f64,
    samples: usize,
    seed: u64,
    observe: F,
) -> WeightedMoments
where
    F: Fn(f64) -> (f64, f64) + Sync,
{
    let chunks = samples.div_ceil(MONTE_CARLO_CHUNK);

    (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * MONTE_CARLO_CHUNK;
            let len = MONTE_CARLO_CHUNK.min(samples - start);
            let mut sampler = BetaSampler::with_stream(seed, chunk as u64);
            let mut moments = WeightedMoments::default();

            for _ in 0..len {
                let (weight, value) = observe(sampler.sample_beta(alpha, beta));
                moments.push(weight, value);
            }
            moments
        })
        .collect::<Vec<_>>()
        .into_iter()
        .fold(WeightedMoments::default(), WeightedMoments::merge)
}

// ==================== Unit Tests ====================
