//! KL Divergence between Beta distributions
//!
//! `KL(Beta(a, b) || Beta(a2, b2))` in nats:
//!
//! ```text
//! ln B(a2, b2) - ln B(a, b) + (a - a2) ψ(a) + (b - b2) ψ(b) - (a + b - a2 - b2) ψ(a + b)
//! ```
//!
//! Used to compare posterior strategies; never on the update path.

use crate::special::{digamma, ln_beta};
use crate::types::BetaPair;

/// KL divergence from `Beta(a, b)` to `Beta(a2, b2)`.
///
/// Non-positive shapes give NaN.
pub fn kl_div_beta(a: f64, b: f64, a2: f64, b2: f64) -> f64 {
    ln_beta(a2, b2) - ln_beta(a, b)
        + (a - a2) * digamma(a)
        + (b - b2) * digamma(b)
        - (a + b - a2 - b2) * digamma(a + b)
}

/// Average of the two KL directions
pub fn symmetric_kl(left: &BetaPair, right: &BetaPair) -> f64 {
    let forward = kl_div_beta(left.alpha, left.beta, right.alpha, right.beta);
    let backward = kl_div_beta(right.alpha, right.beta, left.alpha, left.beta);
    0.5 * (forward + backward)
}
