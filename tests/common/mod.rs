#![allow(dead_code)]

use recall_bayes::{logging, Belief};

pub const SHAPES: [(f64, f64); 2] = [(3.3, 4.4), (34.4, 34.4)];
pub const REFERENCE_TIMES: [f64; 3] = [0.5, 5.5, 15.5];

pub fn init_logging() {
    logging::init_tracing("recall_bayes=debug");
}

/// Every belief in the shape × reference-time grid
pub fn belief_grid() -> Vec<Belief> {
    SHAPES
        .iter()
        .flat_map(|&(alpha, beta)| {
            REFERENCE_TIMES
                .iter()
                .map(move |&t0| Belief::new(alpha, beta, t0).unwrap())
        })
        .collect()
}
