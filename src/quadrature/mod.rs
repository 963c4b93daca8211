//! Adaptive Gauss-Kronrod Quadrature
//!
//! Globally adaptive 7/15-point Gauss-Kronrod integration on a finite
//! interval:
//! - Each panel is integrated with the 15-point Kronrod rule; the embedded
//!   7-point Gauss rule gives the error estimate `|K15 - G7|`
//! - The panel with the largest error estimate is bisected until the summed
//!   error meets `max(abs_tolerance, rel_tolerance * |I|)`
//! - At most `max_subdivisions` bisections; beyond that a convergence error
//!
//! Nodes are strictly interior to each panel. On `(0, 1)` that is not enough
//! near `p = 1`: a node within half an ulp of 1 rounds to 1 and `ln(1 - p)`
//! becomes `-inf`. [`integrate_unit_interval`] therefore splits the interval
//! at 1/2 and integrates the upper half in `u = 1 - p`, handing the integrand
//! both `p` and `1 - p` with whichever of the two is small held exactly.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::config::QuadratureConfig;
use crate::error::{ModelError, Result};

// ==================== Constants ====================

/// Kronrod abscissae on [0, 1]; odd indices are the Gauss nodes, the last is 0
const XGK: [f64; 8] = [
    0.991_455_371_120_812_639_206_854_697_526_329,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.586_087_235_467_691_130_294_144_845_693_013,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0.0,
];

/// Kronrod weights
const WGK: [f64; 8] = [
    0.022_935_322_010_529_224_963_732_008_058_970,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.209_482_141_084_727_828_012_999_174_891_714,
];

/// Gauss weights for XGK[1], XGK[3], XGK[5] and the center
const WG: [f64; 4] = [
    0.129_484_966_168_869_693_270_611_432_679_082,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.417_959_183_673_469_387_755_102_040_816_327,
];

// ==================== Data Structures ====================

/// Result of a successful integration
#[derive(Clone, Copy, Debug)]
pub struct Integral {
    /// Integral estimate
    pub value: f64,
    /// Summed error estimate over all panels
    pub error: f64,
    /// Bisections performed
    pub subdivisions: usize,
}

/// Coordinate a panel is laid out in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Chart {
    /// Abscissa `x` is `p`
    Direct,
    /// Abscissa `x` is `1 - p`
    Mirrored,
}

impl Chart {
    /// `(p, 1 - p)` at abscissa `x`
    fn point(self, x: f64) -> (f64, f64) {
        match self {
            Chart::Direct => (x, 1.0 - x),
            Chart::Mirrored => (1.0 - x, x),
        }
    }
}

/// One panel of the adaptive partition
#[derive(Clone, Copy, Debug)]
struct Panel {
    chart: Chart,
    lo: f64,
    hi: f64,
    value: f64,
    error: f64,
}

impl PartialEq for Panel {
    fn eq(&self, other: &Self) -> bool {
        self.error.total_cmp(&other.error) == Ordering::Equal
    }
}

impl Eq for Panel {}

impl PartialOrd for Panel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Panel {
    // Max-heap on the error estimate
    fn cmp(&self, other: &Self) -> Ordering {
        self.error.total_cmp(&other.error)
    }
}

// ==================== Integration ====================

/// Integrate `f` over `[lo, hi]`.
///
/// A non-finite integrand value aborts with a numeric error; exhausting the
/// subdivision budget aborts with a convergence error.
pub fn integrate<F>(f: F, lo: f64, hi: f64, config: &QuadratureConfig) -> Result<Integral>
where
    F: Fn(f64) -> f64,
{
    if !(lo.is_finite() && hi.is_finite() && lo < hi) {
        return Err(ModelError::domain("integration interval", hi - lo));
    }

    let on_line = |x: f64, _: f64| f(x);
    let whole = kronrod_panel(&on_line, Chart::Direct, lo, hi)?;
    adapt(&on_line, vec![whole], config)
}

/// Integrate `f(p, 1 - p)` over `p ∈ (0, 1)`.
///
/// `(0, 1/2]` is integrated in `p` and `[1/2, 1)` in `u = 1 - p`; both halves
/// share one error budget and one adaptive heap. Neither argument passed to
/// `f` is ever exactly 0. The one below 1/2 is exact; the other is formed as
/// `1 - x`, so `ln p` is best taken as `ln_1p(-(1 - p))` when `p > 1/2`.
pub fn integrate_unit_interval<F>(f: F, config: &QuadratureConfig) -> Result<Integral>
where
    F: Fn(f64, f64) -> f64,
{
    let lower = kronrod_panel(&f, Chart::Direct, 0.0, 0.5)?;
    let upper = kronrod_panel(&f, Chart::Mirrored, 0.0, 0.5)?;
    adapt(&f, vec![lower, upper], config)
}

/// Bisect the worst panel until the summed error meets the tolerance
fn adapt<F>(f: &F, panels: Vec<Panel>, config: &QuadratureConfig) -> Result<Integral>
where
    F: Fn(f64, f64) -> f64,
{
    let mut value: f64 = panels.iter().map(|p| p.value).sum();
    let mut error: f64 = panels.iter().map(|p| p.error).sum();
    let mut heap = BinaryHeap::from(panels);

    let mut subdivisions = 0;
    while !converged(value, error, config) {
        if subdivisions >= config.max_subdivisions {
            return Err(ModelError::Convergence {
                operation: "integrate",
                iterations: subdivisions,
            });
        }

        let worst = match heap.pop() {
            Some(panel) => panel,
            None => break,
        };

        let mid = 0.5 * (worst.lo + worst.hi);
        let left = kronrod_panel(f, worst.chart, worst.lo, mid)?;
        let right = kronrod_panel(f, worst.chart, mid, worst.hi)?;

        value += left.value + right.value - worst.value;
        error += left.error + right.error - worst.error;

        heap.push(left);
        heap.push(right);
        subdivisions += 1;

        // Re-sum periodically so the running totals do not drift
        if subdivisions % RESUM_EVERY == 0 {
            value = heap.iter().map(|p| p.value).sum();
            error = heap.iter().map(|p| p.error).sum();
        }
    }

    Ok(Integral {
        value,
        error,
        subdivisions,
    })
}

const RESUM_EVERY: usize = 32;

fn converged(value: f64, error: f64, config: &QuadratureConfig) -> bool {
    error <= config.abs_tolerance.max(config.rel_tolerance * value.abs())
}

/// 15-point Kronrod estimate with embedded 7-point Gauss error estimate
fn kronrod_panel<F>(f: &F, chart: Chart, lo: f64, hi: f64) -> Result<Panel>
where
    F: Fn(f64, f64) -> f64,
{
    let center = 0.5 * (lo + hi);
    let half = 0.5 * (hi - lo);
    let at = |x: f64| eval(f, chart, x);

    let fc = at(center)?;
    let mut kronrod = WGK[7] * fc;
    let mut gauss = WG[3] * fc;

    for j in 0..7 {
        let dx = half * XGK[j];
        let pair = at(center - dx)? + at(center + dx)?;
        kronrod += WGK[j] * pair;
        if j % 2 == 1 {
            gauss += WG[j / 2] * pair;
        }
    }

    Ok(Panel {
        chart,
        lo,
        hi,
        value: kronrod * half,
        error: ((kronrod - gauss) * half).abs(),
    })
}

fn eval<F>(f: &F, chart: Chart, x: f64) -> Result<f64>
where
    F: Fn(f64, f64) -> f64,
{
    let (p, complement) = chart.point(x);
    let y = f(p, complement);
    if y.is_finite() {
        Ok(y)
    } else {
        Err(ModelError::numeric(
            "integrate",
            format!("integrand is {y} at {p} (complement {complement})"),
        ))
    }
}

// ==================== Unit Tests ====================
