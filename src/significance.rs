//! Li & Ma significance statistics and regularizing floors.
//!
//! The authoritative estimator is eq. 17 of Li & Ma (1983), inverted
//! numerically to find the excess count matching a target significance for
//! a given off-region count and on/off normalization. Two floors
//! regularize the result: an absolute minimum excess, and a fraction of
//! the background to account for systematic uncertainty. A simplified
//! `excess/√(background·α)` estimator is kept for fast approximate scans.

use serde::{Deserialize, Serialize};

/// Regularizing floors applied to significance and cut optimization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatisticsFloors {
    /// Minimum excess count accepted for a 5σ claim.
    pub min_excess: f64,
    /// Minimum weighted background count for a grid cell to be valid.
    pub min_background_events: f64,
    /// Minimum raw (unweighted) event count per sample for a grid cell to
    /// be valid.
    pub min_raw_events: usize,
    /// Systematic uncertainty floor as a fraction of the scaled background.
    pub systematic_fraction: f64,
}

impl Default for StatisticsFloors {
    fn default() -> Self {
        Self {
            min_excess: 10.0,
            min_background_events: 10.0,
            min_raw_events: 10,
            systematic_fraction: 0.05,
        }
    }
}

/// Li & Ma significance (eq. 17) for `n_on` on-region counts, `n_off`
/// off-region counts and on/off normalization `alpha`.
///
/// Terms with zero counts are dropped rather than evaluated as `0·ln 0`.
/// The result is signed by the excess `n_on − α·n_off`.
pub fn li_ma_significance(n_on: f64, n_off: f64, alpha: f64) -> f64 {
    if !(alpha > 0.0) || n_on < 0.0 || n_off < 0.0 {
        return f64::NAN;
    }
    let total = n_on + n_off;
    if total <= 0.0 {
        return 0.0;
    }
    let term_on = if n_on > 0.0 {
        n_on * ((1.0 + alpha) / alpha * (n_on / total)).ln()
    } else {
        0.0
    };
    let term_off = if n_off > 0.0 {
        n_off * ((1.0 + alpha) * (n_off / total)).ln()
    } else {
        0.0
    };
    let arg = term_on + term_off;
    if arg <= 0.0 {
        0.0
    } else {
        (2.0 * arg).sqrt().copysign(n_on - alpha * n_off)
    }
}

/// Simplified significance `excess / √(background·α)`.
pub fn significance_simple(n_excess: f64, n_background: f64, alpha: f64) -> f64 {
    n_excess / (n_background * alpha).sqrt()
}

/// Excess count matching `target_significance` under the simplified
/// estimator.
pub fn excess_matching_significance_simple(
    n_off: f64,
    alpha: f64,
    target_significance: f64,
) -> f64 {
    target_significance * (n_off * alpha).sqrt()
}

/// Excess count over `α·n_off` at which the Li & Ma significance reaches
/// `target_significance`.
///
/// The significance is strictly increasing in the excess, so a bisection
/// over an exponentially expanded bracket converges to double precision.
/// Returns NaN when the inputs cannot bracket a root (degenerate alpha or
/// non-finite counts); callers convert that into infinite sensitivity.
pub fn excess_matching_significance(n_off: f64, alpha: f64, target_significance: f64) -> f64 {
    if !(alpha > 0.0) || !n_off.is_finite() || n_off < 0.0 || !(target_significance > 0.0) {
        return f64::NAN;
    }
    let mu_background = alpha * n_off;
    let deviation =
        |excess: f64| li_ma_significance(mu_background + excess, n_off, alpha) - target_significance;

    let mut high = (target_significance * mu_background.max(1.0).sqrt()).max(1.0);
    let mut expansions = 0;
    while deviation(high) < 0.0 {
        high *= 2.0;
        expansions += 1;
        if expansions > 200 {
            return f64::NAN;
        }
    }

    let mut low = 0.0;
    for _ in 0..100 {
        let mid = 0.5 * (low + high);
        if deviation(mid) < 0.0 {
            low = mid;
        } else {
            high = mid;
        }
    }
    0.5 * (low + high)
}

/// Excess count required for a 5σ detection, before floors.
pub fn excess_matching_5sigma(n_off: f64, alpha: f64) -> f64 {
    excess_matching_significance(n_off, alpha, 5.0)
}

/// Apply the minimum-excess and systematic-background floors.
///
/// A non-finite excess is passed through untouched so that a failed
/// inversion cannot masquerade as a detectable floor value.
pub fn apply_excess_floors(excess: f64, n_off: f64, alpha: f64, floors: &StatisticsFloors) -> f64 {
    if !excess.is_finite() {
        return excess;
    }
    excess
        .max(floors.min_excess)
        .max(floors.systematic_fraction * n_off * alpha)
}

/// Sensitivity in percent of the reference flux: the 5σ excess divided by
/// the expected on-region signal count.
///
/// Zero signal or a non-finite excess yields `+∞`, the "no detection
/// possible" sentinel consumed by the optimizer; this is never an error.
pub fn sensitivity_percent(excess_5sigma: f64, n_on: f64) -> f64 {
    if !(n_on > 0.0) || !excess_5sigma.is_finite() {
        return f64::INFINITY;
    }
    excess_5sigma / n_on * 100.0
}
