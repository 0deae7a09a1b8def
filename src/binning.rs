//! Energy binning and cut-grid definitions.

use crate::error::SensitivityError;
use crate::units::{Energy, EnergyExt};

/// Evenly spaced values from `start` to `stop` inclusive.
fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let step = (stop - start) / (n - 1) as f64;
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Logarithmically spaced energy bin edges in TeV.
///
/// Bins are half-open `[E_i, E_{i+1})`; edges are strictly increasing.
#[derive(Debug, Clone)]
pub struct EnergyBinning {
    edges_tev: Vec<f64>,
}

impl EnergyBinning {
    /// Build `n_bins` logarithmic bins covering `[energy_min, energy_max]`.
    pub fn logarithmic(
        energy_min: Energy,
        energy_max: Energy,
        n_bins: usize,
    ) -> Result<Self, SensitivityError> {
        let lo = energy_min.as_tev();
        let hi = energy_max.as_tev();
        if !(lo > 0.0 && hi > lo) {
            return Err(SensitivityError::InvalidConfig(format!(
                "energy binning requires 0 < min < max, got [{lo:.3e}, {hi:.3e}] TeV"
            )));
        }
        if n_bins == 0 {
            return Err(SensitivityError::InvalidConfig(
                "at least one energy bin is required".into(),
            ));
        }
        let edges_tev: Vec<f64> = linspace(lo.log10(), hi.log10(), n_bins + 1)
            .into_iter()
            .map(|x| 10f64.powf(x))
            .collect();
        debug_assert!(edges_tev.windows(2).all(|w| w[0] < w[1]));
        Ok(Self { edges_tev })
    }

    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.edges_tev.len() - 1
    }

    /// All edges, TeV.
    pub fn edges_tev(&self) -> &[f64] {
        &self.edges_tev
    }

    /// `(low, high)` edges of bin `i`, TeV.
    pub fn bin_edges_tev(&self, i: usize) -> (f64, f64) {
        (self.edges_tev[i], self.edges_tev[i + 1])
    }

    /// Geometric mean energy of bin `i`, TeV.
    pub fn geometric_center_tev(&self, i: usize) -> f64 {
        (self.edges_tev[i] * self.edges_tev[i + 1]).sqrt()
    }

    /// Bin index containing `energy_tev` under the half-open convention,
    /// or None if out of range.
    pub fn bin_index(&self, energy_tev: f64) -> Option<usize> {
        if energy_tev < self.edges_tev[0] || energy_tev >= *self.edges_tev.last()? {
            return None;
        }
        // Edges are sorted, so a partition point gives the bin directly
        let i = self.edges_tev.partition_point(|&e| e <= energy_tev);
        Some(i - 1)
    }
}

/// Cartesian grid of gammaness and theta² cut candidates.
#[derive(Debug, Clone)]
pub struct CutGrid {
    gammaness: Vec<f64>,
    theta2_deg2: Vec<f64>,
}

impl CutGrid {
    /// Linear gammaness grid on `[0, gammaness_max]` and linear theta² grid
    /// on `[theta2_min_deg2, theta2_max_deg2]`.
    pub fn new(
        n_gammaness: usize,
        n_theta2: usize,
        gammaness_max: f64,
        theta2_min_deg2: f64,
        theta2_max_deg2: f64,
    ) -> Result<Self, SensitivityError> {
        if n_gammaness < 2 || n_theta2 < 2 {
            return Err(SensitivityError::InvalidConfig(format!(
                "cut grid needs at least 2 points per axis, got {n_gammaness}×{n_theta2}"
            )));
        }
        if !(gammaness_max > 0.0 && gammaness_max <= 1.0) {
            return Err(SensitivityError::InvalidConfig(format!(
                "gammaness_max must lie in (0, 1], got {gammaness_max}"
            )));
        }
        if !(theta2_min_deg2 > 0.0 && theta2_max_deg2 > theta2_min_deg2) {
            return Err(SensitivityError::InvalidConfig(format!(
                "theta2 grid requires 0 < min < max, got [{theta2_min_deg2}, {theta2_max_deg2}]"
            )));
        }
        Ok(Self {
            gammaness: linspace(0.0, gammaness_max, n_gammaness),
            theta2_deg2: linspace(theta2_min_deg2, theta2_max_deg2, n_theta2),
        })
    }

    /// Gammaness thresholds.
    pub fn gammaness(&self) -> &[f64] {
        &self.gammaness
    }

    /// Theta² thresholds, deg².
    pub fn theta2_deg2(&self) -> &[f64] {
        &self.theta2_deg2
    }
}
