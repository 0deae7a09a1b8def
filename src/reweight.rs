//! Reweighting of simulated trigger samples to physical source spectra.
//!
//! Monte Carlo productions are thrown with a hard power law to populate the
//! high-energy end with statistics. To predict physical event counts the
//! per-event contribution is reweighted to the assumed source spectrum:
//! the sample's total trigger rate under the assumed spectrum is computed
//! analytically, a per-event normalization is derived from it, and each
//! event is tilted by `(E_true/E0)^(Γ_assumed − Γ_simulated)`. The sum of
//! weights over any energy interval, multiplied by the observation time,
//! is the expected number of triggered events in that interval.

use ndarray::{Array1, ArrayView1};

use crate::error::SensitivityError;
use crate::simulation::SimulationMetadata;
use crate::spectra::PowerLaw;
use crate::units::{AreaExt, Energy, EnergyExt, SolidAngleExt};

/// Analytic integral of `(E/E0)^Γ` over `[e_min, e_max]`, in TeV.
///
/// Uses the logarithmic form exactly at Γ = −1 instead of the divergent
/// power form. Degenerate ranges or a non-finite result are configuration
/// errors, never silent NaN.
pub fn spectral_integral(
    index: f64,
    energy_min: Energy,
    energy_max: Energy,
    pivot_energy: Energy,
) -> Result<f64, SensitivityError> {
    let e0 = pivot_energy.as_tev();
    let lo = energy_min.as_tev();
    let hi = energy_max.as_tev();
    if !(e0 > 0.0 && lo > 0.0 && hi > lo) {
        return Err(SensitivityError::InvalidSpectrum(format!(
            "integral bounds must satisfy 0 < min < max with positive pivot, \
             got [{lo:.3e}, {hi:.3e}] TeV, pivot {e0:.3e} TeV"
        )));
    }
    let integral = if (index + 1.0).abs() < 1e-12 {
        (hi / lo).ln() * e0
    } else {
        (hi.powf(index + 1.0) - lo.powf(index + 1.0)) / (index + 1.0) / e0.powf(index)
    };
    if !integral.is_finite() {
        return Err(SensitivityError::InvalidSpectrum(format!(
            "spectral integral is not finite for index {index:.3} over [{lo:.3e}, {hi:.3e}] TeV"
        )));
    }
    Ok(integral)
}

/// Converts raw simulated events of one sample into physically-weighted
/// rate contributions for an assumed source spectrum.
#[derive(Debug, Clone)]
pub struct Reweighter {
    trigger_rate_hz: f64,
    base_weight_hz: f64,
    index_difference: f64,
    pivot_tev: f64,
}

impl Reweighter {
    /// Build the reweighter for one sample and one assumed spectrum.
    ///
    /// The solid-angle dimension must be declared explicitly: a diffuse
    /// production requires a per-solid-angle spectrum and vice versa.
    /// Mixing the two is a configuration error, not an implicit unit cast.
    pub fn new(
        metadata: &SimulationMetadata,
        spectrum: &PowerLaw,
    ) -> Result<Self, SensitivityError> {
        let omega = match (spectrum.per_solid_angle, metadata.is_diffuse()) {
            (true, true) => metadata.viewcone_solid_angle().as_steradians(),
            (false, false) => 1.0,
            (true, false) => {
                return Err(SensitivityError::InvalidConfig(
                    "per-solid-angle spectrum requires a diffuse production \
                     with a nonzero viewcone"
                        .into(),
                ))
            }
            (false, true) => {
                return Err(SensitivityError::InvalidConfig(
                    "diffuse production requires a per-solid-angle spectrum; \
                     normalize the spectrum per steradian explicitly"
                        .into(),
                ))
            }
        };

        let assumed_integral = spectral_integral(
            spectrum.index,
            metadata.energy_min,
            metadata.energy_max,
            spectrum.pivot_energy,
        )?;
        let simulated_integral = spectral_integral(
            metadata.spectral_index,
            metadata.energy_min,
            metadata.energy_max,
            spectrum.pivot_energy,
        )?;

        let area_cm2 = metadata.simulated_area.as_square_centimeters();
        let trigger_rate_hz = spectrum.normalization * area_cm2 * omega * assumed_integral;
        if !trigger_rate_hz.is_finite() {
            return Err(SensitivityError::InvalidSpectrum(format!(
                "trigger rate is not finite (normalization {:.3e}, area {area_cm2:.3e} cm2)",
                spectrum.normalization
            )));
        }

        // Number of simulated events the assumed power law would have
        // produced over the full range, given the simulated throw.
        let norm_simulated = metadata.n_simulated / simulated_integral * assumed_integral;
        let base_weight_hz = trigger_rate_hz / norm_simulated;

        Ok(Self {
            trigger_rate_hz,
            base_weight_hz,
            index_difference: spectrum.index - metadata.spectral_index,
            pivot_tev: spectrum.pivot_energy.as_tev(),
        })
    }

    /// Total trigger rate of the sample under the assumed spectrum, Hz.
    pub fn trigger_rate_hz(&self) -> f64 {
        self.trigger_rate_hz
    }

    /// Per-event rate contributions in Hz, a pure map over true energies
    /// (TeV) with no ordering dependency between events.
    pub fn event_weights(&self, true_energy_tev: ArrayView1<'_, f64>) -> Array1<f64> {
        true_energy_tev.mapv(|e| (e / self.pivot_tev).powf(self.index_difference) * self.base_weight_hz)
    }
}
