//! Reference source spectra for signal and background assumptions.
//!
//! Differential fluxes are expressed in TeV⁻¹ cm⁻² s⁻¹ (additionally sr⁻¹
//! for diffuse cosmic-ray spectra). The built-in references are the ones
//! conventionally used to quote Cherenkov-telescope sensitivity: the HEGRA
//! and MAGIC measurements of the Crab Nebula for the gamma-ray signal, and
//! the BESS cosmic-ray proton spectrum for the background.

use crate::units::{Energy, EnergyExt};

/// A power-law differential flux `f0 · (E/E0)^Γ`.
#[derive(Debug, Clone, Copy)]
pub struct PowerLaw {
    /// Flux normalization at the pivot energy, in TeV⁻¹ cm⁻² s⁻¹
    /// (TeV⁻¹ cm⁻² s⁻¹ sr⁻¹ when `per_solid_angle` is set).
    pub normalization: f64,
    /// Spectral index Γ (negative for falling spectra).
    pub index: f64,
    /// Pivot energy E0.
    pub pivot_energy: Energy,
    /// Whether the normalization carries a sr⁻¹ dimension. Diffuse
    /// cosmic-ray spectra must set this; point-source spectra must not.
    pub per_solid_angle: bool,
}

impl PowerLaw {
    /// Differential flux at `energy`, in the normalization's units.
    pub fn dfde(&self, energy: Energy) -> f64 {
        let x = energy.as_tev() / self.pivot_energy.as_tev();
        self.normalization * x.powf(self.index)
    }
}

/// A log-parabola differential flux `f0 · (E/E0)^(Γ + β·log10(E/E0))`.
#[derive(Debug, Clone, Copy)]
pub struct LogParabola {
    /// Flux normalization at the pivot energy, in TeV⁻¹ cm⁻² s⁻¹.
    pub normalization: f64,
    /// Spectral index Γ at the pivot energy.
    pub index: f64,
    /// Curvature β.
    pub curvature: f64,
    /// Pivot energy E0.
    pub pivot_energy: Energy,
}

impl LogParabola {
    /// Differential flux at `energy`, in TeV⁻¹ cm⁻² s⁻¹.
    pub fn dfde(&self, energy: Energy) -> f64 {
        let x = energy.as_tev() / self.pivot_energy.as_tev();
        self.normalization * x.powf(self.index + self.curvature * x.log10())
    }
}

/// Reference spectral shape used to convert relative sensitivity into
/// absolute flux units.
#[derive(Debug, Clone, Copy)]
pub enum ReferenceSpectrum {
    /// Pure power law.
    PowerLaw(PowerLaw),
    /// Log parabola.
    LogParabola(LogParabola),
}

impl ReferenceSpectrum {
    /// Differential flux at `energy`, in TeV⁻¹ cm⁻² s⁻¹.
    pub fn dfde(&self, energy: Energy) -> f64 {
        match self {
            ReferenceSpectrum::PowerLaw(p) => p.dfde(energy),
            ReferenceSpectrum::LogParabola(p) => p.dfde(energy),
        }
    }
}

/// Crab Nebula spectrum measured by HEGRA (Aharonian et al. 2004).
pub fn crab_hegra() -> PowerLaw {
    PowerLaw {
        normalization: 2.83e-11,
        index: -2.62,
        pivot_energy: Energy::from_tev(1.0),
        per_solid_angle: false,
    }
}

/// Crab Nebula log-parabola spectrum measured by MAGIC (Aleksić et al. 2015).
pub fn crab_magic() -> LogParabola {
    LogParabola {
        normalization: 3.23e-11,
        index: -2.47,
        curvature: -0.24,
        pivot_energy: Energy::from_tev(1.0),
    }
}

/// Cosmic-ray proton spectrum measured by BESS (Sanuki et al. 2000).
///
/// Diffuse: the normalization is per steradian (9.6e-2 TeV⁻¹ m⁻² s⁻¹ sr⁻¹,
/// converted here to cm⁻²).
pub fn proton_bess() -> PowerLaw {
    PowerLaw {
        normalization: 9.6e-6,
        index: -2.70,
        pivot_energy: Energy::from_tev(1.0),
        per_solid_angle: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_power_law_at_pivot() {
        let crab = crab_hegra();
        assert_relative_eq!(
            crab.dfde(Energy::from_tev(1.0)),
            2.83e-11,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_power_law_scaling() {
        let crab = crab_hegra();
        // One decade above the pivot the flux drops by 10^index
        let ratio = crab.dfde(Energy::from_tev(10.0)) / crab.dfde(Energy::from_tev(1.0));
        assert_relative_eq!(ratio, 10f64.powf(-2.62), max_relative = 1e-12);
    }

    #[test]
    fn test_log_parabola_at_pivot() {
        let crab = crab_magic();
        // log10(1) = 0, so the curvature term vanishes at the pivot
        assert_relative_eq!(
            crab.dfde(Energy::from_tev(1.0)),
            3.23e-11,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_log_parabola_softens_above_pivot() {
        let crab = crab_magic();
        // Negative curvature: the effective index steepens with energy, so
        // the log-parabola falls below the pure power law of the same index
        let pl = PowerLaw {
            normalization: 3.23e-11,
            index: -2.47,
            pivot_energy: Energy::from_tev(1.0),
            per_solid_angle: false,
        };
        assert!(crab.dfde(Energy::from_tev(10.0)) < pl.dfde(Energy::from_tev(10.0)));
    }

    #[test]
    fn test_proton_spectrum_is_diffuse() {
        assert!(proton_bess().per_solid_angle);
        assert!(!crab_hegra().per_solid_angle);
    }

    #[test]
    fn test_reference_spectrum_dispatch() {
        let e = Energy::from_tev(0.5);
        let as_pl = ReferenceSpectrum::PowerLaw(crab_hegra());
        let as_lp = ReferenceSpectrum::LogParabola(crab_magic());
        assert_relative_eq!(as_pl.dfde(e), crab_hegra().dfde(e), max_relative = 1e-12);
        assert_relative_eq!(as_lp.dfde(e), crab_magic().dfde(e), max_relative = 1e-12);
    }
}
