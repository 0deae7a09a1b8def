//! Static description of a Monte Carlo shower production.

use crate::error::SensitivityError;
use crate::units::{Angle, AngleExt, Area, AreaExt, Energy, EnergyExt, SolidAngle, SolidAngleExt};

/// Parameters of a simulated particle sample, as recorded by the shower
/// production. Immutable once constructed; a file-count replication factor
/// is applied through [`SimulationMetadata::scaled`].
#[derive(Debug, Clone)]
pub struct SimulationMetadata {
    /// Lower edge of the simulated energy range.
    pub energy_min: Energy,
    /// Upper edge of the simulated energy range.
    pub energy_max: Energy,
    /// Spectral index of the simulated power law (negative).
    pub spectral_index: f64,
    /// Number of simulated showers, including shower reuse.
    pub n_simulated: f64,
    /// Geometric area over which shower cores were thrown.
    pub simulated_area: Area,
    /// View-cone radius of the production. Zero for point-like samples.
    pub viewcone_radius: Angle,
}

impl SimulationMetadata {
    /// Validate and construct the metadata record.
    pub fn new(
        energy_min: Energy,
        energy_max: Energy,
        spectral_index: f64,
        n_simulated: f64,
        simulated_area: Area,
        viewcone_radius: Angle,
    ) -> Result<Self, SensitivityError> {
        if !(energy_min.as_tev() > 0.0 && energy_max.as_tev() > energy_min.as_tev()) {
            return Err(SensitivityError::InvalidConfig(format!(
                "simulated energy range must satisfy 0 < min < max, got [{:.3e}, {:.3e}] TeV",
                energy_min.as_tev(),
                energy_max.as_tev()
            )));
        }
        if !spectral_index.is_finite() {
            return Err(SensitivityError::InvalidConfig(
                "simulated spectral index must be finite".into(),
            ));
        }
        if !(n_simulated > 0.0) {
            return Err(SensitivityError::InvalidConfig(
                "number of simulated events must be positive".into(),
            ));
        }
        if !(simulated_area.as_square_meters() > 0.0) {
            return Err(SensitivityError::InvalidConfig(
                "simulated area must be positive".into(),
            ));
        }
        if viewcone_radius.as_degrees() < 0.0 {
            return Err(SensitivityError::InvalidConfig(
                "viewcone radius must be non-negative".into(),
            ));
        }
        Ok(Self {
            energy_min,
            energy_max,
            spectral_index,
            n_simulated,
            simulated_area,
            viewcone_radius,
        })
    }

    /// Copy of the metadata with the simulated event count multiplied by the
    /// number of reconstructed production files.
    pub fn scaled(&self, n_files: u32) -> Self {
        Self {
            n_simulated: self.n_simulated * f64::from(n_files),
            ..self.clone()
        }
    }

    /// Solid angle of the view cone, `2π(1 − cos r)`.
    pub fn viewcone_solid_angle(&self) -> SolidAngle {
        let r = self.viewcone_radius.as_radians();
        SolidAngle::from_steradians(2.0 * std::f64::consts::PI * (1.0 - r.cos()))
    }

    /// Whether this production was thrown over a nonzero view cone.
    pub fn is_diffuse(&self) -> bool {
        self.viewcone_radius.as_degrees() > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn point_like() -> SimulationMetadata {
        SimulationMetadata::new(
            Energy::from_gev(10.0),
            Energy::from_tev(100.0),
            -2.0,
            1e6,
            Area::from_square_meters(std::f64::consts::PI * 400.0 * 400.0),
            Angle::from_degrees(0.0),
        )
        .expect("valid metadata")
    }

    #[test]
    fn test_scaled_multiplies_event_count() {
        let meta = point_like();
        let scaled = meta.scaled(10);
        assert_relative_eq!(scaled.n_simulated, 1e7, max_relative = 1e-12);
        // Everything else unchanged
        assert_relative_eq!(
            scaled.energy_min.as_tev(),
            meta.energy_min.as_tev(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_point_like_has_zero_solid_angle() {
        let meta = point_like();
        assert!(!meta.is_diffuse());
        assert_relative_eq!(meta.viewcone_solid_angle().as_steradians(), 0.0);
    }

    #[test]
    fn test_viewcone_solid_angle() {
        let meta = SimulationMetadata {
            viewcone_radius: Angle::from_degrees(10.0),
            ..point_like()
        };
        assert!(meta.is_diffuse());
        let r = 10f64.to_radians();
        assert_relative_eq!(
            meta.viewcone_solid_angle().as_steradians(),
            2.0 * std::f64::consts::PI * (1.0 - r.cos()),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_rejects_inverted_energy_range() {
        let result = SimulationMetadata::new(
            Energy::from_tev(100.0),
            Energy::from_gev(10.0),
            -2.0,
            1e6,
            Area::from_square_meters(1e5),
            Angle::from_degrees(0.0),
        );
        assert!(matches!(result, Err(SensitivityError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_event_count() {
        let result = SimulationMetadata::new(
            Energy::from_gev(10.0),
            Energy::from_tev(100.0),
            -2.0,
            0.0,
            Area::from_square_meters(1e5),
            Angle::from_degrees(0.0),
        );
        assert!(matches!(result, Err(SensitivityError::InvalidConfig(_))));
    }
}
