//! Type-safe physical units for gamma-ray astronomy calculations
//!
//! This module provides strongly-typed quantities using the `uom` crate to
//! prevent unit confusion errors at compile time, together with extension
//! traits exposing the unit conventions of very-high-energy astronomy
//! (GeV/TeV energies, deg/deg² angles, cm² collection areas, hour-scale
//! observation times).
//!
//! Power-law algebra with arbitrary spectral indices cannot be expressed in
//! dimensional types, so the numerical core extracts magnitudes in canonical
//! units (TeV, cm², s, sr) through these traits and converts back at the
//! boundaries.

use uom::si::angle::{degree, radian};
use uom::si::area::{square_centimeter, square_meter};
use uom::si::energy::joule;
use uom::si::solid_angle::steradian;
use uom::si::time::{hour, minute, second};

pub use uom::si::f64::{Angle, Area, Energy, SolidAngle, Time};

/// Joules per TeV (CODATA elementary charge × 1e12).
const JOULE_PER_TEV: f64 = 1.602_176_634e-7;

/// Joules per GeV.
const JOULE_PER_GEV: f64 = 1.602_176_634e-10;

/// Joules per erg.
const JOULE_PER_ERG: f64 = 1e-7;

/// Square degrees per steradian.
const SQUARE_DEGREE_PER_STERADIAN: f64 =
    (180.0 / std::f64::consts::PI) * (180.0 / std::f64::consts::PI);

/// Extension trait for the energy units conventional in gamma-ray astronomy
pub trait EnergyExt {
    /// Create energy from giga-electronvolts
    fn from_gev(gev: f64) -> Self;

    /// Get energy in giga-electronvolts
    fn as_gev(&self) -> f64;

    /// Create energy from tera-electronvolts
    fn from_tev(tev: f64) -> Self;

    /// Get energy in tera-electronvolts
    fn as_tev(&self) -> f64;

    /// Get energy in erg (CGS), the conventional unit for integral flux
    fn as_erg(&self) -> f64;
}

impl EnergyExt for Energy {
    fn from_gev(gev: f64) -> Self {
        Energy::new::<joule>(gev * JOULE_PER_GEV)
    }

    fn as_gev(&self) -> f64 {
        self.get::<joule>() / JOULE_PER_GEV
    }

    fn from_tev(tev: f64) -> Self {
        Energy::new::<joule>(tev * JOULE_PER_TEV)
    }

    fn as_tev(&self) -> f64 {
        self.get::<joule>() / JOULE_PER_TEV
    }

    fn as_erg(&self) -> f64 {
        self.get::<joule>() / JOULE_PER_ERG
    }
}

/// Extension trait for angular quantities
pub trait AngleExt {
    /// Create angle from degrees
    fn from_degrees(deg: f64) -> Self;

    /// Get angle in degrees
    fn as_degrees(&self) -> f64;

    /// Create angle from radians
    fn from_radians(rad: f64) -> Self;

    /// Get angle in radians
    fn as_radians(&self) -> f64;
}

impl AngleExt for Angle {
    fn from_degrees(deg: f64) -> Self {
        Angle::new::<degree>(deg)
    }

    fn as_degrees(&self) -> f64 {
        self.get::<degree>()
    }

    fn from_radians(rad: f64) -> Self {
        Angle::new::<radian>(rad)
    }

    fn as_radians(&self) -> f64 {
        self.get::<radian>()
    }
}

/// Extension trait for collection areas
pub trait AreaExt {
    /// Create area from square meters
    fn from_square_meters(m2: f64) -> Self;

    /// Get area in square meters
    fn as_square_meters(&self) -> f64;

    /// Create area from square centimeters
    fn from_square_centimeters(cm2: f64) -> Self;

    /// Get area in square centimeters
    fn as_square_centimeters(&self) -> f64;
}

impl AreaExt for Area {
    fn from_square_meters(m2: f64) -> Self {
        Area::new::<square_meter>(m2)
    }

    fn as_square_meters(&self) -> f64 {
        self.get::<square_meter>()
    }

    fn from_square_centimeters(cm2: f64) -> Self {
        Area::new::<square_centimeter>(cm2)
    }

    fn as_square_centimeters(&self) -> f64 {
        self.get::<square_centimeter>()
    }
}

/// Extension trait for solid angles, including the deg² convention used for
/// on-region and ring areas
pub trait SolidAngleExt {
    /// Create solid angle from steradians
    fn from_steradians(sr: f64) -> Self;

    /// Get solid angle in steradians
    fn as_steradians(&self) -> f64;

    /// Create solid angle from square degrees
    fn from_square_degrees(deg2: f64) -> Self;

    /// Get solid angle in square degrees
    fn as_square_degrees(&self) -> f64;
}

impl SolidAngleExt for SolidAngle {
    fn from_steradians(sr: f64) -> Self {
        SolidAngle::new::<steradian>(sr)
    }

    fn as_steradians(&self) -> f64 {
        self.get::<steradian>()
    }

    fn from_square_degrees(deg2: f64) -> Self {
        SolidAngle::new::<steradian>(deg2 / SQUARE_DEGREE_PER_STERADIAN)
    }

    fn as_square_degrees(&self) -> f64 {
        self.get::<steradian>() * SQUARE_DEGREE_PER_STERADIAN
    }
}

/// Extension trait for observation times
pub trait TimeExt {
    /// Create time from seconds
    fn from_seconds(s: f64) -> Self;

    /// Get time in seconds
    fn as_seconds(&self) -> f64;

    /// Get time in minutes
    fn as_minutes(&self) -> f64;

    /// Create time from hours
    fn from_hours(h: f64) -> Self;

    /// Get time in hours
    fn as_hours(&self) -> f64;
}

impl TimeExt for Time {
    fn from_seconds(s: f64) -> Self {
        Time::new::<second>(s)
    }

    fn as_seconds(&self) -> f64 {
        self.get::<second>()
    }

    fn as_minutes(&self) -> f64 {
        self.get::<minute>()
    }

    fn from_hours(h: f64) -> Self {
        Time::new::<hour>(h)
    }

    fn as_hours(&self) -> f64 {
        self.get::<hour>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_energy_conversions() {
        let e = Energy::from_gev(1000.0);
        assert_relative_eq!(e.as_tev(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(e.as_gev(), 1000.0, epsilon = 1e-9);

        // 1 TeV = 1.602... erg
        let tev = Energy::from_tev(1.0);
        assert_relative_eq!(tev.as_erg(), 1.602176634, epsilon = 1e-9);
    }

    #[test]
    fn test_angle_conversions() {
        let a = Angle::from_degrees(180.0);
        assert_relative_eq!(a.as_radians(), std::f64::consts::PI, epsilon = 1e-12);
        assert_relative_eq!(a.as_degrees(), 180.0, epsilon = 1e-9);

        let b = Angle::from_radians(std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(b.as_degrees(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_area_conversions() {
        let a = Area::from_square_meters(1.0);
        assert_relative_eq!(a.as_square_centimeters(), 1e4, epsilon = 1e-6);

        let b = Area::from_square_centimeters(5e8);
        assert_relative_eq!(b.as_square_meters(), 5e4, epsilon = 1e-6);
    }

    #[test]
    fn test_solid_angle_conversions() {
        // Full sphere: 4π sr ≈ 41252.96 deg²
        let sphere = SolidAngle::from_steradians(4.0 * std::f64::consts::PI);
        assert_relative_eq!(sphere.as_square_degrees(), 41252.96125, epsilon = 1e-3);

        let one_deg2 = SolidAngle::from_square_degrees(1.0);
        assert_relative_eq!(one_deg2.as_steradians(), 3.0461742e-4, epsilon = 1e-9);
        assert_relative_eq!(one_deg2.as_square_degrees(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_time_conversions() {
        let t = Time::from_hours(50.0);
        assert_relative_eq!(t.as_seconds(), 180_000.0, epsilon = 1e-6);
        assert_relative_eq!(t.as_minutes(), 3000.0, epsilon = 1e-9);
        assert_relative_eq!(t.as_hours(), 50.0, epsilon = 1e-12);
    }
}
