//! Ring background model for diffuse cosmic-ray events.
//!
//! Background is estimated from events reconstructed inside an annulus
//! around the camera center. The outer radius is derived from the nominal
//! radius and halfwidth so that the band inside the nominal radius and the
//! band outside it enclose equal area, which keeps the total ring area
//! exact without computing the two halves separately.

use ndarray::{Array1, ArrayView1};

use crate::error::SensitivityError;
use crate::units::{Angle, AngleExt};

/// Containment result of the ring model.
#[derive(Debug, Clone)]
pub struct RingContainment {
    /// Per-event containment mask, aligned with the input column.
    pub contained: Array1<bool>,
    /// Angular area of the ring, deg².
    pub area_deg2: f64,
    /// Inner ring radius, deg.
    pub inner_radius_deg: f64,
    /// Outer ring radius, deg.
    pub outer_radius_deg: f64,
}

/// Evaluate ring containment for an array of squared angular offsets
/// (deg², taken from the camera center).
///
/// With `r_low = R − Δ` the outer radius is `r_high = √(2R² − r_low²)`;
/// an event is contained iff `r_low < √θ² < r_high`. Requires
/// `0 < Δ < R`.
pub fn ring_containment(
    theta2_deg2: ArrayView1<'_, f64>,
    ring_radius: Angle,
    ring_halfwidth: Angle,
) -> Result<RingContainment, SensitivityError> {
    let radius = ring_radius.as_degrees();
    let halfwidth = ring_halfwidth.as_degrees();
    if !(halfwidth > 0.0 && halfwidth < radius) {
        return Err(SensitivityError::InvalidRing { radius, halfwidth });
    }

    let inner = radius - halfwidth;
    let outer = (2.0 * radius * radius - inner * inner).sqrt();
    let area_deg2 = std::f64::consts::PI * (outer * outer - inner * inner);

    let contained = theta2_deg2.mapv(|t2| {
        let offset = t2.sqrt();
        offset > inner && offset < outer
    });

    Ok(RingContainment {
        contained,
        area_deg2,
        inner_radius_deg: inner,
        outer_radius_deg: outer,
    })
}
