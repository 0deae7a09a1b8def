//! Shared synthetic-sample builders for the scenario tests.
//!
//! Events are drawn with a seeded ChaCha generator so every run sees the
//! same tables. Gammas are point-like with scores skewed toward one and
//! small angular offsets; protons are diffuse with scores skewed toward
//! zero and offsets spread uniformly over a disc wide enough to populate
//! the background ring.

use gammascope::units::{Angle, AngleExt, Area, AreaExt, Energy, EnergyExt};
use gammascope::{EventTable, ParticleClass, SimulationMetadata};
use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, Normal};

pub const SIM_ENERGY_MIN_TEV: f64 = 0.01;
pub const SIM_ENERGY_MAX_TEV: f64 = 100.0;
pub const SIM_INDEX: f64 = -2.0;

pub fn gamma_metadata() -> SimulationMetadata {
    SimulationMetadata::new(
        Energy::from_tev(SIM_ENERGY_MIN_TEV),
        Energy::from_tev(SIM_ENERGY_MAX_TEV),
        SIM_INDEX,
        1e6,
        Area::from_square_meters(std::f64::consts::PI * 400.0 * 400.0),
        Angle::from_degrees(0.0),
    )
    .expect("valid gamma metadata")
}

pub fn proton_metadata() -> SimulationMetadata {
    SimulationMetadata::new(
        Energy::from_tev(SIM_ENERGY_MIN_TEV),
        Energy::from_tev(SIM_ENERGY_MAX_TEV),
        SIM_INDEX,
        2e6,
        Area::from_square_meters(std::f64::consts::PI * 500.0 * 500.0),
        Angle::from_degrees(10.0),
    )
    .expect("valid proton metadata")
}

/// Inverse-CDF draw from the simulated `E^-2` power law.
pub fn sample_energy<R: Rng>(rng: &mut R) -> f64 {
    let p: f64 = rng.gen();
    let inv_lo = 1.0 / SIM_ENERGY_MIN_TEV;
    let inv_hi = 1.0 / SIM_ENERGY_MAX_TEV;
    1.0 / (inv_lo - p * (inv_lo - inv_hi))
}

/// Synthetic point-like gamma sample.
pub fn gamma_events<R: Rng>(rng: &mut R, n: usize) -> EventTable {
    let offset = Normal::new(0.0, 0.07).expect("valid sigma");
    let smear = Normal::new(0.0, 0.1).expect("valid sigma");
    let mut true_energy = Vec::with_capacity(n);
    let mut reco_energy = Vec::with_capacity(n);
    let mut gammaness = Vec::with_capacity(n);
    let mut theta2 = Vec::with_capacity(n);
    for _ in 0..n {
        let e = sample_energy(rng);
        true_energy.push(e);
        reco_energy.push(e * f64::exp(smear.sample(rng)));
        gammaness.push(rng.gen::<f64>().powf(0.25));
        let dx: f64 = offset.sample(rng);
        let dy: f64 = offset.sample(rng);
        theta2.push(dx * dx + dy * dy);
    }
    EventTable::new(
        Array1::from(true_energy),
        Array1::from(reco_energy),
        Array1::from(gammaness),
        Array1::from(theta2),
        vec![ParticleClass::Gamma; n],
    )
    .expect("consistent columns")
}

/// Synthetic diffuse proton sample spread over a 1-degree disc.
pub fn proton_events<R: Rng>(rng: &mut R, n: usize) -> EventTable {
    let smear = Normal::new(0.0, 0.2).expect("valid sigma");
    let mut true_energy = Vec::with_capacity(n);
    let mut reco_energy = Vec::with_capacity(n);
    let mut gammaness = Vec::with_capacity(n);
    let mut theta2 = Vec::with_capacity(n);
    for _ in 0..n {
        let e = sample_energy(rng);
        true_energy.push(e);
        reco_energy.push(e * f64::exp(smear.sample(rng)));
        gammaness.push(1.0 - rng.gen::<f64>().powf(0.25));
        // Uniform over the disc: theta² itself is uniform on [0, r_max²]
        theta2.push(rng.gen::<f64>());
    }
    EventTable::new(
        Array1::from(true_energy),
        Array1::from(reco_energy),
        Array1::from(gammaness),
        Array1::from(theta2),
        vec![ParticleClass::Proton; n],
    )
    .expect("consistent columns")
}
