//! Reconstructed event tables.
//!
//! The engine never mutates reconstruction output; it reads columns, builds
//! explicit index selections, and copies the selected rows into new tables.
//! Column units are fixed by convention: energies in TeV, angular offsets
//! squared in deg².

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::SensitivityError;

/// Particle class of a reconstructed shower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleClass {
    /// Gamma-ray shower.
    Gamma,
    /// Cosmic-ray proton shower.
    Proton,
}

/// Column-oriented table of reconstructed events.
///
/// For gamma rays `theta2` is the squared angular offset between the
/// reconstructed and the simulated source direction; for diffuse protons it
/// is taken with respect to the camera center, which is what the ring
/// background model expects.
#[derive(Debug, Clone)]
pub struct EventTable {
    true_energy: Array1<f64>,
    reco_energy: Array1<f64>,
    gammaness: Array1<f64>,
    theta2: Array1<f64>,
    particle: Vec<ParticleClass>,
}

impl EventTable {
    /// Build a table from its columns, validating that all lengths agree.
    pub fn new(
        true_energy: Array1<f64>,
        reco_energy: Array1<f64>,
        gammaness: Array1<f64>,
        theta2: Array1<f64>,
        particle: Vec<ParticleClass>,
    ) -> Result<Self, SensitivityError> {
        let n = true_energy.len();
        let lengths = [
            ("reco_energy", reco_energy.len()),
            ("gammaness", gammaness.len()),
            ("theta2", theta2.len()),
            ("particle", particle.len()),
        ];
        for (name, len) in lengths {
            if len != n {
                return Err(SensitivityError::ColumnLengthMismatch(format!(
                    "true_energy has {n} rows but {name} has {len}"
                )));
            }
        }
        Ok(Self {
            true_energy,
            reco_energy,
            gammaness,
            theta2,
            particle,
        })
    }

    /// Build a table from reconstructed angular offset components, deriving
    /// the `theta2` column as `dx² + dy²`.
    pub fn from_offsets(
        true_energy: Array1<f64>,
        reco_energy: Array1<f64>,
        gammaness: Array1<f64>,
        offset_x_deg: &Array1<f64>,
        offset_y_deg: &Array1<f64>,
        particle: Vec<ParticleClass>,
    ) -> Result<Self, SensitivityError> {
        if offset_x_deg.len() != offset_y_deg.len() {
            return Err(SensitivityError::ColumnLengthMismatch(format!(
                "offset_x has {} rows but offset_y has {}",
                offset_x_deg.len(),
                offset_y_deg.len()
            )));
        }
        let theta2 = offset_x_deg * offset_x_deg + offset_y_deg * offset_y_deg;
        Self::new(true_energy, reco_energy, gammaness, theta2, particle)
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.true_energy.len()
    }

    /// Whether the table holds no events.
    pub fn is_empty(&self) -> bool {
        self.true_energy.is_empty()
    }

    /// True energy column, TeV.
    pub fn true_energy(&self) -> ArrayView1<'_, f64> {
        self.true_energy.view()
    }

    /// Reconstructed energy column, TeV.
    pub fn reco_energy(&self) -> ArrayView1<'_, f64> {
        self.reco_energy.view()
    }

    /// Gammaness classifier score column, in [0, 1].
    pub fn gammaness(&self) -> ArrayView1<'_, f64> {
        self.gammaness.view()
    }

    /// Squared angular offset column, deg².
    pub fn theta2(&self) -> ArrayView1<'_, f64> {
        self.theta2.view()
    }

    /// Particle class column.
    pub fn particle(&self) -> &[ParticleClass] {
        &self.particle
    }

    /// Indices of events satisfying `predicate`, in row order.
    pub fn indices_where<F>(&self, predicate: F) -> Vec<usize>
    where
        F: Fn(usize) -> bool,
    {
        (0..self.len()).filter(|&i| predicate(i)).collect()
    }

    /// Copy the rows at `indices` into a new table.
    pub fn select(&self, indices: &[usize]) -> EventTable {
        let pick = |col: &Array1<f64>| Array1::from_iter(indices.iter().map(|&i| col[i]));
        EventTable {
            true_energy: pick(&self.true_energy),
            reco_energy: pick(&self.reco_energy),
            gammaness: pick(&self.gammaness),
            theta2: pick(&self.theta2),
            particle: indices.iter().map(|&i| self.particle[i]).collect(),
        }
    }

    /// Concatenate two tables, `a` rows first.
    pub fn concat(a: &EventTable, b: &EventTable) -> EventTable {
        let join = |x: &Array1<f64>, y: &Array1<f64>| {
            Array1::from_iter(x.iter().chain(y.iter()).copied())
        };
        let mut particle = a.particle.clone();
        particle.extend_from_slice(&b.particle);
        EventTable {
            true_energy: join(&a.true_energy, &b.true_energy),
            reco_energy: join(&a.reco_energy, &b.reco_energy),
            gammaness: join(&a.gammaness, &b.gammaness),
            theta2: join(&a.theta2, &b.theta2),
            particle,
        }
    }
}
