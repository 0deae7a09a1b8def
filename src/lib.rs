//! Sensitivity estimation for imaging atmospheric Cherenkov telescopes.
//!
//! Given reconstructed Monte Carlo gamma-ray and cosmic-ray proton samples,
//! the engine reweights both to assumed physical spectra, selects gammaness
//! and theta² cuts per reconstructed-energy bin, and reports the minimum
//! detectable flux at 5σ (Li & Ma 1983, eq. 17) in 50 hours of observation,
//! both relative to a reference Crab spectrum and in absolute
//! `E²·dF/dE` units.
//!
//! # Structure
//!
//! - [`units`]: typed physical quantities (TeV, deg², cm², hours)
//! - [`spectra`]: reference source spectra for signal, background and flux
//!   quoting
//! - [`simulation`]: Monte Carlo production metadata
//! - [`events`]: column-oriented reconstructed event tables
//! - [`reweight`]: power-law reweighting of simulated samples
//! - [`ring`]: equal-area ring background model
//! - [`significance`]: Li & Ma statistics and regularizing floors
//! - [`binning`]: energy binning and cut grids
//! - [`optimize`]: per-bin cut selection strategies
//! - [`engine`]: the full estimation pipeline

pub mod binning;
pub mod engine;
pub mod error;
pub mod events;
pub mod optimize;
pub mod reweight;
pub mod ring;
pub mod significance;
pub mod simulation;
pub mod spectra;
pub mod units;

pub use engine::{
    ColumnUnits, CutStrategy, SampleInput, SensitivityConfig, SensitivityEngine,
    SensitivityResult, SensitivityRun,
};
pub use error::SensitivityError;
pub use events::{EventTable, ParticleClass};
pub use significance::StatisticsFloors;
pub use simulation::SimulationMetadata;
