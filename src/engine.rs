//! The sensitivity engine: per-energy-bin cut selection, effective area
//! and flux conversion over reweighted gamma and proton samples.
//!
//! Bins are independent, so the per-bin work (event selection, cut
//! optimization, effective area) runs on a rayon parallel iterator over
//! shared immutable inputs; the result rows are collected in bin order.

use ndarray::ArrayView1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::binning::{CutGrid, EnergyBinning};
use crate::error::SensitivityError;
use crate::events::EventTable;
use crate::optimize::{
    enforce_validity_floors, evaluate_cuts, scan_grid, select_by_efficiency, BinEvents,
    CutSelection, OptimizerContext,
};
use crate::reweight::{spectral_integral, Reweighter};
use crate::ring::ring_containment;
use crate::significance::StatisticsFloors;
use crate::spectra::{crab_hegra, crab_magic, proton_bess, PowerLaw, ReferenceSpectrum};
use crate::simulation::SimulationMetadata;
use crate::units::{Angle, AngleExt, AreaExt, Energy, EnergyExt, Time, TimeExt};

/// How cuts are chosen within each energy bin.
#[derive(Debug, Clone, Copy)]
pub enum CutStrategy {
    /// Exhaustive scan over a gammaness × theta² grid, keeping the cell
    /// with the best valid sensitivity.
    GridScan {
        /// Number of gammaness grid points.
        n_gammaness: usize,
        /// Number of theta² grid points.
        n_theta2: usize,
    },
    /// Cuts retaining fixed fractions of the weighted signal rate.
    EfficiencyTarget {
        /// Fraction of the signal rate surviving the gammaness cut.
        gammaness_efficiency: f64,
        /// Fraction of the gammaness survivors surviving the theta² cut.
        theta2_efficiency: f64,
    },
}

/// Full configuration of a sensitivity estimation run.
#[derive(Debug, Clone)]
pub struct SensitivityConfig {
    /// Lower edge of the reconstructed energy range.
    pub energy_min: Energy,
    /// Upper edge of the reconstructed energy range.
    pub energy_max: Energy,
    /// Number of logarithmic energy bins.
    pub n_energy_bins: usize,
    /// Observation time the rates are scaled to.
    pub observation_time: Time,
    /// Number of off regions; the on/off normalization is its inverse.
    pub n_off_regions: f64,
    /// Nominal radius of the background ring.
    pub ring_radius: Angle,
    /// Halfwidth of the background ring.
    pub ring_halfwidth: Angle,
    /// Upper end of the gammaness cut range.
    pub gammaness_max: f64,
    /// Lower end of the theta² cut range, deg².
    pub theta2_min_deg2: f64,
    /// Upper end of the theta² cut range, deg².
    pub theta2_max_deg2: f64,
    /// Validity and significance floors.
    pub floors: StatisticsFloors,
    /// Per-bin cut selection strategy.
    pub strategy: CutStrategy,
    /// Assumed spectrum of the gamma-ray source.
    pub signal_spectrum: PowerLaw,
    /// Assumed spectrum of the cosmic-ray proton background.
    pub background_spectrum: PowerLaw,
    /// Spectrum the relative sensitivity is quoted against.
    pub flux_reference: ReferenceSpectrum,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            energy_min: Energy::from_gev(10.0),
            energy_max: Energy::from_tev(100.0),
            n_energy_bins: 20,
            observation_time: Time::from_hours(50.0),
            n_off_regions: 2.0,
            ring_radius: Angle::from_degrees(0.4),
            ring_halfwidth: Angle::from_degrees(0.3),
            gammaness_max: 1.0,
            theta2_min_deg2: 0.005,
            theta2_max_deg2: 0.05,
            floors: StatisticsFloors::default(),
            strategy: CutStrategy::GridScan {
                n_gammaness: 10,
                n_theta2: 10,
            },
            signal_spectrum: crab_hegra(),
            background_spectrum: proton_bess(),
            flux_reference: ReferenceSpectrum::LogParabola(crab_magic()),
        }
    }
}

/// One reconstructed Monte Carlo sample handed to the engine.
#[derive(Debug, Clone, Copy)]
pub struct SampleInput<'a> {
    /// Production parameters of a single file of the sample.
    pub metadata: &'a SimulationMetadata,
    /// Reconstructed events of the whole sample.
    pub events: &'a EventTable,
    /// Number of production files the events were read from.
    pub n_files: u32,
}

/// One result row per energy bin.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SensitivityResult {
    /// Lower bin edge, TeV.
    pub energy_low_tev: f64,
    /// Upper bin edge, TeV.
    pub energy_high_tev: f64,
    /// Chosen gammaness cut.
    pub gammaness_cut: f64,
    /// Chosen theta² cut, deg².
    pub theta2_cut_deg2: f64,
    /// Weighted on-region gamma count over the observation time.
    pub n_gammas: f64,
    /// Weighted background count scaled to the on-region area.
    pub n_hadrons: f64,
    /// Gamma rate after cuts, events per minute.
    pub gamma_rate_per_min: f64,
    /// Background rate after cuts, events per minute.
    pub hadron_rate_per_min: f64,
    /// Excess required for 5σ, after floors.
    pub excess_5sigma: f64,
    /// Sensitivity in percent of the reference flux; `+∞` marks a bin
    /// with insufficient statistics.
    pub sensitivity_percent: f64,
    /// Sensitivity as `E² · dF/dE` at the geometric bin center,
    /// erg cm⁻² s⁻¹.
    pub sensitivity_flux_erg_cm2_s: f64,
    /// Effective collection area after cuts, m².
    pub effective_area_m2: f64,
    /// Fraction of the bin's triggered gamma rate surviving the cuts.
    pub eff_gamma: f64,
    /// Fraction of the bin's triggered proton rate surviving the cuts.
    pub eff_hadron: f64,
    /// Raw gamma events passing the cuts.
    pub n_raw_gamma: usize,
    /// Raw ring-contained proton events passing the gammaness cut.
    pub n_raw_proton: usize,
}

/// Units of the [`SensitivityResult`] columns, one entry per column in
/// field order; dimensionless columns carry an empty string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnUnits {
    pub energy_low: &'static str,
    pub energy_high: &'static str,
    pub gammaness_cut: &'static str,
    pub theta2_cut: &'static str,
    pub n_gammas: &'static str,
    pub n_hadrons: &'static str,
    pub gamma_rate: &'static str,
    pub hadron_rate: &'static str,
    pub excess_5sigma: &'static str,
    pub sensitivity: &'static str,
    pub sensitivity_flux: &'static str,
    pub effective_area: &'static str,
    pub eff_gamma: &'static str,
    pub eff_hadron: &'static str,
    pub n_raw_gamma: &'static str,
    pub n_raw_proton: &'static str,
}

impl Default for ColumnUnits {
    fn default() -> Self {
        Self {
            energy_low: "TeV",
            energy_high: "TeV",
            gammaness_cut: "",
            theta2_cut: "deg2",
            n_gammas: "",
            n_hadrons: "",
            gamma_rate: "1/min",
            hadron_rate: "1/min",
            excess_5sigma: "",
            sensitivity: "%",
            sensitivity_flux: "erg / (cm2 s)",
            effective_area: "m2",
            eff_gamma: "",
            eff_hadron: "",
            n_raw_gamma: "",
            n_raw_proton: "",
        }
    }
}

/// Output of one engine run.
#[derive(Debug, Clone)]
pub struct SensitivityRun {
    /// One row per energy bin, in bin order.
    pub rows: Vec<SensitivityResult>,
    /// Bin edges, TeV.
    pub energy_edges_tev: Vec<f64>,
    /// Events of both samples passing their bin's cuts, for diagnostic
    /// distributions.
    pub gamma_like: EventTable,
    /// Column units of the rows.
    pub units: ColumnUnits,
}

impl SensitivityRun {
    /// Index of the bin with the best finite sensitivity, if any.
    pub fn best_bin(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, row) in self.rows.iter().enumerate() {
            if row.sensitivity_percent.is_finite()
                && best
                    .map(|b| row.sensitivity_percent < self.rows[b].sensitivity_percent)
                    .unwrap_or(true)
            {
                best = Some(i);
            }
        }
        best
    }
}

/// Number of simulated events the assumed power law places in each energy
/// bin, given the simulated throw over the full production range.
fn expected_simulated_per_bin(
    metadata: &SimulationMetadata,
    assumed_index: f64,
    pivot_energy: Energy,
    binning: &EnergyBinning,
) -> Result<Vec<f64>, SensitivityError> {
    let full_range = spectral_integral(
        metadata.spectral_index,
        metadata.energy_min,
        metadata.energy_max,
        pivot_energy,
    )?;
    let norm = metadata.n_simulated / full_range;
    (0..binning.n_bins())
        .map(|i| {
            let (lo, hi) = binning.bin_edges_tev(i);
            let bin_integral = spectral_integral(
                assumed_index,
                Energy::from_tev(lo),
                Energy::from_tev(hi),
                pivot_energy,
            )?;
            Ok(norm * bin_integral)
        })
        .collect()
}

/// Sensitivity estimation engine over one gamma and one proton sample.
#[derive(Debug, Clone)]
pub struct SensitivityEngine {
    config: SensitivityConfig,
}

impl SensitivityEngine {
    /// Validate the configuration and build the engine.
    pub fn new(config: SensitivityConfig) -> Result<Self, SensitivityError> {
        EnergyBinning::logarithmic(config.energy_min, config.energy_max, config.n_energy_bins)?;

        if !(config.observation_time.as_seconds() > 0.0) {
            return Err(SensitivityError::InvalidConfig(
                "observation time must be positive".into(),
            ));
        }
        if !(config.n_off_regions > 0.0) {
            return Err(SensitivityError::InvalidConfig(
                "number of off regions must be positive".into(),
            ));
        }
        let radius = config.ring_radius.as_degrees();
        let halfwidth = config.ring_halfwidth.as_degrees();
        if !(halfwidth > 0.0 && halfwidth < radius) {
            return Err(SensitivityError::InvalidRing { radius, halfwidth });
        }

        match config.strategy {
            CutStrategy::GridScan {
                n_gammaness,
                n_theta2,
            } => {
                CutGrid::new(
                    n_gammaness,
                    n_theta2,
                    config.gammaness_max,
                    config.theta2_min_deg2,
                    config.theta2_max_deg2,
                )?;
            }
            CutStrategy::EfficiencyTarget {
                gammaness_efficiency,
                theta2_efficiency,
            } => {
                for (name, eff) in [
                    ("gammaness", gammaness_efficiency),
                    ("theta2", theta2_efficiency),
                ] {
                    if !(eff > 0.0 && eff < 1.0) {
                        return Err(SensitivityError::InvalidConfig(format!(
                            "{name} efficiency must lie in (0, 1), got {eff}"
                        )));
                    }
                }
                if !(config.theta2_max_deg2 > 0.0) {
                    return Err(SensitivityError::InvalidConfig(
                        "theta2_max_deg2 must be positive".into(),
                    ));
                }
            }
        }

        Ok(Self { config })
    }

    /// The validated configuration.
    pub fn config(&self) -> &SensitivityConfig {
        &self.config
    }

    /// Estimate the sensitivity, choosing cuts per bin with the configured
    /// strategy.
    pub fn run(
        &self,
        gammas: &SampleInput<'_>,
        protons: &SampleInput<'_>,
    ) -> Result<SensitivityRun, SensitivityError> {
        self.run_impl(gammas, protons, None)
    }

    /// Estimate the sensitivity with externally fixed per-bin cuts instead
    /// of optimizing them. Both slices must have one entry per energy bin.
    /// The statistics floors gate the result exactly as in the grid scan:
    /// a bin below them reports infinite sensitivity.
    pub fn run_with_cuts(
        &self,
        gammas: &SampleInput<'_>,
        protons: &SampleInput<'_>,
        gammaness_cuts: &[f64],
        theta2_cuts_deg2: &[f64],
    ) -> Result<SensitivityRun, SensitivityError> {
        for cuts in [gammaness_cuts, theta2_cuts_deg2] {
            if cuts.len() != self.config.n_energy_bins {
                return Err(SensitivityError::BinCountMismatch {
                    expected: self.config.n_energy_bins,
                    actual: cuts.len(),
                });
            }
        }
        self.run_impl(gammas, protons, Some((gammaness_cuts, theta2_cuts_deg2)))
    }

    fn run_impl(
        &self,
        gammas: &SampleInput<'_>,
        protons: &SampleInput<'_>,
        fixed_cuts: Option<(&[f64], &[f64])>,
    ) -> Result<SensitivityRun, SensitivityError> {
        let cfg = &self.config;

        let gamma_meta = gammas.metadata.scaled(gammas.n_files);
        let proton_meta = protons.metadata.scaled(protons.n_files);
        let gamma_reweighter = Reweighter::new(&gamma_meta, &cfg.signal_spectrum)?;
        let proton_reweighter = Reweighter::new(&proton_meta, &cfg.background_spectrum)?;
        let gamma_weights = gamma_reweighter.event_weights(gammas.events.true_energy());
        let proton_weights = proton_reweighter.event_weights(protons.events.true_energy());

        log::info!(
            "triggered rates: {:.4} Hz gamma, {:.4} Hz proton ({} + {} events)",
            gamma_weights.sum(),
            proton_weights.sum(),
            gammas.events.len(),
            protons.events.len()
        );

        let binning =
            EnergyBinning::logarithmic(cfg.energy_min, cfg.energy_max, cfg.n_energy_bins)?;
        let ring =
            ring_containment(protons.events.theta2(), cfg.ring_radius, cfg.ring_halfwidth)?;
        let selector = match cfg.strategy {
            CutStrategy::GridScan {
                n_gammaness,
                n_theta2,
            } => BinSelector::Grid(CutGrid::new(
                n_gammaness,
                n_theta2,
                cfg.gammaness_max,
                cfg.theta2_min_deg2,
                cfg.theta2_max_deg2,
            )?),
            CutStrategy::EfficiencyTarget {
                gammaness_efficiency,
                theta2_efficiency,
            } => BinSelector::Efficiency {
                gammaness_efficiency,
                theta2_efficiency,
            },
        };
        let expected_gamma = expected_simulated_per_bin(
            &gamma_meta,
            cfg.signal_spectrum.index,
            cfg.signal_spectrum.pivot_energy,
            &binning,
        )?;

        let obstime_s = cfg.observation_time.as_seconds();
        let ctx = OptimizerContext {
            obstime_s,
            n_off_regions: cfg.n_off_regions,
            ring_area_deg2: ring.area_deg2,
            floors: &cfg.floors,
        };

        let rows: Vec<SensitivityResult> = (0..binning.n_bins())
            .into_par_iter()
            .map(|i| {
                let (lo, hi) = binning.bin_edges_tev(i);
                let bin = collect_bin_events(
                    gammas.events,
                    gamma_weights.view(),
                    protons.events,
                    proton_weights.view(),
                    &ring.contained,
                    lo,
                    hi,
                );
                let gamma_total = bin.gamma_weight.iter().sum::<f64>() * obstime_s;
                let proton_total = bin.proton_weight.iter().sum::<f64>() * obstime_s;

                let selection = match fixed_cuts {
                    Some((gcuts, tcuts)) => {
                        let mut cell = evaluate_cuts(&bin, &ctx, gcuts[i], tcuts[i]);
                        enforce_validity_floors(&mut cell, ctx.floors);
                        cell
                    }
                    None => match &selector {
                        BinSelector::Grid(grid) => scan_grid(&bin, &ctx, grid),
                        BinSelector::Efficiency {
                            gammaness_efficiency,
                            theta2_efficiency,
                        } => select_by_efficiency(
                            &bin,
                            &ctx,
                            *gammaness_efficiency,
                            *theta2_efficiency,
                            0.0,
                            cfg.theta2_max_deg2,
                        ),
                    },
                };
                log::debug!(
                    "bin [{lo:.3e}, {hi:.3e}) TeV: gammaness > {:.3}, theta2 < {:.4} deg2, \
                     sensitivity {:.2}%",
                    selection.gammaness_cut,
                    selection.theta2_cut_deg2,
                    selection.sensitivity_percent
                );

                self.finish_row(lo, hi, &selection, gamma_total, proton_total, gammas,
                    &gamma_meta, expected_gamma[i])
            })
            .collect();

        let degenerate = rows
            .iter()
            .filter(|r| !r.sensitivity_percent.is_finite())
            .count();
        if degenerate > 0 {
            log::warn!(
                "{degenerate} of {} bins have insufficient statistics for any valid cut",
                rows.len()
            );
        }

        let gamma_like = collect_gamma_like(gammas.events, protons.events, &binning, &rows);

        Ok(SensitivityRun {
            rows,
            energy_edges_tev: binning.edges_tev().to_vec(),
            gamma_like,
            units: ColumnUnits::default(),
        })
    }

    /// Assemble the result row of one bin: effective area from true-energy
    /// survivors, flux conversion at the geometric bin center.
    #[allow(clippy::too_many_arguments)]
    fn finish_row(
        &self,
        lo_tev: f64,
        hi_tev: f64,
        selection: &CutSelection,
        gamma_total: f64,
        proton_total: f64,
        gammas: &SampleInput<'_>,
        gamma_meta: &SimulationMetadata,
        expected_in_bin: f64,
    ) -> SensitivityResult {
        let cfg = &self.config;

        // Survivors weighted by the spectral tilt, binned in true energy
        let exponent = cfg.signal_spectrum.index - gamma_meta.spectral_index;
        let pivot_tev = cfg.signal_spectrum.pivot_energy.as_tev();
        let true_energy = gammas.events.true_energy();
        let gammaness = gammas.events.gammaness();
        let theta2 = gammas.events.theta2();
        let mut tilted_survivors = 0.0;
        for j in 0..gammas.events.len() {
            let e = true_energy[j];
            if e >= lo_tev
                && e < hi_tev
                && gammaness[j] > selection.gammaness_cut
                && theta2[j] < selection.theta2_cut_deg2
            {
                tilted_survivors += (e / pivot_tev).powf(exponent);
            }
        }
        let effective_area_m2 = if expected_in_bin > 0.0 {
            tilted_survivors / expected_in_bin * gamma_meta.simulated_area.as_square_meters()
        } else {
            0.0
        };

        let center = Energy::from_tev((lo_tev * hi_tev).sqrt());
        let e2_dfde_erg =
            cfg.flux_reference.dfde(center) * center.as_tev() * center.as_erg();
        let sensitivity_flux_erg_cm2_s = if selection.sensitivity_percent.is_finite() {
            selection.sensitivity_percent / 100.0 * e2_dfde_erg
        } else {
            f64::INFINITY
        };

        let obstime_min = cfg.observation_time.as_minutes();
        SensitivityResult {
            energy_low_tev: lo_tev,
            energy_high_tev: hi_tev,
            gammaness_cut: selection.gammaness_cut,
            theta2_cut_deg2: selection.theta2_cut_deg2,
            n_gammas: selection.n_gammas,
            n_hadrons: selection.n_hadrons,
            gamma_rate_per_min: selection.n_gammas / obstime_min,
            hadron_rate_per_min: selection.n_hadrons / obstime_min,
            excess_5sigma: selection.excess_5sigma,
            sensitivity_percent: selection.sensitivity_percent,
            sensitivity_flux_erg_cm2_s,
            effective_area_m2,
            eff_gamma: if gamma_total > 0.0 {
                selection.n_gammas / gamma_total
            } else {
                0.0
            },
            eff_hadron: if proton_total > 0.0 {
                selection.n_hadrons / proton_total
            } else {
                0.0
            },
            n_raw_gamma: selection.n_raw_gamma,
            n_raw_proton: selection.n_raw_proton,
        }
    }
}

/// Resolved per-bin selection strategy of one run.
enum BinSelector {
    Grid(CutGrid),
    Efficiency {
        gammaness_efficiency: f64,
        theta2_efficiency: f64,
    },
}

/// Copy the events of one reconstructed-energy bin out of the input tables.
fn collect_bin_events(
    gammas: &EventTable,
    gamma_weights: ArrayView1<'_, f64>,
    protons: &EventTable,
    proton_weights: ArrayView1<'_, f64>,
    proton_contained: &ndarray::Array1<bool>,
    lo_tev: f64,
    hi_tev: f64,
) -> BinEvents {
    let mut bin = BinEvents::default();
    let reco = gammas.reco_energy();
    for i in 0..gammas.len() {
        if reco[i] >= lo_tev && reco[i] < hi_tev {
            bin.gamma_gammaness.push(gammas.gammaness()[i]);
            bin.gamma_theta2.push(gammas.theta2()[i]);
            bin.gamma_weight.push(gamma_weights[i]);
        }
    }
    let reco = protons.reco_energy();
    for i in 0..protons.len() {
        if reco[i] >= lo_tev && reco[i] < hi_tev {
            bin.proton_gammaness.push(protons.gammaness()[i]);
            bin.proton_contained.push(proton_contained[i]);
            bin.proton_weight.push(proton_weights[i]);
        }
    }
    bin
}

/// Events of both samples passing their reconstructed-energy bin's cuts.
fn collect_gamma_like(
    gammas: &EventTable,
    protons: &EventTable,
    binning: &EnergyBinning,
    rows: &[SensitivityResult],
) -> EventTable {
    let combined = EventTable::concat(gammas, protons);
    let reco = combined.reco_energy();
    let gammaness = combined.gammaness();
    let theta2 = combined.theta2();
    let indices = combined.indices_where(|i| {
        binning.bin_index(reco[i]).is_some_and(|b| {
            gammaness[i] > rows[b].gammaness_cut && theta2[i] < rows[b].theta2_cut_deg2
        })
    });
    combined.select(&indices)
}
