use thiserror::Error;

/// Errors produced while configuring or running the sensitivity engine.
///
/// Only genuine configuration problems surface as errors. A bin without a
/// valid cut combination is *not* an error; it is reported as infinite
/// sensitivity in its result row so that downstream consumers can tell
/// "measured but undetectable" apart from "computation failed".
#[derive(Error, Debug)]
pub enum SensitivityError {
    /// Spectral parameters produce a non-finite integral or rate.
    #[error("invalid spectral parameters: {0}")]
    InvalidSpectrum(String),

    /// Ring geometry violates 0 < halfwidth < radius.
    #[error("invalid ring geometry: radius {radius:.3} deg, halfwidth {halfwidth:.3} deg")]
    InvalidRing {
        /// Nominal ring radius in degrees.
        radius: f64,
        /// Ring halfwidth in degrees.
        halfwidth: f64,
    },

    /// A per-bin array length does not match the energy binning.
    #[error("expected {expected} energy bins, got {actual}")]
    BinCountMismatch {
        /// Number of bins required by the configuration.
        expected: usize,
        /// Number of entries actually provided.
        actual: usize,
    },

    /// Event table columns have inconsistent lengths.
    #[error("event table column lengths differ: {0}")]
    ColumnLengthMismatch(String),

    /// Configuration validation failure.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
