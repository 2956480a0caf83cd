//! Error types raised while building, persisting and loading ranking models.
#![forbid(unsafe_code)]

use camino::Utf8PathBuf;
use pharmrank_core::{AvailabilityError, Metric, NormalizationError, WeightsError};
use thiserror::Error;

/// Errors raised when a ranking model cannot be created.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// The weight profile was rejected.
    #[error("invalid weight profile")]
    InvalidWeights(#[source] WeightsError),
    /// A metric's normalization parameters were rejected.
    #[error("invalid normalization for {metric}")]
    InvalidNormalization {
        /// Metric whose strategy was invalid.
        metric: Metric,
        /// Underlying parameter error.
        #[source]
        source: NormalizationError,
    },
    /// The expiry window or availability sub-weights were rejected.
    #[error("invalid availability configuration")]
    InvalidAvailability(#[source] AvailabilityError),
    /// A min-max strategy was configured without an observed range.
    #[error("min-max normalization for {metric} needs an observed range")]
    MissingRange {
        /// Metric lacking a range.
        metric: Metric,
    },
    /// The reference population contained no candidates.
    #[error("cannot fit a model against an empty reference population")]
    EmptyPopulation,
}

/// Errors raised while saving or loading model artefacts.
#[derive(Debug, Error)]
pub enum ArtefactError {
    /// The artefact's envelope, schema tag or payload was not understood.
    #[error("incompatible model artefact at {path}: {reason}")]
    IncompatibleSchema {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Why the artefact was rejected.
        reason: String,
    },
    /// The artefact decoded but described an invalid model.
    #[error("model artefact at {path} describes an invalid model")]
    InvalidModel {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Validation failure.
        #[source]
        source: ModelError,
    },
    /// Creating the parent directory for the artefact failed.
    #[error("failed to create parent directory {path}")]
    CreateParent {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Reading the artefact failed.
    #[error("failed to read model artefact at {path}")]
    ReadFile {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Writing the artefact failed; any previous artefact is untouched.
    #[error("failed to write model artefact at {path}")]
    WriteFile {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Encoding the model with `bincode` failed.
    #[error("failed to serialise model into {path}")]
    Serialise {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Source error from `bincode`.
        #[source]
        source: bincode::Error,
    },
}

/// A preset name that matched none of the known presets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown model preset {name}; expected relative, fixed-bounds or priority-decay")]
pub struct UnknownPreset {
    /// Name as supplied.
    pub name: String,
}
