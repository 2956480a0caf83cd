//! Error types emitted by the pharmrank CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use pharmrank_core::{CandidateError, WeightsError};
use pharmrank_scorer::{ArtefactError, ModelError, UnknownPreset};
use thiserror::Error;

/// Errors emitted by the pharmrank CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name of the option.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// Only part of the weight profile was supplied.
    #[error("missing {field}: weights must be given for all three components or none")]
    IncompleteWeights {
        /// First weight flag left unset.
        field: &'static str,
    },
    /// The supplied weight profile is invalid.
    #[error("invalid weight profile: {0}")]
    InvalidWeights(#[from] WeightsError),
    /// The model preset name is not recognised.
    #[error(transparent)]
    UnknownPreset(#[from] UnknownPreset),
    /// The evaluation date could not be parsed.
    #[error("invalid evaluation date {raw:?}; expected YYYY-MM-DD")]
    InvalidAsOf {
        /// Value as supplied.
        raw: String,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag naming the input.
        field: &'static str,
        /// Path as supplied.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag naming the input.
        field: &'static str,
        /// Path as supplied.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag naming the input.
        field: &'static str,
        /// Path as supplied.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Opening a candidate file failed.
    #[error("failed to open candidates at {path:?}: {source}")]
    OpenCandidates {
        /// File being opened.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// A candidate file is not a JSON array of records.
    #[error("failed to parse candidate JSON at {path:?}: {source}")]
    ParseCandidates {
        /// File being decoded.
        path: Utf8PathBuf,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// A reference population record failed validation.
    #[error("record {index} in {path:?} is invalid: {source}")]
    InvalidRecord {
        /// Dataset file.
        path: Utf8PathBuf,
        /// Zero-based position of the record.
        index: usize,
        /// Validation failure.
        #[source]
        source: CandidateError,
    },
    /// Fitting the model failed.
    #[error("failed to fit a model from {path:?}: {source}")]
    FitModel {
        /// Dataset file.
        path: Utf8PathBuf,
        /// Model construction failure.
        #[source]
        source: ModelError,
    },
    /// Saving or loading the model artefact failed.
    #[error(transparent)]
    Artefact(#[from] ArtefactError),
    /// Serializing command output failed.
    #[error("failed to serialize command output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write command output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
