//! Command-line interface for pharmrank's offline tooling.
//!
//! Two subcommands are provided:
//! - `fit` reads a JSON reference population, fits a ranking model and
//!   saves it atomically as a versioned artefact.
//! - `rank` loads a saved model once, ranks a JSON candidate batch and
//!   prints the ranked and skipped candidates as JSON.
#![forbid(unsafe_code)]

use std::io::{BufReader, Write};

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use pharmrank_core::CandidateInput;
use pharmrank_fs::open_utf8_file;
use serde::Serialize;

mod error;
mod fit;
mod rank;

pub use error::CliError;

use fit::FitArgs;
use rank::RankArgs;

pub(crate) const ARG_FIT_DATASET: &str = "dataset";
pub(crate) const ARG_FIT_OUTPUT: &str = "output";
pub(crate) const ARG_FIT_PRESET: &str = "preset";
pub(crate) const ARG_FIT_DISTANCE_WEIGHT: &str = "distance-weight";
pub(crate) const ARG_FIT_PRICE_WEIGHT: &str = "price-weight";
pub(crate) const ARG_FIT_AVAILABILITY_WEIGHT: &str = "availability-weight";
pub(crate) const ENV_FIT_DATASET: &str = "PHARMRANK_CMDS_FIT_DATASET";
pub(crate) const ENV_FIT_OUTPUT: &str = "PHARMRANK_CMDS_FIT_OUTPUT";

pub(crate) const ARG_RANK_REQUEST: &str = "request";
pub(crate) const ARG_RANK_MODEL: &str = "model";
pub(crate) const ARG_RANK_AS_OF: &str = "as-of";
pub(crate) const ARG_RANK_TOP: &str = "top";
pub(crate) const ENV_RANK_REQUEST: &str = "PHARMRANK_CMDS_RANK_REQUEST_PATH";
pub(crate) const ENV_RANK_MODEL: &str = "PHARMRANK_CMDS_RANK_MODEL";

/// Run the pharmrank CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Fit(args) => fit::run_fit(args),
        Command::Rank(args) => rank::run_rank(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "pharmrank",
    about = "Fit and apply pharmacy candidate ranking models",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fit a ranking model from a reference population.
    Fit(FitArgs),
    /// Rank a candidate batch against a saved model.
    Rank(RankArgs),
}

pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match pharmrank_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Loads a JSON array of candidate records from disk.
///
/// Only an unreadable file or a document that is not an array fails here;
/// malformed elements surface per candidate.
pub(crate) fn load_candidates(path: &Utf8Path) -> Result<Vec<CandidateInput>, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenCandidates {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CliError::ParseCandidates {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
