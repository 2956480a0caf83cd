//! Rank command implementation for the pharmrank CLI.

use std::io::Write;

use camino::Utf8PathBuf;
use chrono::{Local, NaiveDate};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use pharmrank_core::{ComponentScores, Rating, parse_expiry};
use pharmrank_scorer::{Ranker, Ranking, load};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_RANK_AS_OF, ARG_RANK_MODEL, ARG_RANK_REQUEST, ARG_RANK_TOP, CliError, ENV_RANK_MODEL,
    ENV_RANK_REQUEST, load_candidates, require_existing, write_json,
};

/// CLI arguments for the `rank` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Rank a batch of candidates against a saved model. The \
                 request is a JSON array of candidate records; invalid \
                 records are reported as skipped and never abort the batch.",
    about = "Rank a candidate batch"
)]
#[ortho_config(prefix = "PHARMRANK")]
pub(crate) struct RankArgs {
    /// Path to a JSON array of candidates.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) request_path: Option<Utf8PathBuf>,
    /// Path to the model artefact written by `fit`.
    #[arg(long = ARG_RANK_MODEL, value_name = "path")]
    #[serde(default)]
    pub(crate) model: Option<Utf8PathBuf>,
    /// Evaluation date for expiry scoring; defaults to today.
    #[arg(long = ARG_RANK_AS_OF, value_name = "date")]
    #[serde(default)]
    pub(crate) as_of: Option<String>,
    /// Keep only the best N candidates.
    #[arg(long = ARG_RANK_TOP, value_name = "n")]
    #[serde(default)]
    pub(crate) top: Option<usize>,
}

impl RankArgs {
    pub(crate) fn into_config(self) -> Result<RankConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RankConfig::try_from(merged)
    }
}

/// Resolved `rank` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RankConfig {
    /// Candidate batch file.
    pub(crate) request_path: Utf8PathBuf,
    /// Model artefact.
    pub(crate) model: Utf8PathBuf,
    /// Evaluation date.
    pub(crate) as_of: NaiveDate,
    /// Optional cut-off for the ranked list.
    pub(crate) top: Option<usize>,
}

impl RankConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.request_path, ARG_RANK_REQUEST)?;
        require_existing(&self.model, ARG_RANK_MODEL)?;
        Ok(())
    }
}

impl TryFrom<RankArgs> for RankConfig {
    type Error = CliError;

    fn try_from(args: RankArgs) -> Result<Self, Self::Error> {
        let request_path = args.request_path.ok_or(CliError::MissingArgument {
            field: ARG_RANK_REQUEST,
            env: ENV_RANK_REQUEST,
        })?;
        let model = args.model.ok_or(CliError::MissingArgument {
            field: ARG_RANK_MODEL,
            env: ENV_RANK_MODEL,
        })?;
        let as_of = match args.as_of {
            Some(raw) => parse_expiry(&raw).ok_or(CliError::InvalidAsOf { raw })?,
            None => Local::now().date_naive(),
        };
        Ok(Self {
            request_path,
            model,
            as_of,
            top: args.top,
        })
    }
}

/// One ranked candidate in the command output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RankedEntry {
    /// One-based position.
    pub(crate) rank: usize,
    /// Candidate identifier.
    pub(crate) id: String,
    /// Final score.
    pub(crate) score: f64,
    /// Qualitative band.
    pub(crate) rating: Rating,
    /// Component scores before weighting.
    pub(crate) components: ComponentScores,
    /// Weighted component contributions.
    pub(crate) contributions: ComponentScores,
}

/// One skipped candidate in the command output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SkippedEntry {
    /// Position in the request.
    pub(crate) index: usize,
    /// Identifier, when one could be read.
    pub(crate) id: Option<String>,
    /// Human-readable reason.
    pub(crate) reason: String,
}

/// Output of the `rank` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RankReport {
    /// Evaluation date used for expiry scoring.
    pub(crate) as_of: NaiveDate,
    /// Ranked candidates, best first.
    pub(crate) ranked: Vec<RankedEntry>,
    /// Candidates that could not be ranked, in request order.
    pub(crate) skipped: Vec<SkippedEntry>,
}

impl RankReport {
    fn new(as_of: NaiveDate, ranking: Ranking) -> Self {
        let ranked = (1..)
            .zip(ranking.ranked)
            .map(|(rank, scored)| RankedEntry {
                rank,
                score: scored.score(),
                id: scored.candidate.id,
                rating: scored.rating,
                components: scored.breakdown.components,
                contributions: scored.breakdown.contributions,
            })
            .collect();
        let skipped = ranking
            .skipped
            .into_iter()
            .map(|skip| SkippedEntry {
                index: skip.index,
                id: skip.id,
                reason: skip.reason.to_string(),
            })
            .collect();
        Self {
            as_of,
            ranked,
            skipped,
        }
    }
}

pub(crate) fn run_rank(args: RankArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_rank_with(args, &mut stdout)
}

pub(crate) fn run_rank_with(args: RankArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = resolve_rank_config(args)?;
    let model = load(&config.model)?;
    let batch = load_candidates(&config.request_path)?;
    let ranker = Ranker::new(&model, config.as_of);
    let ranking = match config.top {
        Some(limit) => ranker.with_limit(limit).rank(&batch),
        None => ranker.rank(&batch),
    };
    write_json(writer, &RankReport::new(config.as_of, ranking))
}

fn resolve_rank_config(args: RankArgs) -> Result<RankConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RankConfig, CliError> {
    let merged = RankArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RankConfig::try_from(merged)
}
