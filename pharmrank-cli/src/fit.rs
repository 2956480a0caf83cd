//! Fit command implementation for the pharmrank CLI.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::warn;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use pharmrank_core::{Candidate, WeightProfile};
use pharmrank_scorer::{FeatureRanges, ModelPreset, RankingModel, save};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_FIT_AVAILABILITY_WEIGHT, ARG_FIT_DATASET, ARG_FIT_DISTANCE_WEIGHT, ARG_FIT_OUTPUT,
    ARG_FIT_PRESET, ARG_FIT_PRICE_WEIGHT, CliError, ENV_FIT_DATASET, ENV_FIT_OUTPUT,
    load_candidates, require_existing, write_json,
};

/// CLI arguments for the `fit` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Fit a ranking model from a reference population. The \
                 dataset is a JSON array of candidate records; normalization \
                 ranges observed in it are frozen into the saved artefact so \
                 later rankings are reproducible.",
    about = "Fit a ranking model from a reference population"
)]
#[ortho_config(prefix = "PHARMRANK")]
pub(crate) struct FitArgs {
    /// Path to a JSON array of reference candidates.
    #[arg(long = ARG_FIT_DATASET, value_name = "path")]
    #[serde(default)]
    pub(crate) dataset: Option<Utf8PathBuf>,
    /// Where to write the model artefact.
    #[arg(long = ARG_FIT_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Normalization preset: relative, fixed-bounds or priority-decay.
    #[arg(long = ARG_FIT_PRESET, value_name = "name")]
    #[serde(default)]
    pub(crate) preset: Option<String>,
    /// Weight of the distance component.
    #[arg(long = ARG_FIT_DISTANCE_WEIGHT, value_name = "weight")]
    #[serde(default)]
    pub(crate) distance_weight: Option<f64>,
    /// Weight of the price component.
    #[arg(long = ARG_FIT_PRICE_WEIGHT, value_name = "weight")]
    #[serde(default)]
    pub(crate) price_weight: Option<f64>,
    /// Weight of the availability component.
    #[arg(long = ARG_FIT_AVAILABILITY_WEIGHT, value_name = "weight")]
    #[serde(default)]
    pub(crate) availability_weight: Option<f64>,
}

impl FitArgs {
    pub(crate) fn into_config(self) -> Result<FitConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        FitConfig::try_from(merged)
    }
}

/// Resolved `fit` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FitConfig {
    /// Reference population file.
    pub(crate) dataset: Utf8PathBuf,
    /// Artefact destination.
    pub(crate) output: Utf8PathBuf,
    /// Normalization preset.
    pub(crate) preset: ModelPreset,
    /// Component weights.
    pub(crate) weights: WeightProfile,
}

impl FitConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.dataset, ARG_FIT_DATASET)
    }
}

impl TryFrom<FitArgs> for FitConfig {
    type Error = CliError;

    fn try_from(args: FitArgs) -> Result<Self, Self::Error> {
        let dataset = args.dataset.ok_or(CliError::MissingArgument {
            field: ARG_FIT_DATASET,
            env: ENV_FIT_DATASET,
        })?;
        let output = args.output.ok_or(CliError::MissingArgument {
            field: ARG_FIT_OUTPUT,
            env: ENV_FIT_OUTPUT,
        })?;
        let preset = args
            .preset
            .as_deref()
            .map(str::parse::<ModelPreset>)
            .transpose()?
            .unwrap_or_default();
        let weights = resolve_weights(
            args.distance_weight,
            args.price_weight,
            args.availability_weight,
        )?;
        Ok(Self {
            dataset,
            output,
            preset,
            weights,
        })
    }
}

/// Weights come as a full triple or not at all.
fn resolve_weights(
    distance: Option<f64>,
    price: Option<f64>,
    availability: Option<f64>,
) -> Result<WeightProfile, CliError> {
    match (distance, price, availability) {
        (None, None, None) => Ok(WeightProfile::default()),
        (Some(distance_weight), Some(price_weight), Some(availability_weight)) => Ok(
            WeightProfile::new(distance_weight, price_weight, availability_weight)?,
        ),
        (None, _, _) => Err(CliError::IncompleteWeights {
            field: ARG_FIT_DISTANCE_WEIGHT,
        }),
        (_, None, _) => Err(CliError::IncompleteWeights {
            field: ARG_FIT_PRICE_WEIGHT,
        }),
        (_, _, None) => Err(CliError::IncompleteWeights {
            field: ARG_FIT_AVAILABILITY_WEIGHT,
        }),
    }
}

/// Summary printed after a successful fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct FitSummary {
    /// Artefact written.
    pub(crate) model: Utf8PathBuf,
    /// Preset used.
    pub(crate) preset: String,
    /// Artefact schema version.
    pub(crate) schema: u16,
    /// Size of the reference population.
    pub(crate) population: usize,
    /// Component weights.
    pub(crate) weights: WeightProfile,
    /// Frozen normalization ranges, when the preset uses any.
    pub(crate) ranges: Option<FeatureRanges>,
}

pub(crate) fn run_fit(args: FitArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_fit_with(args, &mut stdout)
}

pub(crate) fn run_fit_with(args: FitArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = resolve_fit_config(args)?;
    let population = load_population(&config.dataset)?;
    if !config.weights.follows_priority_convention() {
        warn!(
            "weights {:?} do not follow the distance >= price >= availability convention",
            config.weights
        );
    }
    let model = RankingModel::fit(&population, config.weights, config.preset.config()).map_err(
        |source| CliError::FitModel {
            path: config.dataset.clone(),
            source,
        },
    )?;
    save(&model, &config.output)?;
    let summary = FitSummary {
        model: config.output,
        preset: config.preset.to_string(),
        schema: model.schema_version(),
        population: population.len(),
        weights: model.weights(),
        ranges: model.ranges(),
    };
    write_json(writer, &summary)
}

fn resolve_fit_config(args: FitArgs) -> Result<FitConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

/// Loads the reference population. Any invalid record is fatal.
pub(crate) fn load_population(path: &Utf8Path) -> Result<Vec<Candidate>, CliError> {
    load_candidates(path)?
        .iter()
        .enumerate()
        .map(|(index, record)| {
            record
                .to_candidate()
                .map_err(|source| CliError::InvalidRecord {
                    path: path.to_path_buf(),
                    index,
                    source,
                })
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<FitConfig, CliError> {
    let merged = FitArgs::merge_from_layers(layers).map_err(CliError::from)?;
    FitConfig::try_from(merged)
}
