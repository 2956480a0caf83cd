//! Ranking models: a weight profile, a normalization configuration and the
//! reference ranges frozen at fit time.
//!
//! A [`RankingModel`] is immutable once built. Serving code scores against
//! the ranges stored in the model and never recomputes them from live
//! traffic, so two requests scoring the same candidate agree exactly.
#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use log::debug;
use pharmrank_core::{
    AvailabilityCombiner, AvailabilityWeights, Candidate, DEFAULT_EXPIRY_WINDOW_DAYS, Metric,
    NormalizationRange, Normalizer, ScoreBreakdown, Scorer, WeightProfile,
};
use serde::{Deserialize, Serialize};

use crate::{ModelError, SCHEMA_CURRENT, ScoringEngine, UnknownPreset};

/// How a metric is mapped onto `0.0..=1.0`, before any ranges are known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationStrategy {
    /// Min-max against the range observed in the reference population.
    MinMax,
    /// Scale against a configured ceiling.
    FixedBound {
        /// Value at which the metric saturates.
        bound: f64,
    },
    /// Exponential decay with constant `k`.
    Decay {
        /// Decay constant.
        constant: f64,
    },
}

impl NormalizationStrategy {
    fn resolve(
        self,
        metric: Metric,
        ranges: Option<&FeatureRanges>,
    ) -> Result<Normalizer, ModelError> {
        let normalizer = match self {
            Self::MinMax => {
                let range = ranges
                    .and_then(|known| known.get(metric))
                    .ok_or(ModelError::MissingRange { metric })?;
                Normalizer::MinMax(range)
            }
            Self::FixedBound { bound } => Normalizer::FixedBound { bound },
            Self::Decay { constant } => Normalizer::Decay { constant },
        };
        normalizer
            .validate()
            .map_err(|source| ModelError::InvalidNormalization { metric, source })
    }
}

/// Scoring configuration stored verbatim in a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Distance strategy.
    pub distance: NormalizationStrategy,
    /// Price strategy.
    pub price: NormalizationStrategy,
    /// Stock strategy inside the availability score.
    pub stock: NormalizationStrategy,
    /// Days after which stock counts as fully fresh.
    pub expiry_window_days: u32,
    /// Stock versus freshness split.
    pub availability_weights: AvailabilityWeights,
}

impl ModelConfig {
    /// Min-max for every metric, a one-year window and a 0.6 / 0.4 split.
    #[must_use]
    pub fn relative() -> Self {
        Self {
            distance: NormalizationStrategy::MinMax,
            price: NormalizationStrategy::MinMax,
            stock: NormalizationStrategy::MinMax,
            expiry_window_days: DEFAULT_EXPIRY_WINDOW_DAYS,
            availability_weights: AvailabilityWeights::default(),
        }
    }

    /// Ceilings of 15 km, 150 currency units and 200 units with a 0.7 / 0.3
    /// split.
    #[must_use]
    pub const fn fixed_bounds() -> Self {
        Self {
            distance: NormalizationStrategy::FixedBound { bound: 15.0 },
            price: NormalizationStrategy::FixedBound { bound: 150.0 },
            stock: NormalizationStrategy::FixedBound { bound: 200.0 },
            expiry_window_days: DEFAULT_EXPIRY_WINDOW_DAYS,
            availability_weights: AvailabilityWeights {
                stock: 0.7,
                expiry: 0.3,
            },
        }
    }

    /// Steep decay on distance, gentle decay on price, stock saturating at
    /// 100 units and a 180-day window split evenly with stock.
    #[must_use]
    pub const fn priority_decay() -> Self {
        Self {
            distance: NormalizationStrategy::Decay { constant: 2.0 },
            price: NormalizationStrategy::Decay { constant: 50.0 },
            stock: NormalizationStrategy::FixedBound { bound: 100.0 },
            expiry_window_days: 180,
            availability_weights: AvailabilityWeights {
                stock: 0.5,
                expiry: 0.5,
            },
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::relative()
    }
}

/// Named [`ModelConfig`] presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelPreset {
    /// See [`ModelConfig::relative`].
    #[default]
    Relative,
    /// See [`ModelConfig::fixed_bounds`].
    FixedBounds,
    /// See [`ModelConfig::priority_decay`].
    PriorityDecay,
}

impl ModelPreset {
    /// Preset name as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relative => "relative",
            Self::FixedBounds => "fixed-bounds",
            Self::PriorityDecay => "priority-decay",
        }
    }

    /// Configuration described by the preset.
    #[must_use]
    pub fn config(self) -> ModelConfig {
        match self {
            Self::Relative => ModelConfig::relative(),
            Self::FixedBounds => ModelConfig::fixed_bounds(),
            Self::PriorityDecay => ModelConfig::priority_decay(),
        }
    }
}

impl fmt::Display for ModelPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelPreset {
    type Err = UnknownPreset;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "relative" => Ok(Self::Relative),
            "fixed-bounds" => Ok(Self::FixedBounds),
            "priority-decay" => Ok(Self::PriorityDecay),
            _ => Err(UnknownPreset {
                name: name.to_owned(),
            }),
        }
    }
}

/// Ranges observed in a reference population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRanges {
    /// Distance span.
    pub distance: NormalizationRange,
    /// Price span.
    pub price: NormalizationRange,
    /// Stock span.
    pub stock: NormalizationRange,
}

impl FeatureRanges {
    /// Observe the ranges of `population`, or `None` when it is empty.
    #[must_use]
    pub fn observe(population: &[Candidate]) -> Option<Self> {
        Some(Self {
            distance: NormalizationRange::from_values(
                population.iter().map(|candidate| candidate.distance_km),
            )?,
            price: NormalizationRange::from_values(
                population.iter().map(|candidate| candidate.price),
            )?,
            stock: NormalizationRange::from_values(
                population.iter().map(|candidate| f64::from(candidate.stock)),
            )?,
        })
    }

    /// Range recorded for `metric`, if it is a ranged metric.
    #[must_use]
    pub const fn get(&self, metric: Metric) -> Option<NormalizationRange> {
        match metric {
            Metric::Distance => Some(self.distance),
            Metric::Price => Some(self.price),
            Metric::Stock => Some(self.stock),
            Metric::Id | Metric::Expiry => None,
        }
    }

    fn validate(self) -> Result<Self, ModelError> {
        for (metric, range) in [
            (Metric::Distance, self.distance),
            (Metric::Price, self.price),
            (Metric::Stock, self.stock),
        ] {
            range
                .validate()
                .map_err(|source| ModelError::InvalidNormalization { metric, source })?;
        }
        Ok(self)
    }
}

/// A fitted or explicitly constructed ranking model.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use pharmrank_core::{Candidate, Scorer, WeightProfile};
/// use pharmrank_scorer::{ModelConfig, RankingModel};
///
/// let expiry = NaiveDate::from_ymd_opt(2026, 12, 31).expect("valid date");
/// let population = vec![
///     Candidate::new("P1", 1.0, 20.0, 50, expiry).expect("valid candidate"),
///     Candidate::new("P2", 9.0, 60.0, 150, expiry).expect("valid candidate"),
/// ];
/// let model = RankingModel::fit(&population, WeightProfile::default(), ModelConfig::relative())
///     .expect("fit model");
/// let today = NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date");
/// assert!(model.score(&population[0], today).score > model.score(&population[1], today).score);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RankingModel {
    weights: WeightProfile,
    config: ModelConfig,
    ranges: Option<FeatureRanges>,
    schema_version: u16,
    engine: ScoringEngine,
}

impl RankingModel {
    /// Build a model from explicit parts.
    ///
    /// `ranges` may be `None` when no metric uses min-max normalization.
    ///
    /// # Errors
    /// Returns [`ModelError`] when the weights, ranges or configuration are
    /// invalid, or a min-max metric has no range.
    pub fn new(
        weights: WeightProfile,
        config: ModelConfig,
        ranges: Option<FeatureRanges>,
    ) -> Result<Self, ModelError> {
        Self::with_schema(weights, config, ranges, SCHEMA_CURRENT)
    }

    pub(crate) fn with_schema(
        weights: WeightProfile,
        config: ModelConfig,
        ranges: Option<FeatureRanges>,
        schema_version: u16,
    ) -> Result<Self, ModelError> {
        let checked_ranges = ranges.map(FeatureRanges::validate).transpose()?;
        let stock = config.stock.resolve(Metric::Stock, checked_ranges.as_ref())?;
        let availability = AvailabilityCombiner::new(
            stock,
            config.expiry_window_days,
            config.availability_weights,
        )
        .map_err(ModelError::InvalidAvailability)?;
        let engine = ScoringEngine::new(
            weights,
            config.distance.resolve(Metric::Distance, checked_ranges.as_ref())?,
            config.price.resolve(Metric::Price, checked_ranges.as_ref())?,
            availability,
        )?;
        Ok(Self {
            weights,
            config,
            ranges: checked_ranges,
            schema_version,
            engine,
        })
    }

    /// Fit a model against a reference population.
    ///
    /// The observed ranges are frozen into the model together with
    /// `weights` and `config`.
    ///
    /// # Errors
    /// Returns [`ModelError::EmptyPopulation`] for an empty population and
    /// the errors of [`RankingModel::new`] otherwise.
    pub fn fit(
        population: &[Candidate],
        weights: WeightProfile,
        config: ModelConfig,
    ) -> Result<Self, ModelError> {
        let ranges = FeatureRanges::observe(population).ok_or(ModelError::EmptyPopulation)?;
        let model = Self::new(weights, config, Some(ranges))?;
        debug!(
            "fitted ranking model on {} candidates: distance {:?}, price {:?}, stock {:?}",
            population.len(),
            ranges.distance,
            ranges.price,
            ranges.stock,
        );
        Ok(model)
    }

    /// Weight profile.
    #[must_use]
    pub const fn weights(&self) -> WeightProfile {
        self.weights
    }

    /// Normalization configuration.
    #[must_use]
    pub const fn config(&self) -> ModelConfig {
        self.config
    }

    /// Ranges observed at fit time, if any.
    #[must_use]
    pub const fn ranges(&self) -> Option<FeatureRanges> {
        self.ranges
    }

    /// Artefact schema the model was built from.
    #[must_use]
    pub const fn schema_version(&self) -> u16 {
        self.schema_version
    }

    /// Engine scoring candidates for this model.
    #[must_use]
    pub const fn engine(&self) -> &ScoringEngine {
        &self.engine
    }
}

impl Scorer for RankingModel {
    fn score(&self, candidate: &Candidate, as_of: NaiveDate) -> ScoreBreakdown {
        self.engine.score(candidate, as_of)
    }
}
