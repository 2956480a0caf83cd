//! Linear scoring over normalized distance, price and availability.
#![forbid(unsafe_code)]

use chrono::NaiveDate;
use pharmrank_core::{
    AvailabilityCombiner, Candidate, CandidateError, CandidateInput, ComponentScores, Direction,
    Metric, Normalizer, ScoreBreakdown, ScoredCandidate, Scorer, WeightProfile,
};

use crate::ModelError;

/// Weighted-sum scorer with one normalizer per metric.
///
/// Distance and price are lower-is-better; availability comes from the
/// [`AvailabilityCombiner`]. Swapping a normalizer never changes the
/// aggregation, which is always [`ScoreBreakdown::weighted`].
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use pharmrank_core::{Candidate, Scorer};
/// use pharmrank_scorer::ScoringEngine;
///
/// let engine = ScoringEngine::default();
/// let today = NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date");
/// let expiry = NaiveDate::from_ymd_opt(2027, 1, 1).expect("valid date");
/// let near = Candidate::new("P001", 0.8, 25.0, 90, expiry).expect("valid candidate");
/// let far = Candidate::new("P002", 8.0, 20.0, 100, expiry).expect("valid candidate");
/// assert!(engine.score(&near, today).score > engine.score(&far, today).score);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringEngine {
    weights: WeightProfile,
    distance: Normalizer,
    price: Normalizer,
    availability: AvailabilityCombiner,
}

impl ScoringEngine {
    /// Build an engine from validated parts.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidWeights`] or
    /// [`ModelError::InvalidNormalization`] when a part is invalid.
    pub fn new(
        weights: WeightProfile,
        distance: Normalizer,
        price: Normalizer,
        availability: AvailabilityCombiner,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            weights: weights.validate().map_err(ModelError::InvalidWeights)?,
            distance: validated(distance, Metric::Distance)?,
            price: validated(price, Metric::Price)?,
            availability,
        })
    }

    /// Weight profile applied to the component scores.
    #[must_use]
    pub const fn weights(&self) -> WeightProfile {
        self.weights
    }

    /// Normalizer applied to distances.
    #[must_use]
    pub const fn distance_normalizer(&self) -> Normalizer {
        self.distance
    }

    /// Normalizer applied to prices.
    #[must_use]
    pub const fn price_normalizer(&self) -> Normalizer {
        self.price
    }

    /// Availability combiner.
    #[must_use]
    pub const fn availability(&self) -> &AvailabilityCombiner {
        &self.availability
    }

    /// Normalized component scores, before weighting.
    ///
    /// Min-max components are not clamped here and may leave `0.0..=1.0`
    /// for values outside the fitted range.
    #[must_use]
    pub fn components(&self, candidate: &Candidate, as_of: NaiveDate) -> ComponentScores {
        ComponentScores {
            distance: self
                .distance
                .normalize(candidate.distance_km, Direction::LowerIsBetter),
            price: self
                .price
                .normalize(candidate.price, Direction::LowerIsBetter),
            availability: self
                .availability
                .availability(candidate.stock, candidate.expiry, as_of),
        }
    }
}

impl Default for ScoringEngine {
    /// Fixed bounds of 15 km, 150 currency units and 200 stock units with the
    /// default weight profile.
    fn default() -> Self {
        Self {
            weights: WeightProfile::default(),
            distance: Normalizer::FixedBound { bound: 15.0 },
            price: Normalizer::FixedBound { bound: 150.0 },
            availability: AvailabilityCombiner::default(),
        }
    }
}

impl Scorer for ScoringEngine {
    fn score(&self, candidate: &Candidate, as_of: NaiveDate) -> ScoreBreakdown {
        ScoreBreakdown::weighted(self.components(candidate, as_of), &self.weights)
    }
}

fn validated(normalizer: Normalizer, metric: Metric) -> Result<Normalizer, ModelError> {
    normalizer
        .validate()
        .map_err(|source| ModelError::InvalidNormalization { metric, source })
}

/// Validate a raw candidate and score it.
///
/// # Errors
/// Returns the [`CandidateError`] raised while validating `input`.
pub fn score<S>(
    input: &CandidateInput,
    scorer: &S,
    as_of: NaiveDate,
) -> Result<ScoredCandidate, CandidateError>
where
    S: Scorer + ?Sized,
{
    let candidate = input.to_candidate()?;
    let breakdown = scorer.score(&candidate, as_of);
    Ok(ScoredCandidate::new(candidate, breakdown))
}
