//! Score candidates and explain the result.
//!
//! The [`Scorer`] trait is the seam between the ranking pipeline and a
//! scoring backend. Backends produce per-component scores;
//! [`ScoreBreakdown::weighted`] owns the weighting and final clamp so the
//! aggregation rule is written exactly once.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Candidate, Component, WeightProfile};

/// One value per score component.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentScores {
    /// Distance value.
    pub distance: f64,
    /// Price value.
    pub price: f64,
    /// Availability value.
    pub availability: f64,
}

impl ComponentScores {
    /// Return the value for `component`.
    #[must_use]
    pub const fn get(&self, component: Component) -> f64 {
        match component {
            Component::Distance => self.distance,
            Component::Price => self.price,
            Component::Availability => self.availability,
        }
    }
}

/// Clamp a raw score into `0.0..=1.0`, mapping non-finite values to `0.0`.
#[must_use]
pub fn sanitise(score: f64) -> f64 {
    if !score.is_finite() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

/// Final score of a candidate together with its explanation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Weighted, clamped score in `0.0..=1.0`.
    pub score: f64,
    /// Normalized component scores before weighting.
    pub components: ComponentScores,
    /// Component scores multiplied by their weights.
    pub contributions: ComponentScores,
}

impl ScoreBreakdown {
    /// Weight `components` and clamp their sum.
    ///
    /// # Examples
    /// ```
    /// use pharmrank_core::{ComponentScores, ScoreBreakdown, WeightProfile};
    ///
    /// let components = ComponentScores { distance: 1.0, price: 0.5, availability: 0.0 };
    /// let breakdown = ScoreBreakdown::weighted(components, &WeightProfile::default());
    /// assert!((breakdown.score - 0.65).abs() < 1e-12);
    /// assert!((breakdown.contributions.price - 0.15).abs() < 1e-12);
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "the final score is a weighted sum of component scores"
    )]
    pub fn weighted(components: ComponentScores, weights: &WeightProfile) -> Self {
        let contributions = ComponentScores {
            distance: components.distance * weights.distance,
            price: components.price * weights.price,
            availability: components.availability * weights.availability,
        };
        let raw = contributions.distance + contributions.price + contributions.availability;
        Self {
            score: sanitise(raw),
            components,
            contributions,
        }
    }
}

/// Qualitative band for a final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    /// Score of at least `0.8`.
    Excellent,
    /// Score of at least `0.6`.
    Good,
    /// Score of at least `0.4`.
    Average,
    /// Score of at least `0.2`.
    BelowAverage,
    /// Anything lower.
    Poor,
}

impl Rating {
    /// Band a score.
    ///
    /// # Examples
    /// ```
    /// use pharmrank_core::Rating;
    ///
    /// assert_eq!(Rating::from_score(0.8), Rating::Excellent);
    /// assert_eq!(Rating::from_score(0.39), Rating::BelowAverage);
    /// ```
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::Excellent
        } else if score >= 0.6 {
            Self::Good
        } else if score >= 0.4 {
            Self::Average
        } else if score >= 0.2 {
            Self::BelowAverage
        } else {
            Self::Poor
        }
    }
}

/// A candidate with its score. Produced per request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// The scored candidate.
    pub candidate: Candidate,
    /// Score and explanation.
    pub breakdown: ScoreBreakdown,
    /// Qualitative band of the score.
    pub rating: Rating,
}

impl ScoredCandidate {
    /// Attach a breakdown to a candidate.
    #[must_use]
    pub fn new(candidate: Candidate, breakdown: ScoreBreakdown) -> Self {
        let rating = Rating::from_score(breakdown.score);
        Self {
            candidate,
            breakdown,
            rating,
        }
    }

    /// Final score in `0.0..=1.0`.
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.breakdown.score
    }
}

/// Score a candidate as of a given date.
///
/// Implementations must be pure functions of their inputs and thread-safe
/// (`Send` + `Sync`) so one scorer can serve concurrent batches. Returned
/// scores must lie in `0.0..=1.0`; building the result with
/// [`ScoreBreakdown::weighted`] guarantees this.
///
/// # Examples
///
/// ```rust
/// use chrono::NaiveDate;
/// use pharmrank_core::{Candidate, ComponentScores, ScoreBreakdown, Scorer, WeightProfile};
///
/// struct NearestFirst;
///
/// impl Scorer for NearestFirst {
///     fn score(&self, candidate: &Candidate, _as_of: NaiveDate) -> ScoreBreakdown {
///         let components = ComponentScores {
///             distance: 1.0 / (1.0 + candidate.distance_km),
///             ..ComponentScores::default()
///         };
///         ScoreBreakdown::weighted(components, &WeightProfile::new(1.0, 0.0, 0.0).expect("valid weights"))
///     }
/// }
///
/// let today = NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date");
/// let candidate = Candidate::new("P1", 0.0, 10.0, 5, today).expect("valid candidate");
/// assert_eq!(NearestFirst.score(&candidate, today).score, 1.0);
/// ```
pub trait Scorer: Send + Sync {
    /// Return the score of `candidate` evaluated on `as_of`.
    fn score(&self, candidate: &Candidate, as_of: NaiveDate) -> ScoreBreakdown;
}
