//! Combine stock level and expiry freshness into one availability score.
//!
//! `availability = stock_score * w_stock + expiry_score * w_expiry` where
//! both sub-scores lie in `0.0..=1.0` and the sub-weights sum to one, so the
//! combined score does too. Empty stock scores `0.0`; an item that has
//! already expired contributes no freshness rather than a negative one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::weights::validate_unit_sum;
use crate::{Direction, NormalizationError, Normalizer, WeightsError, days_until};

/// Default number of days after which an item counts as fully fresh.
pub const DEFAULT_EXPIRY_WINDOW_DAYS: u32 = 365;

/// Default ceiling at which stock saturates.
pub const DEFAULT_STOCK_BOUND: f64 = 200.0;

/// Split of the availability score between stock and freshness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityWeights {
    /// Weight of the stock sub-score.
    pub stock: f64,
    /// Weight of the expiry sub-score.
    pub expiry: f64,
}

impl AvailabilityWeights {
    /// Build and validate sub-weights.
    ///
    /// # Errors
    /// Returns [`WeightsError`] when a weight is negative or non-finite, or
    /// the pair does not sum to `1.0`.
    pub fn new(stock: f64, expiry: f64) -> Result<Self, WeightsError> {
        Self { stock, expiry }.validate()
    }

    /// Availability driven by stock alone.
    #[must_use]
    pub const fn stock_only() -> Self {
        Self {
            stock: 1.0,
            expiry: 0.0,
        }
    }

    /// Validate the sub-weights and return a copy.
    ///
    /// # Errors
    /// Returns [`WeightsError`] when a weight is negative or non-finite, or
    /// the pair does not sum to `1.0`.
    pub fn validate(self) -> Result<Self, WeightsError> {
        validate_unit_sum(&[("stock", self.stock), ("expiry", self.expiry)])?;
        Ok(self)
    }
}

impl Default for AvailabilityWeights {
    fn default() -> Self {
        Self {
            stock: 0.6,
            expiry: 0.4,
        }
    }
}

/// Errors raised when configuring an [`AvailabilityCombiner`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AvailabilityError {
    /// The stock normalizer was invalid.
    #[error("invalid stock normalization")]
    Stock(#[source] NormalizationError),
    /// The expiry window was zero days long.
    #[error("expiry window must be at least one day")]
    ZeroWindow,
    /// The sub-weights were invalid.
    #[error("invalid availability sub-weights")]
    Weights(#[source] WeightsError),
}

/// Merges stock ratio and expiry urgency into one score.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use pharmrank_core::{AvailabilityCombiner, AvailabilityWeights, Normalizer};
///
/// let combiner = AvailabilityCombiner::new(
///     Normalizer::fixed_bound(200.0).expect("valid bound"),
///     365,
///     AvailabilityWeights::default(),
/// )
/// .expect("valid combiner");
/// let today = NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date");
/// let expired = NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date");
/// assert_eq!(combiner.availability(0, expired, today), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvailabilityCombiner {
    stock: Normalizer,
    expiry_window_days: u32,
    weights: AvailabilityWeights,
}

impl AvailabilityCombiner {
    /// Build a combiner from its parts.
    ///
    /// # Errors
    /// Returns [`AvailabilityError`] when the stock normalizer or the
    /// sub-weights are invalid, or the window is zero days.
    pub fn new(
        stock: Normalizer,
        expiry_window_days: u32,
        weights: AvailabilityWeights,
    ) -> Result<Self, AvailabilityError> {
        let stock = stock.validate().map_err(AvailabilityError::Stock)?;
        if expiry_window_days == 0 {
            return Err(AvailabilityError::ZeroWindow);
        }
        let weights = weights.validate().map_err(AvailabilityError::Weights)?;
        Ok(Self {
            stock,
            expiry_window_days,
            weights,
        })
    }

    /// Normalizer applied to stock counts.
    #[must_use]
    pub const fn stock_normalizer(&self) -> Normalizer {
        self.stock
    }

    /// Days after which an item counts as fully fresh.
    #[must_use]
    pub const fn expiry_window_days(&self) -> u32 {
        self.expiry_window_days
    }

    /// Stock versus freshness split.
    #[must_use]
    pub const fn weights(&self) -> AvailabilityWeights {
        self.weights
    }

    /// Stock sub-score in `0.0..=1.0`; zero stock scores `0.0`.
    #[must_use]
    pub fn stock_score(&self, stock: u32) -> f64 {
        if stock == 0 {
            return 0.0;
        }
        self.stock
            .normalize(f64::from(stock), Direction::HigherIsBetter)
            .clamp(0.0, 1.0)
    }

    /// Freshness sub-score in `0.0..=1.0`; expired items score `0.0`.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "freshness is the share of the expiry window still remaining"
    )]
    pub fn expiry_score(&self, expiry: NaiveDate, as_of: NaiveDate) -> f64 {
        let remaining = days_until(expiry, as_of).max(0);
        (remaining as f64 / f64::from(self.expiry_window_days)).min(1.0)
    }

    /// Combined availability score in `0.0..=1.0`.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "availability is a weighted sum of two sub-scores"
    )]
    pub fn availability(&self, stock: u32, expiry: NaiveDate, as_of: NaiveDate) -> f64 {
        let stock_score = self.stock_score(stock);
        let expiry_score = self.expiry_score(expiry, as_of);
        (stock_score * self.weights.stock + expiry_score * self.weights.expiry).clamp(0.0, 1.0)
    }
}

impl Default for AvailabilityCombiner {
    fn default() -> Self {
        Self {
            stock: Normalizer::FixedBound {
                bound: DEFAULT_STOCK_BOUND,
            },
            expiry_window_days: DEFAULT_EXPIRY_WINDOW_DAYS,
            weights: AvailabilityWeights::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NormalizationRange;
    use chrono::Days;
    use rstest::{fixture, rstest};

    const EPSILON: f64 = 1e-12;

    #[fixture]
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date")
    }

    #[fixture]
    fn combiner() -> AvailabilityCombiner {
        AvailabilityCombiner::default()
    }

    #[rstest]
    #[case(0, 0.0)]
    #[case(50, 0.25)]
    #[case(200, 1.0)]
    #[case(1_000, 1.0)]
    fn stock_score_saturates_at_bound(
        combiner: AvailabilityCombiner,
        #[case] stock: u32,
        #[case] expected: f64,
    ) {
        assert!((combiner.stock_score(stock) - expected).abs() < EPSILON);
    }

    #[rstest]
    fn zero_stock_scores_zero_even_for_degenerate_ranges() {
        let range = NormalizationRange::new(0.0, 0.0).expect("valid range");
        let combiner =
            AvailabilityCombiner::new(Normalizer::MinMax(range), 365, AvailabilityWeights::default())
                .expect("valid combiner");
        assert_eq!(combiner.stock_score(0), 0.0);
        assert_eq!(combiner.stock_score(5), 1.0);
    }

    #[rstest]
    fn min_max_stock_is_clamped() {
        let range = NormalizationRange::new(10.0, 20.0).expect("valid range");
        let combiner =
            AvailabilityCombiner::new(Normalizer::MinMax(range), 365, AvailabilityWeights::default())
                .expect("valid combiner");
        assert_eq!(combiner.stock_score(5), 0.0);
        assert_eq!(combiner.stock_score(40), 1.0);
    }

    #[rstest]
    #[case(730, 1.0)]
    #[case(365, 1.0)]
    #[case(73, 0.2)]
    #[case(0, 0.0)]
    fn expiry_score_is_share_of_window(
        combiner: AvailabilityCombiner,
        today: NaiveDate,
        #[case] days: u64,
        #[case] expected: f64,
    ) {
        let expiry = today
            .checked_add_days(Days::new(days))
            .expect("date in range");
        let score = combiner.expiry_score(expiry, today);
        assert!(
            (score - expected).abs() < EPSILON,
            "expected {expected}, got {score}"
        );
    }

    #[rstest]
    fn expired_items_contribute_no_freshness(combiner: AvailabilityCombiner, today: NaiveDate) {
        let expired = today
            .checked_sub_days(Days::new(30))
            .expect("date in range");
        assert_eq!(combiner.expiry_score(expired, today), 0.0);
        assert_eq!(combiner.availability(0, expired, today), 0.0);
    }

    #[rstest]
    fn availability_blends_sub_scores(combiner: AvailabilityCombiner, today: NaiveDate) {
        let expiry = today
            .checked_add_days(Days::new(365))
            .expect("date in range");
        let score = combiner.availability(100, expiry, today);
        let expected = 0.5 * 0.6 + 1.0 * 0.4;
        assert!((score - expected).abs() < EPSILON);
    }

    #[rstest]
    fn rejects_zero_window() {
        let err = AvailabilityCombiner::new(
            Normalizer::FixedBound { bound: 100.0 },
            0,
            AvailabilityWeights::default(),
        )
        .expect_err("zero window should be rejected");
        assert_eq!(err, AvailabilityError::ZeroWindow);
    }

    #[rstest]
    fn rejects_unbalanced_sub_weights() {
        let err = AvailabilityCombiner::new(
            Normalizer::FixedBound { bound: 100.0 },
            180,
            AvailabilityWeights {
                stock: 0.7,
                expiry: 0.7,
            },
        )
        .expect_err("sub-weights should be rejected");
        assert!(matches!(err, AvailabilityError::Weights(_)));
    }

    #[rstest]
    fn stock_only_weights_ignore_expiry(today: NaiveDate) {
        let combiner = AvailabilityCombiner::new(
            Normalizer::FixedBound { bound: 100.0 },
            365,
            AvailabilityWeights::stock_only(),
        )
        .expect("valid combiner");
        let expired = today
            .checked_sub_days(Days::new(1))
            .expect("date in range");
        assert_eq!(combiner.availability(100, expired, today), 1.0);
    }
}
