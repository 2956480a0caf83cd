//! Map raw metric values onto comparable `0.0..=1.0` scores.
//!
//! Three strategies are supported and are interchangeable behind
//! [`Normalizer`]:
//!
//! - **Min-max** against a [`NormalizationRange`] observed over a reference
//!   population. A degenerate range (`min == max`) carries no signal and
//!   scores every value as `1.0`. Values outside the range are *not*
//!   clamped, so serving-time outliers may score slightly below `0.0` or
//!   above `1.0`; callers clamp after aggregation.
//! - **Fixed bound** against a configured ceiling, clamped into
//!   `0.0..=1.0`.
//! - **Exponential decay** with a configured constant `k`: `exp(-v / k)`.
//!
//! # Examples
//! ```
//! use pharmrank_core::{Direction, NormalizationRange, Normalizer};
//!
//! let range = NormalizationRange::new(2.0, 10.0).expect("valid range");
//! let distance = Normalizer::MinMax(range);
//! assert_eq!(distance.normalize(2.0, Direction::LowerIsBetter), 1.0);
//! assert_eq!(distance.normalize(10.0, Direction::LowerIsBetter), 0.0);
//!
//! let price = Normalizer::fixed_bound(150.0).expect("valid bound");
//! assert_eq!(price.normalize(300.0, Direction::LowerIsBetter), 0.0);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether low or high raw values are favourable for a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Smaller raw values score higher (distance, price).
    LowerIsBetter,
    /// Larger raw values score higher (stock).
    HigherIsBetter,
}

/// Errors raised by invalid normalization parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizationError {
    /// Range bounds were non-finite or inverted.
    #[error("normalization range [{min}, {max}] must be finite with min <= max")]
    InvalidRange {
        /// Lower bound supplied.
        min: f64,
        /// Upper bound supplied.
        max: f64,
    },
    /// A fixed bound was zero, negative or non-finite.
    #[error("fixed normalization bound {bound} must be finite and positive")]
    InvalidBound {
        /// Bound supplied.
        bound: f64,
    },
    /// A decay constant was zero, negative or non-finite.
    #[error("decay constant {constant} must be finite and positive")]
    InvalidDecay {
        /// Constant supplied.
        constant: f64,
    },
}

/// Observed or configured `[min, max]` span of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationRange {
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
}

impl NormalizationRange {
    /// Build a validated range.
    ///
    /// # Errors
    /// Returns [`NormalizationError::InvalidRange`] when either bound is not
    /// finite or `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self, NormalizationError> {
        Self { min, max }.validate()
    }

    /// Compute the span of `values`, returning `None` for an empty input.
    ///
    /// Non-finite values are ignored.
    ///
    /// # Examples
    /// ```
    /// use pharmrank_core::NormalizationRange;
    ///
    /// let range = NormalizationRange::from_values([3.0, 1.0, 2.0]).expect("non-empty");
    /// assert_eq!((range.min, range.max), (1.0, 3.0));
    /// assert!(NormalizationRange::from_values(std::iter::empty()).is_none());
    /// ```
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        values
            .into_iter()
            .filter(|value| value.is_finite())
            .fold(None, |span: Option<Self>, value| {
                Some(span.map_or(
                    Self {
                        min: value,
                        max: value,
                    },
                    |current| Self {
                        min: current.min.min(value),
                        max: current.max.max(value),
                    },
                ))
            })
    }

    /// Validate the bounds and return a copy.
    ///
    /// # Errors
    /// Returns [`NormalizationError::InvalidRange`] when either bound is not
    /// finite or `min > max`.
    pub fn validate(self) -> Result<Self, NormalizationError> {
        if self.min.is_finite() && self.max.is_finite() && self.min <= self.max {
            Ok(self)
        } else {
            Err(NormalizationError::InvalidRange {
                min: self.min,
                max: self.max,
            })
        }
    }

    /// Report whether the range has no width.
    #[must_use]
    #[expect(
        clippy::float_cmp,
        reason = "a degenerate range is defined by exactly equal bounds"
    )]
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }
}

/// Min-max normalize `value` against `range`.
///
/// Returns `1.0` when the range is degenerate. Out-of-range values are not
/// clamped.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "min-max scaling divides the offset by the range width"
)]
pub fn min_max(value: f64, range: NormalizationRange, direction: Direction) -> f64 {
    if range.is_degenerate() {
        return 1.0;
    }
    let width = range.max - range.min;
    match direction {
        Direction::LowerIsBetter => (range.max - value) / width,
        Direction::HigherIsBetter => (value - range.min) / width,
    }
}

/// Normalize `value` against a fixed positive `bound`, clamped into
/// `0.0..=1.0`.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "fixed-bound scaling divides by the configured ceiling"
)]
pub fn fixed_bound(value: f64, bound: f64, direction: Direction) -> f64 {
    let ratio = (value / bound).min(1.0);
    let score = match direction {
        Direction::LowerIsBetter => 1.0 - ratio,
        Direction::HigherIsBetter => ratio,
    };
    score.max(0.0)
}

/// Exponential decay with constant `constant`.
///
/// Lower-is-better metrics score `exp(-v / k)`; higher-is-better metrics
/// score the complement `1 - exp(-v / k)`. Smaller constants decay faster
/// and so weigh small values more heavily.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "decay divides by the configured constant"
)]
pub fn exponential_decay(value: f64, constant: f64, direction: Direction) -> f64 {
    let decayed = (-value / constant).exp();
    match direction {
        Direction::LowerIsBetter => decayed,
        Direction::HigherIsBetter => 1.0 - decayed,
    }
}

/// A resolved normalization strategy ready to score raw values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalizer {
    /// Dataset-relative min-max scaling.
    MinMax(NormalizationRange),
    /// Scaling against a configured ceiling.
    FixedBound {
        /// Value at (or beyond) which the metric saturates.
        bound: f64,
    },
    /// Exponential decay.
    Decay {
        /// Decay constant `k`.
        constant: f64,
    },
}

impl Normalizer {
    /// Build a fixed-bound normalizer.
    ///
    /// # Errors
    /// Returns [`NormalizationError::InvalidBound`] unless `bound` is finite
    /// and positive.
    pub fn fixed_bound(bound: f64) -> Result<Self, NormalizationError> {
        Self::FixedBound { bound }.validate()
    }

    /// Build an exponential-decay normalizer.
    ///
    /// # Errors
    /// Returns [`NormalizationError::InvalidDecay`] unless `constant` is
    /// finite and positive.
    pub fn decay(constant: f64) -> Result<Self, NormalizationError> {
        Self::Decay { constant }.validate()
    }

    /// Validate the parameters and return a copy.
    ///
    /// # Errors
    /// Returns the [`NormalizationError`] matching the invalid parameter.
    pub fn validate(self) -> Result<Self, NormalizationError> {
        match self {
            Self::MinMax(range) => range.validate().map(Self::MinMax),
            Self::FixedBound { bound } if bound.is_finite() && bound > 0.0 => Ok(self),
            Self::FixedBound { bound } => Err(NormalizationError::InvalidBound { bound }),
            Self::Decay { constant } if constant.is_finite() && constant > 0.0 => Ok(self),
            Self::Decay { constant } => Err(NormalizationError::InvalidDecay { constant }),
        }
    }

    /// Score `value` according to the strategy.
    #[must_use]
    pub fn normalize(&self, value: f64, direction: Direction) -> f64 {
        match *self {
            Self::MinMax(range) => min_max(value, range, direction),
            Self::FixedBound { bound } => fixed_bound(value, bound, direction),
            Self::Decay { constant } => exponential_decay(value, constant, direction),
        }
    }
}
