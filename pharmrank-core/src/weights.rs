//! Weight profiles: the relative importance of each score component.
//!
//! Weights are finite, non-negative and sum to `1.0` (within
//! [`WEIGHT_SUM_TOLERANCE`]). Keeping the sum fixed means every weighted
//! total of `0.0..=1.0` component scores stays inside `0.0..=1.0`.
//!
//! # Examples
//! ```
//! use pharmrank_core::{Component, WeightProfile};
//!
//! let weights = WeightProfile::default();
//! assert_eq!(weights.weight(Component::Distance), 0.5);
//! assert_eq!(
//!     weights.priority_order(),
//!     [Component::Distance, Component::Price, Component::Availability]
//! );
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Allowed deviation of a weight sum from `1.0`.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Components combined into the final ranking score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    /// Distance to the supply point; lower is better.
    Distance,
    /// Price of the item; lower is better.
    Price,
    /// Combined stock and freshness signal; higher is better.
    Availability,
}

impl Component {
    /// Every component in declaration order.
    pub const ALL: [Self; 3] = [Self::Distance, Self::Price, Self::Availability];

    /// Return the component as a lowercase `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Distance => "distance",
            Self::Price => "price",
            Self::Availability => "availability",
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised when a set of weights breaks the unit-sum convention.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightsError {
    /// A weight was negative, NaN or infinite.
    #[error("{component} weight {value} must be finite and non-negative")]
    InvalidWeight {
        /// Name of the offending weight.
        component: &'static str,
        /// Value that was supplied.
        value: f64,
    },
    /// The weights did not sum to `1.0`.
    #[error("weights must sum to 1.0 within 1e-6 (got {sum})")]
    InvalidSum {
        /// Observed sum of the weights.
        sum: f64,
    },
}

/// Check that named weights are finite, non-negative and sum to one.
#[expect(
    clippy::float_arithmetic,
    reason = "validation sums weights and measures the deviation from one"
)]
pub(crate) fn validate_unit_sum(weights: &[(&'static str, f64)]) -> Result<(), WeightsError> {
    for &(component, value) in weights {
        if !value.is_finite() || value < 0.0 {
            return Err(WeightsError::InvalidWeight { component, value });
        }
    }
    let sum: f64 = weights.iter().map(|&(_, value)| value).sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(WeightsError::InvalidSum { sum });
    }
    Ok(())
}

/// Relative importance of distance, price and availability.
///
/// By convention `distance >= price >= availability` expresses the intended
/// priority. The ordering is advisory: [`WeightProfile::validate`] only
/// enforces the unit-sum rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightProfile {
    /// Weight of the distance component.
    pub distance: f64,
    /// Weight of the price component.
    pub price: f64,
    /// Weight of the availability component.
    pub availability: f64,
}

impl WeightProfile {
    /// Build and validate a profile.
    ///
    /// # Errors
    /// Returns [`WeightsError`] when a weight is negative or non-finite, or
    /// when the weights do not sum to `1.0`.
    ///
    /// # Examples
    /// ```
    /// use pharmrank_core::{WeightProfile, WeightsError};
    ///
    /// assert!(WeightProfile::new(0.6, 0.3, 0.1).is_ok());
    /// assert!(matches!(
    ///     WeightProfile::new(0.6, 0.6, 0.1),
    ///     Err(WeightsError::InvalidSum { .. })
    /// ));
    /// ```
    pub fn new(distance: f64, price: f64, availability: f64) -> Result<Self, WeightsError> {
        Self {
            distance,
            price,
            availability,
        }
        .validate()
    }

    /// Weights used by the dataset-relative ranking model
    /// (60% distance, 28% price, 12% stock-driven availability).
    #[must_use]
    pub const fn relative_ranking() -> Self {
        Self {
            distance: 0.60,
            price: 0.28,
            availability: 0.12,
        }
    }

    /// Validate the weights and return a copy.
    ///
    /// # Errors
    /// Returns [`WeightsError::InvalidWeight`] for negative or non-finite
    /// values and [`WeightsError::InvalidSum`] when the sum deviates from
    /// `1.0` by more than [`WEIGHT_SUM_TOLERANCE`].
    pub fn validate(self) -> Result<Self, WeightsError> {
        validate_unit_sum(&[
            (Component::Distance.as_str(), self.distance),
            (Component::Price.as_str(), self.price),
            (Component::Availability.as_str(), self.availability),
        ])?;
        Ok(self)
    }

    /// Return the weight attached to `component`.
    #[must_use]
    pub const fn weight(&self, component: Component) -> f64 {
        match component {
            Component::Distance => self.distance,
            Component::Price => self.price,
            Component::Availability => self.availability,
        }
    }

    /// Components ordered from most to least important.
    ///
    /// Equal weights keep declaration order (distance, price,
    /// availability).
    #[must_use]
    pub fn priority_order(&self) -> [Component; 3] {
        let mut order = Component::ALL;
        order.sort_by(|a, b| self.weight(*b).total_cmp(&self.weight(*a)));
        order
    }

    /// Report whether the profile follows the advisory
    /// `distance >= price >= availability` convention.
    #[must_use]
    pub fn follows_priority_convention(&self) -> bool {
        self.distance >= self.price && self.price >= self.availability
    }
}

impl Default for WeightProfile {
    fn default() -> Self {
        Self {
            distance: 0.5,
            price: 0.3,
            availability: 0.2,
        }
    }
}
