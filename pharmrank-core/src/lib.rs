//! Core domain types for the pharmrank engine.
//!
//! The crate holds the pure leaves of the ranking pipeline: validated
//! [`Candidate`]s and their loosely typed [`CandidateInput`] form, the
//! [`Normalizer`] strategies mapping raw metrics onto `0.0..=1.0`, the
//! [`AvailabilityCombiner`] merging stock and freshness, the
//! [`WeightProfile`] expressing priorities, and the [`Scorer`] trait that
//! scoring backends implement. Nothing here performs I/O or holds state.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod availability;
mod candidate;
mod expiry;
mod normalize;
mod scorer;
mod weights;

pub use availability::{
    AvailabilityCombiner, AvailabilityError, AvailabilityWeights, DEFAULT_EXPIRY_WINDOW_DAYS,
    DEFAULT_STOCK_BOUND,
};
pub use candidate::{Candidate, CandidateError, CandidateInput, Metric};
pub use expiry::{days_until, parse_expiry};
pub use normalize::{
    Direction, NormalizationError, NormalizationRange, Normalizer, exponential_decay, fixed_bound,
    min_max,
};
pub use scorer::{ComponentScores, Rating, ScoreBreakdown, ScoredCandidate, Scorer, sanitise};
pub use weights::{Component, WEIGHT_SUM_TOLERANCE, WeightProfile, WeightsError};

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;
