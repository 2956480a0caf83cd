//! Facade crate for the pharmrank candidate ranking engine.
//!
//! This crate re-exports the core domain types, the scoring engine, model
//! persistence and the ranker so callers can depend on a single crate.
//! Enable the `test-support` feature for the candidate builders used in
//! tests.

#![forbid(unsafe_code)]

pub use pharmrank_core::{
    AvailabilityCombiner, AvailabilityError, AvailabilityWeights, Candidate, CandidateError,
    CandidateInput, Component, ComponentScores, DEFAULT_EXPIRY_WINDOW_DAYS, Direction, Metric,
    NormalizationError, NormalizationRange, Normalizer, Rating, ScoreBreakdown, ScoredCandidate,
    Scorer, WeightProfile, WeightsError, days_until, parse_expiry,
};

pub use pharmrank_scorer::{
    ArtefactError, FeatureRanges, ModelConfig, ModelError, ModelPreset, NormalizationStrategy,
    Ranker, Ranking, RankingModel, ScoringEngine, SkippedCandidate, UnknownPreset, load, rank,
    save, score,
};

#[cfg(feature = "test-support")]
pub use pharmrank_core::test_support;
