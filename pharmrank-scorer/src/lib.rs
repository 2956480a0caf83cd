//! Scoring, model persistence and ranking for pharmrank.
//!
//! The crate turns the pure building blocks of `pharmrank-core` into a
//! working ranking pipeline:
//! - **Models.** [`RankingModel::fit`] freezes normalization ranges observed
//!   in a reference population together with a
//!   [`WeightProfile`](pharmrank_core::WeightProfile) and a [`ModelConfig`].
//!   [`RankingModel::new`] builds one explicitly, for example from fixed
//!   bounds.
//! - **Artefacts.** [`save`] writes a versioned `bincode` artefact
//!   atomically; [`load`] dispatches on its schema tag and rejects unknown
//!   or unsupported shapes with [`ArtefactError::IncompatibleSchema`].
//! - **Ranking.** [`Ranker`] scores a batch through any
//!   [`Scorer`](pharmrank_core::Scorer), orders it best first with stable
//!   tie-breaking, and reports invalid candidates separately.
//!
//! # Examples
//!
//! ```no_run
//! use camino::Utf8Path;
//! use chrono::NaiveDate;
//! use pharmrank_core::CandidateInput;
//! use pharmrank_scorer::{Ranker, load};
//!
//! let model = load(Utf8Path::new("artefacts/model.bin")).expect("load model");
//! let batch: Vec<CandidateInput> = Vec::new();
//! let today = NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date");
//! let ranking = Ranker::new(&model, today).with_limit(10).rank(&batch);
//! assert!(ranking.ranked.len() <= 10);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod artefact;
mod engine;
mod error;
mod model;
mod ranker;

pub use artefact::{
    ARTEFACT_MAGIC, SCHEMA_CURRENT, SCHEMA_FEATURE_RANGES, SCHEMA_FIXED_BOUNDS, SCHEMA_REGRESSOR,
    from_bytes, load, save, to_bytes,
};
pub use engine::{ScoringEngine, score};
pub use error::{ArtefactError, ModelError, UnknownPreset};
pub use model::{FeatureRanges, ModelConfig, ModelPreset, NormalizationStrategy, RankingModel};
pub use ranker::{Ranker, Ranking, SkippedCandidate, rank};

/// Bincode options shared by every artefact reader and writer.
///
/// Trailing bytes are rejected so a payload of another shape cannot decode
/// by accident.
pub(crate) fn bincode_options() -> impl bincode::Options {
    bincode::DefaultOptions::new()
}
