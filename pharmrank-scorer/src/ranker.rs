//! Rank a batch of candidates by score.
#![forbid(unsafe_code)]

use std::collections::HashSet;

use chrono::NaiveDate;
use log::{debug, warn};
use pharmrank_core::{CandidateError, CandidateInput, Metric, ScoredCandidate, Scorer};

use crate::score;

/// A candidate that could not be ranked, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCandidate {
    /// Position in the request.
    pub index: usize,
    /// Identifier, when one could be read.
    pub id: Option<String>,
    /// Why the candidate was skipped.
    pub reason: CandidateError,
}

/// Outcome of ranking one batch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ranking {
    /// Scored candidates, best first.
    pub ranked: Vec<ScoredCandidate>,
    /// Candidates that failed validation, in request order.
    pub skipped: Vec<SkippedCandidate>,
}

/// Scores and orders candidate batches against one scorer.
///
/// Every candidate is scored independently. Results are sorted by score,
/// highest first, with ties kept in request order. Candidates that fail
/// validation, and repeats of an identifier already ranked earlier in the
/// request, are reported in [`Ranking::skipped`] and never abort the batch.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use pharmrank_core::CandidateInput;
/// use pharmrank_scorer::{Ranker, ScoringEngine};
///
/// let inputs: Vec<CandidateInput> = serde_json::from_str(
///     r#"[
///         {"id": "P002", "distance_km": 8.0, "price": 20, "stock": 100, "expiry_date": "2027-12-31"},
///         {"id": "P001", "distance_km": 0.8, "price": 25, "stock": 90, "expiry_date": "2026-12-31"},
///         {"id": "P003", "distance_km": 1.0, "price": 25, "stock": 90, "expiry_date": "31/12/2026"}
///     ]"#,
/// )
/// .expect("valid json");
/// let engine = ScoringEngine::default();
/// let today = NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date");
/// let ranking = Ranker::new(&engine, today).rank(&inputs);
/// assert_eq!(ranking.ranked[0].candidate.id, "P001");
/// assert_eq!(ranking.skipped.len(), 1);
/// ```
#[derive(Debug)]
pub struct Ranker<'s, S: ?Sized> {
    scorer: &'s S,
    as_of: NaiveDate,
    limit: Option<usize>,
}

impl<'s, S> Ranker<'s, S>
where
    S: Scorer + ?Sized,
{
    /// Rank against `scorer` as of `as_of`.
    #[must_use]
    pub const fn new(scorer: &'s S, as_of: NaiveDate) -> Self {
        Self {
            scorer,
            as_of,
            limit: None,
        }
    }

    /// Keep only the best `limit` candidates. Skipped candidates are always
    /// reported in full.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Score and order `inputs`.
    #[must_use]
    pub fn rank(&self, inputs: &[CandidateInput]) -> Ranking {
        let mut seen = HashSet::new();
        let mut ranking = Ranking::default();

        for (index, input) in inputs.iter().enumerate() {
            let id = input.id();
            match self.evaluate(input, id.as_deref(), &mut seen) {
                Ok(scored) => ranking.ranked.push(scored),
                Err(reason) => {
                    warn!(
                        "skipping candidate {index} ({}): {reason}",
                        id.as_deref().unwrap_or("<no id>")
                    );
                    ranking.skipped.push(SkippedCandidate { index, id, reason });
                }
            }
        }

        ranking
            .ranked
            .sort_by(|left, right| right.score().total_cmp(&left.score()));
        if let Some(limit) = self.limit {
            ranking.ranked.truncate(limit);
        }
        debug!(
            "ranked {} of {} candidates, skipped {}",
            ranking.ranked.len(),
            inputs.len(),
            ranking.skipped.len()
        );
        ranking
    }

    fn evaluate(
        &self,
        input: &CandidateInput,
        id: Option<&str>,
        seen: &mut HashSet<String>,
    ) -> Result<ScoredCandidate, CandidateError> {
        let key = id.ok_or(CandidateError::MissingMetric { metric: Metric::Id })?;
        if seen.contains(key) {
            return Err(CandidateError::DuplicateId {
                id: key.to_owned(),
            });
        }
        // An id is claimed only by a candidate that scored.
        let scored = score(input, self.scorer, self.as_of)?;
        seen.insert(key.to_owned());
        Ok(scored)
    }
}

/// Rank `inputs` against `scorer` as of `as_of`.
///
/// Shorthand for [`Ranker::new`] followed by [`Ranker::rank`].
#[must_use]
pub fn rank<S>(inputs: &[CandidateInput], scorer: &S, as_of: NaiveDate) -> Ranking
where
    S: Scorer + ?Sized,
{
    Ranker::new(scorer, as_of).rank(inputs)
}
