//! Candidate builders shared by unit, behaviour and property tests.

use chrono::{Days, NaiveDate};

use crate::{Candidate, CandidateInput};

/// Fixed evaluation date so expiry arithmetic is reproducible.
///
/// # Panics
/// Never in practice; the date is a compile-time constant.
#[must_use]
#[expect(clippy::expect_used, reason = "the literal date is always valid")]
pub fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid reference date")
}

/// Builder for [`Candidate`] values with sensible defaults.
///
/// Defaults: 1 km away, priced at 50, 100 units in stock, expiring one
/// year after [`reference_date`].
#[derive(Debug, Clone)]
pub struct CandidateBuilder {
    candidate: Candidate,
}

impl CandidateBuilder {
    /// Start a builder for `id`.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            candidate: Candidate {
                id: id.to_owned(),
                distance_km: 1.0,
                price: 50.0,
                stock: 100,
                expiry: offset_date(365),
            },
        }
    }

    /// Set the distance in kilometres.
    #[must_use]
    pub fn distance(mut self, distance_km: f64) -> Self {
        self.candidate.distance_km = distance_km;
        self
    }

    /// Set the price.
    #[must_use]
    pub fn price(mut self, price: f64) -> Self {
        self.candidate.price = price;
        self
    }

    /// Set the stock count.
    #[must_use]
    pub fn stock(mut self, stock: u32) -> Self {
        self.candidate.stock = stock;
        self
    }

    /// Expire `days` after [`reference_date`]; negative values are in the
    /// past.
    #[must_use]
    pub fn expires_in(mut self, days: i64) -> Self {
        self.candidate.expiry = offset_date(days);
        self
    }

    /// Finish as a typed candidate.
    #[must_use]
    pub fn build(self) -> Candidate {
        self.candidate
    }

    /// Finish as a request payload.
    #[must_use]
    pub fn input(self) -> CandidateInput {
        CandidateInput::from(&self.candidate)
    }
}

/// Date `days` after (or before, when negative) [`reference_date`].
///
/// # Panics
/// Panics when the offset leaves chrono's supported date range.
#[must_use]
#[expect(clippy::expect_used, reason = "test helper offsets stay in range")]
pub fn offset_date(days: i64) -> NaiveDate {
    let base = reference_date();
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        base.checked_add_days(magnitude)
    } else {
        base.checked_sub_days(magnitude)
    }
    .expect("offset date within range")
}
