//! Candidates: the supply points being scored for a query.
//!
//! [`CandidateInput`] mirrors the loosely typed request payload: every field
//! is optional and numeric fields may arrive as JSON numbers or numeric
//! strings. [`CandidateInput::to_candidate`] validates it into a strongly
//! typed [`Candidate`], and that conversion is where per-candidate failures
//! ([`CandidateError`]) arise.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::parse_expiry;

/// Input fields a candidate must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// The candidate identifier.
    Id,
    /// Distance to the supply point in kilometres.
    Distance,
    /// Price in currency units.
    Price,
    /// Units in stock.
    Stock,
    /// Expiry date of the stocked item.
    Expiry,
}

impl Metric {
    /// Name of the request field carrying the metric.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Distance => "distance_km",
            Self::Price => "price",
            Self::Stock => "stock",
            Self::Expiry => "expiry_date",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field())
    }
}

/// Reasons a single candidate cannot be scored.
///
/// These never abort a ranking batch; the candidate is reported as skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateError {
    /// A required field was absent, null or not numeric.
    #[error("missing or non-numeric {metric}")]
    MissingMetric {
        /// Field that could not be read.
        metric: Metric,
    },
    /// A numeric field was negative, non-finite or not an integer where
    /// one is required.
    #[error("invalid {metric} value {raw}")]
    InvalidMetric {
        /// Field holding the value.
        metric: Metric,
        /// Raw value as received.
        raw: String,
    },
    /// The expiry date could not be parsed.
    #[error("unparseable expiry date {raw}")]
    InvalidDate {
        /// Raw value as received.
        raw: String,
    },
    /// The identifier was already used earlier in the same request.
    #[error("duplicate candidate id {id}")]
    DuplicateId {
        /// Repeated identifier.
        id: String,
    },
}

/// A validated supply point.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use pharmrank_core::Candidate;
///
/// let expiry = NaiveDate::from_ymd_opt(2026, 6, 30).expect("valid date");
/// let candidate = Candidate::new("P001", 0.8, 25.0, 90, expiry).expect("valid candidate");
/// assert_eq!(candidate.id, "P001");
/// assert!(Candidate::new("P002", -1.0, 25.0, 90, expiry).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Identifier, unique within a ranking request.
    pub id: String,
    /// Distance in kilometres.
    pub distance_km: f64,
    /// Price in currency units.
    pub price: f64,
    /// Units in stock.
    pub stock: u32,
    /// Expiry date of the stocked item.
    #[serde(rename = "expiry_date")]
    pub expiry: NaiveDate,
}

impl Candidate {
    /// Validate and construct a candidate.
    ///
    /// # Errors
    /// Returns [`CandidateError::InvalidMetric`] when `distance_km` or
    /// `price` is negative or non-finite.
    pub fn new(
        id: impl Into<String>,
        distance_km: f64,
        price: f64,
        stock: u32,
        expiry: NaiveDate,
    ) -> Result<Self, CandidateError> {
        Ok(Self {
            id: id.into(),
            distance_km: non_negative(distance_km, Metric::Distance)?,
            price: non_negative(price, Metric::Price)?,
            stock,
            expiry,
        })
    }
}

fn non_negative(value: f64, metric: Metric) -> Result<f64, CandidateError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CandidateError::InvalidMetric {
            metric,
            raw: value.to_string(),
        })
    }
}

/// A candidate exactly as received from a caller.
///
/// Unknown fields (names, cities and so on) are ignored. `pharmacy_id` is
/// read when `id` is absent. Decoding never fails: a record that is not an
/// object decodes with every field absent, so a batch survives one bad
/// element.
///
/// # Examples
/// ```
/// use pharmrank_core::{CandidateError, CandidateInput, Metric};
///
/// let input: CandidateInput = serde_json::from_str(
///     r#"{"pharmacy_id": "P7", "distance_km": "2.5", "price": 30, "stock": 70,
///         "expiry_date": "2026-02-20T00:00:00.000Z", "city": "Pune"}"#,
/// )
/// .expect("valid json");
/// let candidate = input.to_candidate().expect("valid candidate");
/// assert_eq!(candidate.distance_km, 2.5);
///
/// let missing = CandidateInput { price: None, ..input };
/// assert_eq!(
///     missing.to_candidate(),
///     Err(CandidateError::MissingMetric { metric: Metric::Price })
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CandidateInput {
    /// Identifier; strings and integers are accepted.
    pub id: Option<Value>,
    /// Distance in kilometres.
    pub distance_km: Option<Value>,
    /// Price in currency units.
    pub price: Option<Value>,
    /// Units in stock.
    pub stock: Option<Value>,
    /// ISO-8601 date or date-time string.
    pub expiry_date: Option<Value>,
}

impl<'de> Deserialize<'de> for CandidateInput {
    /// Any JSON value decodes. Problems surface later from
    /// [`CandidateInput::to_candidate`], one candidate at a time.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from)
    }
}

impl From<Value> for CandidateInput {
    /// Read the known fields of a JSON object. `id` wins over
    /// `pharmacy_id` unless it is null. Values that are not objects yield an
    /// input with every field absent.
    fn from(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Self::default();
        };
        let mut take = |key: &str| fields.remove(key).filter(|field| !field.is_null());
        let id = take("id").or_else(|| take("pharmacy_id"));
        Self {
            id,
            distance_km: take("distance_km"),
            price: take("price"),
            stock: take("stock"),
            expiry_date: take("expiry_date"),
        }
    }
}

impl CandidateInput {
    /// Identifier as a string, if one was supplied.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_owned()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    /// Validate the payload into a [`Candidate`].
    ///
    /// # Errors
    /// Returns [`CandidateError::MissingMetric`] for absent or non-numeric
    /// fields, [`CandidateError::InvalidMetric`] for negative, non-finite or
    /// fractional stock values, and [`CandidateError::InvalidDate`] when the
    /// expiry cannot be parsed.
    pub fn to_candidate(&self) -> Result<Candidate, CandidateError> {
        let id = self
            .id()
            .ok_or(CandidateError::MissingMetric { metric: Metric::Id })?;
        let distance_km = real(self.distance_km.as_ref(), Metric::Distance)?;
        let price = real(self.price.as_ref(), Metric::Price)?;
        let stock = units(self.stock.as_ref())?;
        let expiry = expiry(self.expiry_date.as_ref())?;
        Candidate::new(id, distance_km, price, stock, expiry)
    }
}

impl From<&Candidate> for CandidateInput {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: Some(Value::String(candidate.id.clone())),
            distance_km: Some(Value::from(candidate.distance_km)),
            price: Some(Value::from(candidate.price)),
            stock: Some(Value::from(candidate.stock)),
            expiry_date: Some(Value::String(candidate.expiry.to_string())),
        }
    }
}

fn real(value: Option<&Value>, metric: Metric) -> Result<f64, CandidateError> {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or(CandidateError::MissingMetric { metric })
}

fn units(value: Option<&Value>) -> Result<u32, CandidateError> {
    let metric = Metric::Stock;
    let count = real(value, metric)?;
    whole_units(count).ok_or_else(|| CandidateError::InvalidMetric {
        metric,
        raw: value.map_or_else(String::new, Value::to_string),
    })
}

/// `Some` only for a finite, non-negative whole number that fits in `u32`.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "range and fraction are checked before the cast"
)]
fn whole_units(count: f64) -> Option<u32> {
    let whole = count.is_finite()
        && count >= 0.0
        && count <= f64::from(u32::MAX)
        && count.fract() == 0.0;
    whole.then_some(count as u32)
}

fn expiry(value: Option<&Value>) -> Result<NaiveDate, CandidateError> {
    match value {
        None | Some(Value::Null) => Err(CandidateError::MissingMetric {
            metric: Metric::Expiry,
        }),
        Some(Value::String(text)) => {
            parse_expiry(text).ok_or_else(|| CandidateError::InvalidDate { raw: text.clone() })
        }
        Some(other) => Err(CandidateError::InvalidDate {
            raw: other.to_string(),
        }),
    }
}
