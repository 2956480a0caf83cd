//! Versioned model artefacts.
//!
//! An artefact is a `bincode` envelope holding a magic marker, a schema tag
//! and the schema-specific payload. The loader dispatches on the tag and
//! decodes the payload strictly, so an artefact written for another shape
//! is reported as incompatible instead of being misread field by field.
//!
//! | Tag   | Payload                                                     |
//! |-------|-------------------------------------------------------------|
//! | `1`   | weights `{distance, price, availability}` and fixed maxima  |
//! | `2`   | weights `{distance, price, stock}` and observed ranges      |
//! | `3`   | weight profile, [`ModelConfig`] and optional ranges         |
//! | `100` | scaler and fitted regressor; recognised but unsupported     |
#![forbid(unsafe_code)]

use bincode::Options;
use camino::Utf8Path;
use log::info;
use pharmrank_core::{
    AvailabilityWeights, DEFAULT_EXPIRY_WINDOW_DAYS, NormalizationRange, WeightProfile,
};
use pharmrank_fs::{ensure_parent_dir, read_bytes, write_atomic};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    ArtefactError, FeatureRanges, ModelConfig, ModelError, NormalizationStrategy, RankingModel,
    bincode_options,
};

/// Marker opening every artefact.
pub const ARTEFACT_MAGIC: [u8; 4] = *b"PHRK";

/// Weights plus fixed maxima.
pub const SCHEMA_FIXED_BOUNDS: u16 = 1;

/// Weights keyed by stock plus observed min/max ranges.
pub const SCHEMA_FEATURE_RANGES: u16 = 2;

/// Weight profile, model configuration and observed ranges.
pub const SCHEMA_CURRENT: u16 = 3;

/// Scaler plus fitted regressor.
pub const SCHEMA_REGRESSOR: u16 = 100;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Envelope {
    pub(crate) magic: [u8; 4],
    pub(crate) schema: u16,
    pub(crate) payload: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CurrentRecord {
    pub(crate) weights: WeightProfile,
    pub(crate) config: ModelConfig,
    pub(crate) ranges: Option<FeatureRanges>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub(crate) struct LegacyWeights {
    pub(crate) distance: f64,
    pub(crate) price: f64,
    pub(crate) availability: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub(crate) struct LegacyMaxValues {
    pub(crate) distance: f64,
    pub(crate) price: f64,
    pub(crate) stock: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct FixedBoundsRecord {
    pub(crate) weights: LegacyWeights,
    pub(crate) max_values: LegacyMaxValues,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub(crate) struct LegacyStockWeights {
    pub(crate) distance: f64,
    pub(crate) price: f64,
    pub(crate) stock: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub(crate) struct LegacyRange {
    pub(crate) min: f64,
    pub(crate) max: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub(crate) struct LegacyRanges {
    pub(crate) distance: LegacyRange,
    pub(crate) price: LegacyRange,
    pub(crate) stock: LegacyRange,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct FeatureRangesRecord {
    pub(crate) weights: LegacyStockWeights,
    pub(crate) feature_ranges: LegacyRanges,
}

impl FixedBoundsRecord {
    fn into_model(self) -> Result<RankingModel, ModelError> {
        let weights = WeightProfile {
            distance: self.weights.distance,
            price: self.weights.price,
            availability: self.weights.availability,
        };
        let config = ModelConfig {
            distance: NormalizationStrategy::FixedBound {
                bound: self.max_values.distance,
            },
            price: NormalizationStrategy::FixedBound {
                bound: self.max_values.price,
            },
            stock: NormalizationStrategy::FixedBound {
                bound: self.max_values.stock,
            },
            expiry_window_days: DEFAULT_EXPIRY_WINDOW_DAYS,
            availability_weights: AvailabilityWeights {
                stock: 0.7,
                expiry: 0.3,
            },
        };
        RankingModel::with_schema(weights, config, None, SCHEMA_FIXED_BOUNDS)
    }
}

impl FeatureRangesRecord {
    fn into_model(self) -> Result<RankingModel, ModelError> {
        let weights = WeightProfile {
            distance: self.weights.distance,
            price: self.weights.price,
            availability: self.weights.stock,
        };
        let config = ModelConfig {
            distance: NormalizationStrategy::MinMax,
            price: NormalizationStrategy::MinMax,
            stock: NormalizationStrategy::MinMax,
            expiry_window_days: DEFAULT_EXPIRY_WINDOW_DAYS,
            availability_weights: AvailabilityWeights::stock_only(),
        };
        let legacy = self.feature_ranges;
        let ranges = FeatureRanges {
            distance: range(legacy.distance),
            price: range(legacy.price),
            stock: range(legacy.stock),
        };
        RankingModel::with_schema(weights, config, Some(ranges), SCHEMA_FEATURE_RANGES)
    }
}

const fn range(legacy: LegacyRange) -> NormalizationRange {
    NormalizationRange {
        min: legacy.min,
        max: legacy.max,
    }
}

/// Encode `model` as a current-schema artefact.
///
/// # Errors
/// Returns the `bincode` error raised while encoding.
pub fn to_bytes(model: &RankingModel) -> Result<Vec<u8>, bincode::Error> {
    let record = CurrentRecord {
        weights: model.weights(),
        config: model.config(),
        ranges: model.ranges(),
    };
    seal(SCHEMA_CURRENT, &record)
}

pub(crate) fn seal<T: Serialize>(schema: u16, record: &T) -> Result<Vec<u8>, bincode::Error> {
    let envelope = Envelope {
        magic: ARTEFACT_MAGIC,
        schema,
        payload: bincode_options().serialize(record)?,
    };
    bincode_options().serialize(&envelope)
}

/// Decode an artefact read from `path`.
///
/// `path` is only used to label errors.
///
/// # Errors
/// Returns [`ArtefactError::IncompatibleSchema`] for foreign, unknown or
/// malformed artefacts and [`ArtefactError::InvalidModel`] when the payload
/// describes a model that fails validation.
pub fn from_bytes(bytes: &[u8], path: &Utf8Path) -> Result<RankingModel, ArtefactError> {
    let incompatible = |reason: String| ArtefactError::IncompatibleSchema {
        path: path.to_path_buf(),
        reason,
    };
    let envelope: Envelope = bincode_options()
        .deserialize(bytes)
        .map_err(|err| incompatible(format!("undecodable envelope: {err}")))?;
    if envelope.magic != ARTEFACT_MAGIC {
        return Err(incompatible(format!("unexpected magic {:?}", envelope.magic)));
    }

    let model = match envelope.schema {
        SCHEMA_FIXED_BOUNDS => payload::<FixedBoundsRecord>(&envelope, path)?.into_model(),
        SCHEMA_FEATURE_RANGES => payload::<FeatureRangesRecord>(&envelope, path)?.into_model(),
        SCHEMA_CURRENT => {
            let record = payload::<CurrentRecord>(&envelope, path)?;
            RankingModel::new(record.weights, record.config, record.ranges)
        }
        SCHEMA_REGRESSOR => {
            return Err(incompatible(format!(
                "schema {SCHEMA_REGRESSOR} holds a fitted regressor, which is not a supported scoring backend"
            )));
        }
        unknown => return Err(incompatible(format!("unknown schema tag {unknown}"))),
    };
    model.map_err(|source| ArtefactError::InvalidModel {
        path: path.to_path_buf(),
        source,
    })
}

fn payload<T>(envelope: &Envelope, path: &Utf8Path) -> Result<T, ArtefactError>
where
    T: DeserializeOwned,
{
    bincode_options()
        .deserialize(&envelope.payload)
        .map_err(|err| ArtefactError::IncompatibleSchema {
            path: path.to_path_buf(),
            reason: format!("payload does not match schema {}: {err}", envelope.schema),
        })
}

/// Persist `model` to `path`, creating missing parent directories.
///
/// The artefact is written to a staging file and renamed into place, so a
/// failed save never leaves a partial artefact and never disturbs an
/// existing one.
///
/// # Errors
/// Returns [`ArtefactError`] when encoding, directory creation or the
/// write fails.
pub fn save(model: &RankingModel, path: &Utf8Path) -> Result<(), ArtefactError> {
    let bytes = to_bytes(model).map_err(|source| ArtefactError::Serialise {
        path: path.to_path_buf(),
        source,
    })?;
    ensure_parent_dir(path).map_err(|source| ArtefactError::CreateParent {
        path: path
            .parent()
            .map_or_else(|| Utf8Path::new(".").to_path_buf(), Utf8Path::to_path_buf),
        source,
    })?;
    write_atomic(path, &bytes).map_err(|source| ArtefactError::WriteFile {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        "saved ranking model (schema {SCHEMA_CURRENT}, {} bytes) to {path}",
        bytes.len()
    );
    Ok(())
}

/// Load a model artefact from `path`.
///
/// # Errors
/// Returns [`ArtefactError::ReadFile`] when the file cannot be read and
/// the errors of [`from_bytes`] otherwise.
pub fn load(path: &Utf8Path) -> Result<RankingModel, ArtefactError> {
    let bytes = read_bytes(path).map_err(|source| ArtefactError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let model = from_bytes(&bytes, path)?;
    info!(
        "loaded ranking model from {path} (schema {})",
        model.schema_version()
    );
    Ok(model)
}
