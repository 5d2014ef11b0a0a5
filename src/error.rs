//! Error taxonomy for the engine (spec §7).
//!
//! Constructors and codecs return `Err`; derivation operations return
//! `Ok(None)` for "the result is empty" and `Err` only for ill-typed
//! inputs. See `TemporalError` variants for the full kind list.

use thiserror::Error;

use crate::catalog::TypeTag;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TemporalError {
    #[error("invalid type: tag {0:?} does not satisfy this operation's precondition")]
    InvalidType(TypeTag),

    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("mixed base types: {0:?} vs {1:?}")]
    MixedBaseType(TypeTag, TypeTag),

    #[error("mixed interpolation: {0} incompatible with {1} without explicit conversion")]
    MixedInterpolation(String, String),

    #[error("mixed geodetic flags between spatial arguments")]
    MixedGeodetic,

    #[error("mixed SRID: {0} vs {1}")]
    MixedSRID(i32, i32),

    #[error("mixed dimensionality between spatial arguments")]
    MixedDimensionality,

    #[error("operation requires continuous (Linear) interpolation, found {0}")]
    NotContinuous(String),

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("malformed WKB at byte offset {offset}: {message}")]
    BadWkb { offset: usize, message: String },

    #[error("malformed hex-encoded WKB at byte offset {offset}: {message}")]
    BadHexWkb { offset: usize, message: String },

    #[error("malformed MF-JSON: {0}")]
    BadMfJson(String),

    #[error("malformed text representation: {0}")]
    BadText(String),

    #[error("unsupported type combination: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, TemporalError>;
