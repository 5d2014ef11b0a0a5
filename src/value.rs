//! `BaseValue`: the closed sum type recommended by spec §9's design notes
//! for "the scalar value type... over which higher-level types are
//! parameterized" (GLOSSARY). Spans, sets, span-sets, and temporal
//! instants all hold `BaseValue`s rather than being generic over a type
//! parameter, matching the source's tag-driven dispatch (`meos_catalog.h`).

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::TypeTag;
use crate::error::{Result, TemporalError};

pub const EPSILON: f64 = 1.0e-6;

/// An opaque geometry/geography payload (spec §1 OUT OF SCOPE): the engine
/// never parses or computes over the coordinates, it only carries the WKB
/// bytes plus whatever bounding information the host geometry library
/// chooses to hand back at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryValue {
    pub srid: i32,
    pub geodetic: bool,
    /// Raw WKB bytes for the point/geometry, as produced by the host library.
    pub wkb: Vec<u8>,
    pub bbox: GeomBbox,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeomBbox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub zmin: Option<f64>,
    pub zmax: Option<f64>,
}

/// Internal running-aggregate accumulators (spec §3): `(count, sum...)`
/// pairs/triples/quads used by `tnumber_twavg` (SPEC_FULL §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Double2(pub f64, pub f64);
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Double3(pub f64, pub f64, pub f64);
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Double4(pub f64, pub f64, pub f64, pub f64);

impl Double2 {
    /// Identity element for running-sum accumulation.
    pub fn zero() -> Double2 {
        Double2(0.0, 0.0)
    }

    /// Componentwise running-sum accumulation (`double2_add` in the
    /// catalog): `.0` carries the weighted value sum, `.1` the weight sum.
    pub fn add(self, other: Double2) -> Double2 {
        Double2(self.0 + other.0, self.1 + other.1)
    }

    /// The accumulated weighted average, `self.0 / self.1`.
    pub fn finalize(self) -> f64 {
        self.0 / self.1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BaseValue {
    Bool(bool),
    Int4(i32),
    Int8(i64),
    Float8(f64),
    Text(String),
    Date(NaiveDate),
    TimestampTz(DateTime<Utc>),
    Geometry(GeometryValue),
    Geography(GeometryValue),
    Double2(Double2),
    Double3(Double3),
    Double4(Double4),
}

impl BaseValue {
    pub fn tag(&self) -> TypeTag {
        match self {
            BaseValue::Bool(_) => TypeTag::Bool,
            BaseValue::Int4(_) => TypeTag::Int4,
            BaseValue::Int8(_) => TypeTag::Int8,
            BaseValue::Float8(_) => TypeTag::Float8,
            BaseValue::Text(_) => TypeTag::Text,
            BaseValue::Date(_) => TypeTag::Date,
            BaseValue::TimestampTz(_) => TypeTag::TimestampTz,
            BaseValue::Geometry(_) => TypeTag::Geometry,
            BaseValue::Geography(_) => TypeTag::Geography,
            BaseValue::Double2(_) => TypeTag::Double2,
            BaseValue::Double3(_) => TypeTag::Double3,
            BaseValue::Double4(_) => TypeTag::Double4,
        }
    }

    /// Total order used by span bounds, ordered sets, and B-tree-style
    /// comparisons. Float8 equality uses the engine-wide epsilon tolerance
    /// (spec §9 "Epsilon comparison") so that `Ordering::Equal` agrees with
    /// `fp_eq`.
    pub fn compare(&self, other: &BaseValue) -> Result<Ordering> {
        match (self, other) {
            (BaseValue::Bool(a), BaseValue::Bool(b)) => Ok(a.cmp(b)),
            (BaseValue::Int4(a), BaseValue::Int4(b)) => Ok(a.cmp(b)),
            (BaseValue::Int8(a), BaseValue::Int8(b)) => Ok(a.cmp(b)),
            (BaseValue::Float8(a), BaseValue::Float8(b)) => Ok(fp_cmp(*a, *b)),
            (BaseValue::Text(a), BaseValue::Text(b)) => Ok(a.cmp(b)),
            (BaseValue::Date(a), BaseValue::Date(b)) => Ok(a.cmp(b)),
            (BaseValue::TimestampTz(a), BaseValue::TimestampTz(b)) => Ok(a.cmp(b)),
            _ => Err(TemporalError::MixedBaseType(self.tag(), other.tag())),
        }
    }

    pub fn equal(&self, other: &BaseValue) -> Result<bool> {
        Ok(self.compare(other)? == Ordering::Equal)
    }

    /// `dist_double_value_value` (spec §4.2 Distance): the gap size in
    /// base-type units between two *non-overlapping* values, expressed as an
    /// `f64` (microseconds for `TimestampTz`, days for `Date`).
    pub fn numeric_distance(&self, other: &BaseValue) -> Result<f64> {
        match (self, other) {
            (BaseValue::Int4(a), BaseValue::Int4(b)) => Ok((*a as f64 - *b as f64).abs()),
            (BaseValue::Int8(a), BaseValue::Int8(b)) => Ok((*a as f64 - *b as f64).abs()),
            (BaseValue::Float8(a), BaseValue::Float8(b)) => Ok((a - b).abs()),
            (BaseValue::Date(a), BaseValue::Date(b)) => {
                Ok((a.signed_duration_since(*b)).num_days().unsigned_abs() as f64)
            }
            (BaseValue::TimestampTz(a), BaseValue::TimestampTz(b)) => {
                Ok((a.signed_duration_since(*b)).num_microseconds().unwrap_or(i64::MAX).unsigned_abs() as f64)
            }
            _ => Err(TemporalError::MixedBaseType(self.tag(), other.tag())),
        }
    }

    /// Add the canonical unit step (used only for `Int4`/`Int8`/`Date`);
    /// converts an exclusive bound to inclusive on span normalization
    /// (spec §3 invariant iii).
    pub fn incr(&self) -> Result<BaseValue> {
        match self {
            BaseValue::Int4(v) => v
                .checked_add(1)
                .map(BaseValue::Int4)
                .ok_or_else(|| TemporalError::OutOfRange("int4 overflow on span normalization".into())),
            BaseValue::Int8(v) => v
                .checked_add(1)
                .map(BaseValue::Int8)
                .ok_or_else(|| TemporalError::OutOfRange("int8 overflow on span normalization".into())),
            BaseValue::Date(d) => Ok(BaseValue::Date(*d + chrono::Duration::days(1))),
            other => Err(TemporalError::InvalidType(other.tag())),
        }
    }

    /// Subtract the canonical unit step.
    pub fn decr(&self) -> Result<BaseValue> {
        match self {
            BaseValue::Int4(v) => v
                .checked_sub(1)
                .map(BaseValue::Int4)
                .ok_or_else(|| TemporalError::OutOfRange("int4 underflow on span normalization".into())),
            BaseValue::Int8(v) => v
                .checked_sub(1)
                .map(BaseValue::Int8)
                .ok_or_else(|| TemporalError::OutOfRange("int8 underflow on span normalization".into())),
            BaseValue::Date(d) => Ok(BaseValue::Date(*d - chrono::Duration::days(1))),
            other => Err(TemporalError::InvalidType(other.tag())),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            BaseValue::Int4(v) => Some(*v as f64),
            BaseValue::Int8(v) => Some(*v as f64),
            BaseValue::Float8(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            BaseValue::TimestampTz(t) => Some(*t),
            _ => None,
        }
    }

    /// Linear interpolation between two numeric base values at ratio
    /// `ratio` in `[0, 1]`. Integer results round to nearest, ties away from
    /// zero (SPEC_FULL §9, `tint` Open Question).
    pub fn lerp(&self, other: &BaseValue, ratio: f64) -> Result<BaseValue> {
        match (self, other) {
            (BaseValue::Float8(a), BaseValue::Float8(b)) => Ok(BaseValue::Float8(a + (b - a) * ratio)),
            (BaseValue::Int4(a), BaseValue::Int4(b)) => {
                let v = *a as f64 + (*b as f64 - *a as f64) * ratio;
                Ok(BaseValue::Int4(round_ties_away_from_zero(v) as i32))
            }
            (BaseValue::Int8(a), BaseValue::Int8(b)) => {
                let v = *a as f64 + (*b as f64 - *a as f64) * ratio;
                Ok(BaseValue::Int8(round_ties_away_from_zero(v) as i64))
            }
            _ => Err(TemporalError::MixedBaseType(self.tag(), other.tag())),
        }
    }

    /// Canonical text representation of a single base value (spec §6).
    pub fn to_text(&self) -> String {
        match self {
            BaseValue::Bool(b) => b.to_string(),
            BaseValue::Int4(v) => v.to_string(),
            BaseValue::Int8(v) => v.to_string(),
            BaseValue::Float8(v) => {
                if v.is_infinite() {
                    if *v > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
                } else {
                    format!("{v}")
                }
            }
            BaseValue::Text(s) => s.clone(),
            BaseValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            BaseValue::TimestampTz(t) => t.to_rfc3339(),
            BaseValue::Geometry(g) | BaseValue::Geography(g) => format!("0x{}", hex_upper(&g.wkb)),
            BaseValue::Double2(Double2(a, b)) => format!("({a},{b})"),
            BaseValue::Double3(Double3(a, b, c)) => format!("({a},{b},{c})"),
            BaseValue::Double4(Double4(a, b, c, d)) => format!("({a},{b},{c},{d})"),
        }
    }
}

pub fn hex_upper(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{b:02X}"));
    }
    s
}

/// Epsilon-tolerant float comparison (spec §9): absolute tolerance `1e-6`.
pub fn fp_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

pub fn fp_cmp(a: f64, b: f64) -> Ordering {
    if fp_eq(a, b) {
        Ordering::Equal
    } else if a < b {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

fn round_ties_away_from_zero(v: f64) -> f64 {
    if v >= 0.0 {
        (v + 0.5).floor()
    } else {
        (v - 0.5).ceil()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_equality() {
        assert!(fp_eq(1.0, 1.0 + 1e-7));
        assert!(!fp_eq(1.0, 1.0 + 1e-5));
    }

    #[test]
    fn lerp_integer_rounds_ties_away_from_zero() {
        let a = BaseValue::Int4(1);
        let b = BaseValue::Int4(2);
        // ratio 0.5 -> 1.5 -> rounds to 2
        assert_eq!(a.lerp(&b, 0.5).unwrap(), BaseValue::Int4(2));
    }

    #[test]
    fn numeric_distance_dates_in_days() {
        let a = BaseValue::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        let b = BaseValue::Date(NaiveDate::from_ymd_opt(2020, 1, 10).unwrap());
        assert_eq!(a.numeric_distance(&b).unwrap(), 9.0);
    }
}
