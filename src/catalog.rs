//! Type catalog (spec §4.1): a closed enumeration of every value type the
//! engine knows about, plus O(1) classification lookups over it.
//!
//! Grounded on `meos_catalog.h`'s `meosType` enum: the tag ordering below
//! mirrors the source's grouping (base types, set types, span types,
//! span-set types, temporal types, box types) even though the numeric
//! values themselves are a private implementation detail here, not a wire
//! contract — WKB framing carries its own explicit type-tag byte (§6).

use crate::error::{Result, TemporalError};

/// Every value type the engine can construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TypeTag {
    // ── Base types ──
    Bool,
    Int4,
    Int8,
    Float8,
    Text,
    Date,
    TimestampTz,
    Geometry,
    Geography,
    /// Internal aggregation accumulator: (count, sum).
    Double2,
    /// Internal aggregation accumulator: (count, sum_x, sum_y).
    Double3,
    /// Internal aggregation accumulator: (count, sum_x, sum_y, sum_z).
    Double4,

    // ── Set types ──
    BoolSet,
    IntSet,
    BigintSet,
    FloatSet,
    TextSet,
    DateSet,
    TstzSet,
    GeomSet,
    GeogSet,

    // ── Span types ──
    IntSpan,
    BigintSpan,
    FloatSpan,
    DateSpan,
    TstzSpan,

    // ── Span-set types ──
    IntSpanSet,
    BigintSpanSet,
    FloatSpanSet,
    DateSpanSet,
    TstzSpanSet,

    // ── Temporal types ──
    TBool,
    TInt,
    TFloat,
    TText,
    TGeomPoint,
    TGeogPoint,
    TDouble2,
    TDouble3,
    TDouble4,

    // ── Box types ──
    TBox,
    STBox,
}

/// Broad classification used by every generic routine (spec §3, §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    Base,
    Set,
    Span,
    SpanSet,
    Temporal,
    Box,
}

impl TypeTag {
    pub fn class(self) -> TypeClass {
        use TypeTag::*;
        match self {
            Bool | Int4 | Int8 | Float8 | Text | Date | TimestampTz | Geometry | Geography
            | Double2 | Double3 | Double4 => TypeClass::Base,
            BoolSet | IntSet | BigintSet | FloatSet | TextSet | DateSet | TstzSet | GeomSet
            | GeogSet => TypeClass::Set,
            IntSpan | BigintSpan | FloatSpan | DateSpan | TstzSpan => TypeClass::Span,
            IntSpanSet | BigintSpanSet | FloatSpanSet | DateSpanSet | TstzSpanSet => {
                TypeClass::SpanSet
            }
            TBool | TInt | TFloat | TText | TGeomPoint | TGeogPoint | TDouble2 | TDouble3
            | TDouble4 => TypeClass::Temporal,
            TBox | STBox => TypeClass::Box,
        }
    }

    /// `basetype_of` (spec §4.1): the base type underlying a set/span/span-set/
    /// temporal type. Fails with `InvalidType` on base or box types, which have
    /// no underlying base type of their own.
    pub fn basetype_of(self) -> Result<TypeTag> {
        use TypeTag::*;
        Ok(match self {
            BoolSet => Bool,
            IntSet | IntSpan | IntSpanSet | TInt => Int4,
            BigintSet | BigintSpan | BigintSpanSet => Int8,
            FloatSet | FloatSpan | FloatSpanSet | TFloat => Float8,
            TextSet | TText => Text,
            DateSet | DateSpan | DateSpanSet => Date,
            TstzSet | TstzSpan | TstzSpanSet => TimestampTz,
            GeomSet | TGeomPoint => Geometry,
            GeogSet | TGeogPoint => Geography,
            TDouble2 => Double2,
            TDouble3 => Double3,
            TDouble4 => Double4,
            other => return Err(TemporalError::InvalidType(other)),
        })
    }

    /// `spantype_of` (spec §4.1): the span type over a given base type.
    pub fn spantype_of(basetype: TypeTag) -> Result<TypeTag> {
        use TypeTag::*;
        Ok(match basetype {
            Int4 => IntSpan,
            Int8 => BigintSpan,
            Float8 => FloatSpan,
            Date => DateSpan,
            TimestampTz => TstzSpan,
            other => return Err(TemporalError::InvalidType(other)),
        })
    }

    /// `settype_of` (spec §4.1): the set type over a given base type.
    pub fn settype_of(basetype: TypeTag) -> Result<TypeTag> {
        use TypeTag::*;
        Ok(match basetype {
            Bool => BoolSet,
            Int4 => IntSet,
            Int8 => BigintSet,
            Float8 => FloatSet,
            Text => TextSet,
            Date => DateSet,
            TimestampTz => TstzSet,
            Geometry => GeomSet,
            Geography => GeogSet,
            other => return Err(TemporalError::InvalidType(other)),
        })
    }

    /// `spansettype_of` (spec §4.1): the span-set type over a given span type.
    pub fn spansettype_of(spantype: TypeTag) -> Result<TypeTag> {
        use TypeTag::*;
        Ok(match spantype {
            IntSpan => IntSpanSet,
            BigintSpan => BigintSpanSet,
            FloatSpan => FloatSpanSet,
            DateSpan => DateSpanSet,
            TstzSpan => TstzSpanSet,
            other => return Err(TemporalError::InvalidType(other)),
        })
    }

    pub fn is_by_value(self) -> bool {
        matches!(
            self,
            TypeTag::Bool | TypeTag::Int4 | TypeTag::Int8 | TypeTag::Float8 | TypeTag::Date
                | TypeTag::TimestampTz
        )
    }

    pub fn is_variable_length(self) -> bool {
        matches!(self, TypeTag::Text | TypeTag::Geometry | TypeTag::Geography)
    }

    /// `basetype_length` (spec §4.1): fixed byte width, word width for by-value
    /// types, or -1 for variable-length types.
    pub fn basetype_length(self) -> i32 {
        use TypeTag::*;
        match self {
            Bool => 1,
            Int4 | Date => 4,
            Int8 | Float8 | TimestampTz => 8,
            Double2 => 16,
            Double3 => 24,
            Double4 => 32,
            Text | Geometry | Geography => -1,
            _ => -1,
        }
    }

    /// Continuous base types admit Linear interpolation (spec §3, §9).
    pub fn is_continuous(self) -> bool {
        matches!(self, TypeTag::Float8 | TypeTag::TimestampTz | TypeTag::Geometry | TypeTag::Geography)
    }

    /// Canonical (discrete-domain) base types normalize span bounds to
    /// half-open `[lower, upper)` by stepping the exclusive bound (spec §3).
    pub fn is_canonical(self) -> bool {
        matches!(self, TypeTag::Int4 | TypeTag::Int8 | TypeTag::Date)
    }

    pub fn is_spatial(self) -> bool {
        matches!(
            self,
            TypeTag::Geometry
                | TypeTag::Geography
                | TypeTag::GeomSet
                | TypeTag::GeogSet
                | TypeTag::TGeomPoint
                | TypeTag::TGeogPoint
                | TypeTag::STBox
        )
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            TypeTag::Int4
                | TypeTag::Int8
                | TypeTag::Float8
                | TypeTag::IntSpan
                | TypeTag::BigintSpan
                | TypeTag::FloatSpan
                | TypeTag::IntSpanSet
                | TypeTag::BigintSpanSet
                | TypeTag::FloatSpanSet
                | TypeTag::TInt
                | TypeTag::TFloat
        )
    }

    pub fn is_time(self) -> bool {
        matches!(
            self,
            TypeTag::TimestampTz
                | TypeTag::Date
                | TypeTag::TstzSpan
                | TypeTag::DateSpan
                | TypeTag::TstzSpanSet
                | TypeTag::DateSpanSet
        )
    }

    /// Default interpolation for a continuous base type when a text/WKB
    /// representation omits the `Interp=` prefix (spec §6).
    pub fn interp_default_for(basetype: TypeTag) -> crate::temporal::Interpolation {
        use crate::temporal::Interpolation;
        if basetype.is_continuous() {
            Interpolation::Linear
        } else {
            Interpolation::Step
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basetype_of_round_trips_span_hierarchy() {
        assert_eq!(TypeTag::IntSpan.basetype_of().unwrap(), TypeTag::Int4);
        assert_eq!(TypeTag::TInt.basetype_of().unwrap(), TypeTag::Int4);
        assert!(TypeTag::Int4.basetype_of().is_err());
    }

    #[test]
    fn spantype_settype_spansettype_chain() {
        let base = TypeTag::Float8;
        let span = TypeTag::spantype_of(base).unwrap();
        assert_eq!(span, TypeTag::FloatSpan);
        let set = TypeTag::settype_of(base).unwrap();
        assert_eq!(set, TypeTag::FloatSet);
        let spanset = TypeTag::spansettype_of(span).unwrap();
        assert_eq!(spanset, TypeTag::FloatSpanSet);
    }

    #[test]
    fn classification_predicates() {
        assert!(TypeTag::Float8.is_continuous());
        assert!(!TypeTag::Int4.is_continuous());
        assert!(TypeTag::Int4.is_canonical());
        assert!(!TypeTag::Float8.is_canonical());
        assert!(TypeTag::Geometry.is_spatial());
        assert!(TypeTag::TInt.is_numeric());
        assert_eq!(TypeTag::Text.basetype_length(), -1);
        assert_eq!(TypeTag::Int8.basetype_length(), 8);
    }
}
