//! Span algebra (spec §4.2): half-open intervals over an ordered base type.
//!
//! Grounded on `original_source/meos/include/temporal/span.h`'s `SpanBound`
//! (deserialized bound + inclusivity + lower/upper flag) and
//! `mobilitydb/src/general/span_ops.c`'s predicate family.

use std::cmp::Ordering;

use crate::catalog::TypeTag;
use crate::error::{Result, TemporalError};
use crate::value::BaseValue;

/// A half-open interval over an ordered base type (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub lower: BaseValue,
    pub upper: BaseValue,
    pub lower_inc: bool,
    pub upper_inc: bool,
}

/// One bound of a span, decomposed for comparison purposes (mirrors the
/// source's `SpanBound`).
#[derive(Debug, Clone, Copy)]
struct BoundCmp<'a> {
    val: &'a BaseValue,
    inclusive: bool,
    is_lower: bool,
}

/// `span_bound_cmp`: an inclusive lower bound sorts before an exclusive
/// lower bound at the same value; the opposite holds for upper bounds.
fn bound_cmp(a: BoundCmp, b: BoundCmp) -> Result<Ordering> {
    let base = a.val.compare(b.val)?;
    if base != Ordering::Equal {
        return Ok(base);
    }
    if a.inclusive == b.inclusive {
        return Ok(Ordering::Equal);
    }
    let a_first = if a.is_lower { a.inclusive } else { !a.inclusive };
    Ok(if a_first { Ordering::Less } else { Ordering::Greater })
}

impl Span {
    pub fn basetype(&self) -> TypeTag {
        self.lower.tag()
    }

    /// `make` (spec §4.2): constructs and normalizes a span. Canonical base
    /// types (`Int4`/`Int8`/`Date`) are normalized to half-open
    /// `[lower, upper)`, stepping an inclusive upper bound to the next
    /// exclusive value (spec §3 invariant iii).
    pub fn make(lower: BaseValue, upper: BaseValue, lower_inc: bool, upper_inc: bool) -> Result<Span> {
        if lower.tag() != upper.tag() {
            return Err(TemporalError::MixedBaseType(lower.tag(), upper.tag()));
        }
        let tag = lower.tag();
        let (mut lower, mut lower_inc, mut upper, mut upper_inc) = (lower, lower_inc, upper, upper_inc);

        if tag.is_canonical() {
            if !lower_inc {
                lower = lower.incr()?;
                lower_inc = true;
            }
            if upper_inc {
                upper = upper.incr()?;
                upper_inc = false;
            }
        }

        let cmp = lower.compare(&upper)?;
        match cmp {
            Ordering::Greater => {
                return Err(TemporalError::InvalidBounds(format!(
                    "lower {} > upper {}",
                    lower.to_text(),
                    upper.to_text()
                )))
            }
            Ordering::Equal => {
                if !(lower_inc && upper_inc) {
                    return Err(TemporalError::InvalidBounds(
                        "empty span: equal bounds must both be inclusive".to_string(),
                    ));
                }
            }
            Ordering::Less => {}
        }

        log::trace!("Span::make: [{}, {}] basetype {:?} -> lower_inc={} upper_inc={}", lower.to_text(), upper.to_text(), tag, lower_inc, upper_inc);
        Ok(Span { lower, upper, lower_inc, upper_inc })
    }

    /// A single-point span `[v, v]`.
    pub fn point(v: BaseValue) -> Result<Span> {
        Span::make(v.clone(), v, true, true)
    }

    fn lower_bound(&self) -> BoundCmp<'_> {
        BoundCmp { val: &self.lower, inclusive: self.lower_inc, is_lower: true }
    }
    fn upper_bound(&self) -> BoundCmp<'_> {
        BoundCmp { val: &self.upper, inclusive: self.upper_inc, is_lower: false }
    }

    fn check_same_type(&self, other: &Span) -> Result<()> {
        if self.basetype() != other.basetype() {
            return Err(TemporalError::MixedBaseType(self.basetype(), other.basetype()));
        }
        Ok(())
    }

    /// Lexicographic ordering: first by (lower, lower_inc) then by
    /// (upper, upper_inc) (spec §3).
    pub fn cmp(&self, other: &Span) -> Result<Ordering> {
        self.check_same_type(other)?;
        let lo = bound_cmp(self.lower_bound(), other.lower_bound())?;
        if lo != Ordering::Equal {
            return Ok(lo);
        }
        bound_cmp(self.upper_bound(), other.upper_bound())
    }

    pub fn equal(&self, other: &Span) -> Result<bool> {
        Ok(self.cmp(other)? == Ordering::Equal)
    }

    pub fn contains(&self, other: &Span) -> Result<bool> {
        self.check_same_type(other)?;
        Ok(bound_cmp(self.lower_bound(), other.lower_bound())? != Ordering::Greater
            && bound_cmp(self.upper_bound(), other.upper_bound())? != Ordering::Less)
    }

    pub fn contained(&self, other: &Span) -> Result<bool> {
        other.contains(self)
    }

    pub fn contains_value(&self, v: &BaseValue) -> Result<bool> {
        let lo = v.compare(&self.lower)?;
        let hi = v.compare(&self.upper)?;
        let lower_ok = lo == Ordering::Greater || (lo == Ordering::Equal && self.lower_inc);
        let upper_ok = hi == Ordering::Less || (hi == Ordering::Equal && self.upper_inc);
        Ok(lower_ok && upper_ok)
    }

    pub fn overlaps(&self, other: &Span) -> Result<bool> {
        self.check_same_type(other)?;
        let lower_le_other_upper = bound_upper_vs_lower(self.upper_bound(), other.lower_bound())?;
        let other_lower_le_upper = bound_upper_vs_lower(other.upper_bound(), self.lower_bound())?;
        Ok(lower_le_other_upper && other_lower_le_upper)
    }

    /// True iff one span's upper bound equals the other's lower bound with
    /// complementary inclusivity (spec §4.2).
    pub fn adjacent(&self, other: &Span) -> Result<bool> {
        self.check_same_type(other)?;
        let a = self.upper.compare(&other.lower)? == Ordering::Equal && self.upper_inc != other.lower_inc;
        let b = other.upper.compare(&self.lower)? == Ordering::Equal && other.upper_inc != self.lower_inc;
        Ok(a || b)
    }

    pub fn left(&self, other: &Span) -> Result<bool> {
        self.check_same_type(other)?;
        Ok(!bound_upper_vs_lower(self.upper_bound(), other.lower_bound())?)
    }

    pub fn right(&self, other: &Span) -> Result<bool> {
        other.left(self)
    }

    pub fn overleft(&self, other: &Span) -> Result<bool> {
        self.check_same_type(other)?;
        Ok(bound_cmp(self.upper_bound(), other.upper_bound())? != Ordering::Greater)
    }

    pub fn overright(&self, other: &Span) -> Result<bool> {
        self.check_same_type(other)?;
        Ok(bound_cmp(self.lower_bound(), other.lower_bound())? != Ordering::Less)
    }

    /// `mi_span_span` intersection: `None` when disjoint and non-adjacent
    /// (empty-signal per spec §4.2).
    pub fn intersection(&self, other: &Span) -> Result<Option<Span>> {
        self.check_same_type(other)?;
        if !self.overlaps(other)? {
            return Ok(None);
        }
        let lower = if bound_cmp(self.lower_bound(), other.lower_bound())? == Ordering::Less {
            (other.lower.clone(), other.lower_inc)
        } else {
            (self.lower.clone(), self.lower_inc)
        };
        let upper = if bound_cmp(self.upper_bound(), other.upper_bound())? == Ordering::Greater {
            (other.upper.clone(), other.upper_inc)
        } else {
            (self.upper.clone(), self.upper_inc)
        };
        Ok(Some(Span::make(lower.0, upper.0, lower.1, upper.1)?))
    }

    /// Union: a single `Span` if overlapping or adjacent, otherwise `None`
    /// signaling the caller should build a two-element `SpanSet` (spec §4.2).
    pub fn union(&self, other: &Span) -> Result<Option<Span>> {
        self.check_same_type(other)?;
        if !(self.overlaps(other)? || self.adjacent(other)?) {
            return Ok(None);
        }
        let lower = if bound_cmp(self.lower_bound(), other.lower_bound())? == Ordering::Greater {
            (other.lower.clone(), other.lower_inc)
        } else {
            (self.lower.clone(), self.lower_inc)
        };
        let upper = if bound_cmp(self.upper_bound(), other.upper_bound())? == Ordering::Less {
            (other.upper.clone(), other.upper_inc)
        } else {
            (self.upper.clone(), self.upper_inc)
        };
        Ok(Some(Span::make(lower.0, upper.0, lower.1, upper.1)?))
    }

    /// Difference: `self - other`, returning 0, 1, or 2 spans (spec §4.2).
    pub fn difference(&self, other: &Span) -> Result<Vec<Span>> {
        self.check_same_type(other)?;
        if !self.overlaps(other)? {
            return Ok(vec![self.clone()]);
        }
        let mut out = Vec::with_capacity(2);
        if bound_cmp(self.lower_bound(), other.lower_bound())? == Ordering::Less {
            out.push(Span::make(self.lower.clone(), other.lower.clone(), self.lower_inc, !other.lower_inc)?);
        }
        if bound_cmp(self.upper_bound(), other.upper_bound())? == Ordering::Greater {
            out.push(Span::make(other.upper.clone(), self.upper.clone(), !other.upper_inc, self.upper_inc)?);
        }
        Ok(out)
    }

    /// `dist_double_value_value`-derived span distance (spec §4.2): zero
    /// when overlapping, else the gap between the nearer bounds.
    pub fn distance(&self, other: &Span) -> Result<f64> {
        self.check_same_type(other)?;
        if self.overlaps(other)? {
            return Ok(0.0);
        }
        if bound_cmp(self.upper_bound(), other.lower_bound())? != Ordering::Greater {
            self.upper.numeric_distance(&other.lower)
        } else {
            other.upper.numeric_distance(&self.lower)
        }
    }

    pub fn to_text(&self) -> String {
        format!(
            "{}{}, {}{}",
            if self.lower_inc { "[" } else { "(" },
            self.lower.to_text(),
            self.upper.to_text(),
            if self.upper_inc { "]" } else { ")" },
        )
    }
}

/// `span_bounds_shift_scale_value` (span.h): shift and/or scale a span's
/// bounds by an amount given in the span's own units (microseconds for
/// `TimestampTz`, the base type's own scale otherwise). `delta` moves both
/// bounds by the same amount; `scale` stretches the width around the lower
/// bound. Shared by `TBox`/`STBox`'s `shift_value`/`scale_value`/
/// `shift_time`/`scale_time`.
pub fn span_shift_scale(s: &Span, delta: Option<f64>, scale: Option<f64>) -> Result<Span> {
    if s.basetype() == TypeTag::TimestampTz {
        let lo = s.lower.as_timestamp().ok_or(TemporalError::MixedDimensionality)?;
        let hi = s.upper.as_timestamp().ok_or(TemporalError::MixedDimensionality)?;
        let width_micros = (hi - lo).num_microseconds().unwrap_or(0) as f64;
        let new_width = scale.map(|sc| width_micros * sc).unwrap_or(width_micros);
        let shift = delta.unwrap_or(0.0) as i64;
        let new_lo = lo + chrono::Duration::microseconds(shift);
        let new_hi = new_lo + chrono::Duration::microseconds(new_width as i64);
        return Span::make(BaseValue::TimestampTz(new_lo), BaseValue::TimestampTz(new_hi), s.lower_inc, s.upper_inc);
    }

    let lo = s.lower.as_f64().ok_or(TemporalError::MixedDimensionality)?;
    let hi = s.upper.as_f64().ok_or(TemporalError::MixedDimensionality)?;
    let width = hi - lo;
    let new_width = scale.map(|sc| width * sc).unwrap_or(width);
    let shift = delta.unwrap_or(0.0);
    let new_lo = lo + shift;
    let new_hi = new_lo + new_width;
    if s.basetype() == TypeTag::Int4 {
        Span::make(BaseValue::Int4(new_lo.round() as i32), BaseValue::Int4(new_hi.round() as i32), true, false)
    } else {
        Span::make(BaseValue::Float8(new_lo), BaseValue::Float8(new_hi), s.lower_inc, s.upper_inc)
    }
}

fn bound_upper_vs_lower(upper: BoundCmp, lower: BoundCmp) -> Result<bool> {
    let base = upper.val.compare(lower.val)?;
    Ok(match base {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => upper.inclusive && lower.inclusive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::BaseValue::{Float8, Int4};

    #[test]
    fn scenario_1_int_span_normalization() {
        let s = Span::make(Int4(1), Int4(5), true, true).unwrap();
        assert_eq!(s.lower, Int4(1));
        assert_eq!(s.upper, Int4(6));
        assert!(s.lower_inc);
        assert!(!s.upper_inc);
        assert_eq!(s.to_text(), "[1, 6)");
    }

    #[test]
    fn scenario_2_float_span_intersection() {
        let a = Span::make(Float8(1.0), Float8(3.0), true, false).unwrap();
        let b = Span::make(Float8(2.5), Float8(4.0), true, false).unwrap();
        let inter = a.intersection(&b).unwrap().unwrap();
        assert_eq!(inter.lower, Float8(2.5));
        assert_eq!(inter.upper, Float8(3.0));
        assert_eq!(a.distance(&b).unwrap(), 0.0);
    }

    #[test]
    fn shift_scale_moves_and_stretches_a_numeric_span() {
        let s = Span::make(Float8(1.0), Float8(3.0), true, false).unwrap();
        let shifted = span_shift_scale(&s, Some(2.0), None).unwrap();
        assert_eq!(shifted.lower, Float8(3.0));
        assert_eq!(shifted.upper, Float8(5.0));

        let scaled = span_shift_scale(&s, None, Some(2.0)).unwrap();
        assert_eq!(scaled.lower, Float8(1.0));
        assert_eq!(scaled.upper, Float8(5.0));
    }

    #[test]
    fn shift_scale_on_a_time_span_uses_microseconds() {
        use crate::value::BaseValue::TimestampTz;
        use chrono::{TimeZone, Utc};
        let t0 = Utc.timestamp_opt(0, 0).unwrap();
        let t1 = Utc.timestamp_opt(10, 0).unwrap();
        let s = Span::make(TimestampTz(t0), TimestampTz(t1), true, false).unwrap();
        let shifted = span_shift_scale(&s, Some(5_000_000.0), None).unwrap();
        assert_eq!(shifted.lower, TimestampTz(Utc.timestamp_opt(5, 0).unwrap()));
        assert_eq!(shifted.upper, TimestampTz(Utc.timestamp_opt(15, 0).unwrap()));
    }

    #[test]
    fn adjacency_and_union_produce_merged_span() {
        let a = Span::make(Int4(1), Int4(3), true, false).unwrap();
        let b = Span::make(Int4(3), Int4(5), true, false).unwrap();
        assert!(a.adjacent(&b).unwrap());
        let u = a.union(&b).unwrap().unwrap();
        assert_eq!(u.lower, Int4(1));
        assert_eq!(u.upper, Int4(5));
    }

    #[test]
    fn difference_can_produce_two_spans() {
        let a = Span::make(Int4(1), Int4(10), true, false).unwrap();
        let b = Span::make(Int4(3), Int4(5), true, false).unwrap();
        let d = a.difference(&b).unwrap();
        assert_eq!(d.len(), 2);
        assert_eq!(d[0].lower, Int4(1));
        assert_eq!(d[0].upper, Int4(3));
        assert_eq!(d[1].lower, Int4(5));
        assert_eq!(d[1].upper, Int4(10));
    }

    #[test]
    fn empty_span_is_rejected() {
        let err = Span::make(Int4(1), Int4(1), true, false).unwrap_err();
        assert!(matches!(err, TemporalError::InvalidBounds(_)));
    }

    #[test]
    fn mixed_base_type_is_rejected() {
        let err = Span::make(Int4(1), Float8(1.0), true, true).unwrap_err();
        assert!(matches!(err, TemporalError::MixedBaseType(_, _)));
    }
}
