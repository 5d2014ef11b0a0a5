//! `TBox` (spec §4.4): an axis-aligned box in (numeric value × time).
//!
//! Grounded on `mobilitydb/src/general/tbox.c`'s WKT forms
//! (`TBOX XT(...)`, `TBOXINT`, `TBOXFLOAT`). Shift/scale delegates to
//! `span::span_shift_scale`, shared with `STBox`'s time dimension.

use crate::error::{Result, TemporalError};
use crate::span::{span_shift_scale, Span};
use crate::value::BaseValue;

/// Optional value span (numeric) × optional time span (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct TBox {
    pub value_span: Option<Span>,
    pub time_span: Option<Span>,
}

impl TBox {
    pub fn new(value_span: Option<Span>, time_span: Option<Span>) -> Result<TBox> {
        if value_span.is_none() && time_span.is_none() {
            return Err(TemporalError::InvalidBounds(
                "TBox must have at least one present dimension".into(),
            ));
        }
        Ok(TBox { value_span, time_span })
    }

    fn check_compatible(&self, other: &TBox) -> Result<()> {
        if self.value_span.is_some() != other.value_span.is_some()
            || self.time_span.is_some() != other.time_span.is_some()
        {
            return Err(TemporalError::MixedDimensionality);
        }
        Ok(())
    }

    pub fn expand(&self, delta: f64) -> Result<TBox> {
        let value_span = self
            .value_span
            .as_ref()
            .map(|s| expand_numeric_span(s, delta))
            .transpose()?;
        let time_span = self
            .time_span
            .as_ref()
            .map(|s| expand_time_span(s, delta))
            .transpose()?;
        Ok(TBox { value_span, time_span })
    }

    pub fn shift_time(&self, delta_micros: i64) -> Result<TBox> {
        let time_span = self
            .time_span
            .as_ref()
            .map(|s| span_shift_scale(s, Some(delta_micros as f64), None))
            .transpose()?;
        Ok(TBox { value_span: self.value_span.clone(), time_span })
    }

    pub fn scale_time(&self, scale: f64) -> Result<TBox> {
        let time_span = self
            .time_span
            .as_ref()
            .map(|s| span_shift_scale(s, None, Some(scale)))
            .transpose()?;
        Ok(TBox { value_span: self.value_span.clone(), time_span })
    }

    pub fn shift_scale_time(&self, delta_micros: Option<i64>, scale: Option<f64>) -> Result<TBox> {
        let time_span = self
            .time_span
            .as_ref()
            .map(|s| span_shift_scale(s, delta_micros.map(|d| d as f64), scale))
            .transpose()?;
        Ok(TBox { value_span: self.value_span.clone(), time_span })
    }

    pub fn shift_value(&self, delta: f64) -> Result<TBox> {
        let value_span = self
            .value_span
            .as_ref()
            .map(|s| span_shift_scale(s, Some(delta), None))
            .transpose()?;
        Ok(TBox { value_span, time_span: self.time_span.clone() })
    }

    pub fn scale_value(&self, scale: f64) -> Result<TBox> {
        let value_span = self
            .value_span
            .as_ref()
            .map(|s| span_shift_scale(s, None, Some(scale)))
            .transpose()?;
        Ok(TBox { value_span, time_span: self.time_span.clone() })
    }

    pub fn overlaps(&self, other: &TBox) -> Result<bool> {
        self.check_compatible(other)?;
        Ok(overlaps_dim(&self.value_span, &other.value_span)?
            && overlaps_dim(&self.time_span, &other.time_span)?)
    }

    pub fn contains(&self, other: &TBox) -> Result<bool> {
        self.check_compatible(other)?;
        Ok(contains_dim(&self.value_span, &other.value_span)? && contains_dim(&self.time_span, &other.time_span)?)
    }

    pub fn equal(&self, other: &TBox) -> Result<bool> {
        self.check_compatible(other)?;
        let v = match (&self.value_span, &other.value_span) {
            (Some(a), Some(b)) => a.equal(b)?,
            (None, None) => true,
            _ => false,
        };
        let t = match (&self.time_span, &other.time_span) {
            (Some(a), Some(b)) => a.equal(b)?,
            (None, None) => true,
            _ => false,
        };
        Ok(v && t)
    }

    /// Non-strict union: the box covering both inputs (spec §4.4).
    pub fn union(&self, other: &TBox) -> Result<TBox> {
        self.check_compatible(other)?;
        let value_span = union_dim(&self.value_span, &other.value_span)?;
        let time_span = union_dim(&self.time_span, &other.time_span)?;
        Ok(TBox { value_span, time_span })
    }

    /// Returns `None` (empty-signal) when the boxes don't overlap.
    pub fn intersection(&self, other: &TBox) -> Result<Option<TBox>> {
        self.check_compatible(other)?;
        if !self.overlaps(other)? {
            return Ok(None);
        }
        let value_span = match (&self.value_span, &other.value_span) {
            (Some(a), Some(b)) => a.intersection(b)?,
            _ => None,
        };
        let time_span = match (&self.time_span, &other.time_span) {
            (Some(a), Some(b)) => a.intersection(b)?,
            _ => None,
        };
        Ok(Some(TBox { value_span, time_span }))
    }

    /// Lexicographic ordering for B-tree indexing: missing dimensions sort
    /// before present ones (spec §4.4).
    pub fn cmp(&self, other: &TBox) -> Result<std::cmp::Ordering> {
        let v = cmp_dim(&self.value_span, &other.value_span)?;
        if v != std::cmp::Ordering::Equal {
            return Ok(v);
        }
        cmp_dim(&self.time_span, &other.time_span)
    }

    pub fn to_text(&self) -> String {
        match (&self.value_span, &self.time_span) {
            (Some(v), Some(t)) => {
                let kind = if matches!(v.lower, BaseValue::Int4(_)) { "TBOXINT" } else { "TBOXFLOAT" };
                format!("{kind} XT({}, {})", v.to_text(), t.to_text())
            }
            (Some(v), None) => {
                let kind = if matches!(v.lower, BaseValue::Int4(_)) { "TBOXINT" } else { "TBOXFLOAT" };
                format!("{kind} X({})", v.to_text())
            }
            (None, Some(t)) => format!("TBOX T({})", t.to_text()),
            (None, None) => unreachable!("TBox::new rejects both-absent"),
        }
    }
}

fn expand_numeric_span(s: &Span, delta: f64) -> Result<Span> {
    let lower = BaseValue::Float8(s.lower.as_f64().ok_or(TemporalError::MixedDimensionality)? - delta);
    let upper = BaseValue::Float8(s.upper.as_f64().ok_or(TemporalError::MixedDimensionality)? + delta);
    if matches!(s.lower, BaseValue::Int4(_)) {
        Span::make(BaseValue::Int4(lower.as_f64().unwrap() as i32), BaseValue::Int4(upper.as_f64().unwrap() as i32), true, false)
    } else {
        Span::make(lower, upper, s.lower_inc, s.upper_inc)
    }
}

fn expand_time_span(s: &Span, delta_micros: f64) -> Result<Span> {
    let dur = chrono::Duration::microseconds(delta_micros as i64);
    let lower = s.lower.as_timestamp().ok_or(TemporalError::MixedDimensionality)? - dur;
    let upper = s.upper.as_timestamp().ok_or(TemporalError::MixedDimensionality)? + dur;
    Span::make(BaseValue::TimestampTz(lower), BaseValue::TimestampTz(upper), s.lower_inc, s.upper_inc)
}

fn overlaps_dim(a: &Option<Span>, b: &Option<Span>) -> Result<bool> {
    match (a, b) {
        (Some(a), Some(b)) => a.overlaps(b),
        _ => Ok(true),
    }
}
fn contains_dim(a: &Option<Span>, b: &Option<Span>) -> Result<bool> {
    match (a, b) {
        (Some(a), Some(b)) => a.contains(b),
        _ => Ok(true),
    }
}

fn union_dim(a: &Option<Span>, b: &Option<Span>) -> Result<Option<Span>> {
    match (a, b) {
        (Some(a), Some(b)) => Ok(a.union(b)?.or_else(|| {
            // Disjoint, non-adjacent: union still must cover both (non-strict box union).
            Span::make(
                if a.lower.compare(&b.lower).unwrap() == std::cmp::Ordering::Less { a.lower.clone() } else { b.lower.clone() },
                if a.upper.compare(&b.upper).unwrap() == std::cmp::Ordering::Greater { a.upper.clone() } else { b.upper.clone() },
                a.lower_inc || b.lower_inc,
                a.upper_inc || b.upper_inc,
            )
            .ok()
        })),
        _ => Ok(None),
    }
}

fn cmp_dim(a: &Option<Span>, b: &Option<Span>) -> Result<std::cmp::Ordering> {
    match (a, b) {
        (None, None) => Ok(std::cmp::Ordering::Equal),
        (None, Some(_)) => Ok(std::cmp::Ordering::Less),
        (Some(_), None) => Ok(std::cmp::Ordering::Greater),
        (Some(a), Some(b)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::BaseValue::Float8;

    fn fspan(lo: f64, hi: f64) -> Span {
        Span::make(Float8(lo), Float8(hi), true, false).unwrap()
    }

    #[test]
    fn union_and_intersection_on_value_only_boxes() {
        let a = TBox::new(Some(fspan(1.0, 5.0)), None).unwrap();
        let b = TBox::new(Some(fspan(3.0, 8.0)), None).unwrap();
        let u = a.union(&b).unwrap();
        assert_eq!(u.value_span.unwrap().upper, Float8(8.0));
        let i = a.intersection(&b).unwrap().unwrap();
        assert_eq!(i.value_span.unwrap().lower, Float8(3.0));
    }

    #[test]
    fn shift_value_delegates_to_the_shared_span_helper() {
        let b = TBox::new(Some(fspan(1.0, 5.0)), None).unwrap();
        let shifted = b.shift_value(2.0).unwrap();
        assert_eq!(shifted.value_span.unwrap(), crate::span::span_shift_scale(&fspan(1.0, 5.0), Some(2.0), None).unwrap());
    }

    #[test]
    fn missing_dimension_sorts_before_present() {
        let a = TBox::new(Some(fspan(1.0, 2.0)), None).unwrap();
        let b = TBox::new(Some(fspan(1.0, 2.0)), Some(Span::make(
            BaseValue::TimestampTz(chrono::Utc::now()),
            BaseValue::TimestampTz(chrono::Utc::now() + chrono::Duration::days(1)),
            true, false).unwrap())).unwrap();
        assert_eq!(a.cmp(&b).unwrap(), std::cmp::Ordering::Less);
    }
}
