//! `SequenceSet` (spec §3, §4.5): a time-ordered list of time-disjoint,
//! non-adjacent sequences sharing a base type and interpolation.
//!
//! Grounded on `tsequence_join_test`/`tsequence_join` for the adjacency
//! rule this type's constructor enforces, and on `SpanSet`'s merge-walk
//! algebra, which this module reuses at the per-sequence level.

use chrono::{DateTime, Utc};

use crate::bbox::TBox;
use crate::catalog::TypeTag;
use crate::error::{Result, TemporalError};
use crate::span::Span;
use crate::value::BaseValue;

use super::instant::Instant;
use super::sequence::Sequence;
use super::Interpolation;

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceSet {
    sequences: Vec<Sequence>,
    interp: Interpolation,
    bbox_time: Span,
    bbox_value: Option<Span>,
}

fn is_numeric_base(tag: TypeTag) -> bool {
    matches!(tag, TypeTag::Int4 | TypeTag::Int8 | TypeTag::Float8)
}

impl SequenceSet {
    /// Strict constructor (spec §3): rejects sequences that overlap in time
    /// or are adjacent (a caller with adjacent sequences should join them
    /// first via [`crate::temporal::value::merge_sequences`]).
    pub fn new(mut sequences: Vec<Sequence>) -> Result<SequenceSet> {
        if sequences.is_empty() {
            return Err(TemporalError::InvalidBounds("sequence-set must contain at least one sequence".into()));
        }
        let basetype = sequences[0].basetype();
        let interp = sequences[0].interpolation();
        for s in &sequences {
            if s.basetype() != basetype {
                return Err(TemporalError::MixedBaseType(basetype, s.basetype()));
            }
            if s.interpolation() != interp {
                return Err(TemporalError::MixedInterpolation(
                    format!("{interp}"),
                    format!("{}", s.interpolation()),
                ));
            }
        }
        sequences.sort_by(|a, b| a.start_time().cmp(&b.start_time()));

        for w in sequences.windows(2) {
            let (a, b) = (&w[0], &w[1]);
            if temporal_overlaps(a, b) {
                return Err(TemporalError::InvalidBounds(
                    "sequence-set members must be time-disjoint".into(),
                ));
            }
            if temporal_adjacent(a, b) {
                return Err(TemporalError::InvalidBounds(
                    "sequence-set members must not be temporally adjacent; join them instead".into(),
                ));
            }
        }

        Self::from_validated(sequences, interp)
    }

    /// Builds the cached bbox from an already-validated, sorted sequence
    /// list; used internally once `merge_sequences` has done the joining.
    pub(crate) fn from_validated(sequences: Vec<Sequence>, interp: Interpolation) -> Result<SequenceSet> {
        let basetype = sequences[0].basetype();
        let bbox_time = Span::make(
            BaseValue::TimestampTz(sequences.first().unwrap().start_time()),
            BaseValue::TimestampTz(sequences.last().unwrap().end_time()),
            sequences.first().unwrap().lower_inc(),
            sequences.last().unwrap().upper_inc(),
        )?;
        let bbox_value = if is_numeric_base(basetype) {
            let mut lo = sequences[0].value_span().unwrap().lower.clone();
            let mut hi = sequences[0].value_span().unwrap().upper.clone();
            for s in &sequences[1..] {
                let vs = s.value_span().unwrap();
                if vs.lower.compare(&lo)? == std::cmp::Ordering::Less {
                    lo = vs.lower.clone();
                }
                if vs.upper.compare(&hi)? == std::cmp::Ordering::Greater {
                    hi = vs.upper.clone();
                }
            }
            Some(Span::make(lo, hi, true, true)?)
        } else {
            None
        };
        log::debug!("SequenceSet::from_validated: {} sequences, interp {:?}", sequences.len(), interp);
        Ok(SequenceSet { sequences, interp, bbox_time, bbox_value })
    }

    pub fn basetype(&self) -> TypeTag {
        self.sequences[0].basetype()
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interp
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.sequences.first().unwrap().start_time()
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.sequences.last().unwrap().end_time()
    }

    pub fn time_span(&self) -> &Span {
        &self.bbox_time
    }

    pub fn value_span(&self) -> Option<&Span> {
        self.bbox_value.as_ref()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.sequences.iter().map(Sequence::duration).fold(chrono::Duration::zero(), |a, b| a + b)
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.sequences.iter().flat_map(Sequence::timestamps).collect()
    }

    pub fn instants(&self) -> Vec<&Instant> {
        self.sequences.iter().flat_map(|s| s.instants().iter()).collect()
    }

    pub fn value_set(&self) -> Result<crate::set::OrderedSet> {
        let mut values = Vec::new();
        for s in &self.sequences {
            values.extend(s.instants().iter().map(|i| i.value.clone()));
        }
        crate::set::OrderedSet::new(values)
    }

    pub fn min_value(&self) -> Result<&BaseValue> {
        let mut best = self.sequences[0].min_value()?;
        for s in &self.sequences[1..] {
            let cand = s.min_value()?;
            if cand.compare(best)? == std::cmp::Ordering::Less {
                best = cand;
            }
        }
        Ok(best)
    }

    pub fn max_value(&self) -> Result<&BaseValue> {
        let mut best = self.sequences[0].max_value()?;
        for s in &self.sequences[1..] {
            let cand = s.max_value()?;
            if cand.compare(best)? == std::cmp::Ordering::Greater {
                best = cand;
            }
        }
        Ok(best)
    }

    pub fn bounding_tbox(&self) -> Option<TBox> {
        self.bbox_value.clone().map(|v| TBox::new(Some(v), Some(self.bbox_time.clone())).expect("both dims present"))
    }

    pub fn value_at(&self, t: DateTime<Utc>) -> Result<Option<BaseValue>> {
        for s in &self.sequences {
            if t < s.start_time() || t > s.end_time() {
                continue;
            }
            if let Some(v) = s.value_at(t)? {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }

    /// Time-weighted average across all member sequences, weighted by each
    /// sequence's own contribution (SPEC_FULL §4.5 `tnumber_twavg`).
    pub fn twavg(&self) -> Result<f64> {
        let mut weighted = 0.0;
        let mut total = 0.0;
        for s in &self.sequences {
            let dur = s.duration().num_microseconds().unwrap_or(0).max(1) as f64;
            weighted += s.twavg()? * dur;
            total += dur;
        }
        Ok(weighted / total)
    }

    pub fn equal(&self, other: &SequenceSet) -> Result<bool> {
        if self.sequences.len() != other.sequences.len() {
            return Ok(false);
        }
        for (a, b) in self.sequences.iter().zip(other.sequences.iter()) {
            if !a.equal(b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn restrict(&self, f: impl Fn(&Sequence) -> Result<Vec<Sequence>> + Copy) -> Result<Vec<Sequence>> {
        let mut out = Vec::new();
        for s in &self.sequences {
            out.extend(f(s)?);
        }
        Ok(out)
    }

    pub fn restrict_value_at(&self, v: &BaseValue) -> Result<Vec<Sequence>> {
        self.restrict(|s| s.restrict_value_at(v))
    }
    pub fn restrict_value_minus(&self, v: &BaseValue) -> Result<Vec<Sequence>> {
        self.restrict(|s| s.restrict_value_minus(v))
    }
    pub fn restrict_set_at(&self, set: &crate::set::OrderedSet) -> Result<Vec<Sequence>> {
        self.restrict(|s| s.restrict_set_at(set))
    }
    pub fn restrict_set_minus(&self, set: &crate::set::OrderedSet) -> Result<Vec<Sequence>> {
        self.restrict(|s| s.restrict_set_minus(set))
    }
    pub fn restrict_span_at(&self, span: &Span) -> Result<Vec<Sequence>> {
        self.restrict(|s| s.restrict_span_at(span))
    }
    pub fn restrict_span_minus(&self, span: &Span) -> Result<Vec<Sequence>> {
        self.restrict(|s| s.restrict_span_minus(span))
    }
    pub fn restrict_spanset_at(&self, ss: &crate::spanset::SpanSet) -> Result<Vec<Sequence>> {
        self.restrict(|s| s.restrict_spanset_at(ss))
    }
    pub fn restrict_spanset_minus(&self, ss: &crate::spanset::SpanSet) -> Result<Vec<Sequence>> {
        self.restrict(|s| s.restrict_spanset_minus(ss))
    }

    pub fn to_text(&self) -> String {
        let parts: Vec<String> = self.sequences.iter().map(Sequence::to_text_body).collect();
        format!("{}{{{}}}", super::sequence::interp_prefix(self.interp), parts.join(", "))
    }
}

/// Whether two time-sorted sequences overlap (share more than a
/// non-adjacent boundary) in time.
pub(crate) fn temporal_overlaps(a: &Sequence, b: &Sequence) -> bool {
    if a.end_time() < b.start_time() || a.end_time() > b.start_time() {
        return a.end_time() > b.start_time();
    }
    a.upper_inc() && b.lower_inc()
}

/// Temporal adjacency (spec §3): sharing a boundary timestamp with
/// complementary inclusivity.
pub(crate) fn temporal_adjacent(a: &Sequence, b: &Sequence) -> bool {
    a.end_time() == b.start_time() && a.upper_inc() != b.lower_inc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::BaseValue::Float8;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn seq(a: f64, ta: i64, b: f64, tb: i64) -> Sequence {
        Sequence::new(
            vec![Instant::new(Float8(a), t(ta)), Instant::new(Float8(b), t(tb))],
            true,
            true,
            Interpolation::Linear,
        )
        .unwrap()
    }

    #[test]
    fn rejects_overlapping_sequences() {
        let a = seq(0.0, 0, 10.0, 10);
        let b = seq(5.0, 5, 15.0, 15);
        assert!(SequenceSet::new(vec![a, b]).is_err());
    }

    #[test]
    fn disjoint_non_adjacent_sequences_build_a_set() {
        let a = seq(0.0, 0, 10.0, 10);
        let b = seq(20.0, 20, 30.0, 30);
        let ss = SequenceSet::new(vec![a, b]).unwrap();
        assert_eq!(ss.sequences().len(), 2);
        assert_eq!(ss.start_time(), t(0));
        assert_eq!(ss.end_time(), t(30));
    }

    #[test]
    fn value_at_dispatches_to_the_containing_sequence() {
        let a = seq(0.0, 0, 10.0, 10);
        let b = seq(20.0, 20, 30.0, 30);
        let ss = SequenceSet::new(vec![a, b]).unwrap();
        assert_eq!(ss.value_at(t(25)).unwrap().unwrap(), Float8(25.0));
        assert_eq!(ss.value_at(t(15)).unwrap(), None);
    }
}
