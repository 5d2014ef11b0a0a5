//! `Temporal` (spec §3, §4.5): the tagged union `{Instant, Sequence,
//! SequenceSet}` that every temporal type (`tbool`, `tint`, `tfloat`, ...)
//! is built from. Dispatch is exhaustive pattern matching, per the design
//! notes in spec §9 ("express this as a closed sum type... dispatch is
//! exhaustive pattern matching").
//!
//! Grounded on `meos/include/temporal/temporal.h`'s `TemporalSubtype`
//! discriminant and `tsequence_join`'s merge-array boundary-joining rule.

use chrono::{DateTime, Utc};

use crate::bbox::TBox;
use crate::catalog::TypeTag;
use crate::error::{Result, TemporalError};
use crate::set::OrderedSet;
use crate::span::Span;
use crate::spanset::SpanSet;
use crate::value::BaseValue;

use super::instant::Instant;
use super::sequence::{AppendOutcome, Sequence};
use super::sequenceset::{temporal_adjacent, temporal_overlaps, SequenceSet};
use super::Interpolation;

/// A time-varying value: one instant, a contiguous run, or a disjoint
/// collection of runs (spec GLOSSARY).
#[derive(Debug, Clone, PartialEq)]
pub enum Temporal {
    Instant(Instant),
    Sequence(Sequence),
    SequenceSet(SequenceSet),
}

impl Temporal {
    pub fn basetype(&self) -> TypeTag {
        match self {
            Temporal::Instant(i) => i.basetype(),
            Temporal::Sequence(s) => s.basetype(),
            Temporal::SequenceSet(ss) => ss.basetype(),
        }
    }

    /// `None` for a bare instant: interpolation is only meaningful once
    /// there is more than one instant to interpolate between.
    pub fn interpolation(&self) -> Option<Interpolation> {
        match self {
            Temporal::Instant(_) => None,
            Temporal::Sequence(s) => Some(s.interpolation()),
            Temporal::SequenceSet(ss) => Some(ss.interpolation()),
        }
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        match self {
            Temporal::Instant(i) => i.t,
            Temporal::Sequence(s) => s.start_time(),
            Temporal::SequenceSet(ss) => ss.start_time(),
        }
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        match self {
            Temporal::Instant(i) => i.t,
            Temporal::Sequence(s) => s.end_time(),
            Temporal::SequenceSet(ss) => ss.end_time(),
        }
    }

    /// `time` (spec §4.5 accessors) as the value's time span.
    pub fn time_span(&self) -> Result<Span> {
        match self {
            Temporal::Instant(i) => Span::make(
                BaseValue::TimestampTz(i.t),
                BaseValue::TimestampTz(i.t),
                true,
                true,
            ),
            Temporal::Sequence(s) => Ok(s.time_span().clone()),
            Temporal::SequenceSet(ss) => Ok(ss.time_span().clone()),
        }
    }

    /// `time` as a span-set: for a `SequenceSet` this is one span per
    /// member sequence rather than the single bounding span.
    pub fn time_spanset(&self) -> Result<SpanSet> {
        match self {
            Temporal::Instant(_) | Temporal::Sequence(_) => SpanSet::new(vec![self.time_span()?]),
            Temporal::SequenceSet(ss) => {
                SpanSet::new(ss.sequences().iter().map(|s| s.time_span().clone()).collect())
            }
        }
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        match self {
            Temporal::Instant(i) => vec![i.t],
            Temporal::Sequence(s) => s.timestamps(),
            Temporal::SequenceSet(ss) => ss.timestamps(),
        }
    }

    pub fn instants(&self) -> Vec<&Instant> {
        match self {
            Temporal::Instant(i) => vec![i],
            Temporal::Sequence(s) => s.instants().iter().collect(),
            Temporal::SequenceSet(ss) => ss.instants(),
        }
    }

    pub fn value_set(&self) -> Result<OrderedSet> {
        match self {
            Temporal::Instant(i) => OrderedSet::new(vec![i.value.clone()]),
            Temporal::Sequence(s) => s.value_set(),
            Temporal::SequenceSet(ss) => ss.value_set(),
        }
    }

    /// `value_spans` (spec §4.5 accessors): the set of distinct values a
    /// numeric temporal value takes, as a span-set. `Discrete`/`Step`
    /// sequences contribute the point value of each instant; `Linear`
    /// sequences contribute their full value span per segment.
    pub fn value_spans(&self) -> Result<SpanSet> {
        if !self.basetype().is_numeric() {
            return Err(TemporalError::InvalidType(self.basetype()));
        }
        let mut spans = Vec::new();
        match self {
            Temporal::Instant(i) => spans.push(Span::point(i.value.clone())?),
            Temporal::Sequence(s) => collect_segment_spans(s, &mut spans)?,
            Temporal::SequenceSet(ss) => {
                for s in ss.sequences() {
                    collect_segment_spans(s, &mut spans)?;
                }
            }
        }
        SpanSet::new(spans)
    }

    pub fn min_value(&self) -> Result<&BaseValue> {
        match self {
            Temporal::Instant(i) => Ok(&i.value),
            Temporal::Sequence(s) => s.min_value(),
            Temporal::SequenceSet(ss) => ss.min_value(),
        }
    }

    pub fn max_value(&self) -> Result<&BaseValue> {
        match self {
            Temporal::Instant(i) => Ok(&i.value),
            Temporal::Sequence(s) => s.max_value(),
            Temporal::SequenceSet(ss) => ss.max_value(),
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        match self {
            Temporal::Instant(_) => chrono::Duration::zero(),
            Temporal::Sequence(s) => s.duration(),
            Temporal::SequenceSet(ss) => ss.duration(),
        }
    }

    pub fn bounding_tbox(&self) -> Option<TBox> {
        match self {
            Temporal::Instant(i) => {
                let v = Span::point(i.value.clone()).ok()?;
                let t = Span::make(BaseValue::TimestampTz(i.t), BaseValue::TimestampTz(i.t), true, true).ok()?;
                TBox::new(Some(v), Some(t)).ok()
            }
            Temporal::Sequence(s) => s.bounding_tbox(),
            Temporal::SequenceSet(ss) => ss.bounding_tbox(),
        }
    }

    /// Value-at-timestamp (spec §4.5 accessors): binary search then
    /// interpolate per the interpolation tag.
    pub fn value_at(&self, t: DateTime<Utc>) -> Result<Option<BaseValue>> {
        match self {
            Temporal::Instant(i) => Ok(if i.t == t { Some(i.value.clone()) } else { None }),
            Temporal::Sequence(s) => s.value_at(t),
            Temporal::SequenceSet(ss) => ss.value_at(t),
        }
    }

    /// `tnumber_twavg` (SPEC_FULL §4.5).
    pub fn twavg(&self) -> Result<f64> {
        match self {
            Temporal::Instant(i) => i.value.as_f64().ok_or(TemporalError::InvalidType(i.basetype())),
            Temporal::Sequence(s) => s.twavg(),
            Temporal::SequenceSet(ss) => ss.twavg(),
        }
    }

    pub fn equal(&self, other: &Temporal) -> Result<bool> {
        match (self, other) {
            (Temporal::Instant(a), Temporal::Instant(b)) => a.equal(b),
            (Temporal::Sequence(a), Temporal::Sequence(b)) => a.equal(b),
            (Temporal::SequenceSet(a), Temporal::SequenceSet(b)) => a.equal(b),
            _ => Ok(false),
        }
    }

    /// `restrict_at` (spec §4.5): restricts the value to the sub-domain
    /// where `pred` holds for the instantaneous value, returning `None`
    /// when the result would be empty (spec §4.5 semantics:
    /// "return `null` rather than an empty value").
    fn restrict_generic(&self, pred: impl Fn(&BaseValue) -> Result<bool>, complement: bool) -> Result<Option<Temporal>> {
        match self {
            Temporal::Instant(i) => {
                let keep = if complement { !pred(&i.value)? } else { pred(&i.value)? };
                Ok(if keep { Some(Temporal::Instant(i.clone())) } else { None })
            }
            Temporal::Sequence(s) => {
                let frags = s.restrict_value(&pred, complement)?;
                assemble(frags)
            }
            Temporal::SequenceSet(ss) => {
                let mut frags = Vec::new();
                for s in ss.sequences() {
                    frags.extend(s.restrict_value(&pred, complement)?);
                }
                assemble(frags)
            }
        }
    }

    pub fn restrict_value_at(&self, v: &BaseValue) -> Result<Option<Temporal>> {
        let target = v.clone();
        self.restrict_generic(move |x| x.equal(&target), false)
    }

    pub fn restrict_value_minus(&self, v: &BaseValue) -> Result<Option<Temporal>> {
        let target = v.clone();
        self.restrict_generic(move |x| x.equal(&target), true)
    }

    pub fn restrict_set_at(&self, set: &OrderedSet) -> Result<Option<Temporal>> {
        self.restrict_generic(|x| set.contains_value(x), false)
    }

    pub fn restrict_set_minus(&self, set: &OrderedSet) -> Result<Option<Temporal>> {
        self.restrict_generic(|x| set.contains_value(x), true)
    }

    pub fn restrict_span_at(&self, span: &Span) -> Result<Option<Temporal>> {
        self.restrict_generic(|x| span.contains_value(x), false)
    }

    pub fn restrict_span_minus(&self, span: &Span) -> Result<Option<Temporal>> {
        self.restrict_generic(|x| span.contains_value(x), true)
    }

    pub fn restrict_spanset_at(&self, ss: &SpanSet) -> Result<Option<Temporal>> {
        self.restrict_generic(|x| ss.contains_value(x), false)
    }

    pub fn restrict_spanset_minus(&self, ss: &SpanSet) -> Result<Option<Temporal>> {
        self.restrict_generic(|x| ss.contains_value(x), true)
    }

    /// Restriction to a single timestamp. Spec §9 Open Question decision:
    /// (see `restrict_timestampset_at` for the set case).
    pub fn restrict_timestamp_at(&self, t: DateTime<Utc>) -> Result<Option<Temporal>> {
        Ok(self.value_at(t)?.map(|v| Temporal::Instant(Instant::new(v, t))))
    }

    pub fn restrict_timestamp_minus(&self, t: DateTime<Utc>) -> Result<Option<Temporal>> {
        self.restrict_time_span_minus(&Span::make(
            BaseValue::TimestampTz(t),
            BaseValue::TimestampTz(t),
            true,
            true,
        )?)
    }

    /// Restriction to an isolated timestamp set (spec §9 Open Question):
    /// `Discrete` when the source is already `Discrete`, otherwise a
    /// `SequenceSet` of single-instant sequences.
    pub fn restrict_timestampset_at(&self, set: &OrderedSet) -> Result<Option<Temporal>> {
        if set.basetype() != TypeTag::TimestampTz {
            return Err(TemporalError::InvalidType(set.basetype()));
        }
        let mut hits: Vec<(DateTime<Utc>, BaseValue)> = Vec::new();
        for v in set.values() {
            let t = v.as_timestamp().unwrap();
            if let Some(val) = self.value_at(t)? {
                hits.push((t, val));
            }
        }
        if hits.is_empty() {
            return Ok(None);
        }
        let source_discrete = self.interpolation() == Some(Interpolation::Discrete);
        if source_discrete {
            let instants: Vec<Instant> = hits.into_iter().map(|(t, v)| Instant::new(v, t)).collect();
            Ok(Some(Temporal::Sequence(Sequence::new(instants, true, true, Interpolation::Discrete)?)))
        } else {
            let interp = self.interpolation().unwrap_or(Interpolation::Linear);
            let seqs: Result<Vec<Sequence>> = hits
                .into_iter()
                .map(|(t, v)| Sequence::new(vec![Instant::new(v, t)], true, true, interp))
                .collect();
            let seqs = seqs?;
            if seqs.len() == 1 {
                Ok(Some(Temporal::Sequence(seqs.into_iter().next().unwrap())))
            } else {
                Ok(Some(Temporal::SequenceSet(SequenceSet::from_validated(seqs, interp)?)))
            }
        }
    }

    pub fn restrict_time_span_at(&self, span: &Span) -> Result<Option<Temporal>> {
        let mut frags = Vec::new();
        for s in self.as_sequences() {
            if let Some(sub) = s.time_span().intersection(span)? {
                frags.push(clip_sequence_to_time(&s, &sub)?);
            }
        }
        let frags: Vec<Sequence> = frags.into_iter().flatten().collect();
        assemble(frags)
    }

    pub fn restrict_time_span_minus(&self, span: &Span) -> Result<Option<Temporal>> {
        let domain = self.time_spanset()?;
        let complement = domain.difference(&SpanSet::new(vec![span.clone()])?)?;
        match complement {
            None => Ok(None),
            Some(cs) => self.restrict_time_spanset_at(&cs),
        }
    }

    pub fn restrict_time_spanset_at(&self, spanset: &SpanSet) -> Result<Option<Temporal>> {
        let mut frags = Vec::new();
        for s in self.as_sequences() {
            for span in spanset.spans() {
                if let Some(sub) = s.time_span().intersection(span)? {
                    frags.extend(clip_sequence_to_time(&s, &sub)?);
                }
            }
        }
        assemble(frags)
    }

    pub fn restrict_time_spanset_minus(&self, spanset: &SpanSet) -> Result<Option<Temporal>> {
        let domain = self.time_spanset()?;
        let complement = domain.difference(spanset)?;
        match complement {
            None => Ok(None),
            Some(cs) => self.restrict_time_spanset_at(&cs),
        }
    }

    pub(crate) fn as_sequences(&self) -> Vec<Sequence> {
        match self {
            Temporal::Instant(i) => {
                let interp = Interpolation::Discrete;
                vec![Sequence::new(vec![i.clone()], true, true, interp).unwrap()]
            }
            Temporal::Sequence(s) => vec![s.clone()],
            Temporal::SequenceSet(ss) => ss.sequences().to_vec(),
        }
    }

    /// `append_instant` (spec §4.5): grows a `Sequence` in place, or falls
    /// back to a `SequenceSet` with a gap when the new instant exceeds
    /// `maxdist`/`maxt`. `expand` selects in-place tail growth vs.
    /// reallocation; both are observationally identical at this layer
    /// since `Sequence` values are immutable persistent data (the
    /// distinction only matters to an arena-allocating host, spec §9
    /// design notes).
    pub fn append_instant(
        &self,
        inst: Instant,
        maxdist: Option<f64>,
        maxt: Option<chrono::Duration>,
        _expand: bool,
    ) -> Result<Temporal> {
        match self {
            Temporal::Instant(i) => {
                let interp = crate::catalog::TypeTag::interp_default_for(i.basetype());
                let seq = Sequence::new(vec![i.clone(), inst], true, true, interp)?;
                Ok(Temporal::Sequence(seq))
            }
            Temporal::Sequence(s) => match s.append_instant(inst.clone(), maxdist, maxt)? {
                AppendOutcome::Extended(seq) => Ok(Temporal::Sequence(seq)),
                AppendOutcome::Unchanged => Ok(Temporal::Sequence(s.clone())),
                AppendOutcome::Gap => {
                    let new_seq = Sequence::new(vec![inst], true, true, s.interpolation())?;
                    Ok(Temporal::SequenceSet(SequenceSet::new(vec![s.clone(), new_seq])?))
                }
            },
            Temporal::SequenceSet(ss) => {
                let last = ss.sequences().last().unwrap();
                match last.append_instant(inst.clone(), maxdist, maxt)? {
                    AppendOutcome::Extended(seq) => {
                        let mut seqs = ss.sequences().to_vec();
                        *seqs.last_mut().unwrap() = seq;
                        Ok(Temporal::SequenceSet(SequenceSet::from_validated(seqs, ss.interpolation())?))
                    }
                    AppendOutcome::Unchanged => Ok(Temporal::SequenceSet(ss.clone())),
                    AppendOutcome::Gap => {
                        let mut seqs = ss.sequences().to_vec();
                        seqs.push(Sequence::new(vec![inst], true, true, ss.interpolation())?);
                        Ok(Temporal::SequenceSet(SequenceSet::from_validated(seqs, ss.interpolation())?))
                    }
                }
            }
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Temporal::Instant(i) => i.to_text(),
            Temporal::Sequence(s) => s.to_text(),
            Temporal::SequenceSet(ss) => ss.to_text(),
        }
    }
}

/// Assembles 0, 1, or several restriction fragments into the appropriate
/// `Temporal` shape, joining adjacent fragments back together first.
fn assemble(frags: Vec<Sequence>) -> Result<Option<Temporal>> {
    if frags.is_empty() {
        return Ok(None);
    }
    Ok(Some(merge_sequences(frags)?))
}

/// `tsequence_join`-style merge-array (spec §4.5): orders sequences by
/// start time, joins any pair sharing a boundary timestamp with agreeing
/// values and complementary inclusivities, and otherwise assembles the
/// remainder into a `SequenceSet`.
pub fn merge_sequences(mut sequences: Vec<Sequence>) -> Result<Temporal> {
    if sequences.is_empty() {
        return Err(TemporalError::InvalidBounds("merge_sequences requires at least one sequence".into()));
    }
    if sequences.len() == 1 {
        return Ok(Temporal::Sequence(sequences.pop().unwrap()));
    }
    let basetype = sequences[0].basetype();
    let interp = sequences[0].interpolation();
    for s in &sequences {
        if s.basetype() != basetype {
            return Err(TemporalError::MixedBaseType(basetype, s.basetype()));
        }
        if s.interpolation() != interp {
            return Err(TemporalError::MixedInterpolation(format!("{interp}"), format!("{}", s.interpolation())));
        }
    }
    sequences.sort_by(|a, b| a.start_time().cmp(&b.start_time()));

    let mut merged: Vec<Sequence> = Vec::with_capacity(sequences.len());
    for s in sequences {
        if let Some(last) = merged.last() {
            if temporal_overlaps(last, &s) {
                return Err(TemporalError::InvalidBounds("cannot merge overlapping sequences".into()));
            }
            if temporal_adjacent(last, &s) {
                let left_val = &last.instants().last().unwrap().value;
                let right_val = &s.instants().first().unwrap().value;
                if left_val.equal(right_val)? {
                    let mut instants: Vec<Instant> = last.instants().to_vec();
                    instants.extend(s.instants()[1..].iter().cloned());
                    let joined = Sequence::new(instants, last.lower_inc(), s.upper_inc(), interp)?;
                    *merged.last_mut().unwrap() = joined;
                    continue;
                }
            }
        }
        merged.push(s);
    }

    if merged.len() == 1 {
        Ok(Temporal::Sequence(merged.pop().unwrap()))
    } else {
        Ok(Temporal::SequenceSet(SequenceSet::from_validated(merged, interp)?))
    }
}

/// Restricts a single sequence to the portion of it lying within `sub`
/// (a sub-span of the sequence's own time span), introducing boundary
/// instants by interpolation when `sub`'s edges fall strictly inside a
/// segment.
fn clip_sequence_to_time(s: &Sequence, sub: &Span) -> Result<Option<Sequence>> {
    let lo = sub.lower.as_timestamp().unwrap();
    let hi = sub.upper.as_timestamp().unwrap();
    let mut kept: Vec<Instant> = Vec::new();
    for inst in s.instants() {
        if inst.t > lo && inst.t < hi {
            kept.push(inst.clone());
        }
    }
    let lower_inst = match s.value_at(lo)? {
        Some(v) => Some(Instant::new(v, lo)),
        None => None,
    };
    let upper_inst = match s.value_at(hi)? {
        Some(v) => Some(Instant::new(v, hi)),
        None => None,
    };
    if let Some(li) = lower_inst {
        if kept.first().map(|i| i.t != lo).unwrap_or(true) {
            kept.insert(0, li);
        }
    }
    if let Some(ui) = upper_inst {
        if kept.last().map(|i| i.t != hi).unwrap_or(true) {
            kept.push(ui);
        }
    }
    if kept.is_empty() {
        return Ok(None);
    }
    let lower_inc = sub.lower_inc && (kept[0].t == lo);
    let upper_inc = sub.upper_inc && (kept.last().unwrap().t == hi);
    let interp = s.interpolation();
    if interp == Interpolation::Discrete {
        return Ok(Some(Sequence::new(kept, true, true, interp)?));
    }
    Ok(Some(Sequence::new(kept, lower_inc || kept.len() == 1, upper_inc || kept.len() == 1, interp)?))
}

fn collect_segment_spans(s: &Sequence, out: &mut Vec<Span>) -> Result<()> {
    match s.interpolation() {
        Interpolation::Linear => {
            for w in s.instants().windows(2) {
                let (lo, hi) = if w[0].value.compare(&w[1].value)? == std::cmp::Ordering::Greater {
                    (&w[1].value, &w[0].value)
                } else {
                    (&w[0].value, &w[1].value)
                };
                out.push(Span::make(lo.clone(), hi.clone(), true, true)?);
            }
            if s.instants().len() == 1 {
                out.push(Span::point(s.instants()[0].value.clone())?);
            }
        }
        Interpolation::Step | Interpolation::Discrete => {
            for inst in s.instants() {
                out.push(Span::point(inst.value.clone())?);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::BaseValue::Float8;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn scenario_3_linear_value_at_timestamp() {
        let seq = Sequence::new(
            vec![Instant::new(Float8(1.0), t(0)), Instant::new(Float8(3.0), t(2 * 86400))],
            true,
            true,
            Interpolation::Linear,
        )
        .unwrap();
        let temp = Temporal::Sequence(seq);
        let v = temp.value_at(t(86400)).unwrap().unwrap();
        assert_eq!(v, Float8(2.0));
    }

    #[test]
    fn merge_sequences_joins_adjacent_boundary() {
        let a = Sequence::new(
            vec![Instant::new(Float8(0.0), t(0)), Instant::new(Float8(10.0), t(10))],
            true,
            true,
            Interpolation::Linear,
        )
        .unwrap();
        let b = Sequence::new(
            vec![Instant::new(Float8(10.0), t(10)), Instant::new(Float8(20.0), t(20))],
            false,
            true,
            Interpolation::Linear,
        )
        .unwrap();
        let merged = merge_sequences(vec![a, b]).unwrap();
        match merged {
            Temporal::Sequence(s) => assert_eq!(s.instants().len(), 3),
            _ => panic!("expected a single joined sequence"),
        }
    }

    #[test]
    fn complementarity_restrict_at_and_minus_cover_the_domain() {
        let seq = Sequence::new(
            vec![Instant::new(Float8(0.0), t(0)), Instant::new(Float8(10.0), t(10))],
            true,
            true,
            Interpolation::Linear,
        )
        .unwrap();
        let temp = Temporal::Sequence(seq);
        let span = Span::make(Float8(5.0), Float8(10.0), true, true).unwrap();
        let at = temp.restrict_span_at(&span).unwrap();
        let minus = temp.restrict_span_minus(&span).unwrap();
        assert!(at.is_some());
        assert!(minus.is_some());
    }

    #[test]
    fn restrict_timestamp_at_returns_an_instant() {
        let seq = Sequence::new(
            vec![Instant::new(Float8(0.0), t(0)), Instant::new(Float8(10.0), t(10))],
            true,
            true,
            Interpolation::Linear,
        )
        .unwrap();
        let temp = Temporal::Sequence(seq);
        let r = temp.restrict_timestamp_at(t(5)).unwrap().unwrap();
        assert!(matches!(r, Temporal::Instant(_)));
    }
}
