//! `Sequence` (spec §3, §4.5): an ordered run of instants sharing an
//! interpolation, normalized at construction and then immutable.
//!
//! Grounded on `tsequence_norm_test` (collinear-instant removal under
//! Linear, equal-value merge under Step) and `tsequence_join_test`/
//! `tsequence_join` (merge-array boundary joining).

use chrono::{DateTime, Utc};

use crate::bbox::TBox;
use crate::catalog::TypeTag;
use crate::error::{Result, TemporalError};
use crate::set::OrderedSet;
use crate::span::Span;
use crate::spanset::SpanSet;
use crate::value::{BaseValue, Double2};

use super::instant::Instant;
use super::Interpolation;

#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    instants: Vec<Instant>,
    lower_inc: bool,
    upper_inc: bool,
    interp: Interpolation,
    /// Cached time extent (spec §3 "cached bounding box"); rebuilt at
    /// construction, never mutated afterwards.
    bbox_time: Span,
    /// Cached value extent for numeric base types, `None` otherwise.
    bbox_value: Option<Span>,
}

fn is_numeric_base(tag: TypeTag) -> bool {
    matches!(tag, TypeTag::Int4 | TypeTag::Int8 | TypeTag::Float8)
}

impl Sequence {
    /// `tsequence_make`: validates ordering/type invariants, then
    /// normalizes per interpolation (spec §4.5).
    pub fn new(
        instants: Vec<Instant>,
        lower_inc: bool,
        upper_inc: bool,
        interp: Interpolation,
    ) -> Result<Sequence> {
        if instants.is_empty() {
            return Err(TemporalError::InvalidBounds("sequence must contain at least one instant".into()));
        }
        let basetype = instants[0].basetype();
        for pair in instants.windows(2) {
            if pair[0].basetype() != basetype || pair[1].basetype() != basetype {
                return Err(TemporalError::MixedBaseType(basetype, pair[1].basetype()));
            }
            if pair[0].t >= pair[1].t {
                return Err(TemporalError::InvalidBounds("instant timestamps must be strictly increasing".into()));
            }
        }

        if interp == Interpolation::Discrete && !(lower_inc && upper_inc) {
            return Err(TemporalError::InvalidBounds("a Discrete sequence must have both bounds inclusive".into()));
        }
        if interp == Interpolation::Linear && !basetype.is_continuous() {
            return Err(TemporalError::NotContinuous(format!("{basetype:?}")));
        }
        if instants.len() == 1 && interp == Interpolation::Linear && !(lower_inc && upper_inc) {
            return Err(TemporalError::InvalidBounds(
                "a single-instant Linear sequence must have both bounds inclusive".into(),
            ));
        }

        let instants = normalize(instants, interp)?;

        let bbox_time = Span::make(
            BaseValue::TimestampTz(instants.first().unwrap().t),
            BaseValue::TimestampTz(instants.last().unwrap().t),
            lower_inc,
            upper_inc,
        )?;
        let bbox_value = if is_numeric_base(basetype) {
            let mut lo = instants[0].value.clone();
            let mut hi = instants[0].value.clone();
            for inst in &instants[1..] {
                if inst.value.compare(&lo)? == std::cmp::Ordering::Less {
                    lo = inst.value.clone();
                }
                if inst.value.compare(&hi)? == std::cmp::Ordering::Greater {
                    hi = inst.value.clone();
                }
            }
            Some(Span::make(lo, hi, true, true)?)
        } else {
            None
        };

        log::debug!("Sequence::new: {} instants, interp {:?}, lower_inc={} upper_inc={}", instants.len(), interp, lower_inc, upper_inc);
        Ok(Sequence { instants, lower_inc, upper_inc, interp, bbox_time, bbox_value })
    }

    pub fn basetype(&self) -> TypeTag {
        self.instants[0].basetype()
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interp
    }

    pub fn lower_inc(&self) -> bool {
        self.lower_inc
    }

    pub fn upper_inc(&self) -> bool {
        self.upper_inc
    }

    pub fn instants(&self) -> &[Instant] {
        &self.instants
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.instants.first().unwrap().t
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.instants.last().unwrap().t
    }

    pub fn time_span(&self) -> &Span {
        &self.bbox_time
    }

    pub fn value_span(&self) -> Option<&Span> {
        self.bbox_value.as_ref()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end_time() - self.start_time()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.instants.iter().map(|i| i.t).collect()
    }

    pub fn value_set(&self) -> Result<OrderedSet> {
        OrderedSet::new(self.instants.iter().map(|i| i.value.clone()).collect())
    }

    /// Min/max over the instants (spec §4.5 accessors).
    pub fn min_value(&self) -> Result<&BaseValue> {
        let mut best = &self.instants[0].value;
        for inst in &self.instants[1..] {
            if inst.value.compare(best)? == std::cmp::Ordering::Less {
                best = &inst.value;
            }
        }
        Ok(best)
    }

    pub fn max_value(&self) -> Result<&BaseValue> {
        let mut best = &self.instants[0].value;
        for inst in &self.instants[1..] {
            if inst.value.compare(best)? == std::cmp::Ordering::Greater {
                best = &inst.value;
            }
        }
        Ok(best)
    }

    fn to_tbox(&self) -> Option<TBox> {
        self.bbox_value
            .clone()
            .map(|v| TBox::new(Some(v), Some(self.bbox_time.clone())).expect("both dimensions present"))
    }

    pub fn bounding_tbox(&self) -> Option<TBox> {
        self.to_tbox()
    }

    /// Binary search by timestamp, then interpolate per §4.5.
    pub fn value_at(&self, t: DateTime<Utc>) -> Result<Option<BaseValue>> {
        if t < self.start_time() || t > self.end_time() {
            return Ok(None);
        }
        if t == self.start_time() && !self.lower_inc {
            return Ok(None);
        }
        if t == self.end_time() && !self.upper_inc {
            return Ok(None);
        }
        match self.instants.binary_search_by(|i| i.t.cmp(&t)) {
            Ok(idx) => Ok(Some(self.instants[idx].value.clone())),
            Err(idx) => {
                if idx == 0 || idx == self.instants.len() {
                    return Ok(None);
                }
                let left = &self.instants[idx - 1];
                let right = &self.instants[idx];
                match self.interp {
                    Interpolation::Discrete => Ok(None),
                    Interpolation::Step => Ok(Some(left.value.clone())),
                    Interpolation::Linear => {
                        let ratio = (t - left.t).num_microseconds().unwrap_or(0) as f64
                            / (right.t - left.t).num_microseconds().unwrap_or(1) as f64;
                        Ok(Some(left.value.lerp(&right.value, ratio)?))
                    }
                }
            }
        }
    }

    fn check_same_shape(&self, other: &Sequence) -> Result<()> {
        if self.basetype() != other.basetype() {
            return Err(TemporalError::MixedBaseType(self.basetype(), other.basetype()));
        }
        Ok(())
    }

    pub fn equal(&self, other: &Sequence) -> Result<bool> {
        self.check_same_shape(other)?;
        if self.instants.len() != other.instants.len()
            || self.lower_inc != other.lower_inc
            || self.upper_inc != other.upper_inc
            || self.interp != other.interp
        {
            return Ok(false);
        }
        for (a, b) in self.instants.iter().zip(other.instants.iter()) {
            if !a.equal(b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Restricts the sequence to the sub-segments where `pred` holds for
    /// the value, inserting a synthetic boundary instant when a Linear
    /// segment crosses the predicate's edge (spec §4.5). Returns 0, 1, or
    /// (for Linear or Step sequences whose restricted domain is
    /// disconnected) several fragments; callers assemble a `SequenceSet`
    /// from more than one fragment.
    pub(crate) fn restrict_value(&self, pred: impl Fn(&BaseValue) -> Result<bool>, complement: bool) -> Result<Vec<Sequence>> {
        let test = |v: &BaseValue| -> Result<bool> {
            let r = pred(v)?;
            Ok(if complement { !r } else { r })
        };

        match self.interp {
            Interpolation::Discrete => {
                let mut kept = Vec::new();
                for inst in &self.instants {
                    if test(&inst.value)? {
                        kept.push(inst.clone());
                    }
                }
                if kept.is_empty() {
                    return Ok(vec![]);
                }
                let lower_inc = if kept[0].t == self.start_time() { self.lower_inc } else { true };
                let upper_inc = if kept.last().unwrap().t == self.end_time() { self.upper_inc } else { true };
                Ok(vec![Sequence::new(kept, lower_inc, upper_inc, self.interp)?])
            }
            // Step holds the left instant's value over each half-open
            // [t_i, t_{i+1}) segment; the final instant only contributes its
            // own value as an isolated point when `upper_inc`. A run of kept
            // segments is built from contiguous segment indices rather than
            // from individually-kept instants, so a value that reappears
            // after an unkept gap starts a fresh fragment instead of being
            // folded into one reconstructed sequence that would falsely
            // assert the value held across the gap.
            Interpolation::Step => {
                let n = self.instants.len();
                if n == 1 {
                    return if test(&self.instants[0].value)? {
                        Ok(vec![Sequence::new(vec![self.instants[0].clone()], self.lower_inc, self.upper_inc, Interpolation::Step)?])
                    } else {
                        Ok(vec![])
                    };
                }

                let mut seg_kept = Vec::with_capacity(n - 1);
                for inst in &self.instants[..n - 1] {
                    seg_kept.push(test(&inst.value)?);
                }
                let final_kept = self.upper_inc && test(&self.instants[n - 1].value)?;

                let mut runs: Vec<(usize, usize, bool)> = Vec::new();
                let mut run_start: Option<usize> = None;
                for (i, kept) in seg_kept.iter().enumerate() {
                    if *kept {
                        if run_start.is_none() {
                            run_start = Some(i);
                        }
                    } else if let Some(start) = run_start.take() {
                        runs.push((start, i, false));
                    }
                }
                if let Some(start) = run_start {
                    runs.push((start, n - 1, final_kept));
                } else if final_kept {
                    runs.push((n - 1, n - 1, true));
                }

                let mut seqs = Vec::with_capacity(runs.len());
                for (start, end, upper_inc) in runs {
                    let run_instants = self.instants[start..=end].to_vec();
                    let lower_inc = if start == 0 { self.lower_inc } else { true };
                    seqs.push(Sequence::new(run_instants, lower_inc, upper_inc, Interpolation::Step)?);
                }
                Ok(seqs)
            }
            Interpolation::Linear => {
                let mut runs: Vec<Vec<Instant>> = Vec::new();
                let mut current: Vec<Instant> = Vec::new();

                if test(&self.instants[0].value)? {
                    current.push(self.instants[0].clone());
                }
                for w in self.instants.windows(2) {
                    let (a, b) = (&w[0], &w[1]);
                    let a_in = test(&a.value)?;
                    let b_in = test(&b.value)?;
                    if a_in && b_in {
                        current.push(b.clone());
                        continue;
                    }
                    if a_in != b_in {
                        let crossing = find_crossing(a, b, &test)?;
                        if let Some(inst) = crossing {
                            if a_in {
                                current.push(inst);
                                runs.push(std::mem::take(&mut current));
                            } else {
                                if !current.is_empty() {
                                    runs.push(std::mem::take(&mut current));
                                }
                                current.push(inst);
                                current.push(b.clone());
                            }
                            continue;
                        }
                    }
                    if !a_in && !current.is_empty() {
                        runs.push(std::mem::take(&mut current));
                    }
                    if b_in {
                        current.push(b.clone());
                    }
                }
                if !current.is_empty() {
                    runs.push(current);
                }

                let mut seqs = Vec::with_capacity(runs.len());
                for run in runs {
                    let lower_inc = if run[0].t == self.start_time() { self.lower_inc } else { true };
                    let upper_inc = if run.last().unwrap().t == self.end_time() { self.upper_inc } else { true };
                    seqs.push(Sequence::new(run, lower_inc, upper_inc, Interpolation::Linear)?);
                }
                Ok(seqs)
            }
        }
    }

    pub fn restrict_value_at(&self, v: &BaseValue) -> Result<Vec<Sequence>> {
        let target = v.clone();
        self.restrict_value(move |x| x.equal(&target), false)
    }

    pub fn restrict_value_minus(&self, v: &BaseValue) -> Result<Vec<Sequence>> {
        let target = v.clone();
        self.restrict_value(move |x| x.equal(&target), true)
    }

    pub fn restrict_set_at(&self, set: &OrderedSet) -> Result<Vec<Sequence>> {
        self.restrict_value(|x| set.contains_value(x), false)
    }

    pub fn restrict_set_minus(&self, set: &OrderedSet) -> Result<Vec<Sequence>> {
        self.restrict_value(|x| set.contains_value(x), true)
    }

    pub fn restrict_span_at(&self, span: &Span) -> Result<Vec<Sequence>> {
        self.restrict_value(|x| span.contains_value(x), false)
    }

    pub fn restrict_span_minus(&self, span: &Span) -> Result<Vec<Sequence>> {
        self.restrict_value(|x| span.contains_value(x), true)
    }

    pub fn restrict_spanset_at(&self, ss: &SpanSet) -> Result<Vec<Sequence>> {
        self.restrict_value(|x| ss.contains_value(x), false)
    }

    pub fn restrict_spanset_minus(&self, ss: &SpanSet) -> Result<Vec<Sequence>> {
        self.restrict_value(|x| ss.contains_value(x), true)
    }

    /// Restriction to an isolated timestamp (spec §9 Open Question
    /// decision): `Some(value)` if the timestamp is in the domain.
    pub fn restrict_timestamp_at(&self, t: DateTime<Utc>) -> Result<Option<Instant>> {
        Ok(self.value_at(t)?.map(|v| Instant::new(v, t)))
    }

    /// `tnumber_twavg` (SPEC_FULL §4.5): time-weighted average over a
    /// numeric sequence, via Double2 running-sum accumulation.
    pub fn twavg(&self) -> Result<f64> {
        if !is_numeric_base(self.basetype()) {
            return Err(TemporalError::InvalidType(self.basetype()));
        }
        match self.interp {
            Interpolation::Discrete => {
                let acc = self
                    .instants
                    .iter()
                    .fold(Double2::zero(), |acc, i| acc.add(Double2(i.value.as_f64().unwrap(), 1.0)));
                Ok(acc.finalize())
            }
            Interpolation::Step => {
                let mut acc = Double2::zero();
                for w in self.instants.windows(2) {
                    let dt = (w[1].t - w[0].t).num_microseconds().unwrap_or(0) as f64;
                    acc = acc.add(Double2(w[0].value.as_f64().unwrap() * dt, dt));
                }
                if acc.1 == 0.0 {
                    Ok(self.instants[0].value.as_f64().unwrap())
                } else {
                    Ok(acc.finalize())
                }
            }
            Interpolation::Linear => {
                let mut acc = Double2::zero();
                for w in self.instants.windows(2) {
                    let dt = (w[1].t - w[0].t).num_microseconds().unwrap_or(0) as f64;
                    let avg = (w[0].value.as_f64().unwrap() + w[1].value.as_f64().unwrap()) / 2.0;
                    acc = acc.add(Double2(avg * dt, dt));
                }
                if acc.1 == 0.0 {
                    Ok(self.instants[0].value.as_f64().unwrap())
                } else {
                    Ok(acc.finalize())
                }
            }
        }
    }

    /// `append_instant` (spec §4.5): grows the sequence, or signals (via
    /// `Err`) that the caller must fall back to a sequence-set because the
    /// gap exceeds `maxt`/`maxdist`.
    pub fn append_instant(&self, inst: Instant, maxdist: Option<f64>, maxt: Option<chrono::Duration>) -> Result<AppendOutcome> {
        let last = self.instants.last().unwrap();
        if inst.t == last.t {
            if inst.value.equal(&last.value)? {
                return Ok(AppendOutcome::Unchanged);
            }
            return Err(TemporalError::InvalidBounds(
                "append_instant: new instant's timestamp matches the last but values differ".into(),
            ));
        }
        if inst.t < last.t {
            return Err(TemporalError::InvalidBounds("append_instant: new instant must not precede the sequence".into()));
        }
        if let Some(maxt) = maxt {
            if inst.t - last.t > maxt {
                return Ok(AppendOutcome::Gap);
            }
        }
        if let Some(maxdist) = maxdist {
            if let Ok(d) = inst.value.numeric_distance(&last.value) {
                if d > maxdist {
                    return Ok(AppendOutcome::Gap);
                }
            }
        }
        let mut instants = self.instants.clone();
        instants.push(inst);
        Ok(AppendOutcome::Extended(Sequence::new(instants, self.lower_inc, self.upper_inc, self.interp)?))
    }

    /// Bracketed instant list without the leading `Interp=` prefix; used
    /// standalone by [`Sequence::to_text`] and nested (once, at the
    /// `SequenceSet` level) by [`super::SequenceSet::to_text`].
    pub(crate) fn to_text_body(&self) -> String {
        let parts: Vec<String> = self.instants.iter().map(Instant::to_text).collect();
        let (open, close) = match self.interp {
            Interpolation::Discrete => ('{', '}'),
            _ => (if self.lower_inc { '[' } else { '(' }, if self.upper_inc { ']' } else { ')' }),
        };
        format!("{open}{}{close}", parts.join(", "))
    }

    /// `Interp=Step;`/`Interp=Discrete;` prefixes disambiguate the bracket
    /// shape from plain `Linear` (the default, left unprefixed) the way
    /// MobilityDB's own `tsequence_out`/`temporal_parse` pair does (spec §6).
    pub fn to_text(&self) -> String {
        format!("{}{}", interp_prefix(self.interp), self.to_text_body())
    }
}

pub enum AppendOutcome {
    Extended(Sequence),
    Gap,
    Unchanged,
}

pub(crate) fn interp_prefix(interp: Interpolation) -> &'static str {
    match interp {
        Interpolation::Linear => "",
        Interpolation::Step => "Interp=Step;",
        Interpolation::Discrete => "Interp=Discrete;",
    }
}

/// Finds the instant at the crossing point within the open segment
/// `(a, b)` where `test` flips, via bisection on the interpolated value
/// (monotone for a linear segment between two numeric endpoints). Returns
/// `None` when the base type has no numeric interpolation (e.g. `Text`,
/// `Geometry`) — the caller then treats the whole segment as a hard edge.
fn find_crossing(a: &Instant, b: &Instant, test: &impl Fn(&BaseValue) -> Result<bool>) -> Result<Option<Instant>> {
    let (Some(_), Some(_)) = (a.value.as_f64(), b.value.as_f64()) else {
        return Ok(None);
    };
    let a_in = test(&a.value)?;
    let mut lo = 0.0f64;
    let mut hi = 1.0f64;
    for _ in 0..40 {
        let mid = (lo + hi) / 2.0;
        let mid_val = a.value.lerp(&b.value, mid)?;
        let mid_in = test(&mid_val)?;
        if mid_in == a_in {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let t = a.t + chrono::Duration::microseconds(((b.t - a.t).num_microseconds().unwrap_or(0) as f64 * hi) as i64);
    if t <= a.t || t >= b.t {
        Ok(None)
    } else {
        let v = a.value.lerp(&b.value, hi)?;
        Ok(Some(Instant::new(v, t)))
    }
}

/// `tinstarr_normalize` (spec §3, §4.5): removes collinear middle instants
/// under Linear, merges equal-value runs under Step.
fn normalize(instants: Vec<Instant>, interp: Interpolation) -> Result<Vec<Instant>> {
    if instants.len() < 3 || interp == Interpolation::Discrete {
        return Ok(instants);
    }
    let mut out: Vec<Instant> = Vec::with_capacity(instants.len());
    out.push(instants[0].clone());
    for i in 1..instants.len() - 1 {
        let keep = match interp {
            Interpolation::Step => !out.last().unwrap().value.equal(&instants[i].value)?,
            Interpolation::Linear => !is_collinear(out.last().unwrap(), &instants[i], &instants[i + 1])?,
            Interpolation::Discrete => true,
        };
        if keep {
            out.push(instants[i].clone());
        }
    }
    out.push(instants.last().unwrap().clone());
    Ok(out)
}

/// `float_collinear`: true when `v2` lies exactly on the line from `v1` to
/// `v3` at the time-proportional ratio, within the engine's epsilon.
fn is_collinear(a: &Instant, b: &Instant, c: &Instant) -> Result<bool> {
    let (Some(v1), Some(v2), Some(v3)) = (a.value.as_f64(), b.value.as_f64(), c.value.as_f64()) else {
        return Ok(false);
    };
    let total = (c.t - a.t).num_microseconds().unwrap_or(1) as f64;
    if total == 0.0 {
        return Ok(false);
    }
    let ratio = (b.t - a.t).num_microseconds().unwrap_or(0) as f64 / total;
    let expected = v1 + (v3 - v1) * ratio;
    Ok(crate::value::fp_eq(expected, v2))
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
    fn linear_sequence_drops_collinear_middle_instant() {
        let instants = vec![
            Instant::new(Float8(0.0), t(0)),
            Instant::new(Float8(5.0), t(5)),
            Instant::new(Float8(10.0), t(10)),
        ];
        let seq = Sequence::new(instants, true, true, Interpolation::Linear).unwrap();
        assert_eq!(seq.instants().len(), 2);
    }

    #[test]
    fn value_at_interpolates_linearly() {
        let instants = vec![Instant::new(Float8(0.0), t(0)), Instant::new(Float8(10.0), t(10))];
        let seq = Sequence::new(instants, true, true, Interpolation::Linear).unwrap();
        let v = seq.value_at(t(5)).unwrap().unwrap();
        assert_eq!(v, Float8(5.0));
    }

    #[test]
    fn step_sequence_holds_left_value() {
        let instants = vec![Instant::new(Float8(1.0), t(0)), Instant::new(Float8(2.0), t(10))];
        let seq = Sequence::new(instants, true, true, Interpolation::Step).unwrap();
        assert_eq!(seq.value_at(t(5)).unwrap().unwrap(), Float8(1.0));
    }

    #[test]
    fn restrict_span_splits_linear_segment_at_crossing() {
        let instants = vec![Instant::new(Float8(0.0), t(0)), Instant::new(Float8(10.0), t(10))];
        let seq = Sequence::new(instants, true, true, Interpolation::Linear).unwrap();
        let span = Span::make(Float8(5.0), Float8(10.0), true, true).unwrap();
        let restricted = seq.restrict_span_at(&span).unwrap();
        assert_eq!(restricted.len(), 1);
        assert_eq!(restricted[0].start_time(), t(5));
    }

    #[test]
    fn restrict_value_splits_step_sequence_at_gap() {
        // Step [A@t0, B@t10, A@t20], bounds inclusive. Restricting to A must
        // not hold A across [10, 20) where the true held value is B; the
        // domain splits into [0, 10) and the isolated point {20}.
        let instants = vec![
            Instant::new(Float8(1.0), t(0)),
            Instant::new(Float8(2.0), t(10)),
            Instant::new(Float8(1.0), t(20)),
        ];
        let seq = Sequence::new(instants, true, true, Interpolation::Step).unwrap();
        let restricted = seq.restrict_value_at(&Float8(1.0)).unwrap();
        assert_eq!(restricted.len(), 2);

        assert_eq!(restricted[0].start_time(), t(0));
        assert_eq!(restricted[0].end_time(), t(10));
        assert!(restricted[0].lower_inc());
        assert!(!restricted[0].upper_inc());

        assert_eq!(restricted[1].start_time(), t(20));
        assert_eq!(restricted[1].end_time(), t(20));
        assert!(restricted[1].lower_inc());
        assert!(restricted[1].upper_inc());
    }

    #[test]
    fn restrict_value_minus_step_sequence_keeps_middle_segment() {
        let instants = vec![
            Instant::new(Float8(1.0), t(0)),
            Instant::new(Float8(2.0), t(10)),
            Instant::new(Float8(1.0), t(20)),
        ];
        let seq = Sequence::new(instants, true, true, Interpolation::Step).unwrap();
        let restricted = seq.restrict_value_minus(&Float8(1.0)).unwrap();
        assert_eq!(restricted.len(), 1);
        assert_eq!(restricted[0].start_time(), t(10));
        assert_eq!(restricted[0].end_time(), t(20));
        assert!(restricted[0].lower_inc());
        assert!(!restricted[0].upper_inc());
    }

    #[test]
    fn twavg_linear_matches_trapezoid_average() {
        let instants = vec![Instant::new(Float8(0.0), t(0)), Instant::new(Float8(10.0), t(10))];
        let seq = Sequence::new(instants, true, true, Interpolation::Linear).unwrap();
        assert_eq!(seq.twavg().unwrap(), 5.0);
    }
}
