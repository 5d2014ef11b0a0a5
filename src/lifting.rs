//! Lifting engine (spec §4.6): promotes a function over base values to a
//! function over `Temporal` values.
//!
//! Grounded on `original_source/meos/include/temporal/lifting.h`'s
//! `LiftedFunctionInfo` (the `func`/`argtype`/`restype`/`reslinear`/`invert`/
//! `discont`/`tpfn_base`/`tpfn_temp` record) and on
//! `tnumber_mathfuncs.h`'s `tfloat_arithop_turnpt`, which locates the
//! turning-point timestamp(s) where a product, quotient, or distance of two
//! linear segments needs an extra instant to stay exact.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::error::{Result, TemporalError};
use crate::value::BaseValue;

use crate::temporal::{merge_sequences, Instant, Interpolation, Sequence, Temporal};

/// Mirrors `LiftedFunctionInfo`: the parameters `tfunc_temporal_temporal`
/// needs beyond the base function itself.
#[derive(Clone, Copy)]
pub struct LiftInfo {
    /// True when a `Linear`/`Linear` pairing produces a `Linear` result
    /// (`reslinear`).
    pub result_linear: bool,
    /// True when the function has instantaneous discontinuities and the
    /// result must be `Step` even if both inputs are `Linear` (`discont`).
    pub discont: bool,
    /// True if the second argument is division's denominator: the engine
    /// splits the result where it crosses zero instead of treating the
    /// crossing as an ordinary turning point.
    pub division: bool,
    /// Turning-point callback (`tpfn_temp`): given the two segments'
    /// endpoint values `(a0, a1)` and `(b0, b1)`, returns the interior
    /// ratios in `(0, 1)` at which the lifted function has a local extremum.
    pub turning_points: Option<fn(f64, f64, f64, f64) -> Vec<f64>>,
}

/// Unary counterpart (`tpfn_base`-free case): most base functions used here
/// (`abs`, `round`, ...) don't need a turning-point callback unless they are
/// non-monotonic over a `Linear` segment.
#[derive(Clone, Copy)]
pub struct UnaryLiftInfo {
    pub result_linear: bool,
    pub turning_points: Option<fn(f64, f64) -> Vec<f64>>,
}

/// `tfunc_temporal` (spec §4.6): applies `f` to every instant's value.
pub fn lift_unary(
    temp: &Temporal,
    f: impl Fn(&BaseValue) -> Result<BaseValue> + Copy,
    info: &UnaryLiftInfo,
) -> Result<Temporal> {
    match temp {
        Temporal::Instant(i) => Ok(Temporal::Instant(Instant::new(f(&i.value)?, i.t))),
        Temporal::Sequence(s) => Ok(Temporal::Sequence(lift_unary_sequence(s, f, info)?)),
        Temporal::SequenceSet(ss) => {
            let mut frags = Vec::new();
            for s in ss.sequences() {
                frags.push(lift_unary_sequence(s, f, info)?);
            }
            merge_sequences(frags)
        }
    }
}

fn lift_unary_sequence(
    s: &Sequence,
    f: impl Fn(&BaseValue) -> Result<BaseValue> + Copy,
    info: &UnaryLiftInfo,
) -> Result<Sequence> {
    let seg_linear = s.interpolation() == Interpolation::Linear && info.result_linear;
    let mut out: Vec<Instant> = Vec::new();
    let instants = s.instants();
    for (idx, inst) in instants.iter().enumerate() {
        out.push(Instant::new(f(&inst.value)?, inst.t));
        if seg_linear {
            if let (Some(tp), Some(next)) = (info.turning_points, instants.get(idx + 1)) {
                let Some(a0) = inst.value.as_f64() else { continue };
                let Some(a1) = next.value.as_f64() else { continue };
                for r in tp(a0, a1) {
                    if r > 1e-9 && r < 1.0 - 1e-9 {
                        let tc = interpolate_time(inst.t, next.t, r);
                        let ac = a0 + (a1 - a0) * r;
                        out.push(Instant::new(f(&BaseValue::Float8(ac))?, tc));
                    }
                }
            }
        }
    }
    let interp = if seg_linear { Interpolation::Linear } else { Interpolation::Step };
    Sequence::new(out, s.lower_inc(), s.upper_inc(), interp)
}

/// `tfunc_temporal_temporal` (spec §4.6): synchronizes two temporal values'
/// time domains and applies `f` pointwise, inserting turning points so a
/// `Linear` result stays exact between synchronized breakpoints.
pub fn lift_binary(
    x: &Temporal,
    y: &Temporal,
    f: fn(f64, f64) -> Option<f64>,
    info: &LiftInfo,
) -> Result<Option<Temporal>> {
    let was_instant_pair = matches!((x, y), (Temporal::Instant(_), Temporal::Instant(_)));
    let xs = x.as_sequences();
    let ys = y.as_sequences();
    let mut frags = Vec::new();
    for a in &xs {
        for b in &ys {
            frags.extend(lift_pair(a, b, f, info)?);
        }
    }
    if frags.is_empty() {
        return Ok(None);
    }
    if was_instant_pair && frags.len() == 1 && frags[0].instants().len() == 1 {
        let inst = frags[0].instants()[0].clone();
        return Ok(Some(Temporal::Instant(inst)));
    }
    Ok(Some(merge_sequences(frags)?))
}

/// Core of the synchronization algorithm (spec §4.6 bullet 2): merges both
/// sequences' timestamps into one sorted breakpoint list within their
/// overlap, evaluates `f` at each breakpoint, and (for `Linear`/`Linear`
/// non-discontinuous pairs) inserts any interior turning points the callback
/// reports. Division additionally splits at denominator zero-crossings,
/// producing two open-ended fragments flanking an unrepresentable point.
fn lift_pair(a: &Sequence, b: &Sequence, f: fn(f64, f64) -> Option<f64>, info: &LiftInfo) -> Result<Vec<Sequence>> {
    let overlap = match a.time_span().intersection(b.time_span())? {
        Some(span) => span,
        None => return Ok(vec![]),
    };
    let lo = overlap.lower.as_timestamp().unwrap();
    let hi = overlap.upper.as_timestamp().unwrap();

    let mut breakpoints: BTreeSet<DateTime<Utc>> = BTreeSet::new();
    breakpoints.insert(lo);
    breakpoints.insert(hi);
    for t in a.timestamps() {
        if t > lo && t < hi {
            breakpoints.insert(t);
        }
    }
    for t in b.timestamps() {
        if t > lo && t < hi {
            breakpoints.insert(t);
        }
    }
    let bp: Vec<DateTime<Utc>> = breakpoints.into_iter().collect();
    log::trace!("lift_pair: synchronized {} breakpoints over overlap [{}, {}]", bp.len(), lo, hi);

    let seg_linear =
        a.interpolation() == Interpolation::Linear && b.interpolation() == Interpolation::Linear && info.result_linear && !info.discont;

    let mut avs = Vec::with_capacity(bp.len());
    let mut bvs = Vec::with_capacity(bp.len());
    for &t in &bp {
        avs.push(a.value_at(t)?.and_then(|v| v.as_f64()));
        bvs.push(b.value_at(t)?.and_then(|v| v.as_f64()));
    }

    let mut runs: Vec<Vec<Instant>> = Vec::new();
    let mut current: Vec<Instant> = Vec::new();

    for i in 0..bp.len() {
        match (avs[i], bvs[i]) {
            (Some(av), Some(bv)) if !(info.division && bv == 0.0) => {
                if let Some(v) = f(av, bv) {
                    current.push(Instant::new(BaseValue::Float8(v), bp[i]));
                } else if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
                continue;
            }
        }

        if seg_linear && i + 1 < bp.len() {
            if let (Some(a0), Some(b0), Some(a1), Some(b1)) = (avs[i], bvs[i], avs[i + 1], bvs[i + 1]) {
                if info.division {
                    if let Some(r) = zero_crossing_ratio(b0, b1) {
                        let tc = interpolate_time(bp[i], bp[i + 1], r);
                        let ac = a0 + (a1 - a0) * r;
                        let sign = if ac >= 0.0 { 1.0 } else { -1.0 };
                        current.push(Instant::new(BaseValue::Float8(sign * f64::INFINITY), tc));
                        runs.push(std::mem::take(&mut current));
                        current.push(Instant::new(BaseValue::Float8(-sign * f64::INFINITY), tc));
                        continue;
                    }
                }
                if let Some(tp) = info.turning_points {
                    for r in tp(a0, a1, b0, b1) {
                        if r > 1e-9 && r < 1.0 - 1e-9 {
                            let tc = interpolate_time(bp[i], bp[i + 1], r);
                            let ac = a0 + (a1 - a0) * r;
                            let bc = b0 + (b1 - b0) * r;
                            if let Some(vc) = f(ac, bc) {
                                current.push(Instant::new(BaseValue::Float8(vc), tc));
                            }
                        }
                    }
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    let interp = if seg_linear { Interpolation::Linear } else { Interpolation::Step };
    let mut out = Vec::new();
    for (idx, run) in runs.iter().enumerate() {
        if run.is_empty() {
            continue;
        }
        let mut lower_inc = idx == 0 && overlap.lower_inc && run[0].t == lo;
        let mut upper_inc = idx == runs.len() - 1 && overlap.upper_inc && run.last().unwrap().t == hi;
        if run.len() == 1 && interp == Interpolation::Linear {
            lower_inc = true;
            upper_inc = true;
        }
        out.push(Sequence::new(run.clone(), lower_inc, upper_inc, interp)?);
    }
    Ok(out)
}

fn zero_crossing_ratio(b0: f64, b1: f64) -> Option<f64> {
    if b0 * b1 < 0.0 {
        Some(b0 / (b0 - b1))
    } else {
        None
    }
}

fn interpolate_time(t0: DateTime<Utc>, t1: DateTime<Utc>, ratio: f64) -> DateTime<Utc> {
    let total = (t1 - t0).num_microseconds().unwrap_or(0) as f64;
    t0 + chrono::Duration::microseconds((total * ratio).round() as i64)
}

/// Quadratic turning point of a product of two linear segments
/// (`d/dt[(a0+da·t)(b0+db·t)] = 0`), grounded on `tnumber_mathfuncs.c`'s
/// multiplication arithop using `tfloat_arithop_turnpt`.
fn mul_turning_points(a0: f64, a1: f64, b0: f64, b1: f64) -> Vec<f64> {
    let da = a1 - a0;
    let db = b1 - b0;
    if da.abs() < 1e-12 || db.abs() < 1e-12 {
        return vec![];
    }
    let t = -(a0 * db + b0 * da) / (2.0 * da * db);
    if t > 0.0 && t < 1.0 {
        vec![t]
    } else {
        vec![]
    }
}

/// Turning point of `|a(t) - b(t)|`: the zero-crossing of the difference,
/// where the distance function has a kink (its minimum), grounded on
/// `tnumber_distance.c`'s handling of temporal-temporal distance.
fn distance_turning_points(a0: f64, a1: f64, b0: f64, b1: f64) -> Vec<f64> {
    let d0 = a0 - b0;
    let d1 = a1 - b1;
    if d0 * d1 < 0.0 {
        vec![d0 / (d0 - d1)]
    } else {
        vec![]
    }
}

fn pack_numeric(both_int: bool, v: f64) -> BaseValue {
    if both_int {
        BaseValue::Int4(v.round() as i32)
    } else {
        BaseValue::Float8(v)
    }
}

fn both_int(x: &Temporal, y: &Temporal) -> bool {
    use crate::catalog::TypeTag;
    matches!(x.basetype(), TypeTag::Int4) && matches!(y.basetype(), TypeTag::Int4)
}

/// `tnumber_add` (SPEC_FULL §4.6): lifted addition, `Linear` throughout,
/// no turning points (a sum of two linear functions is linear).
pub fn tnumber_add(x: &Temporal, y: &Temporal) -> Result<Option<Temporal>> {
    let int_result = both_int(x, y);
    let info = LiftInfo { result_linear: true, discont: false, division: false, turning_points: None };
    let out = lift_binary(x, y, |a, b| Some(a + b), &info)?;
    Ok(out.map(|t| repack(t, int_result)))
}

/// `tnumber_sub` (SPEC_FULL §4.6): lifted subtraction.
pub fn tnumber_sub(x: &Temporal, y: &Temporal) -> Result<Option<Temporal>> {
    let int_result = both_int(x, y);
    let info = LiftInfo { result_linear: true, discont: false, division: false, turning_points: None };
    let out = lift_binary(x, y, |a, b| Some(a - b), &info)?;
    Ok(out.map(|t| repack(t, int_result)))
}

/// `tnumber_mult` (SPEC_FULL §4.6): lifted multiplication; a product of two
/// `Linear` segments is quadratic, so the engine inserts the vertex instant
/// via [`mul_turning_points`].
pub fn tnumber_mult(x: &Temporal, y: &Temporal) -> Result<Option<Temporal>> {
    let int_result = both_int(x, y);
    let info =
        LiftInfo { result_linear: true, discont: false, division: false, turning_points: Some(mul_turning_points) };
    let out = lift_binary(x, y, |a, b| Some(a * b), &info)?;
    Ok(out.map(|t| repack(t, int_result)))
}

/// `tnumber_div` (SPEC_FULL §4.6): lifted division. The result is `Float8`
/// regardless of the operand types. A zero-crossing of the divisor splits
/// the result into two open-ended fragments; see [`lift_pair`]'s `division`
/// branch and SPEC_FULL.md §9's Open Question decision on the sentinel
/// `+-Infinity` values used at the split.
pub fn tnumber_div(x: &Temporal, y: &Temporal) -> Result<Option<Temporal>> {
    let info = LiftInfo { result_linear: true, discont: false, division: true, turning_points: None };
    lift_binary(x, y, |a, b| if b == 0.0 { None } else { Some(a / b) }, &info)
}

/// `tnumber_distance` (SPEC_FULL §4.6): lifted `|a - b|`, with a turning
/// point inserted at the moment the two temporal numbers are equal so the
/// kink at distance zero is captured exactly.
pub fn tnumber_distance(x: &Temporal, y: &Temporal) -> Result<Option<Temporal>> {
    let info = LiftInfo {
        result_linear: true,
        discont: false,
        division: false,
        turning_points: Some(distance_turning_points),
    };
    lift_binary(x, y, |a, b| Some((a - b).abs()), &info)
}

fn repack(temp: Temporal, int_result: bool) -> Temporal {
    if !int_result {
        return temp;
    }
    match temp {
        Temporal::Instant(i) => Temporal::Instant(Instant::new(to_int(&i.value), i.t)),
        Temporal::Sequence(s) => {
            let interp = s.interpolation();
            let instants: Vec<Instant> = s.instants().iter().map(|i| Instant::new(to_int(&i.value), i.t)).collect();
            Temporal::Sequence(Sequence::new(instants, s.lower_inc(), s.upper_inc(), interp).expect("repack preserves shape"))
        }
        Temporal::SequenceSet(ss) => {
            let interp = ss.interpolation();
            let seqs: Vec<Sequence> = ss
                .sequences()
                .iter()
                .map(|s| {
                    let instants: Vec<Instant> =
                        s.instants().iter().map(|i| Instant::new(to_int(&i.value), i.t)).collect();
                    Sequence::new(instants, s.lower_inc(), s.upper_inc(), interp).expect("repack preserves shape")
                })
                .collect();
            Temporal::SequenceSet(crate::temporal::SequenceSet::new(seqs).expect("repack preserves shape"))
        }
    }
}

fn to_int(v: &BaseValue) -> BaseValue {
    match v.as_f64() {
        Some(f) if f.is_finite() => pack_numeric(true, f),
        _ => v.clone(),
    }
}

/// `abs` lifted over a temporal number (spec §4.6 unary example), with a
/// turning point at the zero-crossing so a `Linear` source stays exact.
pub fn tnumber_abs(x: &Temporal) -> Result<Temporal> {
    let info = UnaryLiftInfo { result_linear: true, turning_points: Some(abs_turning_points) };
    lift_unary(
        x,
        |v| match v.as_f64() {
            Some(f) => Ok(BaseValue::Float8(f.abs())),
            None => Err(TemporalError::InvalidType(v.tag())),
        },
        &info,
    )
}

fn abs_turning_points(a0: f64, a1: f64) -> Vec<f64> {
    if a0 * a1 < 0.0 {
        vec![a0 / (a0 - a1)]
    } else {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::Instant as Inst;
    use crate::value::BaseValue::Float8;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn lin(points: &[(f64, i64)]) -> Sequence {
        let instants = points.iter().map(|&(v, s)| Inst::new(Float8(v), t(s))).collect();
        Sequence::new(instants, true, true, Interpolation::Linear).unwrap()
    }

    /// Scenario 4 (spec §8): lifted addition of two synchronized `Linear`
    /// `tfloat`s stays `Linear` with no extra instants.
    #[test]
    fn scenario_4_lifted_addition_is_linear() {
        let x = Temporal::Sequence(lin(&[(0.0, 0), (10.0, 10)]));
        let y = Temporal::Sequence(lin(&[(0.0, 0), (5.0, 10)]));
        let sum = tnumber_add(&x, &y).unwrap().unwrap();
        match sum {
            Temporal::Sequence(s) => {
                assert_eq!(s.interpolation(), Interpolation::Linear);
                assert_eq!(s.instants().len(), 2);
                assert_eq!(s.value_at(t(10)).unwrap().unwrap(), Float8(15.0));
            }
            _ => panic!("expected a single synchronized sequence"),
        }
    }

    /// Scenario 4's literal case (spec §8): `X = [1@t0, 3@t2]`, `Y = [2@t1,
    /// 4@t3]`, both `Linear`, with `t0 < t1 < t2 < t3`. Synchronization
    /// narrows the domain to `[t1, t2]`; the sum is `X(t1)+Y(t1) = 2+2 = 4`
    /// at `t1` and `X(t2)+Y(t2) = 3+3 = 6` at `t2`.
    #[test]
    fn scenario_4_literal_partial_overlap() {
        let x = Temporal::Sequence(lin(&[(1.0, 0), (3.0, 10)]));
        let y = Temporal::Sequence(lin(&[(2.0, 5), (4.0, 15)]));
        let sum = tnumber_add(&x, &y).unwrap().unwrap();
        match sum {
            Temporal::Sequence(s) => {
                assert_eq!(s.interpolation(), Interpolation::Linear);
                assert_eq!(s.start_time(), t(5));
                assert_eq!(s.end_time(), t(10));
                assert_eq!(s.value_at(t(5)).unwrap().unwrap(), Float8(4.0));
                assert_eq!(s.value_at(t(10)).unwrap().unwrap(), Float8(6.0));
            }
            other => panic!("expected a single synchronized sequence, got {other:?}"),
        }
    }

    /// Scenario 5 (spec §8): dividing by a `tfloat` that crosses zero splits
    /// the result at the crossing into two open-ended fragments.
    #[test]
    fn scenario_5_division_splits_at_zero_crossing() {
        let x = Temporal::Sequence(lin(&[(2.0, 0), (2.0, 10)]));
        let y = Temporal::Sequence(lin(&[(-1.0, 0), (1.0, 10)]));
        let quotient = tnumber_div(&x, &y).unwrap().unwrap();
        match quotient {
            Temporal::SequenceSet(ss) => {
                assert_eq!(ss.sequences().len(), 2);
                let first = &ss.sequences()[0];
                let second = &ss.sequences()[1];
                assert!(!first.upper_inc());
                assert!(!second.lower_inc());
            }
            other => panic!("expected a two-fragment sequence set, got {other:?}"),
        }
    }

    #[test]
    fn distance_inserts_a_turning_point_at_the_crossing() {
        let x = Temporal::Sequence(lin(&[(0.0, 0), (10.0, 10)]));
        let y = Temporal::Sequence(lin(&[(10.0, 0), (0.0, 10)]));
        let dist = tnumber_distance(&x, &y).unwrap().unwrap();
        match dist {
            Temporal::Sequence(s) => {
                assert_eq!(s.instants().len(), 3);
                assert_eq!(s.value_at(t(5)).unwrap().unwrap(), Float8(0.0));
            }
            other => panic!("expected a single sequence with an inserted turning point, got {other:?}"),
        }
    }
}
