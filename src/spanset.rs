//! Span-set algebra (spec §4.3): an ordered sequence of disjoint,
//! non-adjacent spans with a cached bounding span.
//!
//! Grounded on `mobilitydb/src/general/spanset_ops.c`'s merge-walk set
//! operations and `span_spgist.c`'s sortedness invariant.

use crate::error::{Result, TemporalError};
use crate::span::Span;
use crate::EngineConfig;

/// A disjoint, ascending sequence of spans (spec §3). Empty span-sets are
/// not representable — construction of zero spans is an error.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanSet {
    spans: Vec<Span>,
    bounding: Span,
}

impl SpanSet {
    /// Normalizes `spans`: sorts, then merges any pair that overlaps or is
    /// adjacent, matching `spanarr_normalize`.
    pub fn new(spans: Vec<Span>) -> Result<SpanSet> {
        SpanSet::new_with_config(spans, None)
    }

    /// Same as [`SpanSet::new`], polling `cfg`'s cancellation hook (spec §5)
    /// between merge-walk steps so a host can abort a union over many spans.
    pub fn new_with_config(mut spans: Vec<Span>, cfg: Option<&EngineConfig>) -> Result<SpanSet> {
        if spans.is_empty() {
            return Err(TemporalError::InvalidBounds("span-set must contain at least one span".into()));
        }
        let basetype = spans[0].basetype();
        for s in &spans {
            if s.basetype() != basetype {
                return Err(TemporalError::MixedBaseType(basetype, s.basetype()));
            }
        }
        spans.sort_by(|a, b| a.cmp(b).unwrap());

        let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
        for s in spans {
            if let Some(cfg) = cfg {
                cfg.poll_interrupt()?;
            }
            if let Some(last) = merged.last_mut() {
                if last.overlaps(&s)? || last.adjacent(&s)? {
                    *last = last.union(&s)?.expect("overlap/adjacent implies mergeable union");
                    continue;
                }
            }
            merged.push(s);
        }

        let bounding = Span::make(
            merged.first().unwrap().lower.clone(),
            merged.last().unwrap().upper.clone(),
            merged.first().unwrap().lower_inc,
            merged.last().unwrap().upper_inc,
        )?;

        Ok(SpanSet { spans: merged, bounding })
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn bounding_span(&self) -> &Span {
        &self.bounding
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    fn check_same_type(&self, other: &SpanSet) -> Result<()> {
        if self.bounding.basetype() != other.bounding.basetype() {
            return Err(TemporalError::MixedBaseType(self.bounding.basetype(), other.bounding.basetype()));
        }
        Ok(())
    }

    pub fn contains_value(&self, v: &crate::value::BaseValue) -> Result<bool> {
        for s in &self.spans {
            if s.contains_value(v)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn overlaps(&self, other: &SpanSet) -> Result<bool> {
        self.check_same_type(other)?;
        let (mut i, mut j) = (0usize, 0usize);
        while i < self.spans.len() && j < other.spans.len() {
            if self.spans[i].overlaps(&other.spans[j])? {
                return Ok(true);
            }
            if self.spans[i].cmp(&other.spans[j])? == std::cmp::Ordering::Less {
                i += 1;
            } else {
                j += 1;
            }
        }
        Ok(false)
    }

    pub fn contains(&self, other: &SpanSet) -> Result<bool> {
        self.check_same_type(other)?;
        'outer: for os in &other.spans {
            for s in &self.spans {
                if s.contains(os)? {
                    continue 'outer;
                }
            }
            return Ok(false);
        }
        Ok(true)
    }

    pub fn equal(&self, other: &SpanSet) -> Result<bool> {
        self.check_same_type(other)?;
        if self.spans.len() != other.spans.len() {
            return Ok(false);
        }
        for (a, b) in self.spans.iter().zip(other.spans.iter()) {
            if !a.equal(b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Merge-walk union over the sorted sequences, O(n+m) (spec §4.3).
    pub fn union(&self, other: &SpanSet) -> Result<SpanSet> {
        self.union_with_config(other, None)
    }

    /// Same as [`SpanSet::union`], polling `cfg`'s cancellation hook between
    /// merge steps (spec §5) for unions over many spans.
    pub fn union_with_config(&self, other: &SpanSet, cfg: Option<&EngineConfig>) -> Result<SpanSet> {
        self.check_same_type(other)?;
        let mut all: Vec<Span> = self.spans.clone();
        all.extend(other.spans.iter().cloned());
        SpanSet::new_with_config(all, cfg)
    }

    pub fn intersection(&self, other: &SpanSet) -> Result<Option<SpanSet>> {
        self.intersection_with_config(other, None)
    }

    /// Same as [`SpanSet::intersection`], polling `cfg`'s cancellation hook
    /// between merge-walk steps (spec §5).
    pub fn intersection_with_config(&self, other: &SpanSet, cfg: Option<&EngineConfig>) -> Result<Option<SpanSet>> {
        self.check_same_type(other)?;
        let mut out = Vec::new();
        let (mut i, mut j) = (0usize, 0usize);
        while i < self.spans.len() && j < other.spans.len() {
            if let Some(cfg) = cfg {
                cfg.poll_interrupt()?;
            }
            if let Some(inter) = self.spans[i].intersection(&other.spans[j])? {
                out.push(inter);
            }
            if self.spans[i].cmp(&other.spans[j])? == std::cmp::Ordering::Less {
                i += 1;
            } else {
                j += 1;
            }
        }
        if out.is_empty() {
            Ok(None)
        } else {
            Ok(Some(SpanSet::new_with_config(out, cfg)?))
        }
    }

    /// `self - other`, eliminating covered regions span by span.
    pub fn difference(&self, other: &SpanSet) -> Result<Option<SpanSet>> {
        self.difference_with_config(other, None)
    }

    /// Same as [`SpanSet::difference`], polling `cfg`'s cancellation hook
    /// between spans of `other` (spec §5).
    pub fn difference_with_config(&self, other: &SpanSet, cfg: Option<&EngineConfig>) -> Result<Option<SpanSet>> {
        self.check_same_type(other)?;
        let mut remaining: Vec<Span> = self.spans.clone();
        for os in &other.spans {
            if let Some(cfg) = cfg {
                cfg.poll_interrupt()?;
            }
            let mut next = Vec::with_capacity(remaining.len());
            for s in &remaining {
                next.extend(s.difference(os)?);
            }
            remaining = next;
            if remaining.is_empty() {
                break;
            }
        }
        if remaining.is_empty() {
            Ok(None)
        } else {
            Ok(Some(SpanSet::new_with_config(remaining, cfg)?))
        }
    }

    pub fn distance(&self, other: &SpanSet) -> Result<f64> {
        self.check_same_type(other)?;
        let mut best = f64::INFINITY;
        for s in &self.spans {
            for o in &other.spans {
                let d = s.distance(o)?;
                if d < best {
                    best = d;
                }
                if best == 0.0 {
                    return Ok(0.0);
                }
            }
        }
        Ok(best)
    }

    pub fn to_text(&self) -> String {
        let parts: Vec<String> = self.spans.iter().map(Span::to_text).collect();
        format!("{{{}}}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::BaseValue::Int4;

    fn s(lo: i32, hi: i32) -> Span {
        Span::make(Int4(lo), Int4(hi), true, false).unwrap()
    }

    #[test]
    fn construction_merges_overlaps_and_adjacency() {
        let ss = SpanSet::new(vec![s(1, 3), s(3, 5), s(10, 12)]).unwrap();
        assert_eq!(ss.len(), 2);
        assert_eq!(ss.spans()[0].lower, Int4(1));
        assert_eq!(ss.spans()[0].upper, Int4(5));
        assert_eq!(ss.bounding_span().lower, Int4(1));
        assert_eq!(ss.bounding_span().upper, Int4(12));
    }

    #[test]
    fn idempotent_union_and_intersection() {
        let ss = SpanSet::new(vec![s(1, 3), s(10, 12)]).unwrap();
        let u = ss.union(&ss).unwrap();
        assert!(u.equal(&ss).unwrap());
        let i = ss.intersection(&ss).unwrap().unwrap();
        assert!(i.equal(&ss).unwrap());
    }

    #[test]
    fn difference_eliminates_covered_region() {
        let a = SpanSet::new(vec![s(1, 10)]).unwrap();
        let b = SpanSet::new(vec![s(3, 5)]).unwrap();
        let d = a.difference(&b).unwrap().unwrap();
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn interrupt_hook_aborts_construction_and_union() {
        let cfg = EngineConfig { check_interrupt: Some(&|| true), ..EngineConfig::default() };
        assert!(SpanSet::new_with_config(vec![s(1, 3), s(5, 7)], Some(&cfg)).is_err());
        let a = SpanSet::new(vec![s(1, 3)]).unwrap();
        let b = SpanSet::new(vec![s(5, 7)]).unwrap();
        assert!(a.union_with_config(&b, Some(&cfg)).is_err());
        assert!(a.intersection_with_config(&b, Some(&cfg)).is_err());
    }
}
