//! Ordered set algebra (spec §4.3): a sorted, duplicate-free sequence of
//! base values with a cached bounding span for span-capable base types.
//!
//! Grounded on `mobilitydb/src/general/set_ops.c`'s merge-walk predicates,
//! reused here the same way `SpanSet` reuses `Span`.

use crate::catalog::TypeTag;
use crate::error::{Result, TemporalError};
use crate::span::Span;
use crate::value::BaseValue;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderedSet {
    values: Vec<BaseValue>,
    /// `None` for base types with no total span algebra (e.g. `Text`,
    /// `Geometry`): spec §3 only requires the bounding span for
    /// "span-capable" base types.
    bounding: Option<Span>,
}

impl OrderedSet {
    /// Builds a set from arbitrary input, sorting and removing duplicates
    /// (spec §3 invariants: strictly increasing, no duplicates).
    pub fn new(mut values: Vec<BaseValue>) -> Result<OrderedSet> {
        if values.is_empty() {
            return Err(TemporalError::InvalidBounds("set must contain at least one value".into()));
        }
        let tag = values[0].tag();
        for v in &values {
            if v.tag() != tag {
                return Err(TemporalError::MixedBaseType(tag, v.tag()));
            }
        }
        values.sort_by(|a, b| a.compare(b).unwrap());
        values.dedup_by(|a, b| a.equal(b).unwrap());

        let bounding = if is_span_capable(tag) {
            Some(Span::make(
                values.first().unwrap().clone(),
                values.last().unwrap().clone(),
                true,
                true,
            )?)
        } else {
            None
        };

        Ok(OrderedSet { values, bounding })
    }

    pub fn values(&self) -> &[BaseValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn basetype(&self) -> TypeTag {
        self.values[0].tag()
    }

    pub fn bounding_span(&self) -> Option<&Span> {
        self.bounding.as_ref()
    }

    fn check_same_type(&self, other: &OrderedSet) -> Result<()> {
        if self.basetype() != other.basetype() {
            return Err(TemporalError::MixedBaseType(self.basetype(), other.basetype()));
        }
        Ok(())
    }

    pub fn contains_value(&self, v: &BaseValue) -> Result<bool> {
        for x in &self.values {
            if x.equal(v)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Merge-walk subset test, O(n+m).
    pub fn contains(&self, other: &OrderedSet) -> Result<bool> {
        self.check_same_type(other)?;
        let (mut i, mut j) = (0usize, 0usize);
        while j < other.values.len() {
            if i >= self.values.len() {
                return Ok(false);
            }
            match self.values[i].compare(&other.values[j])? {
                std::cmp::Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => return Ok(false),
            }
        }
        Ok(true)
    }

    pub fn contained(&self, other: &OrderedSet) -> Result<bool> {
        other.contains(self)
    }

    pub fn overlaps(&self, other: &OrderedSet) -> Result<bool> {
        self.check_same_type(other)?;
        let (mut i, mut j) = (0usize, 0usize);
        while i < self.values.len() && j < other.values.len() {
            match self.values[i].compare(&other.values[j])? {
                std::cmp::Ordering::Equal => return Ok(true),
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
            }
        }
        Ok(false)
    }

    pub fn equal(&self, other: &OrderedSet) -> Result<bool> {
        self.check_same_type(other)?;
        if self.values.len() != other.values.len() {
            return Ok(false);
        }
        for (a, b) in self.values.iter().zip(other.values.iter()) {
            if !a.equal(b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn union(&self, other: &OrderedSet) -> Result<OrderedSet> {
        self.check_same_type(other)?;
        let mut all = self.values.clone();
        all.extend(other.values.iter().cloned());
        OrderedSet::new(all)
    }

    pub fn intersection(&self, other: &OrderedSet) -> Result<Option<OrderedSet>> {
        self.check_same_type(other)?;
        let (mut i, mut j) = (0usize, 0usize);
        let mut out = Vec::new();
        while i < self.values.len() && j < other.values.len() {
            match self.values[i].compare(&other.values[j])? {
                std::cmp::Ordering::Equal => {
                    out.push(self.values[i].clone());
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
            }
        }
        if out.is_empty() {
            Ok(None)
        } else {
            Ok(Some(OrderedSet::new(out)?))
        }
    }

    pub fn difference(&self, other: &OrderedSet) -> Result<Option<OrderedSet>> {
        self.check_same_type(other)?;
        let (mut i, mut j) = (0usize, 0usize);
        let mut out = Vec::new();
        while i < self.values.len() {
            if j >= other.values.len() {
                out.push(self.values[i].clone());
                i += 1;
                continue;
            }
            match self.values[i].compare(&other.values[j])? {
                std::cmp::Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => {
                    out.push(self.values[i].clone());
                    i += 1;
                }
                std::cmp::Ordering::Greater => j += 1,
            }
        }
        if out.is_empty() {
            Ok(None)
        } else {
            Ok(Some(OrderedSet::new(out)?))
        }
    }

    pub fn to_text(&self) -> String {
        let parts: Vec<String> = self.values.iter().map(BaseValue::to_text).collect();
        format!("{{{}}}", parts.join(", "))
    }
}

fn is_span_capable(tag: TypeTag) -> bool {
    matches!(
        tag,
        TypeTag::Int4 | TypeTag::Int8 | TypeTag::Float8 | TypeTag::Date | TypeTag::TimestampTz
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::BaseValue::Int4;

    #[test]
    fn construction_sorts_and_dedups() {
        let s = OrderedSet::new(vec![Int4(3), Int4(1), Int4(3), Int4(2)]).unwrap();
        assert_eq!(s.values(), &[Int4(1), Int4(2), Int4(3)]);
        assert_eq!(s.bounding_span().unwrap().lower, Int4(1));
    }

    #[test]
    fn set_algebra_merge_walk() {
        let a = OrderedSet::new(vec![Int4(1), Int4(2), Int4(3)]).unwrap();
        let b = OrderedSet::new(vec![Int4(2), Int4(3), Int4(4)]).unwrap();
        let u = a.union(&b).unwrap();
        assert_eq!(u.values(), &[Int4(1), Int4(2), Int4(3), Int4(4)]);
        let i = a.intersection(&b).unwrap().unwrap();
        assert_eq!(i.values(), &[Int4(2), Int4(3)]);
        let d = a.difference(&b).unwrap().unwrap();
        assert_eq!(d.values(), &[Int4(1)]);
    }
}
