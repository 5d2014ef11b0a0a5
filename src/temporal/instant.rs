//! `Instant` (spec §3): a single (value, timestamp) pair, the leaf of every
//! temporal value.

use chrono::{DateTime, Utc};

use crate::catalog::TypeTag;
use crate::error::{Result, TemporalError};
use crate::value::BaseValue;

#[derive(Debug, Clone, PartialEq)]
pub struct Instant {
    pub value: BaseValue,
    pub t: DateTime<Utc>,
}

impl Instant {
    pub fn new(value: BaseValue, t: DateTime<Utc>) -> Instant {
        Instant { value, t }
    }

    pub fn basetype(&self) -> TypeTag {
        self.value.tag()
    }

    fn check_same_type(&self, other: &Instant) -> Result<()> {
        if self.basetype() != other.basetype() {
            return Err(TemporalError::MixedBaseType(self.basetype(), other.basetype()));
        }
        Ok(())
    }

    pub fn equal(&self, other: &Instant) -> Result<bool> {
        self.check_same_type(other)?;
        Ok(self.t == other.t && self.value.equal(&other.value)?)
    }

    pub fn to_text(&self) -> String {
        format!("{}@{}", self.value.to_text(), self.t.to_rfc3339())
    }
}
