//! Temporal core (spec §4.5): values that vary over time, built from
//! `Instant`/`Sequence`/`SequenceSet` layered over `BaseValue`.
//!
//! Grounded on `original_source/meos/include/temporal/tsequence.h`'s
//! normalization helpers (`tsequence_norm_test`, `tinstarr_normalize`,
//! `tsequence_join_test`) and `temporal.h`'s `TemporalFamily`/interpolation
//! tags.

mod instant;
mod sequence;
mod sequenceset;
mod value;

pub use instant::Instant;
pub use sequence::Sequence;
pub use sequenceset::SequenceSet;
pub use value::{merge_sequences, Temporal};

/// Interpolation mode between consecutive instants (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// No value is implied between instants; the domain is the instant set.
    Discrete,
    /// The value holds at the left instant until the next instant (closed-open).
    Step,
    /// The value interpolates linearly between consecutive instants;
    /// requires a continuous base type.
    Linear,
}

impl std::fmt::Display for Interpolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Interpolation::Discrete => "Discrete",
            Interpolation::Step => "Step",
            Interpolation::Linear => "Linear",
        })
    }
}
