//! `tempora_core`: an in-memory, host-agnostic type system and algebra for
//! temporal and spatiotemporal values, modeled on MobilityDB/MEOS.
//!
//! The engine is a pure library: no network, no disk, no global state. A
//! host (a database extension, a CLI, a service) owns construction of
//! `BaseValue`s from its own wire formats and calls into the algebra here.
//! See `catalog` for the type system, `span`/`set`/`spanset` for the
//! interval algebras, `bbox` for bounding boxes, `temporal` for the core
//! time-varying value types, `lifting` for promoting scalar functions to
//! temporal ones, `tile` for bucketing/splitting, and `io` for the
//! text/WKB/MF-JSON codecs.

pub mod bbox;
pub mod catalog;
pub mod error;
pub mod io;
pub mod lifting;
pub mod set;
pub mod span;
pub mod spanset;
pub mod temporal;
pub mod tile;
pub mod value;

pub use catalog::{TypeClass, TypeTag};
pub use error::{Result, TemporalError};
pub use value::BaseValue;

/// Engine-wide tunables (SPEC_FULL §2 ambient configuration).
///
/// A host constructs one of these up front and threads it through calls
/// that need it; there is no global/static configuration, matching spec
/// §5's "memory is allocated from a per-call arena or the host's memory
/// allocator" resource model. The float-comparison tolerance (spec §9) is
/// a crate-wide constant (`value::EPSILON`) rather than a field here: it is
/// baked into every `BaseValue`/`Span`/box comparison, none of which thread
/// a config through, so a field that only some comparisons honored would be
/// worse than no field at all. Likewise the default interpolation used by
/// text/WKB decoding when no `Interp=` prefix is present is fixed at
/// `Interpolation::Linear` for continuous base types (spec §6), matching
/// `io::strip_interp_prefix`.
#[derive(Clone)]
pub struct EngineConfig<'a> {
    /// Host-provided cancellation hook (spec §5): checked between outer
    /// loop iterations of long-running operations (span-set unions over
    /// many spans, tiling splits over large grids). Returning `true` means
    /// "abort as soon as convenient".
    pub check_interrupt: Option<&'a dyn Fn() -> bool>,
}

impl<'a> Default for EngineConfig<'a> {
    fn default() -> EngineConfig<'a> {
        EngineConfig { check_interrupt: None }
    }
}

impl<'a> EngineConfig<'a> {
    /// Polls the configured cancellation hook, if any. Call this between
    /// iterations of an outer loop over a potentially large collection
    /// (spec §5); returns `Err` so callers can propagate with `?`.
    pub fn poll_interrupt(&self) -> Result<()> {
        if let Some(check) = self.check_interrupt {
            if check() {
                return Err(TemporalError::Unsupported("operation interrupted by host".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_interrupt_hook() {
        let cfg = EngineConfig::default();
        assert!(cfg.poll_interrupt().is_ok());
    }

    #[test]
    fn interrupt_hook_short_circuits() {
        let flag = std::cell::Cell::new(false);
        let cfg = EngineConfig { check_interrupt: Some(&|| flag.get()), ..EngineConfig::default() };
        assert!(cfg.poll_interrupt().is_ok());
        flag.set(true);
        assert!(cfg.poll_interrupt().is_err());
    }
}
