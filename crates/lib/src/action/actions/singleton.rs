use tracing::debug;

use crate::action::{ActionState, BuildAction};
use crate::cache::{CacheClaim, Lookup};
use crate::error::BuildError;
use crate::session::BuildSession;
use crate::unit::Unit;
use crate::value::BuildValue;

/// Cache-stage action making a unit a singleton within one engine.
///
/// On a hit the stored value is returned and later stages are skipped. On a
/// miss the action claims the unit's slot in the engine's cache and signals
/// "no value"; once a later stage has produced the value and every action has
/// been post-processed, `commit` stores it and wakes any thread waiting on the
/// same unit. A resolution that fails before that point releases the claim, so
/// a partially initialized value is never cached. Concurrent first
/// resolutions construct the value at most once.
#[derive(Debug, Default, Clone, Copy)]
pub struct Singleton;

impl BuildAction for Singleton {
  fn process(
    &self,
    session: &mut BuildSession<'_>,
    unit: &Unit,
    state: &mut ActionState,
  ) -> Result<Option<BuildValue>, BuildError> {
    match session.cache().lookup_or_claim(unit) {
      Lookup::Hit(value) => {
        debug!(unit = %unit, "cache hit");
        Ok(Some(value))
      }
      Lookup::Claimed(claim) => {
        state.put(claim);
        Ok(None)
      }
      Lookup::Reentrant => {
        debug!(unit = %unit, "unit is already being built on this thread, bypassing cache");
        Ok(None)
      }
    }
  }

  fn commit(&self, unit: &Unit, value: &BuildValue, state: &mut ActionState) {
    if let Some(claim) = state.take::<CacheClaim>() {
      let stored = claim.fill(value.clone());
      debug!(unit = %unit, same = stored.ptr_eq(value), "cached value");
    }
  }
}
