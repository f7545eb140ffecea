//! Per-engine store of singleton values.
//!
//! Each unit gets a slot that moves between three states:
//!
//! ```text
//! Vacant --claim--> Building(thread) --fill--> Filled(value)
//!                         |
//!                         +--drop claim--> Released (removed from the map)
//! ```
//!
//! The thread that claims a vacant slot builds the value; any other thread
//! asking for the same unit blocks until the slot is filled, or starts over
//! with a fresh slot if the builder gave up. Units whose construction failed
//! leave nothing behind in the map. The claiming thread itself sees
//! [`Lookup::Reentrant`] on a nested request for the same unit and builds
//! without the cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{trace, warn};

use crate::unit::Unit;
use crate::value::BuildValue;

#[derive(Debug)]
enum SlotState {
  Vacant,
  Building(ThreadId),
  Filled(BuildValue),
  Released,
}

#[derive(Debug)]
struct Slot {
  state: Mutex<SlotState>,
  ready: Condvar,
}

impl Slot {
  fn new() -> Self {
    Self {
      state: Mutex::new(SlotState::Vacant),
      ready: Condvar::new(),
    }
  }
}

/// Outcome of [`CacheStore::lookup_or_claim`].
#[derive(Debug)]
pub enum Lookup {
  /// The value was already stored.
  Hit(BuildValue),
  /// The caller now owns the slot and must build the value.
  Claimed(CacheClaim),
  /// The calling thread is already building this unit further up its stack.
  Reentrant,
}

/// Exclusive right to fill one cache slot.
///
/// Dropping a claim without [`fill`](Self::fill)ing it releases the slot so
/// waiting threads can try again.
#[derive(Debug)]
pub struct CacheClaim {
  unit: Unit,
  slot: Arc<Slot>,
  slots: Arc<SlotMap>,
  filled: bool,
}

impl CacheClaim {
  pub fn unit(&self) -> &Unit {
    &self.unit
  }

  /// Store `value` and wake every waiter.
  ///
  /// Returns the value the slot ends up holding: `value` itself, or the one
  /// already stored if the slot was somehow filled first.
  pub fn fill(mut self, value: BuildValue) -> BuildValue {
    let stored = {
      let mut state = self.slot.state.lock();
      match &*state {
        SlotState::Filled(existing) => existing.clone(),
        _ => {
          *state = SlotState::Filled(value.clone());
          value
        }
      }
    };
    self.filled = true;
    self.slot.ready.notify_all();
    trace!(unit = %self.unit, "cache slot filled");
    stored
  }
}

impl Drop for CacheClaim {
  fn drop(&mut self) {
    if self.filled {
      return;
    }
    {
      let mut slots = self.slots.write();
      if slots.get(&self.unit).is_some_and(|slot| Arc::ptr_eq(slot, &self.slot)) {
        slots.remove(&self.unit);
      }
      let mut state = self.slot.state.lock();
      if matches!(*state, SlotState::Building(_)) {
        *state = SlotState::Released;
      }
    }
    self.slot.ready.notify_all();
    warn!(unit = %self.unit, "cache claim released without a value");
  }
}

type SlotMap = RwLock<HashMap<Unit, Arc<Slot>>>;

/// Thread-safe map from units to singleton values.
#[derive(Debug, Default)]
pub struct CacheStore {
  slots: Arc<SlotMap>,
}

impl CacheStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn slot(&self, unit: &Unit) -> Arc<Slot> {
    if let Some(slot) = self.slots.read().get(unit) {
      return Arc::clone(slot);
    }
    let mut slots = self.slots.write();
    Arc::clone(slots.entry(unit.clone()).or_insert_with(|| Arc::new(Slot::new())))
  }

  /// Return the stored value, or claim the slot so the caller builds it.
  ///
  /// Blocks while another thread holds the claim for `unit`.
  pub fn lookup_or_claim(&self, unit: &Unit) -> Lookup {
    let me = thread::current().id();
    'fresh: loop {
      let slot = self.slot(unit);
      let mut state = slot.state.lock();
      loop {
        match &*state {
          SlotState::Filled(value) => return Lookup::Hit(value.clone()),
          SlotState::Building(owner) if *owner == me => return Lookup::Reentrant,
          SlotState::Building(_) => {
            trace!(unit = %unit, "waiting for another thread to build");
            slot.ready.wait(&mut state);
          }
          SlotState::Released => {
            trace!(unit = %unit, "builder gave up, retrying");
            continue 'fresh;
          }
          SlotState::Vacant => {
            *state = SlotState::Building(me);
            drop(state);
            return Lookup::Claimed(CacheClaim {
              unit: unit.clone(),
              slot,
              slots: Arc::clone(&self.slots),
              filled: false,
            });
          }
        }
      }
    }
  }

  /// The stored value for `unit`, without waiting or claiming.
  pub fn get(&self, unit: &Unit) -> Option<BuildValue> {
    let slot = Arc::clone(self.slots.read().get(unit)?);
    let state = slot.state.lock();
    match &*state {
      SlotState::Filled(value) => Some(value.clone()),
      _ => None,
    }
  }

  /// Forget the value of `unit`. Returns whether a value was stored.
  ///
  /// A build in progress is not interrupted; it will store its value into the
  /// detached slot, so the next resolution builds afresh.
  pub fn invalidate(&self, unit: &Unit) -> bool {
    let Some(slot) = self.slots.write().remove(unit) else {
      return false;
    };
    matches!(*slot.state.lock(), SlotState::Filled(_))
  }

  /// Forget every stored value.
  pub fn clear(&self) {
    self.slots.write().clear();
  }

  /// Number of units with a stored value.
  pub fn len(&self) -> usize {
    self
      .slots
      .read()
      .values()
      .filter(|slot| matches!(*slot.state.lock(), SlotState::Filled(_)))
      .count()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
