use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::matcher::Weight;
use crate::session::BuildSession;
use crate::unit::Unit;
use crate::value::BuildValue;

/// A named phase of the construction pipeline.
///
/// The engine runs stages in the order given by its configuration, never in
/// registration order. Three stages cover the usual pipeline:
///
/// - [`Stage::CACHE`]: replay a previously produced value
/// - [`Stage::INITIALIZE`]: hooks that act once the value exists
/// - [`Stage::CREATE`]: produce the value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stage(Cow<'static, str>);

impl Stage {
  pub const CACHE: Stage = Stage(Cow::Borrowed("cache"));
  pub const INITIALIZE: Stage = Stage(Cow::Borrowed("initialize"));
  pub const CREATE: Stage = Stage(Cow::Borrowed("create"));

  pub const fn from_static(name: &'static str) -> Self {
    Stage(Cow::Borrowed(name))
  }

  pub fn new(name: impl Into<String>) -> Self {
    Stage(Cow::Owned(name.into()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// One step of the construction pipeline.
///
/// Actions are shared between resolutions (and threads), so they hold no
/// per-resolution state themselves. Anything that must survive from
/// [`process`](Self::process) to [`post_process`](Self::post_process) of the
/// same execution goes into the [`ActionState`] the session hands to both.
///
/// `process` returns `Ok(None)` to signal "no value": the session then moves
/// on to the next stage. Returning a value ends the stage loop for the unit.
/// Once a value exists, every action that ran is post-processed in execution
/// order with that value. Only after every `post_process` succeeded does each
/// action get [`commit`](Self::commit)ted; a failure anywhere drops the
/// states uncommitted.
///
/// Both methods may resolve further units through the session; those nested
/// resolutions see the full ancestor chain.
pub trait BuildAction: Send + Sync + fmt::Debug {
  fn process(
    &self,
    session: &mut BuildSession<'_>,
    unit: &Unit,
    state: &mut ActionState,
  ) -> Result<Option<BuildValue>, BuildError>;

  fn post_process(
    &self,
    _session: &mut BuildSession<'_>,
    _unit: &Unit,
    _value: &BuildValue,
    _state: &mut ActionState,
  ) -> Result<(), BuildError> {
    Ok(())
  }

  /// Publish the finished value. Runs once the whole resolution succeeded.
  fn commit(&self, _unit: &Unit, _value: &BuildValue, _state: &mut ActionState) {}
}

/// Shared handle to a registered action.
pub type ActionRef = Arc<dyn BuildAction>;

/// Scratch slot owned by a single execution of an action.
///
/// Dropped when the resolution that created it finishes, whether it succeeded
/// or not, so RAII guards stored here are released on failure paths too.
#[derive(Default)]
pub struct ActionState(Option<Box<dyn Any + Send>>);

impl ActionState {
  pub fn put<T: Any + Send>(&mut self, value: T) {
    self.0 = Some(Box::new(value));
  }

  pub fn take<T: Any + Send>(&mut self) -> Option<T> {
    match self.0.take()?.downcast::<T>() {
      Ok(value) => Some(*value),
      Err(other) => {
        self.0 = Some(other);
        None
      }
    }
  }

  pub fn get_mut<T: Any + Send>(&mut self) -> Option<&mut T> {
    self.0.as_mut()?.downcast_mut::<T>()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_none()
  }
}

impl fmt::Debug for ActionState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ActionState").field("occupied", &self.0.is_some()).finish()
  }
}

/// An action stamped with the matching weight it was reached with.
#[derive(Debug, Clone)]
pub struct WeightedAction {
  pub weight: Weight,
  pub action: ActionRef,
}

impl WeightedAction {
  pub fn new(weight: Weight, action: ActionRef) -> Self {
    Self { weight, action }
  }

  /// Whether both entries refer to the same registered action.
  pub fn same_action(&self, other: &WeightedAction) -> bool {
    same_action(&self.action, &other.action)
  }
}

/// Identity comparison of two action handles, ignoring vtable differences.
pub fn same_action(a: &ActionRef, b: &ActionRef) -> bool {
  std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
