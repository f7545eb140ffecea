use std::fmt;

use crate::action::{ActionState, BuildAction};
use crate::error::BuildError;
use crate::session::BuildSession;
use crate::unit::Unit;
use crate::value::BuildValue;

/// Returns one fixed value for every resolution it is selected for.
///
/// Typically registered at the create stage to bind a unit to an existing
/// object, or to supply a literal for a parameter.
#[derive(Clone)]
pub struct Instance {
  value: BuildValue,
}

impl Instance {
  pub fn new(value: BuildValue) -> Self {
    Self { value }
  }

  pub fn of<T: std::any::Any + Send + Sync>(value: T) -> Self {
    Self::new(BuildValue::new(value))
  }

  pub fn value(&self) -> &BuildValue {
    &self.value
  }
}

impl BuildAction for Instance {
  fn process(
    &self,
    _session: &mut BuildSession<'_>,
    _unit: &Unit,
    _state: &mut ActionState,
  ) -> Result<Option<BuildValue>, BuildError> {
    Ok(Some(self.value.clone()))
  }
}

impl fmt::Debug for Instance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Instance({})", self.value.type_name())
  }
}
