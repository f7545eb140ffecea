use std::fmt;
use std::sync::Arc;

use crate::action::{ActionState, BuildAction};
use crate::error::BuildError;
use crate::session::BuildSession;
use crate::unit::Unit;
use crate::value::BuildValue;

type FactoryFn = dyn Fn(&mut BuildSession<'_>, &Unit) -> Result<BuildValue, BuildError> + Send + Sync;

/// Produces the value with a host-supplied closure.
///
/// The closure receives the session, so it can build its own dependencies:
///
/// ```
/// use rigging_lib::action::Factory;
/// use rigging_lib::unit::Unit;
/// use rigging_lib::value::BuildValue;
///
/// let greeting = Factory::new("greeting", |session, _unit| {
///   let name = session.build(Unit::named("name"))?;
///   let name = name.downcast_ref::<String>().cloned().unwrap_or_default();
///   Ok(BuildValue::new(format!("hello {name}")))
/// });
/// # let _ = greeting;
/// ```
#[derive(Clone)]
pub struct Factory {
  name: String,
  create: Arc<FactoryFn>,
}

impl Factory {
  pub fn new<F>(name: impl Into<String>, create: F) -> Self
  where
    F: Fn(&mut BuildSession<'_>, &Unit) -> Result<BuildValue, BuildError> + Send + Sync + 'static,
  {
    Self {
      name: name.into(),
      create: Arc::new(create),
    }
  }
}

impl BuildAction for Factory {
  fn process(
    &self,
    session: &mut BuildSession<'_>,
    unit: &Unit,
    _state: &mut ActionState,
  ) -> Result<Option<BuildValue>, BuildError> {
    (self.create)(session, unit).map(Some)
  }
}

impl fmt::Debug for Factory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Factory({})", self.name)
  }
}
