//! JSON values and the actions that assemble them.

use std::collections::BTreeMap;
use std::fmt;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::debug;

use crate::action::{ActionState, BuildAction};
use crate::error::BuildError;
use crate::session::BuildSession;
use crate::unit::Unit;
use crate::value::BuildValue;

/// A JSON value produced by a manifest-driven engine.
///
/// Interior mutability lets initialize-stage actions fill in properties of
/// an instance that may already be shared through the cache.
#[derive(Debug, Default)]
pub struct Document(RwLock<Value>);

impl Document {
  pub fn new(value: Value) -> Self {
    Self(RwLock::new(value))
  }

  /// A copy of the current contents.
  pub fn snapshot(&self) -> Value {
    self.0.read().clone()
  }

  pub fn update<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
    f(&mut self.0.write())
  }

  /// The document behind a built value, if it is one.
  pub fn of(value: &BuildValue) -> Option<&Document> {
    value.downcast_ref::<Document>()
  }
}

fn build_document(session: &mut BuildSession<'_>, unit: Unit) -> Result<Value, BuildError> {
  let value = session.build(unit.clone())?;
  match Document::of(&value) {
    Some(document) => Ok(document.snapshot()),
    None => Err(BuildError::UnexpectedValue {
      unit,
      expected: std::any::type_name::<Document>(),
      actual: value.type_name(),
    }),
  }
}

/// Builds a JSON object from other units.
///
/// The object carries a `type` member with the id of the unit being built,
/// followed by one member per field.
#[derive(Clone)]
pub struct Record {
  fields: BTreeMap<String, Unit>,
}

impl Record {
  pub fn new(fields: impl IntoIterator<Item = (String, Unit)>) -> Self {
    Self {
      fields: fields.into_iter().collect(),
    }
  }
}

impl BuildAction for Record {
  fn process(
    &self,
    session: &mut BuildSession<'_>,
    unit: &Unit,
    _state: &mut ActionState,
  ) -> Result<Option<BuildValue>, BuildError> {
    let mut object = Map::new();
    object.insert("type".to_string(), Value::String(unit.id.to_string()));
    for (name, field) in &self.fields {
      object.insert(name.clone(), build_document(session, field.clone())?);
    }
    Ok(Some(BuildValue::new(Document::new(Value::Object(object)))))
  }
}

impl fmt::Debug for Record {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
    write!(f, "Record({})", names.join(", "))
  }
}

/// Sets object properties on a value produced by a later stage.
///
/// Produces nothing itself; all the work happens in `post_process`, once the
/// value exists.
#[derive(Clone)]
pub struct Inject {
  properties: BTreeMap<String, Unit>,
}

impl Inject {
  pub fn new(properties: impl IntoIterator<Item = (String, Unit)>) -> Self {
    Self {
      properties: properties.into_iter().collect(),
    }
  }
}

impl BuildAction for Inject {
  fn process(
    &self,
    _session: &mut BuildSession<'_>,
    _unit: &Unit,
    _state: &mut ActionState,
  ) -> Result<Option<BuildValue>, BuildError> {
    Ok(None)
  }

  fn post_process(
    &self,
    session: &mut BuildSession<'_>,
    unit: &Unit,
    value: &BuildValue,
    _state: &mut ActionState,
  ) -> Result<(), BuildError> {
    let Some(document) = Document::of(value) else {
      return Err(BuildError::action(
        format!("{self:?}"),
        format!("{unit} produced {}, not a JSON document", value.type_name()),
      ));
    };

    for (name, property) in &self.properties {
      let injected = build_document(session, property.clone())?;
      let applied = document.update(|target| match target.as_object_mut() {
        Some(object) => {
          object.insert(name.clone(), injected);
          true
        }
        None => false,
      });
      if !applied {
        return Err(BuildError::action(
          format!("{self:?}"),
          format!("{unit} is not a JSON object, can't set '{name}'"),
        ));
      }
      debug!(unit = %unit, property = %name, "injected property");
    }
    Ok(())
  }
}

impl fmt::Debug for Inject {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let names: Vec<&str> = self.properties.keys().map(String::as_str).collect();
    write!(f, "Inject({})", names.join(", "))
  }
}
