use std::fmt;
use std::sync::Arc;

use crate::unit::{Key, Unit};

type Predicate = dyn Fn(&Unit) -> bool + Send + Sync;

/// A named host predicate over units.
///
/// Closures can't be compared, so two custom patterns are equal only when
/// they share the same predicate allocation. Clone a pattern to reuse it in
/// several registrations that should deduplicate.
#[derive(Clone)]
pub struct CustomPattern {
  name: String,
  predicate: Arc<Predicate>,
}

impl CustomPattern {
  pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
  where
    F: Fn(&Unit) -> bool + Send + Sync + 'static,
  {
    Self {
      name: name.into(),
      predicate: Arc::new(predicate),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }
}

impl PartialEq for CustomPattern {
  fn eq(&self, other: &Self) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(&self.predicate), Arc::as_ptr(&other.predicate))
  }
}

impl Eq for CustomPattern {}

impl fmt::Debug for CustomPattern {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "CustomPattern({})", self.name)
  }
}

/// Predicate applied to one position of the descriptor stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitPattern {
  /// Id and token must both be equal (an absent token only matches absent).
  Exact(Unit),
  /// Id must be equal; any token.
  Id(Key),
  /// Token must be equal; any id.
  Token(Key),
  /// Host predicate.
  Custom(CustomPattern),
}

impl UnitPattern {
  pub fn exact(unit: Unit) -> Self {
    UnitPattern::Exact(unit)
  }

  pub fn id(id: impl Into<Key>) -> Self {
    UnitPattern::Id(id.into())
  }

  pub fn token(token: impl Into<Key>) -> Self {
    UnitPattern::Token(token.into())
  }

  pub fn custom<F>(name: impl Into<String>, predicate: F) -> Self
  where
    F: Fn(&Unit) -> bool + Send + Sync + 'static,
  {
    UnitPattern::Custom(CustomPattern::new(name, predicate))
  }

  pub fn matches(&self, unit: &Unit) -> bool {
    match self {
      UnitPattern::Exact(expected) => expected == unit,
      UnitPattern::Id(id) => &unit.id == id,
      UnitPattern::Token(token) => unit.token.as_ref() == Some(token),
      UnitPattern::Custom(custom) => (custom.predicate)(unit),
    }
  }
}

impl fmt::Display for UnitPattern {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      UnitPattern::Exact(unit) => write!(f, "{unit}"),
      UnitPattern::Id(id) => write!(f, "{id}@*"),
      UnitPattern::Token(token) => write!(f, "*@{token}"),
      UnitPattern::Custom(custom) => write!(f, "?{}", custom.name),
    }
  }
}
