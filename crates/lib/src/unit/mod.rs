//! Unit descriptors: what the engine is asked to build.
//!
//! A [`Unit`] pairs an opaque identity ([`Key`]) with an optional token that
//! disambiguates between several registrations for the same identity. Units
//! are immutable and compare structurally, so they serve both as matching
//! input and as cache keys.
//!
//! During a resolution the session keeps a stack of units, from the top-level
//! request down to the unit currently being built:
//!
//! ```text
//! Service -> Service@Constructor -> repo@InjectValue
//! ```
//!
//! Matchers only ever see tail slices (`&[Unit]`) of that stack.

mod key;

pub use key::{Key, KeyValue, TypeKey};

use std::fmt;

/// Describes a unit to build.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Unit {
  pub id: Key,
  pub token: Option<Key>,
}

impl Unit {
  pub fn new(id: impl Into<Key>, token: Option<Key>) -> Self {
    Self { id: id.into(), token }
  }

  /// A unit identified by the Rust type `T`, without a token.
  pub fn of<T: ?Sized + 'static>() -> Self {
    Self::new(Key::of::<T>(), None)
  }

  /// A unit identified by a plain name, without a token.
  pub fn named(id: impl Into<String>) -> Self {
    Self::new(Key::from(id.into()), None)
  }

  pub fn with_token(mut self, token: impl Into<Key>) -> Self {
    self.token = Some(token.into());
    self
  }

  pub fn without_token(mut self) -> Self {
    self.token = None;
    self
  }
}

impl fmt::Display for Unit {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.token {
      Some(token) => write!(f, "{}@{}", self.id, token),
      None => write!(f, "{}", self.id),
    }
  }
}

impl fmt::Debug for Unit {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Unit({})", self)
  }
}

/// Tokens the engine's hosts use to address structural sub-units of a type.
///
/// Building `Unit::of::<T>().with_token(SpecialToken::Constructor)` asks "which
/// constructor should create `T`", while `InjectValue` marks the value to feed
/// into a parameter or property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialToken {
  Constructor,
  Property,
  InjectValue,
}

impl From<SpecialToken> for Key {
  fn from(value: SpecialToken) -> Self {
    Key::new(value)
  }
}

/// Render a descriptor stack as `A -> B -> C`.
pub fn format_stack(stack: &[Unit]) -> String {
  stack.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> ")
}
