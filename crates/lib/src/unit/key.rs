use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Object-safe view over a host-supplied identity value.
///
/// Implemented for every `Eq + Hash + Debug + Send + Sync + 'static` type, so
/// hosts can use type handles, enum tags, strings or anything else as unit ids.
pub trait KeyValue: Any + fmt::Debug + Send + Sync {
  fn as_any(&self) -> &dyn Any;
  fn dyn_eq(&self, other: &dyn KeyValue) -> bool;
  fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<T> KeyValue for T
where
  T: Any + Eq + Hash + fmt::Debug + Send + Sync,
{
  fn as_any(&self) -> &dyn Any {
    self
  }

  fn dyn_eq(&self, other: &dyn KeyValue) -> bool {
    other.as_any().downcast_ref::<T>().is_some_and(|other| self == other)
  }

  fn dyn_hash(&self, mut state: &mut dyn Hasher) {
    TypeId::of::<T>().hash(&mut state);
    self.hash(&mut state);
  }
}

/// Identity of a Rust type, produced by [`Key::of`].
#[derive(Clone, Copy)]
pub struct TypeKey {
  id: TypeId,
  name: &'static str,
}

impl TypeKey {
  pub fn of<T: ?Sized + 'static>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: std::any::type_name::<T>(),
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }
}

impl PartialEq for TypeKey {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl fmt::Debug for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// An opaque, type-erased identity used for unit ids and tokens.
///
/// Two keys are equal when they wrap values of the same type that compare
/// equal. Strings are always stored as `String`, so `Key::from("a")` and
/// `Key::from(String::from("a"))` are the same key.
#[derive(Clone)]
pub struct Key(Arc<dyn KeyValue>);

impl Key {
  pub fn new<T>(value: T) -> Self
  where
    T: Any + Eq + Hash + fmt::Debug + Send + Sync,
  {
    Self(Arc::new(value))
  }

  /// Key identifying the Rust type `T`.
  pub fn of<T: ?Sized + 'static>() -> Self {
    Self::new(TypeKey::of::<T>())
  }

  pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
    self.0.as_any().downcast_ref::<T>()
  }

  pub fn is<T: Any>(&self) -> bool {
    self.downcast_ref::<T>().is_some()
  }

  /// The string this key wraps, if it was built from one.
  pub fn as_str(&self) -> Option<&str> {
    self.downcast_ref::<String>().map(String::as_str)
  }
}

impl PartialEq for Key {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.0, &other.0) || self.0.dyn_eq(other.0.as_ref())
  }
}

impl Eq for Key {}

impl Hash for Key {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.0.dyn_hash(state);
  }
}

impl fmt::Debug for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(&*self.0, f)
  }
}

impl fmt::Display for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(s) = self.as_str() {
      f.write_str(s)
    } else if let Some(ty) = self.downcast_ref::<TypeKey>() {
      f.write_str(ty.name())
    } else {
      fmt::Debug::fmt(&*self.0, f)
    }
  }
}

impl From<&str> for Key {
  fn from(value: &str) -> Self {
    Self::new(value.to_string())
  }
}

impl From<String> for Key {
  fn from(value: String) -> Self {
    Self::new(value)
  }
}

impl From<TypeKey> for Key {
  fn from(value: TypeKey) -> Self {
    Self::new(value)
  }
}
