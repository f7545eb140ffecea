//! Type-erased values produced by build actions.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value produced by resolving a unit.
///
/// Cloning is cheap and preserves identity: every clone points at the same
/// allocation, which is what [`BuildValue::ptr_eq`] compares. Singleton
/// resolutions hand out clones of one `BuildValue`.
#[derive(Clone)]
pub struct BuildValue {
  inner: Arc<dyn Any + Send + Sync>,
  type_name: &'static str,
}

impl BuildValue {
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self::from_arc(Arc::new(value))
  }

  /// Wrap an existing `Arc` without re-allocating, keeping its identity.
  pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
    Self {
      inner: value,
      type_name: std::any::type_name::<T>(),
    }
  }

  pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
    self.inner.downcast_ref::<T>()
  }

  pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    Arc::clone(&self.inner).downcast::<T>().ok()
  }

  pub fn is<T: Any>(&self) -> bool {
    self.inner.is::<T>()
  }

  /// Name of the concrete type behind this value.
  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  /// Whether both values are the very same instance.
  pub fn ptr_eq(&self, other: &BuildValue) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

impl fmt::Debug for BuildValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "BuildValue<{}>", self.type_name)
  }
}
