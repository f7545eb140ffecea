//! The top-level resolution API.

use std::any::{Any, type_name};
use std::sync::Arc;

use tracing::debug;

use crate::cache::CacheStore;
use crate::config::EngineConfig;
use crate::error::{BuildError, ConfigError};
use crate::matcher::MatcherTree;
use crate::session::BuildSession;
use crate::unit::Unit;
use crate::value::BuildValue;

/// A configured dependency-construction engine.
///
/// The matcher tree is frozen when the engine is created and only read
/// afterwards, so an engine can be shared across threads and cloned freely.
/// Clones share the tree and the singleton cache.
///
/// ```
/// use rigging_lib::action::{Instance, Stage};
/// use rigging_lib::config::EngineConfig;
/// use rigging_lib::engine::Engine;
/// use rigging_lib::matcher::{MatcherKind, MatcherTree, UnitPattern};
/// use rigging_lib::unit::Unit;
///
/// let mut tree = MatcherTree::new();
/// tree
///   .add_or_get_child(MatcherKind::last(UnitPattern::id("greeting")), 0)?
///   .add_action(Stage::CREATE, Instance::of(String::from("hello")));
///
/// let engine = Engine::new(EngineConfig::default(), tree)?;
/// let greeting = engine.resolve_as::<String>(Unit::named("greeting"))?;
/// assert_eq!(greeting.as_str(), "hello");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
  config: Arc<EngineConfig>,
  tree: Arc<MatcherTree>,
  cache: Arc<CacheStore>,
}

impl Engine {
  /// Validate `config` against `tree` and freeze both.
  pub fn new(config: EngineConfig, tree: MatcherTree) -> Result<Self, ConfigError> {
    config.validate()?;
    if let Some(stage) = tree.stages().into_iter().find(|stage| !config.has_stage(stage)) {
      return Err(ConfigError::UnknownStage {
        stage,
        pipeline: config.pipeline(),
      });
    }
    debug!(pipeline = %config.pipeline(), max_depth = config.max_depth, "engine ready");

    Ok(Self {
      config: Arc::new(config),
      tree: Arc::new(tree),
      cache: Arc::new(CacheStore::new()),
    })
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn tree(&self) -> &MatcherTree {
    &self.tree
  }

  pub fn cache(&self) -> &Arc<CacheStore> {
    &self.cache
  }

  /// Open a session for issuing several requests that share nothing but the
  /// engine.
  pub fn session(&self) -> BuildSession<'_> {
    BuildSession::new(self)
  }

  /// Build a unit that must exist.
  pub fn resolve(&self, unit: Unit) -> Result<BuildValue, BuildError> {
    self.session().build(unit)
  }

  /// Build a unit, returning `None` if nothing produces it.
  pub fn resolve_optional(&self, unit: Unit) -> Result<Option<BuildValue>, BuildError> {
    self.session().resolve(unit)
  }

  /// Build every registration of `unit`. At least one must produce a value.
  pub fn resolve_all(&self, unit: Unit) -> Result<Vec<BuildValue>, BuildError> {
    let values = self.session().resolve_all(unit.clone())?;
    if values.is_empty() {
      return Err(BuildError::Unresolved {
        stack: vec![unit.clone()],
        unit,
      });
    }
    Ok(values)
  }

  /// Build a unit and downcast its value to `T`.
  pub fn resolve_as<T: Any + Send + Sync>(&self, unit: Unit) -> Result<Arc<T>, BuildError> {
    let value = self.resolve(unit.clone())?;
    value.downcast::<T>().ok_or_else(|| BuildError::UnexpectedValue {
      unit,
      expected: type_name::<T>(),
      actual: value.type_name(),
    })
  }

  /// Drop the cached value of `unit`. Returns whether one was stored.
  pub fn invalidate(&self, unit: &Unit) -> bool {
    let removed = self.cache.invalidate(unit);
    debug!(unit = %unit, removed, "invalidated cache entry");
    removed
  }

  pub fn clear_cache(&self) {
    self.cache.clear();
    debug!("cleared cache");
  }
}
