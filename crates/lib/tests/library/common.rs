//! Shared fixtures for library integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rigging_lib::action::{ActionState, BuildAction, Factory};
use rigging_lib::config::EngineConfig;
use rigging_lib::engine::Engine;
use rigging_lib::error::BuildError;
use rigging_lib::matcher::MatcherTree;
use rigging_lib::session::BuildSession;
use rigging_lib::unit::Unit;
use rigging_lib::value::BuildValue;

/// Build an engine with the default pipeline from a tree configured in place.
pub fn engine_with(configure: impl FnOnce(&mut MatcherTree)) -> Engine {
  let mut tree = MatcherTree::new();
  configure(&mut tree);
  Engine::new(EngineConfig::default(), tree).unwrap()
}

/// A factory producing a fresh `String` on every call and counting calls.
pub fn counting(label: &'static str, calls: &Arc<AtomicUsize>) -> Factory {
  let calls = Arc::clone(calls);
  Factory::new(label, move |_, _| {
    calls.fetch_add(1, Ordering::SeqCst);
    Ok(BuildValue::new(label.to_string()))
  })
}

pub fn text(value: &BuildValue) -> &str {
  value.downcast_ref::<String>().unwrap()
}

/// Records `process:<label>` / `post:<label>` into a shared journal.
///
/// Produces a value only when constructed with [`Recorder::producing`].
#[derive(Debug)]
pub struct Recorder {
  label: &'static str,
  journal: Arc<Mutex<Vec<String>>>,
  produces: bool,
}

impl Recorder {
  pub fn passing(label: &'static str, journal: &Arc<Mutex<Vec<String>>>) -> Self {
    Self {
      label,
      journal: Arc::clone(journal),
      produces: false,
    }
  }

  pub fn producing(label: &'static str, journal: &Arc<Mutex<Vec<String>>>) -> Self {
    Self {
      produces: true,
      ..Self::passing(label, journal)
    }
  }
}

impl BuildAction for Recorder {
  fn process(
    &self,
    _session: &mut BuildSession<'_>,
    _unit: &Unit,
    _state: &mut ActionState,
  ) -> Result<Option<BuildValue>, BuildError> {
    self.journal.lock().push(format!("process:{}", self.label));
    Ok(self.produces.then(|| BuildValue::new(self.label.to_string())))
  }

  fn post_process(
    &self,
    _session: &mut BuildSession<'_>,
    _unit: &Unit,
    _value: &BuildValue,
    _state: &mut ActionState,
  ) -> Result<(), BuildError> {
    self.journal.lock().push(format!("post:{}", self.label));
    Ok(())
  }
}

pub fn journal() -> Arc<Mutex<Vec<String>>> {
  Arc::new(Mutex::new(Vec::new()))
}
