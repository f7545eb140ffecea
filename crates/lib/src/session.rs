//! One top-level build request and everything it resolves transitively.
//!
//! A [`BuildSession`] owns the descriptor stack. Every nested request made by
//! an action pushes onto the same stack, so matchers deeper in the tree see
//! the full chain of units that led to the current one.

use std::sync::Arc;

use tracing::debug;

use crate::action::{ActionRef, ActionState, Stage};
use crate::cache::CacheStore;
use crate::engine::Engine;
use crate::error::BuildError;
use crate::unit::{Unit, format_stack};
use crate::value::BuildValue;

/// The resolution session handed to build actions.
#[derive(Debug)]
pub struct BuildSession<'e> {
  engine: &'e Engine,
  stack: Vec<Unit>,
}

impl<'e> BuildSession<'e> {
  pub(crate) fn new(engine: &'e Engine) -> Self {
    Self {
      engine,
      stack: Vec::new(),
    }
  }

  pub fn engine(&self) -> &'e Engine {
    self.engine
  }

  /// The descriptor stack, outermost request first.
  pub fn stack(&self) -> &[Unit] {
    &self.stack
  }

  pub fn depth(&self) -> usize {
    self.stack.len()
  }

  pub fn cache(&self) -> &'e Arc<CacheStore> {
    self.engine.cache()
  }

  /// Resolve `unit`, returning `None` if no stage produced a value.
  ///
  /// Stages run in pipeline order; the first one whose selected action
  /// produces a value ends the loop. Every action that ran is then
  /// post-processed, in the order it ran, with that value, and committed once
  /// all post-processing succeeded.
  pub fn resolve(&mut self, unit: Unit) -> Result<Option<BuildValue>, BuildError> {
    self.enter(unit.clone())?;
    debug!(unit = %unit, depth = self.depth(), "resolving unit");
    let result = self.run_pipeline(&unit);
    self.stack.pop();

    match &result {
      Ok(Some(value)) => debug!(unit = %unit, value = value.type_name(), "resolved unit"),
      Ok(None) => debug!(unit = %unit, "no stage produced a value"),
      Err(err) => debug!(unit = %unit, error = %err, "resolution failed"),
    }
    result
  }

  /// Resolve a unit that must exist.
  pub fn build(&mut self, unit: Unit) -> Result<BuildValue, BuildError> {
    match self.resolve(unit.clone())? {
      Some(value) => Ok(value),
      None => {
        let mut stack = self.stack.clone();
        stack.push(unit.clone());
        Err(BuildError::Unresolved { unit, stack })
      }
    }
  }

  /// Build every required unit in order.
  pub fn build_each(&mut self, units: impl IntoIterator<Item = Unit>) -> Result<Vec<BuildValue>, BuildError> {
    units.into_iter().map(|unit| self.build(unit)).collect()
  }

  /// Run every distinct action matched for `unit` and collect their values.
  ///
  /// All candidates must live in a single stage; otherwise some values would
  /// come from one stage (say, a cache) and others from another, and the
  /// request fails with [`BuildError::AmbiguousStage`].
  pub fn resolve_all(&mut self, unit: Unit) -> Result<Vec<BuildValue>, BuildError> {
    self.enter(unit.clone())?;
    debug!(unit = %unit, depth = self.depth(), "resolving all units");
    let result = self.run_plural(&unit);
    self.stack.pop();

    if let Ok(values) = &result {
      debug!(unit = %unit, count = values.len(), "resolved all units");
    }
    result
  }

  fn enter(&mut self, unit: Unit) -> Result<(), BuildError> {
    let limit = self.engine.config().max_depth;
    if self.stack.len() >= limit {
      let mut stack = self.stack.clone();
      stack.push(unit.clone());
      debug!(unit = %unit, limit, stack = %format_stack(&stack), "depth limit reached");
      return Err(BuildError::RecursionLimit { unit, limit, stack });
    }
    self.stack.push(unit);
    Ok(())
  }

  fn run_pipeline(&mut self, unit: &Unit) -> Result<Option<BuildValue>, BuildError> {
    let engine = self.engine;
    let matched = engine.tree().match_actions(&self.stack);

    let mut executed: Vec<(ActionRef, ActionState)> = Vec::new();
    let mut produced = None;
    for stage in &engine.config().stages {
      let Some(selected) = matched.top(stage, unit)? else {
        continue;
      };
      debug!(unit = %unit, stage = %stage, weight = selected.weight, action = ?selected.action, "running action");

      let action = Arc::clone(&selected.action);
      let mut state = ActionState::default();
      let outcome = action.process(self, unit, &mut state);
      executed.push((action, state));
      if let Some(value) = outcome? {
        produced = Some(value);
        break;
      }
    }

    let Some(value) = produced else {
      return Ok(None);
    };
    for (action, state) in &mut executed {
      action.post_process(self, unit, &value, state)?;
    }
    for (action, state) in &mut executed {
      action.commit(unit, &value, state);
    }
    Ok(Some(value))
  }

  fn run_plural(&mut self, unit: &Unit) -> Result<Vec<BuildValue>, BuildError> {
    let engine = self.engine;
    let matched = engine.tree().match_actions(&self.stack);

    let stages: Vec<Stage> = engine
      .config()
      .stages
      .iter()
      .filter(|stage| !matched.get(stage).is_empty())
      .cloned()
      .collect();
    let stage = match stages.as_slice() {
      [] => return Ok(Vec::new()),
      [stage] => stage,
      _ => {
        return Err(BuildError::AmbiguousStage {
          unit: unit.clone(),
          stages,
        });
      }
    };

    let actions: Vec<ActionRef> = matched
      .distinct(stage)
      .into_iter()
      .map(|candidate| Arc::clone(&candidate.action))
      .collect();
    debug!(unit = %unit, stage = %stage, candidates = actions.len(), "running every candidate");

    let mut values = Vec::with_capacity(actions.len());
    for action in actions {
      let mut state = ActionState::default();
      if let Some(value) = action.process(self, unit, &mut state)? {
        action.post_process(self, unit, &value, &mut state)?;
        action.commit(unit, &value, &mut state);
        values.push(value);
      }
    }
    Ok(values)
  }
}
