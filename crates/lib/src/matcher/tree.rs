use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::action::{ActionRef, BuildAction, Stage};
use crate::error::ConfigError;
use crate::unit::{Unit, format_stack};

use super::matched::MatchedActions;
use super::sequence::{ActionRegistry, MatcherKind, SequenceMatcher, add_or_get, children_actions, fmt_actions};

/// Root of the matcher tree.
///
/// The root has no pattern of its own: its children are tested against the
/// whole descriptor stack, and actions registered on the root apply to every
/// unit at weight zero.
#[derive(Debug, Default, Clone)]
pub struct MatcherTree {
  actions: ActionRegistry,
  children: Vec<SequenceMatcher>,
}

impl MatcherTree {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn children(&self) -> &[SequenceMatcher] {
    &self.children
  }

  pub fn add_or_get_child(&mut self, kind: MatcherKind, weight: super::Weight) -> Result<&mut SequenceMatcher, ConfigError> {
    add_or_get(&mut self.children, kind, weight)
  }

  /// Register a fallback applying to every unit.
  pub fn add_action<A: BuildAction + 'static>(&mut self, stage: Stage, action: A) -> &mut Self {
    self.add_action_ref(stage, Arc::new(action))
  }

  pub fn add_action_ref(&mut self, stage: Stage, action: ActionRef) -> &mut Self {
    self.actions.add(stage, action);
    self
  }

  /// Collect every candidate action for the unit on top of `stack`.
  pub fn match_actions(&self, stack: &[Unit]) -> MatchedActions {
    let matched = MatchedActions::merge_opt(self.actions.weighted(0), children_actions(&self.children, stack, 0))
      .unwrap_or_default();
    trace!(stack = %format_stack(stack), stages = matched.stages().count(), "matched stack");
    matched
  }

  /// Every stage some registered action runs at.
  pub fn stages(&self) -> BTreeSet<Stage> {
    let mut stages = BTreeSet::new();
    for (stage, _) in self.actions.iter() {
      stages.insert(stage.clone());
    }
    for child in &self.children {
      child.collect_stages(&mut stages);
    }
    stages
  }
}

impl fmt::Display for MatcherTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "<root>")?;
    fmt_actions(f, &self.actions, 1)?;
    for child in &self.children {
      child.fmt_tree(f, 1)?;
    }
    Ok(())
  }
}
