use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::action::{ActionRef, BuildAction, Stage, WeightedAction};
use crate::consts::{ANY_WEIGHT, LAST_WEIGHT, STRICT_WEIGHT, WEAK_WEIGHT};
use crate::error::ConfigError;
use crate::unit::{Key, Unit};

use super::matched::MatchedActions;
use super::pattern::UnitPattern;
use super::Weight;

/// How a matcher node tests the descriptor stack tail it is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatcherKind {
  /// Accepts any stack and focuses on the unit under construction; children
  /// see only that unit. The optional token must equal the unit's token.
  Any { token: Option<Key> },
  /// Accepts a tail of exactly one unit that the pattern matches. Children
  /// see the same unit.
  Last(UnitPattern),
  /// The patterns must match the first positions of the tail contiguously.
  /// The rest of the tail goes to children.
  Strict(Vec<UnitPattern>),
  /// The patterns must match a subsequence of the tail, gaps allowed. The
  /// part after the last matched unit goes to children.
  Weak(Vec<UnitPattern>),
}

/// What a successful node test leaves for the node's own actions and children.
enum Reach<'u> {
  /// The node stays on the unit under construction: own actions apply and
  /// children see the same slice.
  Focus(&'u [Unit]),
  /// The node consumed a prefix of the tail. Own actions apply only if
  /// nothing is left; otherwise the remainder goes to children.
  Consumed(&'u [Unit]),
}

impl MatcherKind {
  pub fn any() -> Self {
    MatcherKind::Any { token: None }
  }

  pub fn any_with_token(token: impl Into<Key>) -> Self {
    MatcherKind::Any {
      token: Some(token.into()),
    }
  }

  pub fn last(pattern: UnitPattern) -> Self {
    MatcherKind::Last(pattern)
  }

  pub fn strict(patterns: impl IntoIterator<Item = UnitPattern>) -> Self {
    MatcherKind::Strict(patterns.into_iter().collect())
  }

  pub fn weak(patterns: impl IntoIterator<Item = UnitPattern>) -> Self {
    MatcherKind::Weak(patterns.into_iter().collect())
  }

  pub fn name(&self) -> &'static str {
    match self {
      MatcherKind::Any { .. } => "any",
      MatcherKind::Last(_) => "last",
      MatcherKind::Strict(_) => "strict",
      MatcherKind::Weak(_) => "weak",
    }
  }

  /// Weight used when a rule doesn't specify one.
  pub fn default_weight(&self) -> Weight {
    match self {
      MatcherKind::Any { .. } => ANY_WEIGHT,
      MatcherKind::Last(_) => LAST_WEIGHT,
      MatcherKind::Strict(_) => STRICT_WEIGHT,
      MatcherKind::Weak(_) => WEAK_WEIGHT,
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    match self {
      MatcherKind::Strict(patterns) | MatcherKind::Weak(patterns) if patterns.is_empty() => {
        Err(ConfigError::EmptyPattern { kind: self.name() })
      }
      _ => Ok(()),
    }
  }

  fn reach<'u>(&self, tail: &'u [Unit]) -> Option<Reach<'u>> {
    match self {
      MatcherKind::Any { token } => {
        let focus = tail.len().checked_sub(1).map(|last| &tail[last..])?;
        if let Some(token) = token
          && focus[0].token.as_ref() != Some(token)
        {
          return None;
        }
        Some(Reach::Focus(focus))
      }

      MatcherKind::Last(pattern) => match tail {
        [unit] if pattern.matches(unit) => Some(Reach::Focus(tail)),
        _ => None,
      },

      MatcherKind::Strict(patterns) => {
        if tail.len() < patterns.len() {
          return None;
        }
        let contiguous = patterns.iter().zip(tail).all(|(pattern, unit)| pattern.matches(unit));
        contiguous.then(|| Reach::Consumed(&tail[patterns.len()..]))
      }

      MatcherKind::Weak(patterns) => {
        let mut next = 0;
        for pattern in patterns {
          let offset = tail[next..].iter().position(|unit| pattern.matches(unit))?;
          next += offset + 1;
        }
        Some(Reach::Consumed(&tail[next..]))
      }
    }
  }
}

impl fmt::Display for MatcherKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fn list(f: &mut fmt::Formatter<'_>, name: &str, patterns: &[UnitPattern]) -> fmt::Result {
      let joined = patterns.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
      write!(f, "{name}[{joined}]")
    }

    match self {
      MatcherKind::Any { token: None } => write!(f, "Any"),
      MatcherKind::Any { token: Some(token) } => write!(f, "Any@{token}"),
      MatcherKind::Last(pattern) => write!(f, "Last({pattern})"),
      MatcherKind::Strict(patterns) => list(f, "Strict", patterns),
      MatcherKind::Weak(patterns) => list(f, "Weak", patterns),
    }
  }
}

/// Actions registered directly on one node, grouped by stage.
#[derive(Debug, Default, Clone)]
pub struct ActionRegistry {
  by_stage: BTreeMap<Stage, Vec<ActionRef>>,
}

impl ActionRegistry {
  pub fn add(&mut self, stage: Stage, action: ActionRef) {
    self.by_stage.entry(stage).or_default().push(action);
  }

  pub fn is_empty(&self) -> bool {
    self.by_stage.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&Stage, &[ActionRef])> {
    self.by_stage.iter().map(|(stage, actions)| (stage, actions.as_slice()))
  }

  /// All actions stamped with `weight`, or `None` when there are none.
  pub fn weighted(&self, weight: Weight) -> Option<MatchedActions> {
    if self.is_empty() {
      return None;
    }
    let mut matched = MatchedActions::new();
    for (stage, actions) in &self.by_stage {
      for action in actions {
        matched.push(stage.clone(), WeightedAction::new(weight, action.clone()));
      }
    }
    Some(matched)
  }
}

/// A node of the matcher tree.
///
/// Nodes are assembled at configuration time with
/// [`add_or_get_child`](Self::add_or_get_child) and
/// [`add_action`](Self::add_action), then frozen inside an
/// [`Engine`](crate::engine::Engine). Matching is a read-only walk.
#[derive(Debug, Clone)]
pub struct SequenceMatcher {
  kind: MatcherKind,
  weight: Weight,
  actions: ActionRegistry,
  children: Vec<SequenceMatcher>,
}

impl SequenceMatcher {
  pub fn new(kind: MatcherKind, weight: Weight) -> Result<Self, ConfigError> {
    kind.validate()?;
    Ok(Self {
      kind,
      weight,
      actions: ActionRegistry::default(),
      children: Vec::new(),
    })
  }

  pub fn kind(&self) -> &MatcherKind {
    &self.kind
  }

  pub fn weight(&self) -> Weight {
    self.weight
  }

  pub fn actions(&self) -> &ActionRegistry {
    &self.actions
  }

  pub fn children(&self) -> &[SequenceMatcher] {
    &self.children
  }

  /// Register `action` on this node at `stage`.
  pub fn add_action<A: BuildAction + 'static>(&mut self, stage: Stage, action: A) -> &mut Self {
    self.add_action_ref(stage, Arc::new(action))
  }

  /// Register an already shared action. The same handle registered on several
  /// nodes counts as one action when candidates are ranked.
  pub fn add_action_ref(&mut self, stage: Stage, action: ActionRef) -> &mut Self {
    self.actions.add(stage, action);
    self
  }

  /// Return the child with the same kind and weight, creating it if missing.
  pub fn add_or_get_child(&mut self, kind: MatcherKind, weight: Weight) -> Result<&mut SequenceMatcher, ConfigError> {
    add_or_get(&mut self.children, kind, weight)
  }

  /// Match `tail` against this node and its subtree.
  ///
  /// Returns `None` when neither the node nor any child contributes. Weights
  /// saturate at the bounds of [`Weight`].
  pub fn match_actions(&self, tail: &[Unit], input_weight: Weight) -> Option<MatchedActions> {
    let Some(reach) = self.kind.reach(tail) else {
      trace!(matcher = %self.kind, "no match");
      return None;
    };
    let weight = input_weight.saturating_add(self.weight);

    let matched = match reach {
      Reach::Focus(focus) => {
        MatchedActions::merge_opt(self.actions.weighted(weight), children_actions(&self.children, focus, weight))
      }
      Reach::Consumed([]) => self.actions.weighted(weight),
      Reach::Consumed(rest) => children_actions(&self.children, rest, weight),
    };
    trace!(matcher = %self.kind, weight, contributed = matched.is_some(), "matched");
    matched
  }

  pub(crate) fn collect_stages(&self, stages: &mut BTreeSet<Stage>) {
    for (stage, _) in self.actions.iter() {
      stages.insert(stage.clone());
    }
    for child in &self.children {
      child.collect_stages(stages);
    }
  }

  pub(crate) fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    writeln!(f, "{indent}{}<{}>", self.kind, self.weight)?;
    fmt_actions(f, &self.actions, depth + 1)?;
    for child in &self.children {
      child.fmt_tree(f, depth + 1)?;
    }
    Ok(())
  }
}

pub(crate) fn add_or_get(
  children: &mut Vec<SequenceMatcher>,
  kind: MatcherKind,
  weight: Weight,
) -> Result<&mut SequenceMatcher, ConfigError> {
  if let Some(index) = children.iter().position(|c| c.kind == kind && c.weight == weight) {
    return Ok(&mut children[index]);
  }
  let index = children.len();
  children.push(SequenceMatcher::new(kind, weight)?);
  Ok(&mut children[index])
}

pub(crate) fn children_actions(children: &[SequenceMatcher], tail: &[Unit], weight: Weight) -> Option<MatchedActions> {
  children
    .iter()
    .fold(None, |acc, child| MatchedActions::merge_opt(acc, child.match_actions(tail, weight)))
}

pub(crate) fn fmt_actions(f: &mut fmt::Formatter<'_>, actions: &ActionRegistry, depth: usize) -> fmt::Result {
  let indent = "  ".repeat(depth);
  for (stage, list) in actions.iter() {
    for action in list {
      writeln!(f, "{indent}+ {stage}: {action:?}")?;
    }
  }
  Ok(())
}
