use std::collections::HashMap;

use crate::action::{Stage, WeightedAction};
use crate::error::BuildError;
use crate::unit::Unit;

/// Per-stage candidate actions produced by one tree match.
#[derive(Debug, Default, Clone)]
pub struct MatchedActions {
  by_stage: HashMap<Stage, Vec<WeightedAction>>,
}

impl MatchedActions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, stage: Stage, action: WeightedAction) {
    self.by_stage.entry(stage).or_default().push(action);
  }

  /// Union of both candidate sets, stage by stage.
  pub fn merge(mut self, other: MatchedActions) -> Self {
    for (stage, actions) in other.by_stage {
      self.by_stage.entry(stage).or_default().extend(actions);
    }
    self
  }

  /// Merge two optional results; `None` stands for "no match".
  pub fn merge_opt(left: Option<Self>, right: Option<Self>) -> Option<Self> {
    match (left, right) {
      (Some(left), Some(right)) => Some(left.merge(right)),
      (left, None) => left,
      (None, right) => right,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.by_stage.values().all(Vec::is_empty)
  }

  pub fn get(&self, stage: &Stage) -> &[WeightedAction] {
    self.by_stage.get(stage).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Stages that have at least one candidate, in no particular order.
  pub fn stages(&self) -> impl Iterator<Item = &Stage> {
    self.by_stage.iter().filter(|(_, actions)| !actions.is_empty()).map(|(stage, _)| stage)
  }

  /// Select the action with the strictly highest weight at `stage`.
  ///
  /// The same action reached through several paths counts once. Two distinct
  /// actions sharing the top weight are reported as
  /// [`BuildError::AmbiguousAction`] instead of picking one arbitrarily.
  pub fn top(&self, stage: &Stage, unit: &Unit) -> Result<Option<&WeightedAction>, BuildError> {
    let candidates = self.get(stage);
    let Some(best) = candidates.iter().max_by_key(|candidate| candidate.weight) else {
      return Ok(None);
    };

    let mut winners: Vec<&WeightedAction> = Vec::new();
    for candidate in candidates.iter().filter(|c| c.weight == best.weight) {
      if !winners.iter().any(|w| w.same_action(candidate)) {
        winners.push(candidate);
      }
    }

    if winners.len() > 1 {
      return Err(BuildError::AmbiguousAction {
        unit: unit.clone(),
        stage: stage.clone(),
        weight: best.weight,
        candidates: winners.iter().map(|w| format!("{:?}", w.action)).collect(),
      });
    }

    Ok(Some(best))
  }

  /// Every distinct action at `stage`, highest weight first.
  ///
  /// An action reached through several paths is kept once, with its highest
  /// weight. Ties keep match order.
  pub fn distinct(&self, stage: &Stage) -> Vec<&WeightedAction> {
    let mut ordered: Vec<&WeightedAction> = self.get(stage).iter().collect();
    ordered.sort_by(|a, b| b.weight.cmp(&a.weight));

    let mut distinct: Vec<&WeightedAction> = Vec::with_capacity(ordered.len());
    for candidate in ordered {
      if !distinct.iter().any(|d| d.same_action(candidate)) {
        distinct.push(candidate);
      }
    }
    distinct
  }
}
