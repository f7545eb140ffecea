//! Error types for configuration and resolution.
//!
//! Configuration mistakes are reported as [`ConfigError`] while the matcher
//! tree and engine are being set up; nothing in that enum can surface during a
//! resolution. Resolution failures are [`BuildError`]s and always propagate to
//! the caller of `resolve`/`resolve_all` unchanged.

use thiserror::Error;

use crate::action::Stage;
use crate::matcher::Weight;
use crate::unit::{Unit, format_stack};

/// Errors detected while registering rules or building an engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  /// A strict or weak matcher was given no patterns.
  #[error("{kind} matcher requires at least one unit pattern")]
  EmptyPattern { kind: &'static str },

  /// A pattern accepts nothing useful (no id and no token).
  #[error("invalid unit pattern: {0}")]
  InvalidPattern(String),

  /// The stage pipeline is empty.
  #[error("the stage pipeline must contain at least one stage")]
  NoStages,

  /// A stage appears twice in the pipeline.
  #[error("stage '{0}' appears more than once in the pipeline")]
  DuplicateStage(Stage),

  /// An action was registered at a stage the pipeline does not run.
  #[error("action registered at stage '{stage}' which is not in the pipeline [{pipeline}]")]
  UnknownStage { stage: Stage, pipeline: String },

  /// `max_depth` must allow at least the top-level unit.
  #[error("max_depth must be greater than zero")]
  InvalidMaxDepth,
}

/// Errors raised while resolving units.
#[derive(Debug, Error)]
pub enum BuildError {
  /// No stage produced a value for a required unit.
  #[error("unit {unit} can't be built (stack: {})", format_stack(.stack))]
  Unresolved { unit: Unit, stack: Vec<Unit> },

  /// Two or more distinct actions share the highest weight at a stage.
  #[error("{} actions matched {unit} at stage '{stage}' with the same weight {weight}: {}", .candidates.len(), .candidates.join(", "))]
  AmbiguousAction {
    unit: Unit,
    stage: Stage,
    weight: Weight,
    candidates: Vec<String>,
  },

  /// A plural request matched actions at more than one stage.
  #[error("building all units of {unit} involves more than one stage: {}", join_stages(.stages))]
  AmbiguousStage { unit: Unit, stages: Vec<Stage> },

  /// The descriptor stack grew beyond the configured limit.
  #[error("resolution of {unit} exceeded the depth limit of {limit}, probably a cyclic dependency (stack: {})", format_stack(.stack))]
  RecursionLimit {
    unit: Unit,
    limit: usize,
    stack: Vec<Unit>,
  },

  /// A produced value was not of the type the caller asked for.
  #[error("unit {unit} produced a value of type {actual}, expected {expected}")]
  UnexpectedValue {
    unit: Unit,
    expected: &'static str,
    actual: &'static str,
  },

  /// A build action failed on its own terms.
  #[error("{action} failed: {message}")]
  Action { action: String, message: String },
}

impl BuildError {
  /// Convenience constructor for action-level failures.
  pub fn action(action: impl Into<String>, message: impl Into<String>) -> Self {
    BuildError::Action {
      action: action.into(),
      message: message.into(),
    }
  }

  /// The unit the error is about, if it names one.
  pub fn unit(&self) -> Option<&Unit> {
    match self {
      BuildError::Unresolved { unit, .. }
      | BuildError::AmbiguousAction { unit, .. }
      | BuildError::AmbiguousStage { unit, .. }
      | BuildError::RecursionLimit { unit, .. }
      | BuildError::UnexpectedValue { unit, .. } => Some(unit),
      BuildError::Action { .. } => None,
    }
  }
}

fn join_stages(stages: &[Stage]) -> String {
  stages.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
