//! Engine configuration.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::action::Stage;
use crate::consts::DEFAULT_MAX_DEPTH;
use crate::error::ConfigError;

/// Fixed per-engine settings.
///
/// `stages` is the pipeline order every resolution follows, independent of
/// the order in which actions were registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
  pub stages: Vec<Stage>,
  pub max_depth: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      stages: vec![Stage::CACHE, Stage::INITIALIZE, Stage::CREATE],
      max_depth: DEFAULT_MAX_DEPTH,
    }
  }
}

impl EngineConfig {
  pub fn with_stages(mut self, stages: impl IntoIterator<Item = Stage>) -> Self {
    self.stages = stages.into_iter().collect();
    self
  }

  pub fn with_max_depth(mut self, max_depth: usize) -> Self {
    self.max_depth = max_depth;
    self
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.stages.is_empty() {
      return Err(ConfigError::NoStages);
    }
    let mut seen = HashSet::new();
    for stage in &self.stages {
      if !seen.insert(stage) {
        return Err(ConfigError::DuplicateStage(stage.clone()));
      }
    }
    if self.max_depth == 0 {
      return Err(ConfigError::InvalidMaxDepth);
    }
    Ok(())
  }

  pub fn has_stage(&self, stage: &Stage) -> bool {
    self.stages.contains(stage)
  }

  /// The pipeline rendered as `cache, initialize, create`.
  pub fn pipeline(&self) -> String {
    self.stages.iter().map(Stage::as_str).collect::<Vec<_>>().join(", ")
  }
}
