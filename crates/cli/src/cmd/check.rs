//! Implementation of the `rig check` command.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use rigging_lib::manifest::RuleDef;

use crate::output::{OutputFormat, print_info, print_json, print_stat, print_success};

use super::load_manifest;

/// Validate a manifest by building an engine from it.
pub fn cmd_check(path: &Path, format: OutputFormat) -> Result<()> {
  let manifest = load_manifest(path)?;
  let rules = count_rules(&manifest.rules);
  let fallback = manifest.fallback.len();

  let engine = manifest
    .into_engine()
    .with_context(|| format!("Invalid manifest {}", path.display()))?;
  let config = engine.config();

  if format.is_json() {
    print_json(&json!({
      "valid": true,
      "rules": rules,
      "fallback_actions": fallback,
      "stages": config.stages,
      "max_depth": config.max_depth,
    }))?;
  } else {
    print_success(&format!("{} is valid", path.display()));
    print_stat("Pipeline", &config.pipeline());
    print_stat("Rules", &rules.to_string());
    print_stat("Max depth", &config.max_depth.to_string());
    if fallback > 0 {
      print_info(&format!("{fallback} fallback action(s) apply to every unit"));
    }
  }
  Ok(())
}

fn count_rules(rules: &[RuleDef]) -> usize {
  rules.iter().map(|rule| 1 + count_rules(&rule.children)).sum()
}
