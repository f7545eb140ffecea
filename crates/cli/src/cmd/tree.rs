//! Implementation of the `rig tree` command.

use std::path::Path;

use anyhow::Result;
use serde_json::json;

use crate::output::{OutputFormat, print_json};

use super::load_engine;

/// Print the matcher tree a manifest produces, one node or action per line.
pub fn cmd_tree(path: &Path, format: OutputFormat) -> Result<()> {
  let engine = load_engine(path)?;
  let rendered = engine.tree().to_string();

  if format.is_json() {
    let lines: Vec<&str> = rendered.lines().collect();
    print_json(&json!({ "stages": engine.config().stages, "tree": lines }))?;
  } else {
    println!("pipeline: {}", engine.config().pipeline());
    print!("{rendered}");
  }
  Ok(())
}
