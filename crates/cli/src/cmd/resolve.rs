//! Implementation of the `rig resolve` command.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Value, json};

use rigging_lib::manifest::{Document, Manifest};
use rigging_lib::unit::Unit;
use rigging_lib::value::BuildValue;

use crate::output::{OutputFormat, compact, print_json, print_stat, print_success};

use super::load_engine;

/// What to resolve and how often.
#[derive(Debug)]
pub struct ResolveRequest {
  pub id: String,
  pub token: Option<String>,
  pub all: bool,
  pub repeat: u32,
}

/// Execute the resolve command.
///
/// With `--all` every registration of the unit is built once. Otherwise the
/// unit is resolved `repeat` times on one engine, which shows whether the
/// manifest makes it a singleton.
pub fn cmd_resolve(path: &Path, request: &ResolveRequest, format: OutputFormat) -> Result<()> {
  let engine = load_engine(path)?;
  let unit = Manifest::unit(&request.id, request.token.as_deref());

  if request.all {
    let values = engine
      .resolve_all(unit.clone())
      .with_context(|| format!("Failed to resolve all units of {unit}"))?;
    let values = values
      .iter()
      .map(|value| to_json(&unit, value))
      .collect::<Result<Vec<_>>>()?;

    if format.is_json() {
      print_json(&json!({ "unit": unit.to_string(), "values": values }))?;
    } else {
      print_success(&format!("Resolved {} value(s) for {unit}", values.len()));
      for value in &values {
        println!("  {}", compact(value));
      }
    }
    return Ok(());
  }

  let mut values = Vec::with_capacity(request.repeat as usize);
  for _ in 0..request.repeat {
    let value = engine
      .resolve(unit.clone())
      .with_context(|| format!("Failed to resolve {unit}"))?;
    values.push(value);
  }
  let first = values.first().context("No resolution was requested")?;
  let same_instance = values.iter().all(|value| value.ptr_eq(first));
  let value = to_json(&unit, first)?;

  if format.is_json() {
    print_json(&json!({
      "unit": unit.to_string(),
      "value": value,
      "resolutions": values.len(),
      "same_instance": same_instance,
    }))?;
  } else {
    print_success(&format!("Resolved {unit}"));
    println!("{}", serde_json::to_string_pretty(&value)?);
    if values.len() > 1 {
      print_stat("Resolutions", &values.len().to_string());
      print_stat("Same instance", if same_instance { "yes" } else { "no" });
    }
  }
  Ok(())
}

fn to_json(unit: &Unit, value: &BuildValue) -> Result<Value> {
  Document::of(value)
    .map(Document::snapshot)
    .with_context(|| format!("{unit} produced {}, not a JSON document", value.type_name()))
}
