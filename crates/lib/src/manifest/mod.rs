//! Declarative engine configuration.
//!
//! A manifest is a JSON file describing an engine pipeline and a tree of
//! rules. Ids and tokens are plain strings and every value is a JSON
//! [`Document`], which is enough to drive the engine without any host code.

mod document;
mod types;

pub use document::{Document, Inject, Record};
pub use types::*;

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::action::{ActionRef, Instance, Redirect, RedirectToken, Singleton};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::ConfigError;
use crate::matcher::{MatcherTree, SequenceMatcher};
use crate::unit::{Key, Unit};
use crate::value::BuildValue;

/// Errors that can occur when loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  /// Failed to read the manifest file.
  #[error("failed to read manifest: {0}")]
  Read(#[source] io::Error),

  /// Failed to parse the manifest JSON.
  #[error("failed to parse manifest: {0}")]
  Parse(#[source] serde_json::Error),

  /// The manifest parsed but describes an invalid engine.
  #[error("invalid manifest: {0}")]
  Invalid(#[from] ConfigError),
}

/// A complete engine description.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
  #[serde(default)]
  pub engine: EngineConfig,
  /// Actions applying to every unit at weight zero.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub fallback: Vec<ActionDef>,
  #[serde(default)]
  pub rules: Vec<RuleDef>,
}

impl Manifest {
  pub fn from_json(content: &str) -> Result<Self, ManifestError> {
    serde_json::from_str(content).map_err(ManifestError::Parse)
  }

  pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
    let content = fs::read_to_string(path).map_err(ManifestError::Read)?;
    Self::from_json(&content)
  }

  /// The unit a manifest refers to as `id` / `token`.
  pub fn unit(id: &str, token: Option<&str>) -> Unit {
    Unit::new(id, token.map(Key::from))
  }

  /// Assemble the matcher tree and hand it to a new engine.
  pub fn into_engine(self) -> Result<Engine, ManifestError> {
    let mut tree = MatcherTree::new();
    for def in &self.fallback {
      tree.add_action_ref(def.stage.clone(), action(def));
    }
    for rule in &self.rules {
      let node = tree.add_or_get_child(rule.kind.to_kind()?, weight(rule)?)?;
      apply_rule(node, rule)?;
    }
    debug!(rules = self.rules.len(), "assembled matcher tree");
    Ok(Engine::new(self.engine, tree)?)
  }
}

fn weight(rule: &RuleDef) -> Result<crate::matcher::Weight, ConfigError> {
  Ok(match rule.weight {
    Some(weight) => weight,
    None => rule.kind.to_kind()?.default_weight(),
  })
}

fn apply_rule(node: &mut SequenceMatcher, rule: &RuleDef) -> Result<(), ConfigError> {
  for def in &rule.actions {
    node.add_action_ref(def.stage.clone(), action(def));
  }
  for child in &rule.children {
    let child_node = node.add_or_get_child(child.kind.to_kind()?, weight(child)?)?;
    apply_rule(child_node, child)?;
  }
  Ok(())
}

fn action(def: &ActionDef) -> ActionRef {
  fn units(defs: &std::collections::BTreeMap<String, UnitDef>) -> Vec<(String, Unit)> {
    defs.iter().map(|(name, def)| (name.clone(), def.to_unit())).collect()
  }

  match &def.action {
    ActionKindDef::Value { value } => Arc::new(Instance::new(BuildValue::new(Document::new(value.clone())))),
    ActionKindDef::Singleton => Arc::new(Singleton),
    ActionKindDef::Redirect {
      id,
      token,
      inherit_token,
    } => {
      let token = match (token, inherit_token) {
        (Some(token), _) => RedirectToken::Explicit(Key::from(token.as_str())),
        (None, true) => RedirectToken::Inherit,
        (None, false) => RedirectToken::None,
      };
      Arc::new(Redirect::new(id.as_str(), token))
    }
    ActionKindDef::Record { fields } => Arc::new(Record::new(units(fields))),
    ActionKindDef::Inject { properties } => Arc::new(Inject::new(units(properties))),
  }
}
