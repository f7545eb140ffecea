//! Serialized rule definitions.
//!
//! # Example
//!
//! ```json
//! {
//!   "engine": { "stages": ["cache", "initialize", "create"] },
//!   "rules": [
//!     {
//!       "kind": "weak",
//!       "units": [{ "id": "Service" }],
//!       "actions": [
//!         { "stage": "cache", "do": "singleton" },
//!         { "stage": "create", "do": "record", "fields": { "repo": { "id": "Repo" } } }
//!       ],
//!       "children": [
//!         {
//!           "kind": "weak",
//!           "units": [{ "id": "Repo" }],
//!           "actions": [{ "stage": "create", "do": "value", "value": { "url": "memory" } }]
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::Stage;
use crate::error::ConfigError;
use crate::matcher::{MatcherKind, UnitPattern, Weight};
use crate::unit::{Key, Unit};

/// A unit named by string id and optional token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDef {
  pub id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub token: Option<String>,
}

impl UnitDef {
  pub fn to_unit(&self) -> Unit {
    Unit::new(self.id.as_str(), self.token.as_deref().map(Key::from))
  }
}

/// One position of a stack pattern.
///
/// Both fields set is an exact match; one field matches on that field alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub token: Option<String>,
}

impl PatternDef {
  pub fn to_pattern(&self) -> Result<UnitPattern, ConfigError> {
    match (&self.id, &self.token) {
      (Some(id), Some(token)) => Ok(UnitPattern::exact(Unit::named(id.as_str()).with_token(token.as_str()))),
      (Some(id), None) => Ok(UnitPattern::id(id.as_str())),
      (None, Some(token)) => Ok(UnitPattern::token(token.as_str())),
      (None, None) => Err(ConfigError::InvalidPattern(
        "a pattern needs an id, a token or both".to_string(),
      )),
    }
  }
}

/// Matcher node kind, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KindDef {
  Any {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
  },
  Last {
    unit: PatternDef,
  },
  Strict {
    units: Vec<PatternDef>,
  },
  Weak {
    units: Vec<PatternDef>,
  },
}

impl KindDef {
  pub fn to_kind(&self) -> Result<MatcherKind, ConfigError> {
    fn patterns(defs: &[PatternDef]) -> Result<Vec<UnitPattern>, ConfigError> {
      defs.iter().map(PatternDef::to_pattern).collect()
    }

    let kind = match self {
      KindDef::Any { token: None } => MatcherKind::any(),
      KindDef::Any { token: Some(token) } => MatcherKind::any_with_token(token.as_str()),
      KindDef::Last { unit } => MatcherKind::last(unit.to_pattern()?),
      KindDef::Strict { units } => MatcherKind::Strict(patterns(units)?),
      KindDef::Weak { units } => MatcherKind::Weak(patterns(units)?),
    };
    kind.validate()?;
    Ok(kind)
  }
}

/// What an action does, tagged by `do`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "do", rename_all = "snake_case")]
pub enum ActionKindDef {
  /// A fixed JSON document, the same instance on every resolution.
  Value { value: serde_json::Value },
  /// Cache the unit's value for the lifetime of the engine.
  Singleton,
  /// Build another unit instead.
  Redirect {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default)]
    inherit_token: bool,
  },
  /// Build an object whose fields are other units.
  Record { fields: BTreeMap<String, UnitDef> },
  /// Once the value exists, set properties on it from other units.
  Inject { properties: BTreeMap<String, UnitDef> },
}

/// An action registered at one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
  pub stage: Stage,
  #[serde(flatten)]
  pub action: ActionKindDef,
}

/// A matcher node with its actions and nested rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDef {
  #[serde(flatten)]
  pub kind: KindDef,
  /// Defaults to the kind's standard weight.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub weight: Option<Weight>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub actions: Vec<ActionDef>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub children: Vec<RuleDef>,
}
