//! Engines described by JSON manifests.

use std::fs;

use serde_json::json;

use rigging_lib::manifest::{Document, Manifest, ManifestError};
use rigging_lib::unit::Unit;
use rigging_lib::value::BuildValue;

fn json_of(value: &BuildValue) -> serde_json::Value {
  Document::of(value).unwrap().snapshot()
}

const SERVICE_MANIFEST: &str = r#"{
  "engine": { "stages": ["cache", "initialize", "create"], "max_depth": 32 },
  "rules": [
    {
      "kind": "weak",
      "units": [{ "id": "Service" }],
      "actions": [
        { "stage": "cache", "do": "singleton" },
        { "stage": "initialize", "do": "inject", "properties": { "logger": { "id": "Logger" } } },
        { "stage": "create", "do": "record", "fields": { "repo": { "id": "Repo" } } }
      ]
    },
    {
      "kind": "weak",
      "units": [{ "id": "Repo" }],
      "actions": [{ "stage": "create", "do": "value", "value": { "url": "sqlite://default" } }]
    },
    {
      "kind": "strict",
      "units": [{ "id": "Service" }, { "id": "Repo" }],
      "actions": [{ "stage": "create", "do": "value", "value": { "url": "sqlite://service" } }]
    },
    {
      "kind": "weak",
      "units": [{ "id": "Logger" }],
      "actions": [{ "stage": "create", "do": "value", "value": "stderr" }]
    },
    {
      "kind": "any",
      "token": "primary",
      "actions": [
        { "stage": "create", "do": "redirect", "id": "Repo", "inherit_token": true }
      ]
    },
    {
      "kind": "weak",
      "units": [{ "id": "Repo", "token": "primary" }],
      "weight": 30,
      "actions": [{ "stage": "create", "do": "value", "value": { "url": "sqlite://primary" } }]
    }
  ]
}"#;

#[test]
fn strict_override_applies_only_within_the_chain() {
  let engine = Manifest::from_json(SERVICE_MANIFEST).unwrap().into_engine().unwrap();

  let service = engine.resolve(Unit::named("Service")).unwrap();
  assert_eq!(json_of(&service)["repo"], json!({ "url": "sqlite://service" }));

  let repo = engine.resolve(Unit::named("Repo")).unwrap();
  assert_eq!(json_of(&repo), json!({ "url": "sqlite://default" }));
}

#[test]
fn singleton_with_injected_properties() {
  let engine = Manifest::from_json(SERVICE_MANIFEST).unwrap().into_engine().unwrap();

  let first = engine.resolve(Unit::named("Service")).unwrap();
  let second = engine.resolve(Unit::named("Service")).unwrap();
  assert!(first.ptr_eq(&second));
  assert_eq!(
    json_of(&first),
    json!({
      "type": "Service",
      "repo": { "url": "sqlite://service" },
      "logger": "stderr"
    })
  );
}

#[test]
fn redirect_inherits_token() {
  let engine = Manifest::from_json(SERVICE_MANIFEST).unwrap().into_engine().unwrap();

  let value = engine.resolve(Manifest::unit("Storage", Some("primary"))).unwrap();
  assert_eq!(json_of(&value), json!({ "url": "sqlite://primary" }));
}

#[test]
fn loads_from_disk() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("rig.json");
  fs::write(&path, SERVICE_MANIFEST).unwrap();

  let manifest = Manifest::from_path(&path).unwrap();
  assert_eq!(manifest.engine.max_depth, 32);
  assert_eq!(manifest.rules.len(), 6);
  assert!(manifest.into_engine().is_ok());
}

#[test]
fn malformed_manifests_are_rejected() {
  assert!(matches!(Manifest::from_json("{ not json"), Err(ManifestError::Parse(_))));

  let empty_units = Manifest::from_json(r#"{ "rules": [{ "kind": "strict", "units": [] }] }"#).unwrap();
  let err = empty_units.into_engine().unwrap_err();
  assert_eq!(
    err.to_string(),
    "invalid manifest: strict matcher requires at least one unit pattern"
  );
}

#[test]
fn record_field_must_be_a_document() {
  let manifest = Manifest::from_json(
    r#"{ "rules": [
      { "kind": "last", "unit": { "id": "Service" },
        "actions": [{ "stage": "create", "do": "record", "fields": { "repo": { "id": "Repo" } } }] }
    ] }"#,
  )
  .unwrap();
  let engine = manifest.into_engine().unwrap();

  let err = engine.resolve(Unit::named("Service")).unwrap_err();
  assert_eq!(err.to_string(), "unit Repo can't be built (stack: Service -> Repo)");
}

#[test]
fn failed_injection_is_not_cached() {
  let manifest = Manifest::from_json(
    r#"{ "rules": [
      { "kind": "weak", "units": [{ "id": "Service" }],
        "actions": [
          { "stage": "cache", "do": "singleton" },
          { "stage": "initialize", "do": "inject", "properties": { "log": { "id": "Missing" } } },
          { "stage": "create", "do": "record", "fields": {} }
        ] }
    ] }"#,
  )
  .unwrap();
  let engine = manifest.into_engine().unwrap();

  for _ in 0..2 {
    let err = engine.resolve(Unit::named("Service")).unwrap_err();
    assert_eq!(err.to_string(), "unit Missing can't be built (stack: Service -> Missing)");
  }
  assert!(engine.cache().is_empty());
}

#[test]
fn extreme_weights_saturate() {
  let manifest = Manifest::from_json(
    r#"{ "rules": [
      { "kind": "any", "weight": 2147483647,
        "children": [
          { "kind": "last", "unit": { "id": "A" }, "weight": 1,
            "actions": [{ "stage": "create", "do": "value", "value": "top" }] }
        ] }
    ] }"#,
  )
  .unwrap();
  let engine = manifest.into_engine().unwrap();

  let value = engine.resolve(Unit::named("A")).unwrap();
  assert_eq!(json_of(&value), json!("top"));
}
