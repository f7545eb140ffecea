//! Plural resolution of every registration of a unit.

use std::sync::Arc;

use rigging_lib::action::{ActionRef, Instance, Redirect, Singleton, Stage};
use rigging_lib::error::BuildError;
use rigging_lib::matcher::{MatcherKind, UnitPattern};
use rigging_lib::unit::Unit;

use super::common::{Recorder, engine_with, journal, text};

fn texts(values: &[rigging_lib::value::BuildValue]) -> Vec<&str> {
  values.iter().map(text).collect()
}

#[test]
fn returns_every_implementation_highest_weight_first() {
  let engine = engine_with(|tree| {
    tree
      .add_or_get_child(MatcherKind::last(UnitPattern::id("Plugin")), 0)
      .unwrap()
      .add_action(Stage::CREATE, Instance::of("metrics".to_string()));
    tree
      .add_or_get_child(MatcherKind::weak([UnitPattern::id("Plugin")]), 10)
      .unwrap()
      .add_action(Stage::CREATE, Redirect::to("AuthPlugin"));
    tree
      .add_or_get_child(MatcherKind::weak([UnitPattern::id("AuthPlugin")]), 10)
      .unwrap()
      .add_action(Stage::CREATE, Instance::of("auth".to_string()));
  });

  let values = engine.resolve_all(Unit::named("Plugin")).unwrap();
  assert_eq!(texts(&values), vec!["auth", "metrics"]);

  let single = engine.resolve(Unit::named("Plugin")).unwrap();
  assert_eq!(text(&single), "auth");
}

#[test]
fn shared_action_runs_once() {
  let shared: ActionRef = Arc::new(Instance::of("only".to_string()));
  let engine = engine_with(|tree| {
    tree
      .add_or_get_child(MatcherKind::last(UnitPattern::id("Plugin")), 0)
      .unwrap()
      .add_action_ref(Stage::CREATE, Arc::clone(&shared));
    tree
      .add_or_get_child(MatcherKind::weak([UnitPattern::id("Plugin")]), 10)
      .unwrap()
      .add_action_ref(Stage::CREATE, Arc::clone(&shared));
  });

  let values = engine.resolve_all(Unit::named("Plugin")).unwrap();
  assert_eq!(texts(&values), vec!["only"]);
  assert!(engine.resolve(Unit::named("Plugin")).is_ok(), "one action via two paths isn't ambiguous");
}

#[test]
fn candidates_across_stages_fail_fast() {
  let engine = engine_with(|tree| {
    tree
      .add_or_get_child(MatcherKind::last(UnitPattern::id("Plugin")), 0)
      .unwrap()
      .add_action(Stage::CREATE, Instance::of("plain".to_string()));
    tree
      .add_or_get_child(MatcherKind::weak([UnitPattern::id("Plugin")]), 10)
      .unwrap()
      .add_action(Stage::CACHE, Singleton)
      .add_action(Stage::CREATE, Instance::of("cached".to_string()));
  });

  let err = engine.resolve_all(Unit::named("Plugin")).unwrap_err();
  match &err {
    BuildError::AmbiguousStage { unit, stages } => {
      assert_eq!(unit, &Unit::named("Plugin"));
      assert_eq!(stages, &vec![Stage::CACHE, Stage::CREATE]);
    }
    other => panic!("unexpected error: {other}"),
  }
  assert_eq!(
    err.to_string(),
    "building all units of Plugin involves more than one stage: cache, create"
  );
  assert!(engine.cache().is_empty());
}

#[test]
fn each_value_is_post_processed() {
  let journal = journal();
  let engine = engine_with(|tree| {
    tree
      .add_or_get_child(MatcherKind::last(UnitPattern::id("Plugin")), 0)
      .unwrap()
      .add_action(Stage::CREATE, Recorder::producing("a", &journal));
    tree
      .add_or_get_child(MatcherKind::weak([UnitPattern::id("Plugin")]), 10)
      .unwrap()
      .add_action(Stage::CREATE, Recorder::producing("b", &journal));
  });

  let values = engine.resolve_all(Unit::named("Plugin")).unwrap();
  assert_eq!(values.len(), 2);
  assert_eq!(*journal.lock(), vec!["process:b", "post:b", "process:a", "post:a"]);
}

#[test]
fn nested_plural_request_sees_the_stack() {
  let engine = engine_with(|tree| {
    tree
      .add_or_get_child(MatcherKind::strict([UnitPattern::id("Host"), UnitPattern::id("Plugin")]), 20)
      .unwrap()
      .add_action(Stage::CREATE, Instance::of("hosted".to_string()));
    tree
      .add_or_get_child(MatcherKind::last(UnitPattern::id("Host")), 0)
      .unwrap()
      .add_action(
        Stage::CREATE,
        rigging_lib::action::Factory::new("host", |session, _| {
          let plugins = session.resolve_all(Unit::named("Plugin"))?;
          Ok(rigging_lib::value::BuildValue::new(plugins.len()))
        }),
      );
  });

  let host = engine.resolve_as::<usize>(Unit::named("Host")).unwrap();
  assert_eq!(*host, 1);
  assert!(matches!(
    engine.resolve_all(Unit::named("Plugin")),
    Err(BuildError::Unresolved { .. })
  ));
}
