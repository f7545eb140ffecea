//! Single-unit resolution: weights, stages and failures.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rigging_lib::action::{Factory, Instance, Stage};
use rigging_lib::config::EngineConfig;
use rigging_lib::engine::Engine;
use rigging_lib::error::BuildError;
use rigging_lib::matcher::{MatcherKind, MatcherTree, UnitPattern};
use rigging_lib::unit::{SpecialToken, Unit};
use rigging_lib::value::BuildValue;

use super::common::{Recorder, counting, engine_with, journal, text};

mod weights {
  use super::*;

  fn with_order(high_first: bool) -> Engine {
    engine_with(|tree| {
      let low = (MatcherKind::last(UnitPattern::id("D")), 5, "low");
      let high = (MatcherKind::weak([UnitPattern::id("D")]), 20, "high");
      let order = if high_first { [high, low] } else { [low, high] };
      for (kind, weight, label) in order {
        tree
          .add_or_get_child(kind, weight)
          .unwrap()
          .add_action(Stage::CREATE, Instance::of(label.to_string()));
      }
    })
  }

  #[test]
  fn highest_weight_wins_regardless_of_registration_order() {
    for high_first in [true, false] {
      let value = with_order(high_first).resolve(Unit::named("D")).unwrap();
      assert_eq!(text(&value), "high");
    }
  }

  #[test]
  fn equal_weights_are_ambiguous() {
    let engine = engine_with(|tree| {
      tree
        .add_or_get_child(MatcherKind::last(UnitPattern::id("D")), 10)
        .unwrap()
        .add_action(Stage::CREATE, Instance::of(1u8));
      tree
        .add_or_get_child(MatcherKind::weak([UnitPattern::id("D")]), 10)
        .unwrap()
        .add_action(Stage::CREATE, Instance::of(2u8));
    });

    let err = engine.resolve(Unit::named("D")).unwrap_err();
    assert!(
      matches!(&err, BuildError::AmbiguousAction { stage, weight: 10, candidates, .. }
        if *stage == Stage::CREATE && candidates.len() == 2),
      "unexpected error: {err}"
    );
  }

  #[test]
  fn token_specific_rule_beats_generic_one() {
    let engine = engine_with(|tree| {
      tree
        .add_or_get_child(MatcherKind::weak([UnitPattern::id("Repo")]), 5)
        .unwrap()
        .add_action(Stage::CREATE, Instance::of("generic".to_string()));
      tree
        .add_or_get_child(
          MatcherKind::weak([UnitPattern::exact(Unit::named("Repo").with_token("primary"))]),
          10,
        )
        .unwrap()
        .add_action(Stage::CREATE, Instance::of("primary".to_string()));
    });

    let primary = engine.resolve(Unit::named("Repo").with_token("primary")).unwrap();
    assert_eq!(text(&primary), "primary");
    let generic = engine.resolve(Unit::named("Repo")).unwrap();
    assert_eq!(text(&generic), "generic");
  }
}

mod stages {
  use super::*;

  #[test]
  fn cache_hit_skips_later_stages() {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = engine_with(|tree| {
      tree
        .add_or_get_child(MatcherKind::last(UnitPattern::id("D")), 0)
        .unwrap()
        .add_action(Stage::CREATE, counting("create", &calls))
        .add_action(Stage::INITIALIZE, counting("initialize", &calls))
        .add_action(Stage::CACHE, Instance::of("cached".to_string()));
    });

    let value = engine.resolve(Unit::named("D")).unwrap();
    assert_eq!(text(&value), "cached");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn pipeline_order_and_post_processing_order() {
    let journal = journal();
    let engine = engine_with(|tree| {
      tree
        .add_or_get_child(MatcherKind::last(UnitPattern::id("D")), 0)
        .unwrap()
        .add_action(Stage::CREATE, Recorder::producing("create", &journal))
        .add_action(Stage::INITIALIZE, Recorder::passing("initialize", &journal))
        .add_action(Stage::CACHE, Recorder::passing("cache", &journal));
    });

    engine.resolve(Unit::named("D")).unwrap();
    assert_eq!(
      *journal.lock(),
      vec![
        "process:cache",
        "process:initialize",
        "process:create",
        "post:cache",
        "post:initialize",
        "post:create",
      ]
    );
  }

  #[test]
  fn no_post_processing_without_a_value() {
    let journal = journal();
    let engine = engine_with(|tree| {
      tree
        .add_or_get_child(MatcherKind::last(UnitPattern::id("D")), 0)
        .unwrap()
        .add_action(Stage::INITIALIZE, Recorder::passing("initialize", &journal));
    });

    assert!(engine.resolve_optional(Unit::named("D")).unwrap().is_none());
    assert_eq!(*journal.lock(), vec!["process:initialize"]);
    assert!(matches!(engine.resolve(Unit::named("D")), Err(BuildError::Unresolved { .. })));
  }

  #[test]
  fn custom_pipeline_order() {
    let audit = Stage::from_static("audit");
    let journal = journal();
    let mut tree = MatcherTree::new();
    tree
      .add_or_get_child(MatcherKind::last(UnitPattern::id("D")), 0)
      .unwrap()
      .add_action(Stage::CREATE, Recorder::producing("create", &journal))
      .add_action(audit.clone(), Recorder::passing("audit", &journal));

    let config = EngineConfig::default().with_stages([audit, Stage::CREATE]);
    let engine = Engine::new(config, tree).unwrap();
    engine.resolve(Unit::named("D")).unwrap();
    assert_eq!(journal.lock()[..2], ["process:audit", "process:create"]);
  }
}

mod round_trip {
  use super::*;

  #[test]
  fn fixed_instance_is_returned_unchanged() {
    let instance = BuildValue::new(vec![1u32, 2, 3]);
    let shared = instance.clone();
    let engine = engine_with(move |tree| {
      tree
        .add_or_get_child(MatcherKind::last(UnitPattern::id("D")), 0)
        .unwrap()
        .add_action(Stage::CREATE, Instance::new(shared));
    });

    for _ in 0..3 {
      let value = engine.resolve(Unit::named("D")).unwrap();
      assert!(value.ptr_eq(&instance));
      assert_eq!(value.downcast_ref::<Vec<u32>>().unwrap(), &[1, 2, 3]);
    }
  }

  #[test]
  fn typed_units_and_special_tokens() {
    struct Service;

    let engine = engine_with(|tree| {
      tree
        .add_or_get_child(MatcherKind::any_with_token(SpecialToken::Constructor), 0)
        .unwrap()
        .add_action(Stage::CREATE, Instance::of("ctor".to_string()));
    });

    let ctor = engine
      .resolve(Unit::of::<Service>().with_token(SpecialToken::Constructor))
      .unwrap();
    assert_eq!(text(&ctor), "ctor");
    assert!(engine.resolve_optional(Unit::of::<Service>()).unwrap().is_none());
  }
}

mod failures {
  use super::*;

  #[test]
  fn nested_unresolved_aborts_the_whole_request() {
    let engine = engine_with(|tree| {
      tree
        .add_or_get_child(MatcherKind::last(UnitPattern::id("Service")), 0)
        .unwrap()
        .add_action(
          Stage::CREATE,
          Factory::new("service", |session, _| {
            let repo = session.build(Unit::named("Repo"))?;
            Ok(BuildValue::new(format!("service({})", repo.type_name())))
          }),
        );
    });

    let mut session = engine.session();
    let err = session.build(Unit::named("Service")).unwrap_err();
    match err {
      BuildError::Unresolved { unit, stack } => {
        assert_eq!(unit, Unit::named("Repo"));
        assert_eq!(stack, vec![Unit::named("Service"), Unit::named("Repo")]);
      }
      other => panic!("unexpected error: {other}"),
    }
    assert_eq!(session.depth(), 0);
  }

  #[test]
  fn self_dependency_hits_the_depth_limit() {
    let mut tree = MatcherTree::new();
    tree
      .add_or_get_child(MatcherKind::any(), 0)
      .unwrap()
      .add_or_get_child(MatcherKind::last(UnitPattern::id("A")), 0)
      .unwrap()
      .add_action(
        Stage::CREATE,
        Factory::new("a", |session, _| session.build(Unit::named("A"))),
      );
    let engine = Engine::new(EngineConfig::default().with_max_depth(8), tree).unwrap();

    let mut session = engine.session();
    let err = session.build(Unit::named("A")).unwrap_err();
    match err {
      BuildError::RecursionLimit { unit, limit, stack } => {
        assert_eq!(unit, Unit::named("A"));
        assert_eq!(limit, 8);
        assert_eq!(stack.len(), 9);
      }
      other => panic!("unexpected error: {other}"),
    }
    assert_eq!(session.depth(), 0);
  }

  #[test]
  fn action_errors_propagate_unchanged() {
    let engine = engine_with(|tree| {
      tree
        .add_or_get_child(MatcherKind::last(UnitPattern::id("D")), 0)
        .unwrap()
        .add_action(
          Stage::CREATE,
          Factory::new("broken", |_, _| Err(BuildError::action("broken", "disk on fire"))),
        );
    });

    let err = engine.resolve(Unit::named("D")).unwrap_err();
    assert_eq!(err.to_string(), "broken failed: disk on fire");
  }
}
