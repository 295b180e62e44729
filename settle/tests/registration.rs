//! Registration flow, the instance factory, and the standard guard-rail
//! modules.

use settle::{
    Action, Actions, Calculation, Calculations, Dedupe, Instances, Lockdown, Requirements, Settle,
    SideEffect, SideEffects,
};
use std::sync::{Arc, Mutex};

mod common;
use common::{Model, count_words, set_words};

#[test]
fn named_instances_are_singletons() {
    let instances: Instances<Model> = Instances::new();
    let first = instances.named("app");
    let second = instances.named("app");
    assert!(first.same_instance(&second));
    assert_eq!(first.label(), "settle:app");
}

#[test]
fn removed_instances_are_anonymised_but_keep_working() {
    let instances: Instances<i32> = Instances::new();
    let original = instances.named("short-lived");
    original.set_state(0).unwrap();

    let removed = instances.remove("short-lived").unwrap();
    assert!(removed.same_instance(&original));
    assert_eq!(original.name(), None);
    assert!(!instances.has("short-lived"));

    original
        .register_actions(Actions::new().add("bump", Action::new(|_: &(), s: &Arc<i32>| Arc::new(**s + 1))))
        .unwrap();
    original.dispatch("bump", ()).unwrap();
    assert_eq!(*original.current_state().unwrap(), 1);

    // The name is free for a fresh instance.
    let replacement = instances.named("short-lived");
    assert!(!replacement.same_instance(&original));
}

#[test]
fn set_state_with_threads_the_existing_state() {
    let settle: Settle<Model> = Settle::new();
    settle.set_state_with(|current| {
        assert!(current.is_none());
        Arc::new(Model::default())
    })
    .unwrap();
    settle
        .set_state_with(|current| {
            let current = current.expect("initialised above");
            Arc::new(Model {
                words: "kept".into(),
                ..(*current).clone()
            })
        })
        .unwrap();
    assert_eq!(settle.current_state().unwrap().words, "kept");
}

#[test]
fn init_hands_over_every_dispatcher() {
    let settle: Settle<Model> = Settle::new();
    settle.set_state(Model::default()).unwrap();
    settle
        .register_actions(
            Actions::new()
                .add("set_words", set_words())
                .add("clear", Action::new(|_: &(), _| Arc::new(Model::default()))),
        )
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let slot = seen.clone();
    settle.init(move |dispatchers| {
        *slot.lock().unwrap() = dispatchers.names();
        // Typed lookup works from here too.
        let set_words = dispatchers.get::<String>("set_words").unwrap();
        set_words.call("from init".to_string()).unwrap();
    });

    assert_eq!(*seen.lock().unwrap(), ["set_words", "clear"]);
    assert_eq!(settle.current_state().unwrap().words, "from init");
}

#[test]
fn lockdown_freezes_the_shape_after_first_dispatch() {
    let settle: Settle<Model> = Settle::new();
    settle.hooks(Lockdown);
    settle.set_state(Model::default()).unwrap();
    settle
        .register_actions(Actions::new().add("set_words", set_words()))
        .unwrap();

    settle.dispatch("set_words", "go".to_string()).unwrap();

    let err = settle
        .register_calculations(Calculations::new().add("count_words", count_words()))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Attempt to add calculations count_words to settle:(anon) after the first action was dispatched"
    );
    let err = settle.set_state(Model::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Attempt to set state of settle:(anon) after the first action was dispatched"
    );
}

#[test]
fn dedupe_keeps_the_first_registration() {
    let settle: Settle<i32> = Settle::new();
    settle.hooks(Dedupe);
    settle.set_state(0).unwrap();
    settle
        .register_actions(Actions::new().add("set", Action::new(|_: &(), _| Arc::new(1))))
        .unwrap();

    let err = settle
        .register_actions(Actions::new().add("set", Action::new(|_: &(), _| Arc::new(2))))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Attempt to add an existing action 'set' to settle:(anon)"
    );

    settle.dispatch("set", ()).unwrap();
    assert_eq!(*settle.current_state().unwrap(), 1);
}

#[test]
fn requirements_accept_only_earlier_batches() {
    let settle: Settle<Model> = Settle::new();
    settle.hooks(Requirements);

    // A requirement inside the same batch is not yet registered.
    let err = settle
        .register_calculations(
            Calculations::new()
            .add("count_words", count_words())
            .add(
                "summary",
                Calculation::new(|prior: &Arc<Model>, _| prior.clone()).requires_calculations(["count_words"]),
            ),
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Calculation 'summary' requires the calculation 'count_words' in settle:(anon)"
    );

    // Split into two batches it registers.
    settle
        .register_calculations(Calculations::new().add("count_words", count_words()))
        .unwrap();
    settle
        .register_calculations(Calculations::new().add(
            "summary",
            Calculation::new(|prior: &Arc<Model>, _| prior.clone()).requires_calculations(["count_words"]),
        ))
        .unwrap();
    assert_eq!(settle.calculation_names(), ["count_words", "summary"]);

    // Side effects may require both kinds.
    settle
        .register_side_effects(SideEffects::new().add("render", SideEffect::new(|_, _, _| {})))
        .unwrap();
    settle
        .register_side_effects(SideEffects::new().add(
            "report",
            SideEffect::new(|_, _, _| {})
                .requires_calculations(["summary"])
                .requires_side_effects(["render"]),
        ))
        .unwrap();
    assert_eq!(settle.side_effect_names(), ["render", "report"]);
}

#[test]
fn batch_rejection_leaves_no_partial_registration() {
    let settle: Settle<i32> = Settle::new();
    settle.hooks(Requirements);

    settle
        .register_calculations(
            Calculations::new()
                .add("fine", Calculation::new(|prior: &Arc<i32>, _| prior.clone()))
                .add(
                    "broken",
                    Calculation::new(|prior: &Arc<i32>, _| prior.clone()).requires_calculations(["missing"]),
                ),
        )
        .unwrap_err();

    // The bulk hook rejected the batch before any item was installed.
    assert!(settle.calculation_names().is_empty());
}
