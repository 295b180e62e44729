//! End-to-end word-counting example, on a development-mode instance.

use settle::{Actions, Calculations, Settle, SideEffect, SideEffects};
use std::sync::{Arc, Mutex};

mod common;
use common::{Model, count_words, set_words};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn words_are_counted_and_rendered() {
    init_tracing();
    let rendered = Arc::new(Mutex::new(Vec::new()));
    let sink = rendered.clone();

    let settle: Settle<Model> = settle::development();
    settle.set_state(Model::default()).unwrap();
    settle
        .register_actions(Actions::new().add("set_words", set_words()))
        .unwrap();
    settle
        .register_calculations(Calculations::new().add("count_words", count_words()))
        .unwrap();
    settle
        .register_side_effects(SideEffects::new().add(
            "render",
            SideEffect::new(move |locked: &Arc<Model>, _, _| {
                sink.lock()
                    .unwrap()
                    .push(format!("{} ({})", locked.words, locked.count));
            }),
        ))
        .unwrap();

    settle
        .dispatch("set_words", "a few short words".to_string())
        .unwrap();

    let state = settle.current_state().unwrap();
    assert_eq!(state.count, 4);
    assert_eq!(*rendered.lock().unwrap(), ["a few short words (4)"]);
}

#[test]
fn unchanged_cycles_render_nothing() {
    init_tracing();
    let rendered = Arc::new(Mutex::new(0));
    let sink = rendered.clone();

    let settle: Settle<Model> = settle::development();
    settle
        .set_state(Model {
            words: "same".into(),
            count: 1,
        })
        .unwrap();
    settle
        .register_actions(Actions::new().add(
            "keep",
            settle::Action::new(|_: &(), state: &Arc<Model>| state.clone()),
        ))
        .unwrap();
    settle
        .register_side_effects(SideEffects::new().add(
            "render",
            SideEffect::new(move |_, _, _| *sink.lock().unwrap() += 1),
        ))
        .unwrap();

    settle.dispatch("keep", ()).unwrap();
    settle.dispatch("keep", ()).unwrap();
    assert_eq!(*rendered.lock().unwrap(), 0);
}

#[test]
fn external_events_feed_back_through_dispatchers() {
    init_tracing();
    // A side effect may hand a dispatcher to the outside world; the next
    // cycle happens after the current one released the flag.
    let pending = Arc::new(Mutex::new(Vec::<String>::new()));

    let settle: Settle<Model> = settle::development();
    settle.set_state(Model::default()).unwrap();
    settle
        .register_actions(Actions::new().add("set_words", set_words()))
        .unwrap();
    settle
        .register_calculations(Calculations::new().add("count_words", count_words()))
        .unwrap();
    let queue = pending.clone();
    settle
        .register_side_effects(SideEffects::new().add(
            "enqueue_shout",
            SideEffect::new(move |locked: &Arc<Model>, _, _| {
                if locked.words.chars().any(|c| c.is_lowercase()) {
                    queue.lock().unwrap().push(locked.words.to_uppercase());
                }
            }),
        ))
        .unwrap();

    settle.dispatch("set_words", "quiet".to_string()).unwrap();

    // Drain the queue outside the cycle, as an external scheduler would.
    let queued: Vec<String> = std::mem::take(&mut *pending.lock().unwrap());
    for words in queued {
        settle.dispatch("set_words", words).unwrap();
    }

    assert_eq!(settle.current_state().unwrap().words, "QUIET");
}
