//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use settle::{Action, Calculation};
use std::sync::Arc;

/// The word-counting model used across the suite.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Model {
    pub words: String,
    pub count: usize,
}

/// Replace the words, carrying the stale count into the transient state.
pub fn set_words() -> Action<Model, String> {
    Action::new(|words: &String, state: &Arc<Model>| {
        Arc::new(Model {
            words: words.clone(),
            count: state.count,
        })
    })
}

/// Derive the word count, returning the prior state untouched when the count
/// is already correct.
pub fn count_words() -> Calculation<Model> {
    Calculation::new(|prior: &Arc<Model>, _| {
        let count = prior.words.split_whitespace().count();
        if count == prior.count {
            prior.clone()
        } else {
            Arc::new(Model {
                words: prior.words.clone(),
                count,
            })
        }
    })
}
