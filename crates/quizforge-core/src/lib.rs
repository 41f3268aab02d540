//! quizforge-core: Adaptive item selection and mastery engine.
//!
//! This crate defines the quiz data model, the collaborator traits (content
//! generator and stores), and the decision logic built on them: item parsing,
//! the generation cache, the item selector, mastery tracking, and the quiz
//! session state machine.

pub mod bank;
pub mod cache;
pub mod error;
pub mod lock;
pub mod mastery;
pub mod memory;
pub mod model;
pub mod parser;
pub mod prompt;
pub mod selector;
pub mod session;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;
