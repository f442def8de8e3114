//! Workflow Engine — drives a Session through the project state machine,
//! persisting after every handler and emitting exactly one Wide Event at
//! termination.
//!
//! Grounded on `wiki/exhaustive/checkpoint.rs`'s enum-with-methods phase
//! tracking and persist-after-each-transition idiom, retargeted here from a
//! SQLite-backed checkpoint table to the JSON Artifact Store.

mod engine;
mod operator;
mod retry;

pub use engine::Engine;
pub use operator::{CiOperator, OperatorInterface, TestOutcome};
