//! Request orchestration module.
//!
//! Sequences load, mutate, save and restart for the managed compose file.

pub mod stack;

pub use stack::{ComposeOrchestrator, InsertRequest};
