//! # Sessionkit Testing
//!
//! Testing utilities and helpers for the sessionkit architecture.
//!
//! The main entry point is [`ReducerTest`], a fluent Given-When-Then harness
//! for exercising reducers at memory speed, without a Store or a runtime.

pub mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};
