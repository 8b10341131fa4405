//! Shared test utilities for docintel integration tests.
//!
//! - `TestHarness` wires an in-memory database, a temp upload directory,
//!   the queue and the broadcaster together
//! - Scripted collaborators stand in for the LLM

pub mod harness;
pub mod stubs;

pub use harness::TestHarness;
pub use stubs::{sample_result, ScriptedAnalyzer};
