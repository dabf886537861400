//! # hearth core
//!
//! Domain types, traits, and error definitions for the hearth agent runtime.
//! This crate performs no I/O of its own. It defines the seams the reasoning
//! loop talks through:
//!
//! - [`Provider`]: the content-generation service (single-shot and streaming)
//! - [`Tool`] / [`ToolRegistry`]: named, side-effecting capabilities
//! - [`ToolOutcome`]: the envelope every tool returns
//! - [`RunContext`]: the caller bundle handed unmodified to every tool call
//!
//! Implementations live in their respective crates, so the loop can be
//! exercised end to end with scripted providers and in-memory tools.

pub mod error;
pub mod outcome;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolError};
pub use outcome::{StructuredOutcome, ToolOutcome};
pub use provider::{ChunkReceiver, GenerationRequest, Provider};
pub use tool::{CHAIN_TASK, RunContext, Tool, ToolRegistry};
