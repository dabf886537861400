//! The hearth agent executor.
//!
//! A bounded reasoning loop that turns one natural-language request into a
//! final answer:
//!
//! 1. **Think**: stream one generation and parse it into a [`Decision`]
//! 2. **Act**: run the chosen tool under a timeout
//! 3. **Observe**: append the outcome to the [`Scratchpad`] and loop
//! 4. **Review**: a proposed final answer goes to the [`Critic`] first
//!
//! Every run ends with an [`AgentResult`], even when the provider fails,
//! the budget runs out, or a tool panics.

pub mod critic;
pub mod executor;
pub mod parser;
pub mod progress;
pub mod prompt;
pub mod scratchpad;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use critic::{Critic, CriticVerdict};
pub use executor::{AgentExecutor, AgentResult, ExecutorSettings, RunRequest, Termination};
pub use parser::{Decision, ParseFailure, parse_decision};
pub use progress::{AgentProgress, ChannelReporter, ProgressError, ProgressReporter, ProgressStatus};
pub use scratchpad::{EntryKind, Scratchpad, ScratchpadEntry};
