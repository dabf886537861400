//! Content-generation providers for hearth.
//!
//! All providers implement the `hearth_core::Provider` trait.
//! The router builds the configured provider (or fallback chain) from config.

pub mod fallback;
pub mod openai_compat;
pub mod router;

pub use fallback::FallbackProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
