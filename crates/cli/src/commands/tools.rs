//! `hearth tools`: list the tool catalog the agent sees.

use std::sync::Arc;

use hearth_tools::{InMemoryArtifactStore, default_registry};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let registry = default_registry(Arc::new(InMemoryArtifactStore::new()))?;

    println!("🧰 Available tools ({})", registry.len());
    println!();
    println!("{}", registry.catalog());
    Ok(())
}
