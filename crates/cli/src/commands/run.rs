//! `hearth run`: run one request through the agent executor.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use hearth_agent::{
    AgentExecutor, AgentProgress, AgentResult, ChannelReporter, ExecutorSettings, ProgressStatus,
    RunRequest,
};
use hearth_config::AppConfig;
use hearth_tools::{InMemoryArtifactStore, default_registry};

/// Characters of streamed text shown per `thinking` line.
const THINKING_PREVIEW_CHARS: usize = 60;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// The request to run
    #[arg(short, long)]
    pub message: String,

    /// User the request runs for
    #[arg(long, default_value = "local")]
    pub user: String,

    /// Scenario label passed to every tool
    #[arg(long, default_value = "cli")]
    pub scenario: String,

    /// Extra context: preferences, constraints, prior state
    #[arg(long)]
    pub context: Option<String>,

    /// Override the step budget
    #[arg(long)]
    pub max_steps: Option<u32>,

    /// Override the wall-clock budget, in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    fn to_request(&self) -> RunRequest {
        let mut request = RunRequest::new(&self.user, &self.scenario, &self.message);
        if let Some(context) = &self.context {
            request = request.with_context(context);
        }
        if let Some(max_steps) = self.max_steps {
            request = request.with_max_steps(max_steps);
        }
        if let Some(ms) = self.timeout_ms {
            request = request.with_timeout(Duration::from_millis(ms));
        }
        request
    }
}

pub async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!("⚠️  No API key configured. Set HEARTH_API_KEY or OPENAI_API_KEY.");
    }

    tracing::debug!(provider = %config.default_provider, model = %config.default_model, "Configuration loaded");

    let provider = hearth_providers::build_from_config(&config)?;
    let tools = default_registry(Arc::new(InMemoryArtifactStore::new()))?;
    let executor = AgentExecutor::new(
        provider,
        Arc::new(tools),
        ExecutorSettings::from(&config.agent),
    );

    let (reporter, mut rx) = ChannelReporter::channel(64);
    let printer = tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            if let Some(line) = format_progress(&progress) {
                eprintln!("{line}");
            }
        }
    });

    let result = executor.run(args.to_request(), Some(Arc::new(reporter))).await;
    // The reporter is dropped with the run, which closes the channel.
    let _ = printer.await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    Ok(())
}

/// One stderr line for a progress snapshot, if it is worth showing.
fn format_progress(progress: &AgentProgress) -> Option<String> {
    let prefix = format!("[{}/{}]", progress.step, progress.max_steps);
    match progress.status {
        ProgressStatus::Starting => Some("🔥 Starting".to_string()),
        ProgressStatus::Thinking => {
            let preview: String = progress
                .message
                .chars()
                .rev()
                .take(THINKING_PREVIEW_CHARS)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            let preview = preview.replace('\n', " ");
            Some(format!("{prefix} 💭 {}", preview.trim()))
        }
        ProgressStatus::Tool => Some(format!("{prefix} 🔧 {}", progress.message)),
        ProgressStatus::Finalizing => Some(format!("{prefix} 🧐 {}", progress.message)),
        ProgressStatus::Error => Some(format!("{prefix} ❌ {}", progress.message)),
        ProgressStatus::Done => None,
    }
}

fn print_result(result: &AgentResult) {
    println!("{}", result.final_answer);

    if let Some(instruction) = &result.chained_instruction {
        println!();
        println!("↪️  Follow-up: {instruction}");
    }
    if let Some(artifacts) = &result.updated_artifacts {
        println!();
        println!(
            "📋 Updated lists: {}",
            serde_json::to_string_pretty(artifacts).unwrap_or_default()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(status: ProgressStatus, message: &str) -> AgentProgress {
        AgentProgress {
            step: 2,
            max_steps: 10,
            status,
            message: message.into(),
            transcript_so_far: vec![],
            last_tool_used: None,
        }
    }

    #[test]
    fn progress_lines() {
        assert_eq!(
            format_progress(&snapshot(ProgressStatus::Tool, "Using find_recipe")).unwrap(),
            "[2/10] 🔧 Using find_recipe"
        );
        assert!(format_progress(&snapshot(ProgressStatus::Done, "Done")).is_none());
    }

    #[test]
    fn thinking_preview_is_tail() {
        let long = format!("{}\"action\": \"find_recipe\"", "x".repeat(200));
        let line = format_progress(&snapshot(ProgressStatus::Thinking, &long)).unwrap();
        assert!(line.ends_with("\"action\": \"find_recipe\""));
        assert!(line.chars().count() < 100);
    }

    #[test]
    fn args_build_request() {
        let args = RunArgs {
            message: "Find cookies".into(),
            user: "u1".into(),
            scenario: "kitchen".into(),
            context: Some("Allergic to peanuts".into()),
            max_steps: Some(3),
            timeout_ms: Some(5000),
            json: false,
        };
        let request = args.to_request();
        assert_eq!(request.context.user_id, "u1");
        assert_eq!(request.context.scenario, "kitchen");
        assert_eq!(request.context_info, "Allergic to peanuts");
        assert_eq!(request.max_steps, Some(3));
        assert_eq!(request.timeout, Some(Duration::from_millis(5000)));
    }
}
