//! The agent executor: Thought → Action → Observation with a critic gate.
//!
//! One call to [`AgentExecutor::run`] drives a single request to a
//! terminal [`AgentResult`]. Each iteration:
//!
//! 1. Checks the wall-clock budget; past it, the run hands off to a
//!    follow-up run (`chain_task`) and keeps whatever artifacts it has.
//! 2. Checks the step budget; past it, the run ends with a fallback answer.
//! 3. Streams one generation, reporting `thinking` progress as text arrives.
//! 4. Parses the text into a [`Decision`]. Unparsable text becomes a system
//!    note and costs a step.
//! 5. Runs the chosen tool, or sends the proposed answer to the critic.
//!
//! `run` never fails. Every error ends up as either a scratchpad line the
//! next step can react to, or a terminal result with an explanatory answer.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use hearth_config::AgentConfig;
use hearth_core::error::{ProviderError, ToolError};
use hearth_core::outcome::{ToolOutcome, truncate_chars};
use hearth_core::provider::{GenerationRequest, Provider};
use hearth_core::tool::{CHAIN_TASK, RunContext, Tool, ToolRegistry};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::critic::Critic;
use crate::parser::{Decision, parse_decision};
use crate::progress::{AgentProgress, ProgressReporter, ProgressStatus};
use crate::prompt;
use crate::scratchpad::{EntryKind, Scratchpad};

/// Answer returned when a generation call fails.
pub const GENERATION_FAILURE_ANSWER: &str = "I'm sorry, I ran into a problem while working on your request. Please try again in a moment.";

/// Answer returned when the time budget runs out mid-task.
pub const SOFT_TIMEOUT_ANSWER: &str =
    "This is taking longer than expected, so I'll keep working on it in a follow-up step.";

/// Characters of streamed text included in a `thinking` snapshot.
const THINKING_TAIL_CHARS: usize = 200;

// ── Results ───────────────────────────────────────────────────────────────

/// How a run ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The critic accepted a final answer.
    Accepted,
    /// The work was handed to a follow-up run, by `chain_task` or by the
    /// time budget.
    Chained,
    /// The step budget ran out.
    StepLimit,
    /// A generation call failed.
    GenerationFailed,
}

/// The terminal result of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub final_answer: String,
    pub steps: Vec<String>,
    pub artifacts_updated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_artifacts: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_tool_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_tool_result: Option<ToolOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chained_instruction: Option<String>,
    pub termination: Termination,
    pub steps_used: u32,
}

// ── Settings and requests ─────────────────────────────────────────────────

/// Budgets and limits applied to every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorSettings {
    pub max_steps: u32,
    pub loop_timeout: Duration,
    pub stream_timeout: Duration,
    pub critic_timeout: Duration,
    pub tool_timeout: Duration,
    pub observation_max_chars: usize,
    pub progress_interval: Duration,
}

impl From<&AgentConfig> for ExecutorSettings {
    fn from(config: &AgentConfig) -> Self {
        Self {
            max_steps: config.max_steps,
            loop_timeout: Duration::from_millis(config.loop_timeout_ms),
            stream_timeout: Duration::from_millis(config.stream_timeout_ms),
            critic_timeout: Duration::from_millis(config.critic_timeout_ms),
            tool_timeout: Duration::from_millis(config.tool_timeout_ms),
            observation_max_chars: config.observation_max_chars,
            progress_interval: Duration::from_millis(config.progress_interval_ms),
        }
    }
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self::from(&AgentConfig::default())
    }
}

/// One request to run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub context: RunContext,
    pub prompt: String,
    /// Serialized caller context (preferences, constraints, prior state).
    pub context_info: String,
    /// Overrides [`ExecutorSettings::max_steps`].
    pub max_steps: Option<u32>,
    /// Overrides [`ExecutorSettings::loop_timeout`].
    pub timeout: Option<Duration>,
}

impl RunRequest {
    pub fn new(
        user_id: impl Into<String>,
        scenario: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            context: RunContext::new(user_id, scenario),
            prompt: prompt.into(),
            context_info: String::new(),
            max_steps: None,
            timeout: None,
        }
    }

    pub fn with_context(mut self, context_info: impl Into<String>) -> Self {
        self.context_info = context_info.into();
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// ── Executor ──────────────────────────────────────────────────────────────

/// Drives requests through the reasoning loop.
///
/// Holds only shared, read-only state, so one executor can serve many
/// concurrent runs.
pub struct AgentExecutor {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    critic: Critic,
    settings: ExecutorSettings,
}

/// A `chain_task` result that ends the run.
struct Handoff {
    final_answer: String,
    instruction: String,
}

impl Handoff {
    fn from_outcome(outcome: &ToolOutcome, action_input: &str) -> Self {
        let final_answer = outcome
            .message()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(SOFT_TIMEOUT_ANSWER)
            .to_string();
        let instruction = outcome
            .chained_instruction()
            .unwrap_or(action_input)
            .to_string();
        Self {
            final_answer,
            instruction,
        }
    }
}

/// Mutable state of one run.
struct RunState {
    scratchpad: Scratchpad,
    step: u32,
    max_steps: u32,
    updated_artifacts: Option<serde_json::Value>,
    last_tool_used: Option<String>,
    last_tool_result: Option<ToolOutcome>,
    reporter: Option<Arc<dyn ProgressReporter>>,
    /// Longest a single report may hold up the loop.
    report_timeout: Duration,
}

impl RunState {
    async fn report(&self, status: ProgressStatus, message: impl Into<String>) {
        let Some(reporter) = &self.reporter else {
            return;
        };
        let progress = AgentProgress {
            step: self.step,
            max_steps: self.max_steps,
            status,
            message: message.into(),
            transcript_so_far: self.scratchpad.lines(),
            last_tool_used: self.last_tool_used.clone(),
        };
        let send = AssertUnwindSafe(async { reporter.report(progress).await }).catch_unwind();

        match tokio::time::timeout(self.report_timeout, send).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => warn!(error = %e, "Progress report dropped"),
            Ok(Err(panic)) => warn!(
                panic = %panic_message(&*panic),
                "Progress sink panicked, report dropped"
            ),
            Err(_) => warn!(
                timeout_ms = self.report_timeout.as_millis() as u64,
                "Progress sink stalled, report dropped"
            ),
        }
    }

    fn finish(
        self,
        final_answer: String,
        chained_instruction: Option<String>,
        termination: Termination,
    ) -> AgentResult {
        AgentResult {
            final_answer,
            steps: self.scratchpad.lines(),
            artifacts_updated: self.updated_artifacts.is_some(),
            updated_artifacts: self.updated_artifacts,
            last_tool_used: self.last_tool_used,
            last_tool_result: self.last_tool_result,
            chained_instruction,
            termination,
            steps_used: self.step,
        }
    }
}

impl AgentExecutor {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        settings: ExecutorSettings,
    ) -> Self {
        let critic = Critic::new(provider.clone(), settings.critic_timeout);
        Self {
            provider,
            tools,
            critic,
            settings,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Run one request to completion.
    pub async fn run(
        &self,
        request: RunRequest,
        reporter: Option<Arc<dyn ProgressReporter>>,
    ) -> AgentResult {
        let span = info_span!(
            "agent_run",
            run_id = %Uuid::new_v4(),
            user = %request.context.user_id,
            scenario = %request.context.scenario,
        );
        self.run_loop(request, reporter).instrument(span).await
    }

    async fn run_loop(
        &self,
        request: RunRequest,
        reporter: Option<Arc<dyn ProgressReporter>>,
    ) -> AgentResult {
        let started = Instant::now();
        let max_steps = request.max_steps.unwrap_or(self.settings.max_steps);
        let loop_timeout = request.timeout.unwrap_or(self.settings.loop_timeout);
        let system = prompt::system_preamble(&self.tools.catalog());

        let mut state = RunState {
            scratchpad: Scratchpad::new(),
            step: 0,
            max_steps,
            updated_artifacts: None,
            last_tool_used: None,
            last_tool_result: None,
            reporter,
            report_timeout: self.settings.progress_interval,
        };

        info!(
            max_steps,
            timeout_ms = loop_timeout.as_millis() as u64,
            "Agent run starting"
        );
        state.report(ProgressStatus::Starting, "Starting").await;

        loop {
            if started.elapsed() >= loop_timeout {
                return self.soft_timeout(&request, state, loop_timeout).await;
            }

            if state.step >= max_steps {
                return self.step_limit(state).await;
            }

            state.step += 1;
            debug!(step = state.step, "Agent iteration");

            let step_prompt = prompt::step_prompt(
                &request.prompt,
                &request.context_info,
                &state.scratchpad.render(),
                state.step,
                max_steps,
            );

            let raw = match self.generate(step_prompt, &system, &state).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(error = %e, step = state.step, "Generation failed, ending run");
                    state
                        .scratchpad
                        .system_note(&format!("LLM Generation Error - {e}"));
                    state.report(ProgressStatus::Error, e.to_string()).await;
                    return state.finish(
                        GENERATION_FAILURE_ANSWER.to_string(),
                        None,
                        Termination::GenerationFailed,
                    );
                }
            };

            let decision = match parse_decision(&raw) {
                Ok(decision) => decision,
                Err(failure) => {
                    warn!(step = state.step, diagnostic = %failure, "Unparsable decision");
                    state.scratchpad.system_note(&format!(
                        "Invalid JSON returned. {failure}. Respond with one JSON object \
                         containing either \"action\" and \"action_input\" or \"final_answer\"."
                    ));
                    continue;
                }
            };

            if !decision.thought().trim().is_empty() {
                state.scratchpad.thought(decision.thought());
            }

            match decision {
                Decision::ToolCall {
                    action,
                    action_input,
                    ..
                } => {
                    if let Some(handoff) = self
                        .dispatch_tool(&mut state, &request.context, action, action_input)
                        .await
                    {
                        info!(steps = state.step, "Run chained to a follow-up");
                        state
                            .report(ProgressStatus::Done, "Continuing in a follow-up run")
                            .await;
                        return state.finish(
                            handoff.final_answer,
                            Some(handoff.instruction),
                            Termination::Chained,
                        );
                    }
                }
                Decision::FinalAnswer { answer, .. } => {
                    state.report(ProgressStatus::Finalizing, "Reviewing answer").await;
                    let verdict = self
                        .critic
                        .review(&request.prompt, &request.context_info, &answer)
                        .await;

                    if verdict.valid {
                        state.scratchpad.final_answer(&answer);
                        info!(steps = state.step, "Answer accepted");
                        state.report(ProgressStatus::Done, "Done").await;
                        return state.finish(answer, None, Termination::Accepted);
                    }

                    let reason = verdict.reason.unwrap_or_default();
                    info!(step = state.step, reason = %reason, "Answer rejected by critic");
                    state.scratchpad.critic_rejection(&reason);
                }
            }
        }
    }

    /// Stream one generation to completion and return the full text.
    async fn generate(
        &self,
        prompt: String,
        system: &str,
        state: &RunState,
    ) -> Result<String, ProviderError> {
        let timeout = self.settings.stream_timeout;
        let request = GenerationRequest::new(prompt, timeout).with_system(system);

        let mut rx = tokio::time::timeout(timeout, self.provider.generate_stream(request))
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!(
                    "Stream did not start within {}ms",
                    timeout.as_millis()
                ))
            })??;

        let mut buffer = String::new();
        let mut last_tick: Option<Instant> = None;

        loop {
            let chunk = tokio::time::timeout(timeout, rx.recv()).await.map_err(|_| {
                ProviderError::Timeout(format!("No chunk within {}ms", timeout.as_millis()))
            })?;

            match chunk {
                Some(Ok(text)) => {
                    buffer.push_str(&text);
                    if last_tick.is_none_or(|t| t.elapsed() >= self.settings.progress_interval) {
                        state
                            .report(ProgressStatus::Thinking, tail(&buffer, THINKING_TAIL_CHARS))
                            .await;
                        last_tick = Some(Instant::now());
                    }
                }
                Some(Err(e)) => return Err(e),
                None => return Ok(buffer),
            }
        }
    }

    /// Run a tool call. Returns a hand-off when the call ends the run.
    async fn dispatch_tool(
        &self,
        state: &mut RunState,
        context: &RunContext,
        action: String,
        action_input: String,
    ) -> Option<Handoff> {
        let tool = match self.tools.lookup(&action) {
            Ok(tool) => tool,
            Err(e) => {
                warn!(error = %e, "Unknown tool requested");
                state.scratchpad.system_note(&format!(
                    "Unknown tool '{}'. Valid tools: {}",
                    action,
                    self.tools.names().join(", ")
                ));
                return None;
            }
        };

        state.scratchpad.action(&action, &action_input);
        state.last_tool_used = Some(action.clone());
        state
            .report(ProgressStatus::Tool, format!("Using {action}"))
            .await;

        match self.invoke_tool(tool, &action_input, context).await {
            Ok(outcome) => {
                if let Some(artifacts) = outcome.artifacts() {
                    state.updated_artifacts = Some(artifacts.clone());
                }
                state
                    .scratchpad
                    .observation(&outcome.render(self.settings.observation_max_chars));
                state.last_tool_result = Some(outcome.clone());

                if action == CHAIN_TASK {
                    return Some(Handoff::from_outcome(&outcome, &action_input));
                }
            }
            Err(e) => {
                warn!(tool = %action, error = %e, "Tool execution failed");
                let message = tool_error_message(&e);
                state.scratchpad.tool_error(&message);
                state.last_tool_result = Some(ToolOutcome::failure(message).into());
            }
        }

        None
    }

    /// Invoke a tool under the tool timeout, turning panics into errors.
    async fn invoke_tool(
        &self,
        tool: Arc<dyn Tool>,
        input: &str,
        context: &RunContext,
    ) -> Result<ToolOutcome, ToolError> {
        let timeout = self.settings.tool_timeout;
        let call = AssertUnwindSafe(tool.invoke(input, context)).catch_unwind();

        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(ToolError::ExecutionFailed {
                tool_name: tool.name().to_string(),
                reason: format!("tool panicked: {}", panic_message(&*panic)),
            }),
            Err(_) => Err(ToolError::Timeout {
                tool_name: tool.name().to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn soft_timeout(
        &self,
        request: &RunRequest,
        mut state: RunState,
        loop_timeout: Duration,
    ) -> AgentResult {
        let completed: Vec<String> = state
            .scratchpad
            .entries()
            .iter()
            .filter(|e| e.kind == EntryKind::Action)
            .map(|e| e.line.trim_start_matches("Action: ").to_string())
            .collect();
        let instruction = prompt::continuation_instruction(&request.prompt, &completed);

        info!(
            steps = state.step,
            timeout_ms = loop_timeout.as_millis() as u64,
            "Time budget exhausted, chaining"
        );
        state
            .scratchpad
            .system_note("Time budget exhausted. Handing the remaining work to a follow-up run.");
        state.last_tool_used = Some(CHAIN_TASK.to_string());
        state.last_tool_result = Some(
            ToolOutcome::success(SOFT_TIMEOUT_ANSWER)
                .with_chained_instruction(instruction.clone())
                .into(),
        );
        state.report(ProgressStatus::Done, SOFT_TIMEOUT_ANSWER).await;
        state.finish(
            SOFT_TIMEOUT_ANSWER.to_string(),
            Some(instruction),
            Termination::Chained,
        )
    }

    async fn step_limit(&self, state: RunState) -> AgentResult {
        warn!(max_steps = state.max_steps, "Step limit reached");

        let mut answer = format!(
            "I reached my limit of {} steps before I could finish your request.",
            state.max_steps
        );
        if let Some(last) = state.last_tool_result.as_ref().and_then(ToolOutcome::message) {
            answer.push_str(&format!(" The last result I got was: {}", truncate_chars(last, 300)));
        }

        state.report(ProgressStatus::Done, answer.clone()).await;
        state.finish(answer, None, Termination::StepLimit)
    }
}

fn tool_error_message(error: &ToolError) -> String {
    match error {
        ToolError::ExecutionFailed { reason, .. } => reason.clone(),
        ToolError::InvalidArguments(reason) => reason.clone(),
        other => other.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// The last `max_chars` characters of `text`.
fn tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(max_chars)).collect()
}
