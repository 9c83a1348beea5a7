//! Core engine: the observe-decide-act control loop and its session state.
//!
//! One [`Agent`] owns one run: it repeatedly scans the page, renders a
//! bounded observation, delegates the decision to an LLM provider, validates
//! the returned action, and executes it — one atomic action per cycle, all
//! suspension points awaited in strict sequence.

pub mod executor;
pub mod history;
pub mod observation;
pub mod protocol;
pub mod prompts;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod agent_tests;

pub use history::History;
pub use observation::Observation;
pub use protocol::{Action, DecisionError};
pub use ui::{NullUiWriter, UiWriter};

use std::fmt;
use tracing::{debug, warn};

use webpilot_browser::Browser;
use webpilot_providers::{CompletionRequest, ProviderRegistry};

use prompts::SYSTEM_PROMPT;

/// Loop state as visible from outside a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    AwaitingUser,
    Finished,
    Aborted,
}

/// Why a run ended without reaching `finish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The decision collaborator failed: transport error or a response that
    /// was not a well-formed JSON object.
    DecisionFailure(String),
    /// The page or browser session is gone.
    SessionLost(String),
    /// The step cap was reached before a terminal action.
    MaxStepsReached,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::DecisionFailure(cause) => write!(f, "decision failure: {}", cause),
            AbortReason::SessionLost(cause) => write!(f, "browser session lost: {}", cause),
            AbortReason::MaxStepsReached => write!(f, "max steps reached"),
        }
    }
}

/// Terminal result of a run. Only `Finished` is a success outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Finished { summary: String, steps: u32 },
    Aborted { reason: AbortReason, steps: u32 },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Finished { .. })
    }

    pub fn steps(&self) -> u32 {
        match self {
            RunOutcome::Finished { steps, .. } | RunOutcome::Aborted { steps, .. } => *steps,
        }
    }
}

/// Knobs for one run.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Maximum decision cycles before the run is aborted
    pub max_steps: u32,
    /// Character budget for the element section of each observation
    pub observation_char_budget: usize,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_steps: 20,
            observation_char_budget: observation::DEFAULT_CHAR_BUDGET,
        }
    }
}

impl From<webpilot_config::AgentConfig> for AgentOptions {
    fn from(config: webpilot_config::AgentConfig) -> Self {
        Self {
            max_steps: config.max_steps,
            observation_char_budget: config.observation_char_budget,
        }
    }
}

/// The autonomous agent: one instance drives one browser toward one goal at
/// a time. The browser is the single shared mutable resource; this loop is
/// its sole mutator, so cycles never interleave.
pub struct Agent<B: Browser, W: UiWriter> {
    providers: ProviderRegistry,
    browser: B,
    ui: W,
    options: AgentOptions,
    history: History,
    status: RunStatus,
}

impl<B: Browser, W: UiWriter> Agent<B, W> {
    pub fn new(providers: ProviderRegistry, browser: B, ui: W, options: AgentOptions) -> Self {
        Self {
            providers,
            browser,
            ui,
            options,
            history: History::new(SYSTEM_PROMPT, ""),
            status: RunStatus::Running,
        }
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Give the browser back so the caller can release it. Every exit path
    /// must end in the session's `stop`.
    pub fn into_browser(self) -> B {
        self.browser
    }

    /// Run the observe-decide-act loop until a terminal state.
    ///
    /// Per-step failures (scan errors, unresolvable element identifiers,
    /// unknown tools, failed browser operations) are reported into history
    /// and consume a step; decision-transport faults, malformed decision
    /// output, and a lost session abort the run.
    pub async fn run_goal(&mut self, goal: &str) -> RunOutcome {
        self.ui.print_goal(goal);
        self.history = History::new(SYSTEM_PROMPT, goal);
        self.status = RunStatus::Running;

        let max_steps = self.options.max_steps;
        let mut step = 0u32;

        while step < max_steps {
            step += 1;
            self.ui.print_step_header(step, max_steps);

            // Observe
            let url = match self.browser.current_url().await {
                Ok(url) => url,
                Err(e) => return self.abort(AbortReason::SessionLost(e.to_string()), step),
            };
            self.ui.print_url(&url);

            let observation = match self.browser.scan().await {
                Ok(elements) => {
                    Observation::new(&url, &elements, self.options.observation_char_budget)
                }
                Err(e) => {
                    // Recoverable per-step failure: logged as the step's
                    // observation so the decision step can react
                    warn!("Page scan failed: {}", e);
                    Observation::from_scan_error(
                        &url,
                        &e.to_string(),
                        self.options.observation_char_budget,
                    )
                }
            };
            self.history.push_observation(observation.text);

            // Decide
            self.ui.print_thinking();
            let completion = {
                let request = CompletionRequest {
                    messages: self.history.messages().to_vec(),
                    max_tokens: None,
                    temperature: None,
                    json_mode: true,
                };
                match self.providers.get(None) {
                    Ok(provider) => provider
                        .complete(request)
                        .await
                        .map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                }
            };

            let raw = match completion {
                Ok(response) => response.content,
                Err(cause) => return self.abort(AbortReason::DecisionFailure(cause), step),
            };

            let parsed = protocol::parse_action(&raw);
            if let Err(e) = &parsed {
                if e.is_fatal() {
                    return self.abort(AbortReason::DecisionFailure(e.to_string()), step);
                }
            }
            self.history.push_decision(raw);

            let action = match parsed {
                Ok(action) => action,
                Err(e) => {
                    // Unknown or ill-formed tool: consumes the step, run continues
                    let result = format!("Error: {}", e);
                    self.ui.print_result(&result);
                    self.history.push_result(format!("Action result: {}", result));
                    continue;
                }
            };
            self.ui.print_decision(&action);

            // Act
            let result = match action {
                Action::Finish { summary } => {
                    self.status = RunStatus::Finished;
                    self.ui.print_finished(&summary);
                    return RunOutcome::Finished {
                        summary,
                        steps: step,
                    };
                }
                Action::AskUser { question } => {
                    // Suspend for external human input, then feed the answer
                    // back as a result turn before continuing
                    self.status = RunStatus::AwaitingUser;
                    let answer = self.ui.prompt_user_answer(&question);
                    self.status = RunStatus::Running;
                    format!("User answered: {}", answer)
                }
                Action::Navigate { url } => {
                    executor::execute_navigate(&mut self.browser, &url).await
                }
                Action::Click { element_id } => {
                    executor::execute_click(&mut self.browser, element_id).await
                }
                Action::Type { element_id, text } => {
                    executor::execute_type(&mut self.browser, element_id, &text).await
                }
            };

            debug!("Step {} result: {}", step, result);
            self.ui.print_result(&result);
            self.history.push_result(format!("Action result: {}", result));
        }

        self.abort(AbortReason::MaxStepsReached, max_steps)
    }

    fn abort(&mut self, reason: AbortReason, steps: u32) -> RunOutcome {
        self.ui.print_aborted(&reason.to_string());
        self.status = RunStatus::Aborted;
        RunOutcome::Aborted { reason, steps }
    }
}
