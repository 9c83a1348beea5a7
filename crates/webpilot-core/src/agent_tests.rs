//! Control-loop tests: scripted decision collaborator + scripted browser.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::protocol::Action;
use crate::test_support::{buttons, BrowserCall, MockBrowser};
use crate::ui::UiWriter;
use crate::{AbortReason, Agent, AgentOptions, RunOutcome, RunStatus};

use webpilot_providers::{CompletionRequest, MessageRole, MockProvider, ProviderRegistry};
use webpilot_providers::mock::MockResponse;

/// UI double: scripted answers for `ask_user`, recorded prompts, optional
/// shared ordering log.
struct RecordingUi {
    answers: Mutex<VecDeque<String>>,
    prompts: Arc<Mutex<Vec<String>>>,
    events: Option<Arc<Mutex<Vec<String>>>>,
}

impl RecordingUi {
    fn new() -> Self {
        Self {
            answers: Mutex::new(VecDeque::new()),
            prompts: Arc::new(Mutex::new(Vec::new())),
            events: None,
        }
    }

    fn with_answer(self, answer: &str) -> Self {
        self.answers.lock().unwrap().push_back(answer.to_string());
        self
    }

    fn with_event_log(mut self, events: Arc<Mutex<Vec<String>>>) -> Self {
        self.events = Some(events);
        self
    }

    fn prompt_log(&self) -> Arc<Mutex<Vec<String>>> {
        self.prompts.clone()
    }
}

impl UiWriter for RecordingUi {
    fn print(&self, _message: &str) {}
    fn print_goal(&self, _goal: &str) {}
    fn print_step_header(&self, _step: u32, _max_steps: u32) {}
    fn print_url(&self, _url: &str) {}
    fn print_thinking(&self) {}
    fn print_decision(&self, _action: &Action) {}
    fn print_result(&self, _message: &str) {}
    fn print_finished(&self, _summary: &str) {}
    fn print_aborted(&self, _reason: &str) {}

    fn prompt_user_answer(&self, question: &str) -> String {
        self.prompts.lock().unwrap().push(question.to_string());
        if let Some(events) = &self.events {
            events.lock().unwrap().push("ask_user".to_string());
        }
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default()
    }
}

fn options(max_steps: u32) -> AgentOptions {
    AgentOptions {
        max_steps,
        ..AgentOptions::default()
    }
}

fn registry_with(provider: MockProvider) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(provider);
    registry
}

fn last_user_message(request: &CompletionRequest) -> &str {
    request
        .messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User)
        .map(|m| m.content.as_str())
        .unwrap()
}

#[tokio::test]
async fn observation_lists_visible_elements_in_document_order() {
    // Scenario A: 3 visible buttons -> observation lists exactly ids 1-3
    let provider = MockProvider::new()
        .with_response(MockResponse::text(r#"{"action":"finish","summary":"done"}"#));
    let requests = provider.request_log();

    let browser = MockBrowser::new("https://shop.example/cart").with_scan(buttons(&[1, 2, 3]));
    let mut agent = Agent::new(
        registry_with(provider),
        browser,
        RecordingUi::new(),
        options(5),
    );

    let outcome = agent.run_goal("check the cart").await;
    assert!(outcome.is_success());

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].json_mode);

    let observation = last_user_message(&requests[0]);
    assert!(observation.starts_with("Current URL: https://shop.example/cart\n"));
    assert!(observation.contains("[1] <button type=''> Button 1"));
    assert!(observation.contains("[2] <button type=''> Button 2"));
    assert!(observation.contains("[3] <button type=''> Button 3"));
    assert!(!observation.contains("[4]"));
}

#[tokio::test]
async fn unresolvable_element_id_is_recoverable() {
    // Scenario B: click on id 7 when only 1-3 exist -> "not found" result,
    // loop stays running, exactly one step consumed
    let provider = MockProvider::new().with_responses([
        MockResponse::text(r#"{"action":"click","element_id":7}"#),
        MockResponse::text(r#"{"action":"finish","summary":"gave up"}"#),
    ]);
    let requests = provider.request_log();

    let browser = MockBrowser::new("https://example.com")
        .with_scan(buttons(&[1, 2, 3]))
        .with_scan(buttons(&[1, 2, 3]));
    let mut agent = Agent::new(
        registry_with(provider),
        browser,
        RecordingUi::new(),
        options(10),
    );

    let outcome = agent.run_goal("press the missing button").await;
    assert_eq!(
        outcome,
        RunOutcome::Finished {
            summary: "gave up".to_string(),
            steps: 2
        }
    );

    // The miss was reported back into history for the next decision
    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    let result_turn = last_user_message(&requests[1]);
    // The result turn precedes the second observation; find it explicitly
    let has_not_found = requests[1]
        .messages
        .iter()
        .any(|m| m.content == "Action result: Error: Element [7] not found.");
    assert!(has_not_found, "missing result turn: {:?}", result_turn);
}

#[tokio::test]
async fn finish_surfaces_summary_and_stops() {
    // Scenario C
    let provider = MockProvider::new()
        .with_response(MockResponse::text(r#"{"action":"finish","summary":"done"}"#));

    let browser = MockBrowser::new("https://example.com").with_scan(buttons(&[1]));
    let mut agent = Agent::new(
        registry_with(provider),
        browser,
        RecordingUi::new(),
        options(5),
    );

    let outcome = agent.run_goal("do the thing").await;
    assert_eq!(
        outcome,
        RunOutcome::Finished {
            summary: "done".to_string(),
            steps: 1
        }
    );
    assert_eq!(*agent.status(), RunStatus::Finished);

    // The browser comes back out exactly once for release
    let browser = agent.into_browser();
    assert!(browser.calls().contains(&BrowserCall::Scan));
}

#[tokio::test]
async fn run_aborts_after_max_steps() {
    // Scenario D: the decision step never finishes -> exactly 5 cycles
    let provider = MockProvider::new().with_responses(
        std::iter::repeat(MockResponse::text(
            r#"{"action":"navigate","url":"https://example.com/next"}"#,
        ))
        .take(10),
    );
    let requests = provider.request_log();

    let browser = MockBrowser::new("https://example.com").with_scan(buttons(&[1]));
    let mut agent = Agent::new(
        registry_with(provider),
        browser,
        RecordingUi::new(),
        options(5),
    );

    let outcome = agent.run_goal("loop forever").await;
    assert_eq!(
        outcome,
        RunOutcome::Aborted {
            reason: AbortReason::MaxStepsReached,
            steps: 5
        }
    );
    assert_eq!(requests.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn malformed_decision_response_aborts_the_run() {
    let provider =
        MockProvider::new().with_response(MockResponse::text("I think I should click the button"));

    let browser = MockBrowser::new("https://example.com").with_scan(buttons(&[1]));
    let mut agent = Agent::new(
        registry_with(provider),
        browser,
        RecordingUi::new(),
        options(5),
    );

    let outcome = agent.run_goal("goal").await;
    match outcome {
        RunOutcome::Aborted {
            reason: AbortReason::DecisionFailure(cause),
            steps,
        } => {
            assert_eq!(steps, 1);
            assert!(cause.contains("not a well-formed JSON object"));
        }
        other => panic!("expected decision-failure abort, got {:?}", other),
    }
    assert_eq!(*agent.status(), RunStatus::Aborted);
}

#[tokio::test]
async fn decision_transport_failure_aborts_the_run() {
    let provider = MockProvider::new().with_response(MockResponse::error("connection refused"));

    let browser = MockBrowser::new("https://example.com").with_scan(buttons(&[1]));
    let mut agent = Agent::new(
        registry_with(provider),
        browser,
        RecordingUi::new(),
        options(5),
    );

    let outcome = agent.run_goal("goal").await;
    assert_eq!(
        outcome,
        RunOutcome::Aborted {
            reason: AbortReason::DecisionFailure("connection refused".to_string()),
            steps: 1
        }
    );
}

#[tokio::test]
async fn unknown_tool_consumes_a_step_and_continues() {
    let provider = MockProvider::new().with_responses([
        MockResponse::text(r#"{"action":"dance","tempo":"fast"}"#),
        MockResponse::text(r#"{"action":"finish","summary":"ok"}"#),
    ]);
    let requests = provider.request_log();

    let browser = MockBrowser::new("https://example.com").with_scan(buttons(&[1]));
    let mut agent = Agent::new(
        registry_with(provider),
        browser,
        RecordingUi::new(),
        options(5),
    );

    let outcome = agent.run_goal("goal").await;
    assert_eq!(outcome.steps(), 2);
    assert!(outcome.is_success());

    let requests = requests.lock().unwrap();
    let has_unknown_tool = requests[1]
        .messages
        .iter()
        .any(|m| m.content.contains("Unknown tool 'dance'"));
    assert!(has_unknown_tool);
}

#[tokio::test]
async fn scan_failure_becomes_the_observation() {
    let provider = MockProvider::new()
        .with_response(MockResponse::text(r#"{"action":"finish","summary":"bail"}"#));
    let requests = provider.request_log();

    let browser =
        MockBrowser::new("https://example.com").with_scan_error("evaluation blocked by page");
    let mut agent = Agent::new(
        registry_with(provider),
        browser,
        RecordingUi::new(),
        options(5),
    );

    let outcome = agent.run_goal("goal").await;
    assert!(outcome.is_success(), "scan failure must not abort the run");

    let requests = requests.lock().unwrap();
    let observation = last_user_message(&requests[0]);
    assert!(observation.contains("Error scanning page:"));
    assert!(observation.contains("evaluation blocked by page"));
}

#[tokio::test]
async fn losing_the_session_aborts_the_run() {
    let provider = MockProvider::new().with_responses([
        MockResponse::text(r#"{"action":"click","element_id":1}"#),
        // Never consumed; the second cycle dies reading the URL
        MockResponse::text(r#"{"action":"finish","summary":"unreachable"}"#),
    ]);

    let browser = MockBrowser::new("https://example.com")
        .with_scan(buttons(&[1]))
        .with_url("https://example.com")
        .with_url_failure("window was closed");
    let mut agent = Agent::new(
        registry_with(provider),
        browser,
        RecordingUi::new(),
        options(5),
    );

    let outcome = agent.run_goal("goal").await;
    match outcome {
        RunOutcome::Aborted {
            reason: AbortReason::SessionLost(cause),
            steps,
        } => {
            assert_eq!(steps, 2);
            assert!(cause.contains("window was closed"));
        }
        other => panic!("expected session-lost abort, got {:?}", other),
    }
}

#[tokio::test]
async fn identifiers_are_fresh_per_scan() {
    // An id valid in cycle N must not resolve after cycle N+1's scan
    // dropped it
    let provider = MockProvider::new().with_responses([
        MockResponse::text(r#"{"action":"click","element_id":3}"#),
        MockResponse::text(r#"{"action":"click","element_id":3}"#),
        MockResponse::text(r#"{"action":"finish","summary":"done"}"#),
    ]);
    let requests = provider.request_log();

    let browser = MockBrowser::new("https://example.com")
        .with_scan(buttons(&[1, 2, 3]))
        .with_scan(buttons(&[1, 2]))
        .with_scan(buttons(&[1, 2]));
    let mut agent = Agent::new(
        registry_with(provider),
        browser,
        RecordingUi::new(),
        options(10),
    );

    let outcome = agent.run_goal("goal").await;
    assert!(outcome.is_success());

    let requests = requests.lock().unwrap();
    // Cycle 1: id 3 existed, the click landed
    assert!(requests[1]
        .messages
        .iter()
        .any(|m| m.content == "Action result: Clicked element [3]"));
    // Cycle 2: fresh scan no longer has id 3, same click now misses
    assert!(requests[2]
        .messages
        .iter()
        .any(|m| m.content == "Action result: Error: Element [3] not found."));
}

#[tokio::test]
async fn ask_user_blocks_before_the_destructive_action() {
    // Safety gate: the destructive click must not reach the executor until
    // the ask_user answer has come back
    let events = Arc::new(Mutex::new(Vec::new()));

    let provider = MockProvider::new().with_responses([
        MockResponse::text(r#"{"action":"ask_user","question":"Really delete all drafts?"}"#),
        MockResponse::text(r#"{"action":"click","element_id":2}"#),
        MockResponse::text(r#"{"action":"finish","summary":"drafts deleted"}"#),
    ]);
    let requests = provider.request_log();

    let browser = MockBrowser::new("https://mail.example")
        .with_scan(buttons(&[1, 2]))
        .with_event_log(events.clone());
    let ui = RecordingUi::new()
        .with_answer("yes")
        .with_event_log(events.clone());
    let prompts = ui.prompt_log();

    let mut agent = Agent::new(registry_with(provider), browser, ui, options(10));

    let outcome = agent.run_goal("delete all my drafts").await;
    assert!(outcome.is_success());

    // The question reached the human verbatim
    assert_eq!(
        *prompts.lock().unwrap(),
        vec!["Really delete all drafts?".to_string()]
    );

    // Ordering: confirmation strictly precedes the destructive click
    let events = events.lock().unwrap();
    let ask_pos = events.iter().position(|e| e == "ask_user").unwrap();
    let click_pos = events.iter().position(|e| e == "click 2").unwrap();
    assert!(
        ask_pos < click_pos,
        "destructive click executed before user confirmation: {:?}",
        *events
    );

    // The answer was fed back as a result turn before the next decision
    let requests = requests.lock().unwrap();
    assert!(requests[1]
        .messages
        .iter()
        .any(|m| m.content == "Action result: User answered: yes"));
}

#[tokio::test]
async fn type_action_fills_the_field_verbatim() {
    let provider = MockProvider::new().with_responses([
        MockResponse::text(r#"{"action":"type","element_id":1,"text":"rust web agents"}"#),
        MockResponse::text(r#"{"action":"finish","summary":"typed"}"#),
    ]);

    let browser = MockBrowser::new("https://search.example").with_scan(vec![
        webpilot_browser::InteractiveElement {
            id: 1,
            tag: "input".to_string(),
            input_type: "text".to_string(),
            label: "Search".to_string(),
        },
    ]);
    let mut agent = Agent::new(
        registry_with(provider),
        browser,
        RecordingUi::new(),
        options(5),
    );

    let outcome = agent.run_goal("search for rust web agents").await;
    assert!(outcome.is_success());

    let browser = agent.into_browser();
    assert!(browser
        .calls()
        .contains(&BrowserCall::Fill(1, "rust web agents".to_string())));
}
