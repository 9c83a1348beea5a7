//! Append-only conversation history for one run.

use webpilot_providers::Message;

/// The ordered sequence of turns accumulated over a run: system
/// instructions, goal, then alternating observation and decision turns with
/// result turns in between. Grows monotonically for the life of the run and
/// is discarded with it; nothing persists across runs.
#[derive(Debug, Clone)]
pub struct History {
    messages: Vec<Message>,
    awaiting_decision: bool,
}

impl History {
    pub fn new(system_prompt: &str, goal: &str) -> Self {
        Self {
            messages: vec![
                Message::system(system_prompt),
                Message::user(format!("Current Goal: {}", goal)),
            ],
            awaiting_decision: false,
        }
    }

    /// Append the cycle's observation as a user turn. Exactly one decision
    /// turn must follow before the next observation is appended.
    pub fn push_observation(&mut self, text: String) {
        debug_assert!(
            !self.awaiting_decision,
            "observation appended while a decision turn is still outstanding"
        );
        self.messages.push(Message::user(text));
        self.awaiting_decision = true;
    }

    /// Append the decision step's raw output as an assistant turn.
    pub fn push_decision(&mut self, raw: String) {
        debug_assert!(
            self.awaiting_decision,
            "decision appended without a preceding observation"
        );
        self.messages.push(Message::assistant(raw));
        self.awaiting_decision = false;
    }

    /// Append an action result (or user answer) as a user turn.
    pub fn push_result(&mut self, text: String) {
        debug_assert!(
            !self.awaiting_decision,
            "result appended while a decision turn is still outstanding"
        );
        self.messages.push(Message::user(text));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
