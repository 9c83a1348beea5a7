//! The decision protocol: the closed action vocabulary and its validation rules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every action name the decision step may emit. The prompt template and
/// this list must agree.
pub const ACTION_NAMES: [&str; 5] = ["navigate", "click", "type", "ask_user", "finish"];

/// One atomic step the agent may take against the page or the operator.
///
/// `element_id` in `Click`/`Type` must reference an identifier assigned by
/// the immediately preceding scan; the executor treats anything else as a
/// recoverable miss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Navigate { url: String },
    Click { element_id: u32 },
    Type { element_id: u32, text: String },
    AskUser { question: String },
    Finish { summary: String },
}

impl Action {
    /// The wire name of this action
    pub fn name(&self) -> &'static str {
        match self {
            Action::Navigate { .. } => "navigate",
            Action::Click { .. } => "click",
            Action::Type { .. } => "type",
            Action::AskUser { .. } => "ask_user",
            Action::Finish { .. } => "finish",
        }
    }
}

/// Why a decision response failed validation.
///
/// Only `Malformed` is fatal to the run; everything else is reported back
/// into history as a result turn and consumes one step.
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("decision response is not a well-formed JSON object: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("decision object has no 'action' field")]
    MissingAction,

    #[error("Unknown tool '{0}'")]
    UnknownAction(String),

    #[error("invalid arguments for '{action}': {source}")]
    InvalidArguments {
        action: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DecisionError {
    /// Fatal errors abort the run; the rest consume a step and continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DecisionError::Malformed(_))
    }
}

/// Validate one decision response.
///
/// A response that does not parse as JSON aborts the cycle. A parseable
/// object naming an unknown action, or a known action with bad fields, is
/// a recoverable protocol violation.
pub fn parse_action(raw: &str) -> Result<Action, DecisionError> {
    let value: serde_json::Value =
        serde_json::from_str(raw.trim()).map_err(DecisionError::Malformed)?;

    let name = match value.get("action").and_then(|a| a.as_str()) {
        Some(name) => name.to_string(),
        None => return Err(DecisionError::MissingAction),
    };

    if !ACTION_NAMES.contains(&name.as_str()) {
        return Err(DecisionError::UnknownAction(name));
    }

    serde_json::from_value(value).map_err(|source| DecisionError::InvalidArguments {
        action: name,
        source,
    })
}
