//! Rendering scanned page structure into the bounded text block fed to the
//! decision step.

use webpilot_browser::InteractiveElement;

/// Default hard ceiling on the serialized element section, in characters.
pub const DEFAULT_CHAR_BUDGET: usize = 6000;

/// Immutable text snapshot of the page at one instant: URL plus the ordered
/// element list, with the element section truncated to a character budget.
/// Created once per cycle and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub url: String,
    pub text: String,
}

impl Observation {
    /// Build an observation from a successful scan.
    pub fn new(url: &str, elements: &[InteractiveElement], char_budget: usize) -> Self {
        Self::from_body(url, &render_elements(elements), char_budget)
    }

    /// Build an observation whose body is an error report (scan failure).
    /// The failure is surfaced to the decision step like any other page
    /// state so it can react.
    pub fn from_scan_error(url: &str, error: &str, char_budget: usize) -> Self {
        Self::from_body(url, &format!("Error scanning page: {}", error), char_budget)
    }

    fn from_body(url: &str, body: &str, char_budget: usize) -> Self {
        // Truncation applies to the element section only; the URL header
        // survives regardless of page complexity.
        let truncated = truncate_chars(body, char_budget);
        Self {
            url: url.to_string(),
            text: format!("Current URL: {}\n\nVisible Elements:\n{}", url, truncated),
        }
    }
}

/// Serialize the element list, one line per element:
/// `[id] <tag type='type'> label`.
pub fn render_elements(elements: &[InteractiveElement]) -> String {
    let mut out = String::from("Interactive Elements on Screen:\n");
    for element in elements {
        out.push_str(&format!(
            "[{}] <{} type='{}'> {}\n",
            element.id, element.tag, element.input_type, element.label
        ));
    }
    out
}

/// Truncate to at most `max_chars` characters, never splitting a char.
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
