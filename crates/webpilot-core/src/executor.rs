//! Action execution: one function per browser action, each returning a
//! human-readable result string and never raising past the loop.

use tracing::debug;
use webpilot_browser::{Browser, BrowserError};

/// Execute a `navigate` action.
pub async fn execute_navigate<B: Browser>(browser: &mut B, url: &str) -> String {
    debug!("Executing navigate to {}", url);
    match browser.navigate(url).await {
        Ok(()) => format!("Navigated to {}", url),
        Err(e) => format!("Error navigating: {}", e),
    }
}

/// Execute a `click` action against an identifier from the most recent scan.
/// A stale or unknown identifier is a recoverable miss, reported as such.
pub async fn execute_click<B: Browser>(browser: &mut B, element_id: u32) -> String {
    debug!("Executing click on element [{}]", element_id);
    match browser.click(element_id).await {
        Ok(()) => format!("Clicked element [{}]", element_id),
        Err(BrowserError::ElementNotFound { id }) => format!("Error: Element [{}] not found.", id),
        Err(e) => format!("Error clicking [{}]: {}", element_id, e),
    }
}

/// Execute a `type` action, overwriting the field's current content.
pub async fn execute_type<B: Browser>(browser: &mut B, element_id: u32, text: &str) -> String {
    debug!("Executing type into element [{}]", element_id);
    match browser.fill(element_id, text).await {
        Ok(()) => format!("Typed '{}' into element [{}]", text, element_id),
        Err(BrowserError::ElementNotFound { id }) => format!("Error: Element [{}] not found.", id),
        Err(e) => format!("Error typing in [{}]: {}", element_id, e),
    }
}
