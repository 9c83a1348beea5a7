//! Browser collaborator: a WebDriver-backed page the agent observes and acts on.

pub mod chrome;
pub mod scanner;

pub use chrome::ChromeSession;
pub use scanner::{InteractiveElement, SCAN_SCRIPT};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from browser operations.
///
/// `ElementNotFound` is split out because the executor must treat a stale or
/// unknown element identifier as a recoverable miss, not a failed command.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Element [{id}] not found")]
    ElementNotFound { id: u32 },

    #[error("page scan failed: {0}")]
    Scan(String),

    #[error("webdriver command failed: {0}")]
    Command(#[from] fantoccini::error::CmdError),

    #[error("browser session lost: {0}")]
    SessionLost(String),
}

/// The five page operations the agent consumes.
///
/// Implementations perform exactly one atomic operation per call and settle
/// the page before returning, so the next scan observes a stable document.
#[async_trait]
pub trait Browser: Send {
    /// Current page address. Failure here means the session is gone and the
    /// run cannot continue.
    async fn current_url(&mut self) -> Result<String, BrowserError>;

    /// Load `url` and wait for the page to settle.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Select visible interactive elements, tag them with fresh sequential
    /// identifiers, and return the structured list. Every scan first clears
    /// the markers and tags of the previous one.
    async fn scan(&mut self) -> Result<Vec<InteractiveElement>, BrowserError>;

    /// Click the element tagged `element_id` by the most recent scan.
    async fn click(&mut self, element_id: u32) -> Result<(), BrowserError>;

    /// Overwrite the content of the field tagged `element_id` with `text`.
    async fn fill(&mut self, element_id: u32, text: &str) -> Result<(), BrowserError>;
}
