//! Scripted browser double shared by the executor and agent loop tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use webpilot_browser::{Browser, BrowserError, InteractiveElement};

/// One recorded browser operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserCall {
    CurrentUrl,
    Scan,
    Navigate(String),
    Click(u32),
    Fill(u32, String),
}

/// A browser whose page states are scripted per scan.
///
/// Each `scan` pops the next scripted element list (reusing the last one
/// when the script runs dry, as a static page would). Click/fill resolve
/// only against identifiers produced by the most recent scan, mirroring the
/// real page-side tag lookup.
pub struct MockBrowser {
    url: String,
    url_responses: VecDeque<Result<String, String>>,
    scans: VecDeque<Result<Vec<InteractiveElement>, String>>,
    last_scan: Vec<InteractiveElement>,
    current_ids: Vec<u32>,
    calls: Arc<Mutex<Vec<BrowserCall>>>,
    events: Option<Arc<Mutex<Vec<String>>>>,
}

impl MockBrowser {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            url_responses: VecDeque::new(),
            scans: VecDeque::new(),
            last_scan: Vec::new(),
            current_ids: Vec::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            events: None,
        }
    }

    /// Script the element list the next scan returns.
    pub fn with_scan(mut self, elements: Vec<InteractiveElement>) -> Self {
        self.scans.push_back(Ok(elements));
        self
    }

    /// Script the next scan to fail.
    pub fn with_scan_error(mut self, message: &str) -> Self {
        self.scans.push_back(Err(message.to_string()));
        self
    }

    /// Script the next `current_url` call to fail (session loss).
    pub fn with_url_failure(mut self, message: &str) -> Self {
        self.url_responses.push_back(Err(message.to_string()));
        self
    }

    /// Script the next `current_url` call explicitly.
    pub fn with_url(mut self, url: &str) -> Self {
        self.url_responses.push_back(Ok(url.to_string()));
        self
    }

    /// Share an ordering log with other test doubles.
    pub fn with_event_log(mut self, events: Arc<Mutex<Vec<String>>>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn calls(&self) -> Vec<BrowserCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: BrowserCall, event: String) {
        self.calls.lock().unwrap().push(call);
        if let Some(events) = &self.events {
            events.lock().unwrap().push(event);
        }
    }
}

/// Convenience: a list of plain buttons with the given ids.
pub fn buttons(ids: &[u32]) -> Vec<InteractiveElement> {
    ids.iter()
        .map(|&id| InteractiveElement {
            id,
            tag: "button".to_string(),
            input_type: String::new(),
            label: format!("Button {}", id),
        })
        .collect()
}

#[async_trait]
impl Browser for MockBrowser {
    async fn current_url(&mut self) -> Result<String, BrowserError> {
        self.record(BrowserCall::CurrentUrl, "current_url".to_string());
        match self.url_responses.pop_front() {
            Some(Ok(url)) => {
                self.url = url.clone();
                Ok(url)
            }
            Some(Err(message)) => Err(BrowserError::SessionLost(message)),
            None => Ok(self.url.clone()),
        }
    }

    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.record(
            BrowserCall::Navigate(url.to_string()),
            format!("navigate {}", url),
        );
        self.url = url.to_string();
        Ok(())
    }

    async fn scan(&mut self) -> Result<Vec<InteractiveElement>, BrowserError> {
        self.record(BrowserCall::Scan, "scan".to_string());
        let next = match self.scans.pop_front() {
            Some(Ok(elements)) => {
                self.last_scan = elements.clone();
                Ok(elements)
            }
            Some(Err(message)) => Err(BrowserError::Scan(message)),
            None => Ok(self.last_scan.clone()),
        };

        // Previous identifiers are invalidated by every scan, successful or not
        self.current_ids = match &next {
            Ok(elements) => elements.iter().map(|e| e.id).collect(),
            Err(_) => Vec::new(),
        };
        next
    }

    async fn click(&mut self, element_id: u32) -> Result<(), BrowserError> {
        self.record(
            BrowserCall::Click(element_id),
            format!("click {}", element_id),
        );
        if self.current_ids.contains(&element_id) {
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound { id: element_id })
        }
    }

    async fn fill(&mut self, element_id: u32, text: &str) -> Result<(), BrowserError> {
        self.record(
            BrowserCall::Fill(element_id, text.to_string()),
            format!("fill {}", element_id),
        );
        if self.current_ids.contains(&element_id) {
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound { id: element_id })
        }
    }
}
