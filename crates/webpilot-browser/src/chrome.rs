//! ChromeDriver-backed browser session.

use anyhow::{Context, Result};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::process::Child;
use tracing::{debug, warn};

use webpilot_config::BrowserConfig;

use crate::scanner::{parse_scan_result, selector_for, InteractiveElement, SCAN_SCRIPT};
use crate::{Browser, BrowserError};

/// Poll interval for the document-ready probe.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One Chrome window driven over WebDriver.
///
/// The session is acquired once at run start and must be released with
/// [`ChromeSession::stop`] on every exit path. If this process spawned the
/// chromedriver it connects to, `stop` also terminates that child.
pub struct ChromeSession {
    client: Client,
    driver_process: Option<Child>,
    settle_delay: Duration,
    ready_timeout: Duration,
}

/// Check if chromedriver is already listening on the given port.
async fn check_chromedriver_running(port: u16) -> bool {
    let url = format!("http://localhost:{}/status", port);
    match reqwest::Client::new()
        .get(&url)
        .timeout(Duration::from_millis(500))
        .send()
        .await
    {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

impl ChromeSession {
    /// Connect to chromedriver (spawning one when none is listening) and
    /// open a Chrome window on the configured persistent profile.
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let port = config.chrome_port;

        if check_chromedriver_running(port).await {
            debug!("Reusing chromedriver already listening on port {}", port);
            let client = Self::connect(config, port).await?;
            return Ok(Self::assemble(client, None, config));
        }

        let chromedriver_cmd = config
            .chromedriver_binary
            .as_deref()
            .unwrap_or("chromedriver");

        let mut driver_process = tokio::process::Command::new(chromedriver_cmd)
            .arg(format!("--port={}", port))
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .with_context(|| {
                format!(
                    "Failed to start chromedriver ('{}'). Make sure it is installed and in PATH.",
                    chromedriver_cmd
                )
            })?;

        // Wait for chromedriver to come up, retrying the connection
        let max_retries = 10;
        let mut last_error = None;

        for attempt in 0..max_retries {
            tokio::time::sleep(Duration::from_millis(200)).await;

            match Self::connect(config, port).await {
                Ok(client) => {
                    debug!("Connected to chromedriver on attempt {}", attempt + 1);
                    return Ok(Self::assemble(client, Some(driver_process), config));
                }
                Err(e) => last_error = Some(e),
            }
        }

        let _ = driver_process.kill().await;
        Err(last_error
            .unwrap_or_else(|| anyhow::anyhow!("unknown error"))
            .context(format!(
                "Failed to connect to chromedriver after {} attempts",
                max_retries
            )))
    }

    async fn connect(config: &BrowserConfig, port: u16) -> Result<Client> {
        let url = format!("http://localhost:{}", port);

        let mut caps = serde_json::Map::new();
        caps.insert(
            "browserName".to_string(),
            Value::String("chrome".to_string()),
        );

        let session_dir = shellexpand::tilde(&config.session_dir).to_string();
        std::fs::create_dir_all(&session_dir)
            .with_context(|| format!("Failed to create session directory {}", session_dir))?;

        let mut args = vec![
            // Persistent profile so logins survive across runs
            Value::String(format!("--user-data-dir={}", session_dir)),
            Value::String("--window-size=1280,800".to_string()),
            Value::String("--disable-blink-features=AutomationControlled".to_string()),
        ];
        if config.headless {
            args.push(Value::String("--headless=new".to_string()));
            args.push(Value::String("--disable-gpu".to_string()));
            args.push(Value::String("--no-sandbox".to_string()));
            args.push(Value::String("--disable-dev-shm-usage".to_string()));
        }

        let mut chrome_options = serde_json::Map::new();
        chrome_options.insert("args".to_string(), Value::Array(args));
        chrome_options.insert(
            "excludeSwitches".to_string(),
            Value::Array(vec![Value::String("enable-automation".to_string())]),
        );
        chrome_options.insert("useAutomationExtension".to_string(), Value::Bool(false));

        if let Some(binary) = &config.chrome_binary {
            chrome_options.insert("binary".to_string(), Value::String(binary.clone()));
        }

        caps.insert(
            "goog:chromeOptions".to_string(),
            Value::Object(chrome_options),
        );

        let mut builder = ClientBuilder::native();
        let connect_future = builder.capabilities(caps).connect(&url);

        let client = tokio::time::timeout(Duration::from_secs(30), connect_future)
            .await
            .context("Connection to chromedriver timed out after 30 seconds")?
            .context("Failed to connect to chromedriver")?;

        Ok(client)
    }

    fn assemble(client: Client, driver_process: Option<Child>, config: &BrowserConfig) -> Self {
        Self {
            client,
            driver_process,
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            ready_timeout: Duration::from_millis(config.ready_timeout_ms),
        }
    }

    /// Close the WebDriver session and terminate the chromedriver child if
    /// this process spawned it. Consuming `self` makes double release a
    /// compile error.
    pub async fn stop(mut self) -> Result<()> {
        if let Err(e) = self.client.close().await {
            warn!("Failed to close WebDriver session: {}", e);
        }

        if let Some(mut process) = self.driver_process.take() {
            if let Err(e) = process.kill().await {
                warn!("Failed to kill chromedriver process: {}", e);
            } else {
                debug!("chromedriver process terminated");
            }
        }

        Ok(())
    }

    /// Wait for the document to report readiness, then apply the configured
    /// render-settle delay for dynamic content. The fixed delay alone is the
    /// fallback when the readiness probe itself fails.
    async fn wait_until_settled(&mut self) {
        let deadline = Instant::now() + self.ready_timeout;

        loop {
            match self
                .client
                .execute("return document.readyState;", vec![])
                .await
            {
                Ok(state) if state.as_str() == Some("complete") => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Readiness probe failed, falling back to fixed delay: {}", e);
                    break;
                }
            }

            if Instant::now() >= deadline {
                warn!(
                    "Page did not reach readyState=complete within {:?}",
                    self.ready_timeout
                );
                break;
            }

            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }

        tokio::time::sleep(self.settle_delay).await;
    }
}

#[async_trait]
impl Browser for ChromeSession {
    async fn current_url(&mut self) -> Result<String, BrowserError> {
        // Losing the URL means losing the page; surface as a session error
        self.client
            .current_url()
            .await
            .map(|u| u.to_string())
            .map_err(|e| BrowserError::SessionLost(e.to_string()))
    }

    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        debug!("Navigating to {}", url);
        self.client.goto(url).await?;
        self.wait_until_settled().await;
        Ok(())
    }

    async fn scan(&mut self) -> Result<Vec<InteractiveElement>, BrowserError> {
        let value = self
            .client
            .execute(SCAN_SCRIPT, vec![])
            .await
            .map_err(|e| BrowserError::Scan(e.to_string()))?;
        parse_scan_result(value)
    }

    async fn click(&mut self, element_id: u32) -> Result<(), BrowserError> {
        let selector = selector_for(element_id);
        let elements = self.client.find_all(Locator::Css(&selector)).await?;

        let element = elements
            .into_iter()
            .next()
            .ok_or(BrowserError::ElementNotFound { id: element_id })?;

        element.click().await?;
        self.wait_until_settled().await;
        Ok(())
    }

    async fn fill(&mut self, element_id: u32, text: &str) -> Result<(), BrowserError> {
        let selector = selector_for(element_id);
        let elements = self.client.find_all(Locator::Css(&selector)).await?;

        let element = elements
            .into_iter()
            .next()
            .ok_or(BrowserError::ElementNotFound { id: element_id })?;

        // Overwrite, never append
        element.clear().await?;
        element.send_keys(text).await?;
        Ok(())
    }
}
