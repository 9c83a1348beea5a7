//! CLI argument parsing for webpilot.

use clap::Parser;

#[derive(Parser, Clone)]
#[command(name = "webpilot")]
#[command(about = "An autonomous agent that drives a web browser toward a natural-language goal")]
#[command(version)]
pub struct Cli {
    /// Natural-language goal for the agent (prompted interactively when omitted)
    pub goal: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the configured provider (e.g., 'groq.default')
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Override the model for the selected provider
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Run Chrome headless (default is a visible window)
    #[arg(long)]
    pub headless: bool,

    /// Browser profile directory (persists logins across runs)
    #[arg(long, value_name = "PATH")]
    pub session_dir: Option<String>,

    /// Port chromedriver listens on
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Maximum decision cycles before the run is aborted
    #[arg(long, value_name = "N")]
    pub max_steps: Option<u32>,
}
