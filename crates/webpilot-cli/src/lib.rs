//! webpilot CLI - process entry for the browser agent.

mod cli_args;
mod ui_writer_impl;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, warn};

use webpilot_browser::ChromeSession;
use webpilot_config::Config;
use webpilot_core::{Agent, RunOutcome};
use webpilot_providers::{LLMProvider, OpenAIProvider, ProviderRegistry};

pub use cli_args::Cli;
use ui_writer_impl::ConsoleUiWriter;

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli);

    let config = load_config_with_cli_overrides(&cli)?;

    // Resolve the decision-collaborator credential before acquiring anything
    // else; a missing credential refuses to start.
    let registry = build_provider_registry(&config)?;

    let goal = match cli.goal.as_deref().map(str::trim) {
        Some(goal) if !goal.is_empty() => goal.to_string(),
        _ => prompt_for_goal()?,
    };

    println!("🌐 Starting browser (profile: {})...", config.browser.session_dir);
    let browser = ChromeSession::launch(&config.browser)
        .await
        .context("Failed to start the browser session")?;

    let ui = ConsoleUiWriter::new();
    let mut agent = Agent::new(registry, browser, ui, config.agent.clone().into());

    // The run is the sole mutator of the page; the only external
    // cancellation is an operator interrupt, which must still release the
    // browser below.
    let outcome = tokio::select! {
        outcome = agent.run_goal(&goal) => Some(outcome),
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("Agent stopped by user.");
            None
        }
    };

    // Release the browser session on every exit path
    println!("Shutting down browser...");
    let browser = agent.into_browser();
    if let Err(e) = browser.stop().await {
        warn!("Browser shutdown reported an error: {}", e);
    }
    debug!("Browser session released");

    match outcome {
        Some(RunOutcome::Finished { .. }) => Ok(()),
        Some(RunOutcome::Aborted { reason, steps }) => {
            anyhow::bail!("Run aborted after {} step(s): {}", steps, reason)
        }
        None => anyhow::bail!("Run interrupted by operator"),
    }
}

// --- Helper functions ---

fn initialize_logging(cli: &Cli) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if cli.verbose {
        EnvFilter::from_default_env()
            .add_directive("webpilot_core=debug".parse().unwrap())
            .add_directive("webpilot_cli=debug".parse().unwrap())
            .add_directive("webpilot_browser=debug".parse().unwrap())
            .add_directive("webpilot_providers=debug".parse().unwrap())
    } else {
        EnvFilter::from_default_env()
            .add_directive("webpilot_core=info".parse().unwrap())
            .add_directive("webpilot_cli=info".parse().unwrap())
            .add_directive("webpilot_browser=info".parse().unwrap())
            .add_directive("webpilot_providers=info".parse().unwrap())
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}

fn load_config_with_cli_overrides(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_with_overrides(
        cli.config.as_deref(),
        cli.provider.clone(),
        cli.model.clone(),
    )?;

    if cli.headless {
        config.browser.headless = true;
    }
    if let Some(session_dir) = &cli.session_dir {
        config.browser.session_dir = session_dir.clone();
    }
    if let Some(port) = cli.port {
        config.browser.chrome_port = port;
    }
    if let Some(max_steps) = cli.max_steps {
        config.agent.max_steps = max_steps;
    }

    Ok(config)
}

fn build_provider_registry(config: &Config) -> Result<ProviderRegistry> {
    let provider_config = config.get_default_provider_config()?;
    let api_key = provider_config.resolve_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for '{}'. Set it in the config file or export GROQ_API_KEY.",
            config.providers.default_provider
        )
    })?;

    let (provider_type, _) = Config::parse_provider_reference(&config.providers.default_provider)?;

    let provider = OpenAIProvider::new_with_name(
        provider_type,
        api_key,
        Some(provider_config.model.clone()),
        provider_config.base_url.clone(),
        provider_config.max_tokens,
        provider_config.temperature,
    )?;

    debug!(
        "Using provider '{}' with model '{}'",
        provider.name(),
        provider.model()
    );

    let mut registry = ProviderRegistry::new();
    registry.register(provider);
    Ok(registry)
}

fn prompt_for_goal() -> Result<String> {
    println!();
    println!("{}", "=".repeat(50));
    println!("webpilot is ready.");
    println!("Example tasks:");
    println!(" - 'Find Rust developer jobs on hn.algolia.com and open the first result'");
    println!(" - 'Go to example.com and click the More information link'");
    println!("{}", "=".repeat(50));

    let mut editor = rustyline::DefaultEditor::new()?;
    loop {
        let line = editor.readline("Enter a task for the agent > ")?;
        let line = line.trim();
        if !line.is_empty() {
            return Ok(line.to_string());
        }
        println!("A goal is required.");
    }
}
