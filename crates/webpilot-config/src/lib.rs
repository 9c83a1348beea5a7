use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

/// Provider configuration with named configs per provider type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Default provider in format "<provider_type>.<config_name>"
    pub default_provider: String,

    /// Named OpenAI provider configs
    #[serde(default)]
    pub openai: HashMap<String, OpenAIConfig>,

    /// Multiple named OpenAI-compatible providers (e.g., groq, openrouter)
    #[serde(default)]
    pub openai_compatible: HashMap<String, OpenAIConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// API key; an empty string falls back to the GROQ_API_KEY environment
    /// variable at resolution time
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl OpenAIConfig {
    /// Resolve the API key, falling back to the environment.
    ///
    /// Returns None when no credential is available anywhere; callers must
    /// treat that as fatal before acquiring any other resource.
    pub fn resolve_api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        std::env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum decision cycles before the run is aborted
    pub max_steps: u32,
    /// Hard character budget for the serialized element section of an observation
    pub observation_char_budget: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 20,
            observation_char_budget: 6000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run Chrome headless (default is a visible window)
    pub headless: bool,
    /// Persistent profile directory, reused across runs so logins survive
    pub session_dir: String,
    /// Port chromedriver listens on
    pub chrome_port: u16,
    /// Optional path to the chromedriver binary (falls back to PATH lookup)
    pub chromedriver_binary: Option<String>,
    /// Optional path to a Chrome binary (e.g., Chrome for Testing)
    pub chrome_binary: Option<String>,
    /// Render-settle delay applied after page-mutating operations, in ms
    pub settle_delay_ms: u64,
    /// Upper bound on the document-ready poll after navigation, in ms
    pub ready_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            session_dir: "~/.webpilot/browser-session".to_string(),
            chrome_port: 9515,
            chromedriver_binary: None,
            chrome_binary: None,
            settle_delay_ms: 2000,
            ready_timeout_ms: 10_000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut openai_compatible = HashMap::new();
        openai_compatible.insert(
            "groq".to_string(),
            OpenAIConfig {
                api_key: String::new(),
                model: "llama-3.3-70b-versatile".to_string(),
                base_url: Some("https://api.groq.com/openai/v1".to_string()),
                max_tokens: Some(1024),
                temperature: Some(0.1),
            },
        );

        Self {
            providers: ProvidersConfig {
                default_provider: "groq.default".to_string(),
                openai: HashMap::new(),
                openai_compatible,
            },
            agent: AgentConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

impl Config {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let default_paths = [
            "./webpilot.toml",
            "~/.config/webpilot/config.toml",
            "~/.webpilot.toml",
        ];

        // Check if any config file exists
        let config_exists = if let Some(path) = config_path {
            Path::new(path).exists()
        } else {
            default_paths.iter().any(|path| {
                let expanded_path = shellexpand::tilde(path);
                Path::new(expanded_path.as_ref()).exists()
            })
        };

        // If no config exists, create and save a default config
        if !config_exists {
            let default_config = Self::default();

            let config_dir = dirs::home_dir()
                .map(|mut path| {
                    path.push(".config");
                    path.push("webpilot");
                    path
                })
                .unwrap_or_else(|| std::path::PathBuf::from("."));

            std::fs::create_dir_all(&config_dir).ok();

            let config_file = config_dir.join("config.toml");
            if let Err(e) = default_config.save(config_file.to_str().unwrap()) {
                eprintln!("Warning: Could not save default config: {}", e);
            } else {
                println!("Created default configuration at: {}", config_file.display());
            }

            return Ok(default_config);
        }

        // Load config from file
        let config_path_to_load = if let Some(path) = config_path {
            Some(path.to_string())
        } else {
            default_paths.iter().find_map(|path| {
                let expanded_path = shellexpand::tilde(path);
                if Path::new(expanded_path.as_ref()).exists() {
                    Some(expanded_path.to_string())
                } else {
                    None
                }
            })
        };

        if let Some(path) = config_path_to_load {
            let config_content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&config_content)?;
            config.validate_provider_reference(&config.providers.default_provider)?;
            return Ok(config);
        }

        Ok(Self::default())
    }

    pub fn load_with_overrides(
        config_path: Option<&str>,
        provider_override: Option<String>,
        model_override: Option<String>,
    ) -> Result<Self> {
        let mut config = Self::load(config_path)?;

        if let Some(provider) = provider_override {
            config.validate_provider_reference(&provider)?;
            config.providers.default_provider = provider;
        }

        if let Some(model) = model_override {
            let (provider_type, config_name) =
                Self::parse_provider_reference(&config.providers.default_provider)?;

            match provider_type.as_str() {
                "openai" => {
                    if let Some(openai_config) = config.providers.openai.get_mut(&config_name) {
                        openai_config.model = model;
                    } else {
                        anyhow::bail!("Provider config 'openai.{}' not found.", config_name);
                    }
                }
                _ => {
                    if let Some(compat_config) =
                        config.providers.openai_compatible.get_mut(&provider_type)
                    {
                        compat_config.model = model;
                    } else {
                        anyhow::bail!("Unknown provider type: {}", provider_type);
                    }
                }
            }
        }

        Ok(config)
    }

    /// Validate a provider reference (format: "<provider_type>.<config_name>")
    fn validate_provider_reference(&self, reference: &str) -> Result<()> {
        let (provider_type, config_name) = Self::parse_provider_reference(reference)?;

        match provider_type.as_str() {
            "openai" => {
                if !self.providers.openai.contains_key(&config_name) {
                    anyhow::bail!(
                        "Provider config 'openai.{}' not found. Available: {:?}",
                        config_name,
                        self.providers.openai.keys().collect::<Vec<_>>()
                    );
                }
            }
            _ => {
                // Anything else is looked up among the openai_compatible names
                if !self.providers.openai_compatible.contains_key(&provider_type) {
                    anyhow::bail!(
                        "Unknown provider type '{}'. Valid types: openai, or openai_compatible names",
                        provider_type
                    );
                }
            }
        }

        Ok(())
    }

    /// Parse a provider reference into (provider_type, config_name)
    pub fn parse_provider_reference(reference: &str) -> Result<(String, String)> {
        let parts: Vec<&str> = reference.split('.').collect();
        if parts.len() != 2 {
            anyhow::bail!(
                "Invalid provider reference '{}'. Expected format: '<provider_type>.<config_name>'",
                reference
            );
        }
        Ok((parts[0].to_string(), parts[1].to_string()))
    }

    /// Get the config for the current default provider
    pub fn get_default_provider_config(&self) -> Result<&OpenAIConfig> {
        let (provider_type, config_name) =
            Self::parse_provider_reference(&self.providers.default_provider)?;

        match provider_type.as_str() {
            "openai" => self
                .providers
                .openai
                .get(&config_name)
                .ok_or_else(|| anyhow::anyhow!("OpenAI config '{}' not found", config_name)),
            _ => self
                .providers
                .openai_compatible
                .get(&provider_type)
                .ok_or_else(|| {
                    anyhow::anyhow!("OpenAI compatible config '{}' not found", provider_type)
                }),
        }
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }
}
