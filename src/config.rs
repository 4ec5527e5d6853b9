use anyhow::Result;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

const CONFIG_FILE: &str = "cooking-assistant";
const ENV_PREFIX: &str = "COOKING_ASSISTANT";

/// Main configuration structure for the cooking assistant
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CookingAssistantConfig {
    /// Language model settings
    pub llm: LlmConfig,
    /// Conversation behaviour
    pub session: SessionConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key (falls back to OPENAI_API_KEY)
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Servings used when the user just presses enter
    pub default_servings: u32,
    /// Consecutive re-prompts before the full list of options is shown
    pub max_reprompts: u32,
    /// Calls to the recipe source per proposal request
    pub max_proposal_attempts: u32,
    /// Number of candidate recipes to ask for
    pub candidate_count: usize,
    /// Seconds between timer polls in the interactive loop
    pub timer_update_seconds: u64,
    /// Begin each step as soon as it is presented
    pub auto_advance: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_servings: 2,
            max_reprompts: 3,
            max_proposal_attempts: 2,
            candidate_count: 3,
            timer_update_seconds: 5,
            auto_advance: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level filter used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON log lines instead of human readable ones
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}

impl CookingAssistantConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (cooking-assistant.toml)
    /// 3. Environment variables (COOKING_ASSISTANT__SECTION__KEY)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new(&format!("{CONFIG_FILE}.toml")).exists() {
            builder = builder.add_source(File::with_name(CONFIG_FILE));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut loaded: CookingAssistantConfig = builder.build()?.try_deserialize()?;
        loaded.apply_api_key_fallback(std::env::var("OPENAI_API_KEY").ok());
        Ok(loaded)
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let loaded = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(loaded)
    }

    fn apply_api_key_fallback(&mut self, key: Option<String>) {
        if !matches!(self.llm.api_key.as_deref(), Some(k) if !k.is_empty()) {
            self.llm.api_key = key.filter(|k| !k.is_empty());
        }
    }

    /// Effective configuration as TOML, with the API key masked
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.llm.api_key.is_some() {
            shown.llm.api_key = Some("********".to_string());
        }
        Ok(toml::to_string_pretty(&shown)?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::debug!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<CookingAssistantConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = CookingAssistantConfig::load_env_file();
        CookingAssistantConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static CookingAssistantConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = CookingAssistantConfig::default();
        assert_eq!(config.session.default_servings, 2);
        assert_eq!(config.session.max_reprompts, 3);
        assert_eq!(config.session.candidate_count, 3);
        assert_eq!(config.session.timer_update_seconds, 5);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = CookingAssistantConfig::from_toml_str(
            r#"
            [llm]
            model = "gpt-4o"

            [session]
            candidate_count = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.session.candidate_count, 5);
        assert_eq!(config.session.default_servings, 2);
        assert_eq!(config.observability, ObservabilityConfig::default());
    }

    #[test]
    fn test_api_key_fallback_only_fills_missing_key() {
        let mut config = CookingAssistantConfig::default();
        config.apply_api_key_fallback(Some("from-env".to_string()));
        assert_eq!(config.llm.api_key.as_deref(), Some("from-env"));

        config.apply_api_key_fallback(Some("other".to_string()));
        assert_eq!(config.llm.api_key.as_deref(), Some("from-env"));

        let mut empty = CookingAssistantConfig::default();
        empty.apply_api_key_fallback(Some(String::new()));
        assert!(empty.llm.api_key.is_none());
    }

    #[test]
    fn test_redacted_toml_hides_key_and_round_trips() {
        let mut config = CookingAssistantConfig::default();
        config.llm.api_key = Some("sk-secret".to_string());

        let rendered = config.to_redacted_toml().unwrap();
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[session]"));

        let parsed = CookingAssistantConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(parsed.session, config.session);
    }

    #[test]
    fn test_saved_file_loads_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cooking-assistant.toml");

        let mut config = CookingAssistantConfig::default();
        config.session.auto_advance = false;
        config.llm.model = "llama3".to_string();
        config.save_to_file(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let loaded = CookingAssistantConfig::from_toml_str(&content).unwrap();
        assert_eq!(loaded, config);
    }
}
