//! Trip planner configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Main trip planner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Completion endpoint configuration
    pub llm: LlmConfig,

    /// History log configuration
    pub history: HistoryConfig,

    /// Prompt template configuration
    pub prompts: PromptsConfig,

    /// Document export configuration
    pub export: ExportConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the API key environment variable is set so that a missing
    /// credential fails at startup instead of on the first request.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local config: ./tripplanner.yml
        let local_config = PathBuf::from("tripplanner.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // User config: ~/.config/tripplanner/tripplanner.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tripplanner").join("tripplanner.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed: a broken config file is reported properly by
    /// [`Config::load`] once logging exists.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from("tripplanner.yml")];
                if let Some(config_dir) = dirs::config_dir() {
                    paths.push(config_dir.join("tripplanner").join("tripplanner.yml"));
                }
                paths
            }
        };

        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Config>(&content).ok())
            .and_then(|config| config.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Chat-completion endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL (OpenAI-compatible, without the `/v1` suffix)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            base_url: "https://api.groq.com/openai".to_string(),
            temperature: 0.0,
            max_tokens: 1024,
            timeout_ms: 60_000,
        }
    }
}

impl LlmConfig {
    /// Resolve into the settings object handed to the client
    ///
    /// The credential is read from the environment here, once.
    pub fn resolve(&self) -> Result<ResolvedLlmConfig> {
        debug!(model = %self.model, api_key_env = %self.api_key_env, "LlmConfig::resolve: called");
        let api_key = std::env::var(&self.api_key_env)
            .map_err(|_| eyre::eyre!("Environment variable {} is not set", self.api_key_env))?;
        Ok(self.resolve_with_key(api_key))
    }

    /// Resolve with an explicitly supplied credential
    pub fn resolve_with_key(&self, api_key: impl Into<String>) -> ResolvedLlmConfig {
        ResolvedLlmConfig {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

/// Fully resolved model settings: endpoint, credential, model id, sampling
#[derive(Clone)]
pub struct ResolvedLlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl std::fmt::Debug for ResolvedLlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedLlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// History log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Record every successful generation
    pub enabled: bool,

    /// Directory holding `history.jsonl`
    pub dir: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        // XDG data directory (~/.local/share/tripplanner on Linux)
        let dir = dirs::data_local_dir()
            .map(|d| d.join("tripplanner"))
            .unwrap_or_else(|| PathBuf::from(".tripplanner"));

        Self { enabled: true, dir }
    }
}

/// Prompt template configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory searched for `.pmt` overrides before the embedded templates
    pub dir: Option<PathBuf>,
}

/// Document export configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// TrueType font for PDF exports (bundled DejaVu Sans when unset)
    #[serde(rename = "pdf-font")]
    pub pdf_font: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(config.llm.temperature, 0.0);
        assert!(config.history.enabled);
        assert!(config.prompts.dir.is_none());
        assert!(config.export.pdf_font.is_none());
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();

        assert_eq!(config.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.base_url, "https://api.groq.com/openai");
        assert_eq!(config.timeout_ms, 60_000);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug
llm:
  model: llama-3.1-8b-instant
  api-key-env: MY_API_KEY
  base-url: https://api.example.com/
  temperature: 0.2
  max-tokens: 512
  timeout-ms: 5000

history:
  enabled: false
  dir: /tmp/trips

prompts:
  dir: /tmp/prompts

export:
  pdf-font: /usr/share/fonts/NotoSansCJK.ttf
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.llm.model, "llama-3.1-8b-instant");
        assert_eq!(config.llm.api_key_env, "MY_API_KEY");
        assert_eq!(config.llm.max_tokens, 512);
        assert!(!config.history.enabled);
        assert_eq!(config.history.dir, PathBuf::from("/tmp/trips"));
        assert_eq!(config.prompts.dir, Some(PathBuf::from("/tmp/prompts")));
        assert_eq!(config.export.pdf_font, Some(PathBuf::from("/usr/share/fonts/NotoSansCJK.ttf")));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  model: mixtral-8x7b
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "mixtral-8x7b");
        assert_eq!(config.llm.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.llm.temperature, 0.0);
        assert!(config.history.enabled);
    }

    #[test]
    fn test_resolve_with_key_trims_base_url() {
        let config = LlmConfig {
            base_url: "https://api.example.com/".to_string(),
            timeout_ms: 1500,
            ..Default::default()
        };

        let resolved = config.resolve_with_key("secret");
        assert_eq!(resolved.base_url, "https://api.example.com");
        assert_eq!(resolved.api_key, "secret");
        assert_eq!(resolved.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_resolved_debug_redacts_key() {
        let resolved = LlmConfig::default().resolve_with_key("gsk-very-secret");
        let printed = format!("{:?}", resolved);
        assert!(!printed.contains("gsk-very-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("custom.yml");
        fs::write(&path, "log-level: warn\nllm:\n  model: custom-model\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.llm.model, "custom-model");
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_explicit_missing_path_errors() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }
}
