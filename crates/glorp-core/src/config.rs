use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{GlorpError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
/// Placeholder key for local OpenAI-compatible servers that ignore auth.
pub const DEFAULT_API_KEY: &str = "sk-no-key-required";
/// Permission bitset requested by the invite link.
pub const INVITE_PERMISSIONS: u64 = 412_317_273_088;

/// Top-level config (config.yaml + GLORP_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlorpConfig {
    pub bot_token: String,
    /// Application id, only used to print the invite link.
    #[serde(default)]
    pub client_id: Option<ClientId>,
    /// `provider/model-name`, e.g. `ollama/llama3`.
    pub model: String,
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub presence: PresenceConfig,
}

/// An OpenAI-compatible endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL including the version segment, e.g. `http://localhost:11434/v1`.
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// YAML users write ids both quoted and bare; accept either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientId {
    Numeric(u64),
    Text(String),
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientId::Numeric(n) => write!(f, "{n}"),
            ClientId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// A channel whose newest turn is older than this is dropped by cleanup.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            max_age_secs: default_max_age_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Per-attempt completion timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// First backoff delay; doubles after every timed-out attempt.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    #[serde(default = "default_presence_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_presence_interval_secs(),
        }
    }
}

/// The `model` setting resolved against `providers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}
fn default_max_turns() -> usize {
    20
}
fn default_max_age_secs() -> u64 {
    3600
}
fn default_cleanup_interval_secs() -> u64 {
    3600
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_max_attempts() -> u32 {
    5
}
fn default_backoff_base_ms() -> u64 {
    1000
}
fn default_presence_interval_secs() -> u64 {
    1800
}

impl GlorpConfig {
    /// Load config from a YAML file with GLORP_* env var overrides.
    ///
    /// Nested keys use a double underscore: `GLORP_AI__TIMEOUT_SECS=60`.
    /// A missing file is an error; the bot cannot start without a token.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).is_file() {
            return Err(GlorpError::ConfigNotFound {
                path: path.to_string(),
            });
        }

        let figment = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("GLORP_").split("__"));
        Self::extract(figment)
    }

    /// Parse config from an in-memory YAML document (no env overrides).
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::extract(Figment::from(Yaml::string(yaml)))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: GlorpConfig = figment
            .extract()
            .map_err(|e| GlorpError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that would only fail later, at connect or first AI call.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            return Err(GlorpError::Config("bot_token is empty".to_string()));
        }
        if self.history.max_turns == 0 {
            return Err(GlorpError::Config(
                "history.max_turns must be at least 1".to_string(),
            ));
        }
        if self.ai.max_attempts == 0 {
            return Err(GlorpError::Config(
                "ai.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.history.cleanup_interval_secs == 0 {
            return Err(GlorpError::Config(
                "history.cleanup_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.presence.interval_secs == 0 {
            return Err(GlorpError::Config(
                "presence.interval_secs must be at least 1".to_string(),
            ));
        }
        self.resolve_model().map(|_| ())
    }

    /// Split `model` into provider and model name and look up the endpoint.
    pub fn resolve_model(&self) -> Result<ResolvedModel> {
        let (provider, model) = self
            .model
            .split_once('/')
            .filter(|(p, m)| !p.is_empty() && !m.is_empty())
            .ok_or_else(|| {
                GlorpError::Config(format!(
                    "model `{}` must be in the form provider/model-name",
                    self.model
                ))
            })?;

        let entry = self
            .providers
            .get(provider)
            .ok_or_else(|| GlorpError::UnknownProvider {
                model: self.model.clone(),
                provider: provider.to_string(),
            })?;

        Ok(ResolvedModel {
            provider: provider.to_string(),
            model: model.to_string(),
            base_url: entry.base_url.trim_end_matches('/').to_string(),
            api_key: entry
                .api_key
                .clone()
                .unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
        })
    }

    /// OAuth2 invite link for the configured application, if any.
    pub fn invite_url(&self) -> Option<String> {
        self.client_id.as_ref().map(|id| {
            format!(
                "https://discord.com/api/oauth2/authorize?client_id={id}&permissions={INVITE_PERMISSIONS}&scope=bot"
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
bot_token: "abc.def"
model: "local/llama3"
providers:
  local:
    base_url: "http://localhost:11434/v1/"
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg = GlorpConfig::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(cfg.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(cfg.history.max_turns, 20);
        assert_eq!(cfg.history.max_age_secs, 3600);
        assert_eq!(cfg.ai.timeout_secs, 120);
        assert_eq!(cfg.ai.max_attempts, 5);
        assert_eq!(cfg.ai.backoff_base_ms, 1000);
        assert_eq!(cfg.presence.interval_secs, 1800);
        assert!(cfg.invite_url().is_none());
    }

    #[test]
    fn resolve_model_splits_provider_and_fills_key() {
        let cfg = GlorpConfig::from_yaml_str(MINIMAL).unwrap();
        let resolved = cfg.resolve_model().unwrap();
        assert_eq!(resolved.provider, "local");
        assert_eq!(resolved.model, "llama3");
        assert_eq!(resolved.base_url, "http://localhost:11434/v1");
        assert_eq!(resolved.api_key, DEFAULT_API_KEY);
    }

    #[test]
    fn model_name_may_contain_slashes() {
        let yaml = r#"
bot_token: "t"
model: "openrouter/meta-llama/llama-3-8b"
providers:
  openrouter:
    base_url: "https://openrouter.ai/api/v1"
    api_key: "sk-real"
"#;
        let resolved = GlorpConfig::from_yaml_str(yaml)
            .unwrap()
            .resolve_model()
            .unwrap();
        assert_eq!(resolved.model, "meta-llama/llama-3-8b");
        assert_eq!(resolved.api_key, "sk-real");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let yaml = r#"
bot_token: "t"
model: "missing/gpt"
providers:
  local:
    base_url: "http://localhost"
"#;
        let err = GlorpConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, GlorpError::UnknownProvider { .. }));
    }

    #[test]
    fn model_without_provider_is_rejected() {
        let yaml = r#"
bot_token: "t"
model: "gpt-4o"
"#;
        let err = GlorpConfig::from_yaml_str(yaml).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn missing_token_is_rejected() {
        let yaml = r#"
model: "local/llama3"
providers:
  local:
    base_url: "http://localhost"
"#;
        assert!(GlorpConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn zero_job_intervals_are_rejected() {
        let cleanup = format!("{MINIMAL}history:\n  cleanup_interval_secs: 0\n");
        let err = GlorpConfig::from_yaml_str(&cleanup).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("history.cleanup_interval_secs"));

        let presence = format!("{MINIMAL}presence:\n  interval_secs: 0\n");
        let err = GlorpConfig::from_yaml_str(&presence).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("presence.interval_secs"));
    }

    #[test]
    fn numeric_client_id_builds_invite_url() {
        let yaml = format!("{MINIMAL}client_id: 1234567890\n");
        let cfg = GlorpConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(
            cfg.invite_url().as_deref(),
            Some("https://discord.com/api/oauth2/authorize?client_id=1234567890&permissions=412317273088&scope=bot")
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let err = GlorpConfig::load("/definitely/not/here/config.yaml").unwrap_err();
        assert!(matches!(err, GlorpError::ConfigNotFound { .. }));
    }

    #[test]
    fn load_applies_env_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.yaml", MINIMAL)?;
            jail.set_env("GLORP_SYSTEM_PROMPT", "be an alien");
            jail.set_env("GLORP_AI__TIMEOUT_SECS", "30");

            let cfg = GlorpConfig::load("config.yaml").expect("config loads");
            assert_eq!(cfg.system_prompt, "be an alien");
            assert_eq!(cfg.ai.timeout_secs, 30);
            Ok(())
        });
    }
}
