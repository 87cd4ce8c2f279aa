use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ReverieConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub ai: AiConfig,
    pub search: SearchConfig,
    pub relations: RelationsConfig,
    pub resurface: ResurfaceConfig,
    pub insights: InsightsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AiConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    pub api_key: Option<String>,
    pub analysis_model: String,
    pub embedding_model: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub min_query_len: usize,
    pub score_threshold: f64,
    pub recency_window_days: i64,
    pub recency_weight: f64,
    pub substring_boost: f64,
    pub exact_tag_boost: f64,
    pub fallback_score: f64,
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RelationsConfig {
    pub threshold: f64,
    pub topic_boost: f64,
    pub max_related: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ResurfaceConfig {
    pub default_count: usize,
    pub sweet_spot_min_days: i64,
    pub sweet_spot_max_days: i64,
    pub sweet_spot_bonus: f64,
    pub stale_bonus: f64,
    pub fatigue_penalty: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InsightsConfig {
    pub min_memories: usize,
    pub max_patterns: usize,
    pub reminder_importance: f64,
    pub reminder_age_days: i64,
    pub max_reminders: usize,
    pub reminder_relevance: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 8765,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_reverie_dir()
            .join("memories.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
            analysis_model: "gpt-4o-mini".into(),
            embedding_model: "text-embedding-3-small".into(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_len: 3,
            score_threshold: 0.40,
            recency_window_days: 60,
            recency_weight: 0.15,
            substring_boost: 0.25,
            exact_tag_boost: 0.35,
            fallback_score: 0.5,
            debounce_ms: 500,
        }
    }
}

impl Default for RelationsConfig {
    fn default() -> Self {
        Self {
            threshold: 0.65,
            topic_boost: 0.1,
            max_related: 5,
        }
    }
}

impl Default for ResurfaceConfig {
    fn default() -> Self {
        Self {
            default_count: 5,
            sweet_spot_min_days: 7,
            sweet_spot_max_days: 30,
            sweet_spot_bonus: 0.3,
            stale_bonus: 0.2,
            fatigue_penalty: 0.1,
        }
    }
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            min_memories: 3,
            max_patterns: 3,
            reminder_importance: 0.6,
            reminder_age_days: 30,
            max_reminders: 3,
            reminder_relevance: 0.8,
        }
    }
}

/// Returns `~/.reverie/`
pub fn default_reverie_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".reverie")
}

/// Returns the default config file path: `~/.reverie/config.toml`
pub fn default_config_path() -> PathBuf {
    default_reverie_dir().join("config.toml")
}

impl ReverieConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            ReverieConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (REVERIE_DB, REVERIE_LOG_LEVEL, REVERIE_API_KEY, REVERIE_AI_BASE_URL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("REVERIE_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("REVERIE_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("REVERIE_API_KEY") {
            self.ai.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("REVERIE_AI_BASE_URL") {
            self.ai.base_url = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ReverieConfig::default();
        assert_eq!(config.server.transport, "stdio");
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.search.debounce_ms, 500);
        assert_eq!(config.relations.threshold, 0.65);
        assert_eq!(config.resurface.default_count, 5);
        assert!(config.storage.db_path.ends_with("memories.db"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"

[storage]
db_path = "/tmp/test.db"

[search]
score_threshold = 0.5

[resurface]
default_count = 10
"#;
        let config: ReverieConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.storage.db_path, "/tmp/test.db");
        assert_eq!(config.search.score_threshold, 0.5);
        assert_eq!(config.resurface.default_count, 10);
        // defaults still apply for unset fields
        assert_eq!(config.search.exact_tag_boost, 0.35);
        assert_eq!(config.insights.max_patterns, 3);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = ReverieConfig::default();
        std::env::set_var("REVERIE_DB", "/tmp/override.db");
        std::env::set_var("REVERIE_LOG_LEVEL", "trace");
        std::env::set_var("REVERIE_API_KEY", "sk-test");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.server.log_level, "trace");
        assert_eq!(config.ai.api_key.as_deref(), Some("sk-test"));

        std::env::remove_var("REVERIE_DB");
        std::env::remove_var("REVERIE_LOG_LEVEL");
        std::env::remove_var("REVERIE_API_KEY");
    }

    #[test]
    fn tilde_expands_to_home() {
        let expanded = expand_tilde("~/x/y.db");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("x/y.db"));
        }
        assert_eq!(expand_tilde("/abs/path.db"), PathBuf::from("/abs/path.db"));
    }
}
