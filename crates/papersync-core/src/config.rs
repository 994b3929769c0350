use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::models::FieldSchema;

/// Root application configuration, loaded from `~/.config/papersync/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub notion: NotionConfig,
    pub semantic_scholar: SemanticScholarConfig,
    pub properties: FieldSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,
    pub api_version: String,
    pub base_url: String,
    pub page_size: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticScholarConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Minimum gap between requests. Unset: 100 ms with an API key, 1 s without.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_interval_ms: Option<u64>,
}

/// Credentials that must be supplied before a run; there are no defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionCredentials {
    pub token: String,
    pub database_id: String,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token: None,
            database_id: None,
            api_version: "2022-06-28".to_string(),
            base_url: "https://api.notion.com/v1".to_string(),
            page_size: 100,
            timeout_secs: 30,
        }
    }
}

impl Default for SemanticScholarConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.semanticscholar.org/graph/v1".to_string(),
            timeout_secs: 30,
            min_interval_ms: None,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/papersync/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PAPERSYNC_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("papersync")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// Token and database id, both required and non-blank.
    pub fn credentials(&self) -> Result<NotionCredentials> {
        let token = non_blank(self.notion.token.as_deref()).ok_or_else(|| {
            SyncError::ValidationError(
                "a Notion integration token is required (--notion-token or NOTION_TOKEN)".to_string(),
            )
        })?;
        let database_id = non_blank(self.notion.database_id.as_deref()).ok_or_else(|| {
            SyncError::ValidationError(
                "a Notion database id is required (--database-id or NOTION_DATABASE_ID)".to_string(),
            )
        })?;
        Ok(NotionCredentials {
            token: token.to_string(),
            database_id: database_id.to_string(),
        })
    }

    /// Checks everything a run needs: credentials, schema and limits.
    pub fn validate(&self) -> Result<NotionCredentials> {
        self.properties.validate()?;
        if !(1..=100).contains(&self.notion.page_size) {
            return Err(SyncError::ConfigError(format!(
                "notion.page_size must be between 1 and 100, got {}",
                self.notion.page_size
            )));
        }
        if self.notion.timeout_secs == 0 || self.semantic_scholar.timeout_secs == 0 {
            return Err(SyncError::ConfigError("timeouts must be positive".to_string()));
        }
        self.credentials()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
