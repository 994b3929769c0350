use std::path::Path;

use papersync_core::{AppConfig, NotionCredentials, Result};

/// Flags, environment and config file merged into what a run needs.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub config: AppConfig,
    pub credentials: NotionCredentials,
    pub dry_run: bool,
}

impl RunSettings {
    pub fn resolve(config: AppConfig, dry_run: bool) -> Result<Self> {
        let credentials = config.validate()?;
        Ok(Self {
            config,
            credentials,
            dry_run,
        })
    }
}

/// Puts non-blank flag values (clap already folded in the env vars) over the file.
pub fn overlay_flags(config: &mut AppConfig, database_id: Option<String>, token: Option<String>) {
    if let Some(id) = database_id.filter(|v| !v.trim().is_empty()) {
        config.notion.database_id = Some(id);
    }
    if let Some(token) = token.filter(|v| !v.trim().is_empty()) {
        config.notion.token = Some(token);
    }
}

/// Saves the file config with only a non-blank `database_id` flag applied.
/// A token from the flags or environment is never written to disk.
pub fn write_config(file_config: &AppConfig, database_id: Option<String>, path: &Path) -> Result<()> {
    let mut config = file_config.clone();
    overlay_flags(&mut config, database_id, None);
    config.save_to(path)
}
