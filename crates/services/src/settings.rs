//! Site settings stored as key-value pairs, with configured fallbacks.

use chrono::Utc;
use domains::{DomainError, Result, Setting, SettingsRepo};
use serde::Serialize;
use std::sync::Arc;

pub const SITE_NAME: &str = "site_name";
pub const SITE_DESCRIPTION: &str = "site_description";
pub const SITE_LANGUAGE: &str = "site_language";

const MAX_KEY_LEN: usize = 64;
const MAX_VALUE_LEN: usize = 64 * 1024;

/// Site identity as configured at startup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteInfo {
    pub name: String,
    pub description: String,
    pub language: String,
    /// Absolute origin used in feeds and the sitemap, without trailing slash
    pub base_url: String,
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-'));
    if valid {
        Ok(())
    } else {
        Err(DomainError::validation(format!(
            "setting key '{key}' must be 1-{MAX_KEY_LEN} chars of a-z, 0-9, '_', '.', '-'"
        )))
    }
}

pub struct SettingsService {
    settings: Arc<dyn SettingsRepo>,
    defaults: SiteInfo,
}

impl SettingsService {
    pub fn new(settings: Arc<dyn SettingsRepo>, defaults: SiteInfo) -> Self {
        Self { settings, defaults }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.settings.get_setting(key).await?.map(|s| s.value))
    }

    /// Inserts or overwrites a setting.
    pub async fn set(&self, key: &str, value: &str) -> Result<Setting> {
        validate_key(key)?;
        if value.len() > MAX_VALUE_LEN {
            return Err(DomainError::validation(format!(
                "setting '{key}' exceeds {MAX_VALUE_LEN} bytes"
            )));
        }
        let setting = self.settings.upsert_setting(key, value, Utc::now()).await?;
        tracing::info!(key, "setting updated");
        Ok(setting)
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        if !self.settings.delete_setting(key).await? {
            return Err(DomainError::not_found("setting", key));
        }
        Ok(())
    }

    pub async fn all(&self) -> Result<Vec<Setting>> {
        self.settings.all_settings().await
    }

    /// Site identity with stored settings taking precedence over defaults.
    pub async fn site(&self) -> Result<SiteInfo> {
        let mut site = self.defaults.clone();
        for setting in self.settings.all_settings().await? {
            let value = setting.value.trim();
            if value.is_empty() {
                continue;
            }
            match setting.key.as_str() {
                SITE_NAME => site.name = value.to_string(),
                SITE_DESCRIPTION => site.description = value.to_string(),
                SITE_LANGUAGE => site.language = value.to_string(),
                _ => {}
            }
        }
        Ok(site)
    }
}
