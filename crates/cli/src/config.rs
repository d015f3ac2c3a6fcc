use anyhow::{Context, Result};
use contact_api::CONTACTS_PATH;
use contact_presentation::TemplateSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "contacts.toml";

pub const API_URL_ENV: &str = "CONTACTS_API_URL";
pub const TIMEOUT_ENV: &str = "CONTACTS_TIMEOUT_MS";
pub const TEMPLATES_ENV: &str = "CONTACTS_TEMPLATES";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContactsConfig {
    pub api_url: String,
    pub contacts_path: String,
    pub timeout_ms: u64,
    /// TOML file with template overrides.
    pub templates: Option<PathBuf>,
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            contacts_path: CONTACTS_PATH.to_string(),
            timeout_ms: 5_000,
            templates: None,
        }
    }
}

impl ContactsConfig {
    /// File (explicit, or `contacts.toml` if present), then environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Overlay `CONTACTS_*` variables read through `lookup`. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        if let Some(url) = read(API_URL_ENV) {
            self.api_url = url;
        }
        if let Some(raw) = read(TIMEOUT_ENV) {
            self.timeout_ms = raw
                .parse()
                .with_context(|| format!("{TIMEOUT_ENV} must be an integer (got '{raw}')"))?;
        }
        if let Some(path) = read(TEMPLATES_ENV) {
            self.templates = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            anyhow::bail!("api_url must not be empty");
        }
        if self.contacts_path.trim().is_empty() {
            anyhow::bail!("contacts_path must not be empty");
        }
        if self.timeout_ms == 0 {
            anyhow::bail!("timeout_ms must be > 0");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Built-in templates, overlaid with the configured file if any.
    pub fn load_templates(&self) -> Result<TemplateSet> {
        let Some(path) = &self.templates else {
            return Ok(TemplateSet::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read templates {}", path.display()))?;
        TemplateSet::from_toml_str(&raw)
            .with_context(|| format!("Invalid templates {}", path.display()))
    }
}
