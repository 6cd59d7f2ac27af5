use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tokio::fs;
use tracing::info;

use crate::error::ConfigError;

const DEFAULT_CONFIG_FILE: &str = "site.toml";
const DEFAULT_CONTENT_DIR: &str = "content";
const DEFAULT_PORT: u16 = 8080;

/// Runtime settings: `site.toml` first, then environment overrides.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub content_dir: PathBuf,
    pub port: u16,
    pub is_development: bool,
    pub contact_webhook_url: Option<String>,
    /// Markdown tag name to CSS class, layered over the built-in typography.
    pub styles: HashMap<String, String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            title: "Portfolio".to_string(),
            content_dir: PathBuf::from(DEFAULT_CONTENT_DIR),
            port: DEFAULT_PORT,
            is_development: false,
            contact_webhook_url: None,
            styles: HashMap::new(),
        }
    }
}

impl SiteConfig {
    pub async fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("SITE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
        let mut config = Self::from_file(Path::new(&path)).await?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Reads the TOML file; a missing file yields the defaults.
    pub async fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path).await {
            Ok(text) => {
                info!("Loading site config from {}", path.display());
                Self::from_toml(&text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SiteConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(env) = var("RUST_ENV") {
            self.is_development = env == "development";
        }
        if let Some(port) = var("PORT") {
            self.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }
        if let Some(dir) = var("CONTENT_DIR") {
            self.content_dir = PathBuf::from(dir);
        }
        if let Some(url) = var("CONTACT_WEBHOOK_URL") {
            self.contact_webhook_url = Some(url).filter(|u| !u.is_empty());
        }
        Ok(())
    }

    pub fn posts_dir(&self) -> PathBuf {
        Self::posts_dir_of(&self.content_dir)
    }

    pub fn posts_dir_of(content_dir: &Path) -> PathBuf {
        content_dir.join("posts")
    }

    pub fn static_dir(&self) -> PathBuf {
        self.content_dir.join("static")
    }
}
