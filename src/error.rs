use thiserror::Error;

/// Failures of a single content load.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("no content found for slug '{slug}'")]
    NotFound { slug: String },

    #[error("malformed content: {reason}")]
    MalformedContent { reason: &'static str },

    #[error("invalid slug '{slug}'")]
    InvalidSlug { slug: String },

    #[error("failed to read content: {0}")]
    Io(#[from] std::io::Error),
}

impl ContentError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentError::NotFound { .. } | ContentError::InvalidSlug { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown markdown tag '{0}' in [styles]")]
    UnknownStyleTag(String),

    #[error("invalid PORT value '{0}'")]
    InvalidPort(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),
}
