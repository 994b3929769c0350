use papersync_core::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {service}: HTTP {status}: {body}")]
    Api {
        service: String,
        status: u16,
        body: String,
    },

    #[error("invalid header value: {0}")]
    InvalidHeader(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl SourceError {
    /// HTTP status of a non-success response, if that is what failed.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<SourceError> for SyncError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Api {
                service,
                status,
                body,
            } => SyncError::Http {
                service,
                status,
                body,
            },
            SourceError::Http(e) => SyncError::Transport(
                e.url().map(|u| u.host_str().unwrap_or_default().to_string()).unwrap_or_default(),
                e.to_string(),
            ),
            SourceError::InvalidHeader(msg) => SyncError::ConfigError(msg),
            SourceError::Parse(msg) => SyncError::Parse(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;
