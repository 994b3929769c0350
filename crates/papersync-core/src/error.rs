use thiserror::Error;

/// All errors that can occur in papersync-core.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("HTTP {status} from {service}: {body}")]
    Http {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Transport error from {0}: {1}")]
    Transport(String, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Exit codes used by the CLI.
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidArgs = 2,
    NetworkError = 6,
}

impl SyncError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::ConfigError(_) | Self::ValidationError(_) | Self::TomlParse(_) => {
                ExitCode::InvalidArgs
            }
            Self::Http { .. } | Self::Transport(..) => ExitCode::NetworkError,
            _ => ExitCode::GeneralError,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
