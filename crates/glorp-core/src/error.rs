use thiserror::Error;

#[derive(Debug, Error)]
pub enum GlorpError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Model `{model}` refers to unknown provider `{provider}`")]
    UnknownProvider { model: String, provider: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GlorpError {
    /// Short error code string used in startup logs.
    pub fn code(&self) -> &'static str {
        match self {
            GlorpError::Config(_) => "CONFIG_ERROR",
            GlorpError::ConfigNotFound { .. } => "CONFIG_NOT_FOUND",
            GlorpError::UnknownProvider { .. } => "UNKNOWN_PROVIDER",
            GlorpError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, GlorpError>;
