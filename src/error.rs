use thiserror::Error;

pub type AtlasResult<T> = Result<T, AtlasError>;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Data parsing failed: {message}")]
    ParsingError { message: String },

    #[error("Cross-match lookup failed: {message}")]
    CrossmatchError { message: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization failed: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl AtlasError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn parsing_error(message: impl Into<String>) -> Self {
        Self::ParsingError {
            message: message.into(),
        }
    }

    pub fn crossmatch(message: impl Into<String>) -> Self {
        Self::CrossmatchError {
            message: message.into(),
        }
    }
}
