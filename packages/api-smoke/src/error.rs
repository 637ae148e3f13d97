use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmokeError {
    #[error("Configuration error: {message}")]
    Config { message: String },
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Decode error: {message}")]
    Decode { message: String },
}

impl SmokeError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}
