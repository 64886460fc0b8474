use thiserror::Error;
use tokio::sync::mpsc::error::SendError;
use tokio_tungstenite::tungstenite;

#[derive(Error, Debug)]
pub enum FlashdeckError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),

    #[error("Channel send error: {0}")]
    ChannelSend(String),

    #[error("Backend returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Set {0} not found")]
    SetNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Backend is unreachable")]
    Offline,

    #[error("{0}")]
    Custom(String),
}

impl<T> From<SendError<T>> for FlashdeckError {
    fn from(error: SendError<T>) -> Self {
        FlashdeckError::ChannelSend(error.to_string())
    }
}

impl From<std::io::Error> for FlashdeckError {
    fn from(error: std::io::Error) -> Self {
        FlashdeckError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for FlashdeckError {
    fn from(error: reqwest::Error) -> Self {
        FlashdeckError::Reqwest(Box::new(error))
    }
}

impl From<tungstenite::Error> for FlashdeckError {
    fn from(error: tungstenite::Error) -> Self {
        FlashdeckError::WebSocket(Box::new(error))
    }
}

pub type Result<T, E = FlashdeckError> = std::result::Result<T, E>;
