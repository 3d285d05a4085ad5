use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Backend closed the connection")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, BackendError>;
