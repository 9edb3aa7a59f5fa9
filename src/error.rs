//! Error type shared by the subscriber and partner probes.

/// Every failure is terminal: probes never retry or recover.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// An HTTP request failed at the transport level (not a status code).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The WebSocket handshake failed or the connection was refused.
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    /// An established WebSocket connection failed while sending or reading.
    #[error("websocket error: {0}")]
    WsTransport(Box<tokio_tungstenite::tungstenite::Error>),
    /// The peer closed the WebSocket connection.
    #[error("websocket closed")]
    WsClosed,
    /// A payload could not be encoded or a response could not be parsed as JSON.
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// Writing probe output failed.
    #[error("output write failed: {0}")]
    Output(#[from] std::io::Error),
    /// A required field was absent from a server response.
    #[error("missing expected field `{0}`")]
    MissingField(&'static str),
    /// The `.env` file exists but could not be read or parsed.
    #[error("invalid .env file: {0}")]
    Env(#[from] dotenvy::Error),
    /// A configured endpoint URL has the wrong scheme.
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for ProbeError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WsTransport(Box::new(error))
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
