//! WebSocket subscriber for the update streams.
//!
//! Connects once, sends one subscription frame, then echoes every data frame
//! to the output sink in receipt order. There is no reconnect: a refused
//! handshake or a dropped connection ends the run with an error.

use std::io::Write;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

use crate::config::SubscriberConfig;
use crate::error::ProbeError;
use crate::protocol::Subscription;

/// A data frame as received, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Text(String),
    Binary(Vec<u8>),
}

impl Received {
    fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }
}

/// A single open connection to an update endpoint.
pub struct WsSubscriber {
    stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
}

impl WsSubscriber {
    /// Open the websocket connection.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::WsConnect`] if the connection is refused or the
    /// handshake fails.
    pub async fn connect(url: &str) -> Result<Self, ProbeError> {
        let (stream, response) = connect_async(url)
            .await
            .map_err(|error| ProbeError::WsConnect(Box::new(error)))?;
        debug!(%url, status = response.status().as_u16(), "ws: handshake complete");
        Ok(Self { stream })
    }

    /// Send the subscription as one text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the socket send fails.
    pub async fn subscribe(&mut self, subscription: &Subscription) -> Result<(), ProbeError> {
        let text = subscription.to_text()?;
        debug!(%text, "ws: sending subscription");
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Wait for the next text or binary frame.
    ///
    /// Control frames are skipped; pings are answered by the transport.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::WsClosed`] on a close frame or end of stream, and
    /// [`ProbeError::WsTransport`] on transport errors.
    pub async fn next_frame(&mut self) -> Result<Received, ProbeError> {
        loop {
            let Some(message) = self.stream.next().await else {
                return Err(ProbeError::WsClosed);
            };
            match message? {
                Message::Text(text) => return Ok(Received::Text(text.as_str().to_owned())),
                Message::Binary(bytes) => return Ok(Received::Binary(bytes.to_vec())),
                Message::Close(frame) => {
                    debug!(?frame, "ws: close frame received");
                    return Err(ProbeError::WsClosed);
                }
                _ => {}
            }
        }
    }
}

/// Connect, subscribe, and print every frame to `out` until the stream ends.
///
/// Each frame is written verbatim followed by a newline and flushed before the
/// next receive. Returns the frame count only when `max_frames` is reached.
///
/// # Errors
///
/// Any connect, transport, or output failure, including the peer closing the
/// connection before `max_frames` is reached.
pub async fn run_subscriber<W: Write>(
    config: &SubscriberConfig,
    subscription: &Subscription,
    out: &mut W,
) -> Result<usize, ProbeError> {
    info!(url = %config.url, "ws: connecting");
    let mut subscriber = WsSubscriber::connect(&config.url).await?;
    subscriber.subscribe(subscription).await?;
    info!(url = %config.url, "ws: subscribed");

    let mut printed = 0_usize;
    loop {
        if config.max_frames.is_some_and(|limit| printed >= limit) {
            info!(frames = printed, "ws: frame limit reached");
            return Ok(printed);
        }

        let frame = match subscriber.next_frame().await {
            Ok(frame) => frame,
            Err(error) => {
                info!(frames = printed, %error, "ws: stream ended");
                return Err(error);
            }
        };
        out.write_all(frame.as_bytes())?;
        out.write_all(b"\n")?;
        out.flush()?;
        printed = printed.saturating_add(1);
    }
}

#[cfg(test)]
#[path = "subscriber_test.rs"]
mod tests;
