//! One push-channel connection — thin wrapper over `tokio-tungstenite`.
//!
//! A [`Channel`] is created per connection attempt and never reused across
//! reconnects. Transport errors are logged but do not close the channel by
//! themselves; closure is driven by the transport's own close signal (a
//! `Close` frame or stream end).

use futures::StreamExt;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Push-channel failure.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The connection could not be established.
    #[error("websocket connect: {0}")]
    Connect(#[from] WsError),
}

/// A live websocket connection delivering text frames.
pub struct Channel {
    stream: WsStream,
    url: String,
}

impl Channel {
    /// Connect to a push-channel endpoint.
    pub async fn open(url: &str) -> Result<Self, ChannelError> {
        let (stream, _) = connect_async(url).await?;
        debug!(url, "channel connected");
        Ok(Self {
            stream,
            url: url.to_string(),
        })
    }

    /// Endpoint this channel is connected to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Next text frame, or `None` once the transport has closed.
    ///
    /// Ping/pong/binary frames are skipped. Read errors are logged; fatal
    /// transport errors end the stream, recoverable ones are skipped.
    pub async fn next_text(&mut self) -> Option<String> {
        loop {
            match self.stream.next().await {
                None => return None,
                Some(Ok(Message::Text(text))) => return Some(text.to_string()),
                Some(Ok(Message::Close(_))) => {
                    debug!(url = %self.url, "channel received close frame");
                    return None;
                }
                Some(Ok(_)) => {} // ping/pong/binary
                Some(Err(e)) => match e {
                    WsError::ConnectionClosed
                    | WsError::AlreadyClosed
                    | WsError::Io(_)
                    | WsError::Protocol(_) => {
                        warn!(url = %self.url, error = %e, "channel transport error");
                        return None;
                    }
                    other => {
                        warn!(url = %self.url, error = %other, "channel frame error, skipping");
                    }
                },
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
