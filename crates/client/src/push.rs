//! WebSocket push channel for dream-status updates.
//!
//! [`WsPushConnector`] opens `/ws/dream-status/{id}` and exposes the
//! connection as a stream of parsed [`PushUpdate`]s. Dropping the stream
//! drops the socket.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use loom_core::types::DreamId;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::config::ClientConfig;
use crate::messages::{parse_update, PushUpdate};

/// Parsed updates from one open push channel. Ends when the server closes.
pub type PushStream = BoxStream<'static, Result<PushUpdate, PushError>>;

/// Errors from the push channel.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A protocol-level error on an open connection.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Opens a push channel scoped to one dream.
#[async_trait]
pub trait PushConnector: Send + Sync {
    async fn open(&self, dream_id: DreamId) -> Result<PushStream, PushError>;
}

/// [`PushConnector`] backed by the backend's WebSocket endpoint.
#[derive(Debug, Clone)]
pub struct WsPushConnector {
    ws_url: String,
}

impl WsPushConnector {
    /// * `ws_url` - WebSocket base URL, e.g. `ws://host:8000`.
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.ws_url.clone())
    }

    pub fn url_for(&self, dream_id: DreamId) -> String {
        format!("{}/ws/dream-status/{dream_id}", self.ws_url)
    }
}

#[async_trait]
impl PushConnector for WsPushConnector {
    async fn open(&self, dream_id: DreamId) -> Result<PushStream, PushError> {
        let url = self.url_for(dream_id);
        let (ws_stream, _response) = connect_async(url.as_str()).await.map_err(|e| {
            PushError::Connection(format!("Failed to connect to {url}: {e}"))
        })?;

        tracing::debug!(dream_id, url = %url, "Push channel connected");

        let updates = ws_stream.filter_map(move |frame| async move {
            match frame {
                Ok(Message::Text(text)) => match parse_update(&text) {
                    Ok(update) => Some(Ok(update)),
                    Err(e) => {
                        tracing::warn!(
                            dream_id,
                            error = %e,
                            raw_message = %text,
                            "Failed to parse push message",
                        );
                        None
                    }
                },
                Ok(Message::Close(frame)) => {
                    tracing::debug!(dream_id, ?frame, "Push channel closed by server");
                    None
                }
                // Pings are answered by tungstenite; binary frames are not used.
                Ok(Message::Binary(_) | Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {
                    None
                }
                Err(e) => Some(Err(PushError::Protocol(e.to_string()))),
            }
        });

        Ok(updates.boxed())
    }
}
