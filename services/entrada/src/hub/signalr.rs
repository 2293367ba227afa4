//! SignalR hub client over websocket

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::protocol::{self, HubMessage};
use super::Hub;
use crate::config::HubConfig;
use crate::io::HttpClient;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Body of `POST {hub}/negotiate`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NegotiateResponse {
    #[serde(default)]
    connection_token: Option<String>,
    #[serde(default)]
    connection_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Read half of the socket plus records already split off a frame
struct Reader {
    stream: SplitStream<WsStream>,
    pending: VecDeque<HubMessage>,
}

/// SignalR client speaking the JSON hub protocol
pub struct SignalRHub {
    url: String,
    skip_negotiation: bool,
    connect_timeout: Duration,
    http: Arc<dyn HttpClient>,
    sink: Mutex<Option<SplitSink<WsStream, Message>>>,
    reader: Mutex<Option<Reader>>,
    connected: AtomicBool,
    next_invocation_id: AtomicU64,
}

impl std::fmt::Debug for SignalRHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalRHub")
            .field("url", &self.url)
            .field("connected", &self.connected.load(Ordering::SeqCst))
            .finish()
    }
}

impl SignalRHub {
    pub fn new(config: &HubConfig, http: Arc<dyn HttpClient>) -> Self {
        tracing::debug!("Created SignalRHub for {}", config.url);

        Self {
            url: config.url.clone(),
            skip_negotiation: config.skip_negotiation,
            connect_timeout: config.connect_timeout,
            http,
            sink: Mutex::new(None),
            reader: Mutex::new(None),
            connected: AtomicBool::new(false),
            next_invocation_id: AtomicU64::new(0),
        }
    }

    async fn negotiate(&self) -> crate::Result<String> {
        let url = negotiate_url(&self.url);
        let response = self.http.post(&url).await?;
        if !response.is_ok() {
            return Err(crate::EntradaError::Hub(format!(
                "Negotiation with {} returned status {}",
                url, response.status
            )));
        }

        let parsed: NegotiateResponse = serde_json::from_str(&response.body)?;
        if let Some(error) = parsed.error {
            return Err(crate::EntradaError::Hub(format!(
                "Negotiation rejected: {}",
                error
            )));
        }

        parsed
            .connection_token
            .or(parsed.connection_id)
            .ok_or_else(|| {
                crate::EntradaError::Hub("Negotiation returned no connection id".to_string())
            })
    }

    /// Negotiate, upgrade and complete the handshake
    async fn open(&self) -> crate::Result<()> {
        let token = if self.skip_negotiation {
            None
        } else {
            Some(self.negotiate().await?)
        };
        let ws_url = websocket_url(&self.url, token.as_deref())?;

        tracing::debug!("Opening hub websocket {}", ws_url);
        let (ws, _) = tokio_tungstenite::connect_async(ws_url.as_str())
            .await
            .map_err(|e| {
                crate::EntradaError::Hub(format!("Connecting to {} failed: {}", ws_url, e))
            })?;
        let (mut sink, mut stream) = ws.split();

        sink.send(Message::text(protocol::handshake_request()))
            .await
            .map_err(|e| crate::EntradaError::Hub(format!("Sending handshake failed: {}", e)))?;

        let frame = loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => break text.as_str().to_string(),
                Some(Ok(Message::Close(_))) | None => {
                    return Err(crate::EntradaError::Hub(
                        "Hub closed the connection during handshake".to_string(),
                    ))
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(crate::EntradaError::Hub(format!("Handshake failed: {}", e)))
                }
            }
        };

        let mut records = protocol::split_records(&frame);
        let handshake = records.next().ok_or_else(|| {
            crate::EntradaError::Hub("Empty handshake response".to_string())
        })?;
        protocol::parse_handshake_response(handshake)?;

        let mut pending = VecDeque::new();
        for record in records {
            match protocol::parse_message(record) {
                Ok(message) => pending.push_back(message),
                Err(e) => tracing::warn!("Discarding unreadable hub record: {}", e),
            }
        }

        *self.sink.lock().await = Some(sink);
        *self.reader.lock().await = Some(Reader { stream, pending });
        self.connected.store(true, Ordering::SeqCst);

        tracing::debug!("Hub handshake with {} complete", self.url);
        Ok(())
    }

    async fn send(&self, payload: String) -> crate::Result<()> {
        let mut guard = self.sink.lock().await;
        let sink = guard
            .as_mut()
            .ok_or_else(|| crate::EntradaError::Hub("Hub is not connected".to_string()))?;
        sink.send(Message::text(payload))
            .await
            .map_err(|e| crate::EntradaError::Hub(format!("Sending to hub failed: {}", e)))
    }
}

#[async_trait]
impl Hub for SignalRHub {
    async fn connect(&self) -> crate::Result<()> {
        tokio::time::timeout(self.connect_timeout, self.open())
            .await
            .map_err(|_| {
                crate::EntradaError::Hub(format!(
                    "Connecting to {} timed out after {:?}",
                    self.url, self.connect_timeout
                ))
            })?
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn invoke(&self, method: &str, arguments: Vec<Value>) -> crate::Result<()> {
        let invocation_id = self
            .next_invocation_id
            .fetch_add(1, Ordering::SeqCst)
            .to_string();
        tracing::debug!("Invoking hub method '{}' ({})", method, invocation_id);
        self.send(protocol::encode_invocation(
            &invocation_id,
            method,
            &arguments,
        ))
        .await
    }

    async fn ping(&self) -> crate::Result<()> {
        self.send(protocol::encode_ping()).await
    }

    async fn next_message(&self) -> Option<HubMessage> {
        let mut guard = self.reader.lock().await;
        let reader = guard.as_mut()?;

        loop {
            if let Some(message) = reader.pending.pop_front() {
                if matches!(message, HubMessage::Close { .. }) {
                    self.connected.store(false, Ordering::SeqCst);
                }
                return Some(message);
            }

            match reader.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    for record in protocol::split_records(text.as_str()) {
                        match protocol::parse_message(record) {
                            Ok(message) => reader.pending.push_back(message),
                            Err(e) => tracing::warn!("Discarding unreadable hub record: {}", e),
                        }
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!("Hub sent websocket close: {:?}", frame);
                    self.connected.store(false, Ordering::SeqCst);
                    return None;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::warn!("Hub connection error: {}", e);
                    self.connected.store(false, Ordering::SeqCst);
                    return None;
                }
                None => {
                    self.connected.store(false, Ordering::SeqCst);
                    return None;
                }
            }
        }
    }

    async fn close(&self) -> crate::Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        let Some(mut sink) = self.sink.lock().await.take() else {
            return Ok(());
        };

        match tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(crate::EntradaError::Hub(format!(
                "Closing hub connection failed: {}",
                e
            ))),
            Err(_) => Err(crate::EntradaError::Hub(
                "Timed out closing hub connection".to_string(),
            )),
        }
    }
}

/// `http://host/hub?x=1` -> `http://host/hub/negotiate?negotiateVersion=1&x=1`
pub fn negotiate_url(hub_url: &str) -> String {
    let (path, query) = match hub_url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (hub_url, None),
    };
    let mut url = format!("{}/negotiate?negotiateVersion=1", path.trim_end_matches('/'));
    if let Some(query) = query {
        url.push('&');
        url.push_str(query);
    }
    url
}

/// Map the hub URL onto its websocket endpoint, adding the connection token
pub fn websocket_url(hub_url: &str, connection_token: Option<&str>) -> crate::Result<String> {
    let mut url = if let Some(rest) = hub_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = hub_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else if hub_url.starts_with("ws://") || hub_url.starts_with("wss://") {
        hub_url.to_string()
    } else {
        return Err(crate::EntradaError::Config(format!(
            "Unsupported hub URL scheme: {}",
            hub_url
        )));
    };

    if let Some(token) = connection_token {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str("id=");
        url.push_str(token);
    }
    Ok(url)
}
