//! Pipeline: turns hub announcements into board entries

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::entry_api::EntryApi;
use crate::hub::{Hub, HubMessage};
use crate::record::ProductEntry;
use crate::state::{ConnectionState, StateHandle};

/// Consumes hub messages and keeps the board's entry list up to date
#[derive(Debug)]
pub struct Pipeline {
    api: Arc<EntryApi>,
    state: StateHandle,
    event: String,
}

impl Pipeline {
    pub fn new(api: Arc<EntryApi>, state: StateHandle, event: &str) -> Self {
        Self {
            api,
            state,
            event: event.to_string(),
        }
    }

    /// Read hub messages until the hub ends or `cancel` fires.
    ///
    /// Each announcement spawns its own lookup task, so entries land in
    /// the order their lookups finish, not the order they were announced.
    pub async fn consume(&self, hub: &dyn Hub, keepalive: Duration, cancel: &CancellationToken) {
        self.state
            .write()
            .await
            .set_connection(ConnectionState::Connected);

        let start = tokio::time::Instant::now() + keepalive;
        let mut keepalive = tokio::time::interval_at(start, keepalive);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Hub consumer cancelled");
                    break;
                }
                _ = keepalive.tick() => {
                    if let Err(e) = hub.ping().await {
                        tracing::warn!("Hub keep-alive failed: {}", e);
                    }
                }
                message = hub.next_message() => {
                    match message {
                        Some(HubMessage::Invocation { target, arguments }) if target == self.event => {
                            match arguments.first() {
                                Some(payload) => {
                                    self.handle_message(payload).await;
                                }
                                None => {
                                    tracing::warn!("'{}' arrived without a payload", target);
                                    let mut state = self.state.write().await;
                                    state.record_message();
                                    state.record_dropped();
                                }
                            }
                        }
                        Some(HubMessage::Invocation { target, .. }) => {
                            tracing::debug!("Ignoring hub event '{}'", target);
                        }
                        Some(HubMessage::Completion { invocation_id, error: Some(error) }) => {
                            tracing::warn!("Hub invocation {} failed: {}", invocation_id, error);
                        }
                        Some(HubMessage::Completion { invocation_id, error: None }) => {
                            tracing::debug!("Hub invocation {} completed", invocation_id);
                        }
                        Some(HubMessage::Ping) => {}
                        Some(HubMessage::Close { error }) => {
                            match error {
                                Some(error) => tracing::warn!("Hub closed the connection: {}", error),
                                None => tracing::info!("Hub closed the connection"),
                            }
                            break;
                        }
                        Some(HubMessage::Other(kind)) => {
                            tracing::debug!("Ignoring hub message type {}", kind);
                        }
                        None => {
                            tracing::warn!("Hub connection ended");
                            break;
                        }
                    }
                }
            }
        }

        if !cancel.is_cancelled() {
            self.state
                .write()
                .await
                .set_connection(ConnectionState::Disconnected);
        }
    }

    /// Validate an announcement and start its lookup.
    ///
    /// Returns the lookup task, or `None` when the message was dropped.
    pub async fn handle_message(&self, payload: &Value) -> Option<JoinHandle<()>> {
        self.state.write().await.record_message();

        let Some(epc) = extract_epc(payload) else {
            tracing::warn!("Malformed message or missing EPC: {}", payload);
            self.state.write().await.record_dropped();
            return None;
        };

        tracing::debug!("Received EPC {}", epc);
        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);

        Some(tokio::spawn(async move {
            match process_epc(&api, &epc).await {
                Some(entry) => {
                    tracing::info!("Added entry for EPC {}: {}", epc, entry.product_name);
                    state.write().await.add_entry(entry);
                }
                None => state.write().await.record_dropped(),
            }
        }))
    }
}

/// Pull the EPC out of a message, with all whitespace removed
pub fn extract_epc(payload: &Value) -> Option<String> {
    let raw = payload.get("epc")?.as_str()?;
    let epc: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if epc.is_empty() {
        None
    } else {
        Some(epc)
    }
}

/// Look up the product for `epc` and its image, logging any failure
pub async fn process_epc(api: &EntryApi, epc: &str) -> Option<ProductEntry> {
    let record = match api.fetch_product(epc).await {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!("No data found for EPC {}: {}", epc, e);
            return None;
        }
    };

    let image = match record.print_card.as_deref() {
        Some(print_card) => match api.fetch_image(print_card).await {
            Ok(image) => image,
            Err(e) => {
                tracing::error!("Failed to load image for EPC {}: {}", epc, e);
                return None;
            }
        },
        None => {
            tracing::debug!("EPC {} has no print card, using placeholder image", epc);
            api.placeholder_image_url().to_string()
        }
    };

    Some(ProductEntry::new(record, image, epc, current_epoch_ms()))
}

fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
