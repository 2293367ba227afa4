//! Group membership on the hub

use std::sync::Arc;

use serde_json::json;

use crate::config::HubConfig;
use crate::hub::Hub;

/// Membership of one broadcast group on an open hub connection.
///
/// [`Subscription::teardown`] consumes the subscription, so the
/// leave-then-close sequence runs at most once.
#[derive(Debug)]
pub struct Subscription {
    hub: Arc<dyn Hub>,
    group: String,
    leave_method: String,
}

impl Subscription {
    /// Connect to the hub and join the configured group.
    ///
    /// Failures are logged; the returned subscription is then simply not
    /// connected and will never yield messages.
    pub async fn open(hub: Arc<dyn Hub>, config: &HubConfig) -> Self {
        match hub.connect().await {
            Ok(()) => {
                tracing::info!("Connected to hub at {}", config.url);
                match hub
                    .invoke(&config.join_method, vec![json!(config.group)])
                    .await
                {
                    Ok(()) => tracing::info!("Joined group '{}'", config.group),
                    Err(e) => tracing::error!("Failed to join group '{}': {}", config.group, e),
                }
            }
            Err(e) => tracing::error!("Hub connection to {} failed: {}", config.url, e),
        }

        Self {
            hub,
            group: config.group.clone(),
            leave_method: config.leave_method.clone(),
        }
    }

    pub fn hub(&self) -> &Arc<dyn Hub> {
        &self.hub
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn is_connected(&self) -> bool {
        self.hub.is_connected()
    }

    /// Leave the group if still connected, then close the connection
    pub async fn teardown(self) {
        if self.hub.is_connected() {
            match self
                .hub
                .invoke(&self.leave_method, vec![json!(self.group)])
                .await
            {
                Ok(()) => tracing::info!("Left group '{}'", self.group),
                Err(e) => tracing::warn!("Failed to leave group '{}': {}", self.group, e),
            }
        }

        match self.hub.close().await {
            Ok(()) => tracing::info!("Hub connection closed"),
            Err(e) => tracing::warn!("Failed to close hub connection: {}", e),
        }
    }
}
