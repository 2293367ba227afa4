//! Entrada - live warehouse-entry board
//!
//! Subscribes to a real-time hub group, looks up every announced EPC
//! against the product and image API, and serves the resulting entries
//! on a web dashboard, newest first.

pub mod config;
pub mod dashboard;
pub mod entry_api;
pub mod error;
pub mod hub;
pub mod image;
pub mod io;
pub mod pipeline;
pub mod record;
pub mod state;
pub mod subscription;

pub use config::{load_config, Config};
pub use error::{EntradaError, Result};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::entry_api::EntryApi;
use crate::hub::{Hub, SignalRHub};
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::pipeline::Pipeline;
use crate::state::{ConnectionState, StateHandle};
use crate::subscription::Subscription;

/// Assembles an [`Entrada`] service, with optional injected collaborators
pub struct EntradaBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    hub: Option<Arc<dyn Hub>>,
    cancel: Option<CancellationToken>,
}

impl EntradaBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            hub: None,
            cancel: None,
        }
    }

    /// Use this HTTP client for lookups and hub negotiation
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Use this hub instead of a SignalR connection built from the config
    pub fn with_hub(mut self, hub: Arc<dyn Hub>) -> Self {
        self.hub = Some(hub);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub async fn build(self) -> Result<Entrada> {
        self.config.validate()?;

        let http: Arc<dyn HttpClient> = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestHttpClient::with_timeout(
                self.config.api.request_timeout,
            )?),
        };

        let hub: Arc<dyn Hub> = match self.hub {
            Some(hub) => hub,
            None => Arc::new(SignalRHub::new(&self.config.hub, Arc::clone(&http))),
        };

        let api = Arc::new(EntryApi::new(&self.config.api, http));
        let state = state::new_state_handle(self.config.dashboard.history_size);

        Ok(Entrada {
            config: self.config,
            hub,
            api,
            state,
            cancel: self.cancel.unwrap_or_else(CancellationToken::new),
        })
    }
}

/// A built, not yet running, entrada service
#[derive(Debug)]
pub struct Entrada {
    config: Config,
    hub: Arc<dyn Hub>,
    api: Arc<EntryApi>,
    state: StateHandle,
    cancel: CancellationToken,
}

impl Entrada {
    pub fn state(&self) -> StateHandle {
        Arc::clone(&self.state)
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until the cancellation token fires (Ctrl-C by default)
    pub async fn start(self) -> Result<()> {
        let cancel_for_signal = self.cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                    cancel_for_signal.cancel();
                }
                Err(e) => tracing::warn!("Failed to listen for ctrl-c: {}", e),
            }
        });

        if self.config.dashboard.enabled {
            self.spawn_dashboard().await?;
        }

        tracing::info!("Entrada service started");

        let subscription = tokio::select! {
            subscription = Subscription::open(Arc::clone(&self.hub), &self.config.hub) => subscription,
            _ = self.cancel.cancelled() => {
                tracing::info!("Shutdown requested while connecting to hub");
                if let Err(e) = self.hub.close().await {
                    tracing::warn!("Failed to close hub connection: {}", e);
                }
                self.state
                    .write()
                    .await
                    .set_connection(ConnectionState::Disconnected);
                tracing::info!("Entrada service stopped");
                return Ok(());
            }
        };
        let pipeline = Pipeline::new(
            Arc::clone(&self.api),
            Arc::clone(&self.state),
            &self.config.hub.event,
        );

        if subscription.is_connected() {
            pipeline
                .consume(
                    subscription.hub().as_ref(),
                    self.config.hub.keepalive_interval,
                    &self.cancel,
                )
                .await;
        } else {
            self.state
                .write()
                .await
                .set_connection(ConnectionState::Disconnected);
        }

        self.cancel.cancelled().await;

        subscription.teardown().await;
        self.state
            .write()
            .await
            .set_connection(ConnectionState::Disconnected);

        tracing::info!("Entrada service stopped");
        Ok(())
    }

    async fn spawn_dashboard(&self) -> Result<()> {
        let port = self.config.dashboard.port;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            EntradaError::Dashboard(format!("Failed to bind dashboard to port {}: {}", port, e))
        })?;
        tracing::info!("Dashboard listening on http://{}", addr);

        let router = dashboard::build_router(Arc::clone(&self.state));
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard stopped");
        });
        Ok(())
    }
}
