//! Shared state for the entry board

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::record::ProductEntry;

/// State of the hub connection as shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Disconnected => write!(f, "Disconnected"),
        }
    }
}

/// Shared state written by the pipeline and read by the dashboard
#[derive(Debug)]
pub struct SharedState {
    /// Newest entry first
    pub entries: VecDeque<ProductEntry>,
    pub history_max_size: usize,
    pub connection: ConnectionState,
    pub messages_received: u64,
    pub entries_added: u64,
    pub messages_dropped: u64,
    pub started_at: Instant,
}

impl SharedState {
    pub fn new(history_max_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(history_max_size),
            history_max_size,
            connection: ConnectionState::Connecting,
            messages_received: 0,
            entries_added: 0,
            messages_dropped: 0,
            started_at: Instant::now(),
        }
    }

    /// Put an entry at the front, evicting the oldest once full
    pub fn add_entry(&mut self, entry: ProductEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.history_max_size);
        self.entries_added += 1;
    }

    pub fn record_message(&mut self) {
        self.messages_received += 1;
    }

    pub fn record_dropped(&mut self) {
        self.messages_dropped += 1;
    }

    pub fn set_connection(&mut self, connection: ConnectionState) {
        if self.connection != connection {
            tracing::debug!("Hub connection {} -> {}", self.connection, connection);
        }
        self.connection = connection;
    }

    pub fn newest(&self) -> Option<&ProductEntry> {
        self.entries.front()
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<SharedState>>;

pub fn new_state_handle(history_max_size: usize) -> StateHandle {
    Arc::new(RwLock::new(SharedState::new(history_max_size)))
}
