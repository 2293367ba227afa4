//! Real-time hub connection

pub mod protocol;
pub mod signalr;

use async_trait::async_trait;
use serde_json::Value;

pub use protocol::HubMessage;
pub use signalr::SignalRHub;

/// A connection to a real-time hub that pushes messages to group members
#[async_trait]
pub trait Hub: Send + Sync + std::fmt::Debug {
    /// Open the connection and complete the protocol handshake
    async fn connect(&self) -> crate::Result<()>;

    /// Whether the connection is currently open
    fn is_connected(&self) -> bool;

    /// Invoke a hub method, e.g. `JoinGroup`
    async fn invoke(&self, method: &str, arguments: Vec<Value>) -> crate::Result<()>;

    /// Send a keep-alive
    async fn ping(&self) -> crate::Result<()>;

    /// Wait for the next message. `None` once the connection has ended.
    ///
    /// Must be cancel-safe: dropping the future never loses a message.
    async fn next_message(&self) -> Option<HubMessage>;

    /// Close the connection. Closing twice is not an error.
    async fn close(&self) -> crate::Result<()>;
}
