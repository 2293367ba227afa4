//! Error types for the entrada service

/// Errors that can occur in the entrada service
#[derive(Debug, thiserror::Error)]
pub enum EntradaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hub error: {0}")]
    Hub(String),

    #[error("Dashboard error: {0}")]
    Dashboard(String),
}

/// Result type alias for entrada operations
pub type Result<T> = std::result::Result<T, EntradaError>;
