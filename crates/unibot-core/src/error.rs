use thiserror::Error;

/// Top-level error type for unibot.
#[derive(Debug, Error)]
pub enum UnibotError {
    /// Error from an LLM or embedding provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// Error from a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Postgres / vector store error.
    #[error("knowledge error: {0}")]
    Knowledge(String),

    /// Object storage (handbook bucket) error.
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
