//! Error types for the orientation telemetry framework

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Framework error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Messaging handler rejected a publish
    #[error("Publish failed: {0}")]
    Publish(#[from] PublishError),

    /// Payload could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timer thread could not be started
    #[error("Failed to spawn timer thread: {0}")]
    TimerSpawn(#[source] std::io::Error),
}

/// Errors reported by a `MessagePublisher`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    /// Client is not connected to a broker
    #[error("not connected")]
    NotConnected,

    /// Outgoing queue is full
    #[error("outgoing queue full")]
    QueueFull,

    /// Transport-specific failure
    #[error("{0}")]
    Transport(String),
}
