//! Error types for PrahariIO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// PrahariIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file parse error
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Device initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Sensor read failure (transient, recovered locally by callers)
    #[error("Sensor read failed: {0}")]
    SensorRead(String),

    /// Wire message serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Command channel disconnected
    #[error("Command channel closed")]
    ChannelClosed,
}
