/// Errors that can occur in brick transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No endpoint matched at connect time.
    #[error("no brick found at {endpoint}")]
    DeviceNotFound { endpoint: String },

    /// Failed to connect to the specified endpoint.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on the link.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The brick closed the link.
    #[error("connection closed by brick")]
    Closed,

    /// A half was used after the link was released.
    #[error("transport not open")]
    NotOpen,

    /// An inbound frame announced a length above the configured maximum.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, TransportError>;
