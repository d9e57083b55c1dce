//! Error types for the radio data source

/// Result type alias for data source operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening or reading a radio stream
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP status {0}")]
    HttpStatus(reqwest::StatusCode),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// URL scheme is not http or https
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// Connect or read exceeded its timeout
    #[error("Transport timeout")]
    Timeout,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Whether the retry state machine may recover from this error.
    ///
    /// Everything the transport reports during a session is transient from
    /// the state machine's point of view; only invalid input is not.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::InvalidUrl(_) | Self::UnsupportedScheme(_))
    }
}
