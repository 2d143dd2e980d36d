//! Error types for Graph mail API operations.

/// Result type alias for Graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the Graph mail API.
///
/// The variants are deliberately coarse: callers react differently to an
/// expired token (refresh it), a server rejection (show and allow retry),
/// and a transport failure (show and allow retry), and that is the whole
/// taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The access token was rejected (HTTP 401). The caller should acquire
    /// a fresh token and retry.
    #[error("Unauthorized: access token rejected")]
    Unauthorized,

    /// The API rejected the request for a reason other than authorization.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-provided message body, possibly empty.
        message: String,
    },

    /// The request never produced an HTTP response (DNS, timeout,
    /// connection reset).
    #[error("Network error: {0}")]
    Network(String),

    /// A 2xx response carried a body this client could not decode.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
