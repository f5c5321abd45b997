use thiserror::Error;

/// Error taxonomy for a synchronization pass.
///
/// None of these are recovered locally; every variant propagates to the
/// top-level handler in `main`, which reports it and sets the exit code.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A required configuration value is missing or empty. Raised before
    /// any network call is made.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection, DNS resolution, TLS, or timeout failure while talking
    /// to an upstream service.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// An upstream service answered with a non-success HTTP status.
    #[error("upstream {url} returned status {status}")]
    Upstream {
        status: reqwest::StatusCode,
        url: String,
    },

    /// The response body did not match the expected JSON shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl SyncError {
    /// Classify a `reqwest::Error`: body-decoding failures are malformed
    /// responses, everything else is a transport failure.
    pub fn from_request(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::Malformed(err.to_string())
        } else {
            SyncError::Transport(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
