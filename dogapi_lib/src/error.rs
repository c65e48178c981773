//! Error types for the monitoring API client.

use thiserror::Error;

/// Boxed cause carried by a transport failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used by every request operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single API request.
///
/// Exactly one variant is produced per failed call; nothing is retried.
#[derive(Error, Debug)]
pub enum Error {
    /// The transport could not complete the exchange (network, timeout,
    /// cancellation, closed client).
    #[error("http request error: {0}")]
    Transport(#[source] BoxError),

    /// The response body was not the JSON the caller expected.
    #[error("invalid JSON in response body: {source}")]
    InvalidJson {
        body: Vec<u8>,
        #[source]
        source: serde_json::Error,
    },

    /// Non-2xx response with a JSON error body.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Non-2xx response whose body is not JSON.
    #[error("HTTP error: status {status}")]
    Http { status: u16 },
}

impl Error {
    /// Wrap a transport-side failure, unless it already is a classified [`Error`].
    pub fn from_transport(cause: BoxError) -> Self {
        match cause.downcast::<Error>() {
            Ok(classified) => *classified,
            Err(cause) => Error::Transport(cause),
        }
    }

    pub(crate) fn invalid_json(body: &[u8], source: serde_json::Error) -> Self {
        Error::InvalidJson {
            body: body.to_vec(),
            source,
        }
    }

    /// HTTP status code of the response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(e) => Some(e.status),
            Error::Http { status } => Some(*status),
            Error::Transport(_) | Error::InvalidJson { .. } => None,
        }
    }
}

/// Raised when the API answers with a JSON error document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("status {status}: {}", display_errors(.errors))]
pub struct ApiError {
    pub status: u16,
    pub errors: Vec<String>,
}

impl ApiError {
    pub fn new(status: u16, errors: Vec<String>) -> Self {
        Self { status, errors }
    }
}

fn display_errors(errors: &[String]) -> String {
    if errors.is_empty() {
        "no error message".to_string()
    } else {
        errors.join("; ")
    }
}
