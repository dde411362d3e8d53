use thiserror::Error;

use crate::response::Response;

/// Boxed error source used at the transport and interceptor seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Request pipeline error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FetchError {
    /// Transport-level failure (connection refused, reset, etc).
    ///
    /// Propagated unchanged from the transport; the pipeline never retries.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// HTTP failure status.
    ///
    /// The response was decoded normally; the rejection carries the full
    /// envelope so callers can inspect status, headers and body of failed
    /// requests.
    #[error("HTTP {}: request failed status validation", .0.status)]
    Status(Box<Response>),

    /// The request was aborted through its cancel token.
    #[error("request cancelled")]
    Cancelled,

    /// Request body JSON encoding failed.
    ///
    /// Response-side JSON parse failures never surface here; they fall back
    /// to the raw decoded text.
    #[error("request body encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Query string encoding failed.
    #[error("query string encoding failed: {0}")]
    ParamsEncode(#[from] serde_urlencoded::ser::Error),

    /// A request interceptor failed; the request was never dispatched.
    #[error("request interceptor failed: {0}")]
    Interceptor(#[source] BoxError),
}

impl FetchError {
    /// True when this failure denotes a cancelled request.
    #[must_use]
    pub fn is_cancel(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }

    /// The response envelope carried by an HTTP-status rejection, if any.
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchError::Status(envelope) => Some(envelope),
            _ => None,
        }
    }
}
