//! Port error type.

use thiserror::Error;

/// A transport-level failure of a backend call.
///
/// Documented business outcomes (404 not-found, 423 lock conflict, 403
/// ownership mismatch) are part of each operation's result type, not
/// errors. Anything outside the documented status codes lands here with
/// the response body as the error detail.
#[derive(Debug, Error)]
pub enum PortError {
    /// The configured base URL for a backend is not a valid URL.
    #[error("invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),

    /// The request never produced a usable response.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a status outside its documented set.
    #[error("{service} service returned {status}: {body}")]
    UnexpectedStatus {
        service: &'static str,
        status: u16,
        body: String,
    },
}

impl PortError {
    /// Builds the error for an undocumented response, consuming the body
    /// as the error detail.
    pub(crate) async fn from_response(
        service: &'static str,
        response: reqwest::Response,
    ) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        PortError::UnexpectedStatus {
            service,
            status,
            body,
        }
    }

    /// Builds an injected failure for the in-memory ports.
    pub(crate) fn injected(service: &'static str) -> Self {
        PortError::UnexpectedStatus {
            service,
            status: 503,
            body: "injected failure".to_string(),
        }
    }
}
