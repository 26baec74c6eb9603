//! Capability contracts for the three backend services.
//!
//! Each port is a transport-agnostic trait with two implementations: an
//! HTTP client speaking the backend's REST API, and an in-memory fake
//! with failure and latency injection for tests. The orchestrator and
//! assembler depend only on the traits.

pub mod car;
pub mod error;
pub mod page;
pub mod payment;
pub mod rental;

pub use car::{CarPort, HttpCarPort, InMemoryCarPort, LockOutcome};
pub use error::PortError;
pub use page::Page;
pub use payment::{HttpPaymentPort, InMemoryPaymentPort, PaymentPort};
pub use rental::{
    HttpRentalPort, InMemoryRentalPort, NewRental, RentalAccess, RentalPort,
};

/// Header carrying the already-trusted caller identity on rental calls.
pub const USER_HEADER: &str = "X-User-Name";

/// Parses a backend base URL, keeping any path prefix joinable.
///
/// `Url::join` resolves relative to the last path segment, so a base of
/// `http://host/car-svc` would lose its prefix on every join. Forcing a
/// trailing slash makes `join("api/v1/...")` append instead.
pub(crate) fn parse_base_url(raw: &str) -> Result<url::Url, error::PortError> {
    let mut url = url::Url::parse(raw)?;
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    Ok(url)
}
