//! Shared identifier types for the rental gateway.

pub mod types;

pub use types::{CarId, PaymentId, RentalId};
