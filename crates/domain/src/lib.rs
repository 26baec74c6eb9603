//! Domain models for the rental gateway.
//!
//! These are transient copies of entities owned by the three backend
//! services; the gateway never persists them. Serde shapes match the
//! backend wire format (camelCase fields, upper-case status tokens,
//! calendar dates).

pub mod car;
pub mod payment;
pub mod rental;

pub use car::{Car, CarType};
pub use payment::{Payment, PaymentStatus};
pub use rental::{Rental, RentalStatus, rental_days};
