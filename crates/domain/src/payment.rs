//! Payment model, owned by the payment service.

use common::PaymentId;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a payment.
///
/// Payment creation is synchronous: a payment that the payment service
/// accepted lands directly in [`PaymentStatus::Paid`]. There is no
/// separate authorization step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    Canceled,
}

impl PaymentStatus {
    /// Returns the wire token for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Canceled => "CANCELED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment as reported by the payment service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub payment_uid: PaymentId,
    pub status: PaymentStatus,
    pub price: u64,
}
