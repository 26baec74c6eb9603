//! Rental model, owned by the rental service.

use chrono::NaiveDate;
use common::{CarId, PaymentId, RentalId};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a rental.
///
/// Rentals are created in [`RentalStatus::InProgress`] and transitioned
/// only via explicit set-status calls on the rental service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RentalStatus {
    InProgress,
    Confirmed,
    Canceled,
    Finished,
}

impl RentalStatus {
    /// Returns the wire token for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::InProgress => "IN_PROGRESS",
            RentalStatus::Confirmed => "CONFIRMED",
            RentalStatus::Canceled => "CANCELED",
            RentalStatus::Finished => "FINISHED",
        }
    }
}

impl std::fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rental as reported by the rental service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    pub rental_uid: RentalId,
    pub username: String,
    pub payment_uid: PaymentId,
    pub car_uid: CarId,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub status: RentalStatus,
}

/// Number of billable days in a rental period.
///
/// The period must be strictly positive: `date_to` on or before
/// `date_from` yields `None`.
pub fn rental_days(date_from: NaiveDate, date_to: NaiveDate) -> Option<u64> {
    let days = (date_to - date_from).num_days();
    (days > 0).then_some(days as u64)
}
