//! Response shapes for assembled rentals.

use chrono::NaiveDate;
use common::{CarId, PaymentId, RentalId};
use domain::{Car, Payment, PaymentStatus, RentalStatus};
use serde::Serialize;

/// The car fields exposed inside a rental view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarSummary {
    pub car_uid: CarId,
    pub brand: String,
    pub model: String,
    pub registration_number: String,
}

impl From<Car> for CarSummary {
    fn from(car: Car) -> Self {
        Self {
            car_uid: car.car_uid,
            brand: car.brand,
            model: car.model,
            registration_number: car.registration_number,
        }
    }
}

/// The payment fields exposed inside a rental view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    pub payment_uid: PaymentId,
    pub status: PaymentStatus,
    pub price: u64,
}

impl From<Payment> for PaymentView {
    fn from(payment: Payment) -> Self {
        Self {
            payment_uid: payment.payment_uid,
            status: payment.status,
            price: payment.price,
        }
    }
}

/// One rental joined with its car and payment.
///
/// `car` or `payment` is `null` when the owning service no longer knows
/// the referenced record; the rest of the item is still served.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalView {
    pub rental_uid: RentalId,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub status: RentalStatus,
    pub car: Option<CarSummary>,
    pub payment: Option<PaymentView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_wire_shape() {
        let view = RentalView {
            rental_uid: RentalId::new(),
            date_from: "2024-10-01".parse().unwrap(),
            date_to: "2024-10-04".parse().unwrap(),
            status: RentalStatus::Confirmed,
            car: Some(CarSummary {
                car_uid: CarId::new(),
                brand: "Kia".to_string(),
                model: "Rio".to_string(),
                registration_number: "IJ789KL".to_string(),
            }),
            payment: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "CONFIRMED");
        assert_eq!(json["dateFrom"], "2024-10-01");
        assert_eq!(json["car"]["registrationNumber"], "IJ789KL");
        // A missing payment is served as an explicit null.
        assert!(json["payment"].is_null());
    }
}
