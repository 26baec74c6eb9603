//! Car model, owned by the car service.

use common::CarId;
use serde::{Deserialize, Serialize};

/// Vehicle class of a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarType {
    Sedan,
    Suv,
    Minivan,
    Roadster,
}

impl CarType {
    /// Returns the wire token for this car type.
    pub fn as_str(&self) -> &'static str {
        match self {
            CarType::Sedan => "SEDAN",
            CarType::Suv => "SUV",
            CarType::Minivan => "MINIVAN",
            CarType::Roadster => "ROADSTER",
        }
    }
}

impl std::fmt::Display for CarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A car as reported by the car service.
///
/// `available` toggles exclusively through lock/unlock calls on the car
/// service; the gateway never mutates it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub car_uid: CarId,
    pub brand: String,
    pub model: String,
    pub registration_number: String,
    pub power: u64,
    /// Price per rental day, as an integer amount.
    pub price: u64,
    #[serde(rename = "type")]
    pub car_type: CarType,
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn car_type_tokens() {
        assert_eq!(serde_json::to_string(&CarType::Suv).unwrap(), "\"SUV\"");
        assert_eq!(
            serde_json::from_str::<CarType>("\"IN_PROGRESS\"").ok(),
            None
        );
    }

    #[test]
    fn car_wire_shape() {
        let json = serde_json::json!({
            "carUid": "109b42f3-198d-4c89-9276-a7520a7120ab",
            "brand": "Mercedes Benz",
            "model": "GLA 250",
            "registrationNumber": "ЛО777Х799",
            "power": 249,
            "price": 3500,
            "type": "SEDAN",
            "available": true
        });
        let car: Car = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(car.car_type, CarType::Sedan);
        assert_eq!(car.price, 3500);
        assert_eq!(serde_json::to_value(&car).unwrap(), json);
    }
}
