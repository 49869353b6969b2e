use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{invalid_input_error, Error};

/// Price charged per unit of trip distance.
pub const PRICE_PER_DISTANCE_UNIT: Decimal = Decimal::TWO;

/// Price of a ride. The total is fixed once, when the ride is created, from
/// the distance captured on the ride request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fare {
    pub base_fare: Decimal,
    pub price_per_distance_unit: Decimal,
    pub surge_multiplier: Decimal,
    pub total: Decimal,
}

impl Fare {
    pub fn new(base_fare: Decimal, surge_multiplier: Decimal) -> Result<Self, Error> {
        if base_fare <= Decimal::ZERO {
            return Err(invalid_input_error("Base fare must be greater than zero."));
        }

        if surge_multiplier < Decimal::ONE {
            return Err(invalid_input_error("Surge multiplier must be at least one."));
        }

        Ok(Self {
            base_fare,
            price_per_distance_unit: PRICE_PER_DISTANCE_UNIT,
            surge_multiplier,
            total: Decimal::ZERO,
        })
    }

    /// `(base + rate * distance) * surge`, stored as the fare's total.
    pub fn calculate_total(&mut self, distance: Decimal) -> Result<Decimal, Error> {
        if distance <= Decimal::ZERO {
            return Err(invalid_input_error("Distance must be greater than zero."));
        }

        let total = self
            .base_fare
            .checked_add(
                self.price_per_distance_unit
                    .checked_mul(distance)
                    .ok_or_else(|| invalid_input_error("Distance is too large."))?,
            )
            .and_then(|subtotal| subtotal.checked_mul(self.surge_multiplier))
            .ok_or_else(|| invalid_input_error("Fare is too large."))?;

        self.total = total;

        Ok(total)
    }
}

#[test]
fn total_is_base_plus_distance_times_surge() {
    let mut fare = Fare::new(Decimal::from(10), Decimal::new(15, 1)).unwrap();

    let total = fare.calculate_total(Decimal::from(5)).unwrap();

    assert_eq!(total, Decimal::from(30));
    assert_eq!(fare.total, Decimal::from(30));
}

#[test]
fn total_keeps_decimal_precision() {
    let mut fare = Fare::new(Decimal::new(1, 1), Decimal::new(13, 1)).unwrap();

    // (0.1 + 2 * 0.2) * 1.3 = 0.65
    let total = fare.calculate_total(Decimal::new(2, 1)).unwrap();

    assert_eq!(total, Decimal::new(65, 2));
}

#[test]
fn rejects_non_positive_base_fare() {
    let err = Fare::new(Decimal::ZERO, Decimal::ONE).unwrap_err();

    assert_eq!(err.message, "Base fare must be greater than zero.");
}

#[test]
fn rejects_surge_below_one() {
    let err = Fare::new(Decimal::from(10), Decimal::new(9, 1)).unwrap_err();

    assert_eq!(err.message, "Surge multiplier must be at least one.");
}

#[test]
fn rejects_non_positive_distance() {
    let mut fare = Fare::new(Decimal::from(10), Decimal::ONE).unwrap();

    assert!(fare.calculate_total(Decimal::ZERO).is_err());
    assert!(fare.calculate_total(Decimal::from(-3)).is_err());
    assert_eq!(fare.total, Decimal::ZERO);
}
