use chrono::{Datelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{invalid_input_error, Error};

const FIRST_CAR_YEAR: i32 = 1886;

lazy_static! {
    static ref PLATE_PATTERN: Regex =
        Regex::new(r"(?i)^[A-Z]{3}[0-9][A-Z][0-9]{2}$").expect("plate pattern is valid");
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub plate: String,
}

impl Vehicle {
    pub fn new(
        brand: String,
        model: String,
        year: i32,
        color: String,
        plate: String,
    ) -> Result<Self, Error> {
        if brand.trim().is_empty() {
            return Err(invalid_input_error("Brand cannot be null or empty."));
        }

        if model.trim().is_empty() {
            return Err(invalid_input_error("Model cannot be null or empty."));
        }

        if color.trim().is_empty() {
            return Err(invalid_input_error("Color cannot be null or empty."));
        }

        if year < FIRST_CAR_YEAR || year > Utc::now().year() {
            return Err(invalid_input_error(
                "Year must be between 1886 and the current year",
            ));
        }

        if plate.trim().is_empty() {
            return Err(invalid_input_error("Plate cannot be null or empty."));
        }

        if !PLATE_PATTERN.is_match(&plate) {
            return Err(invalid_input_error("Invalid plate format."));
        }

        Ok(Self {
            brand,
            model,
            year,
            color,
            plate: plate.to_uppercase(),
        })
    }
}

#[cfg(test)]
pub(crate) fn sample_vehicle(plate: &str) -> Vehicle {
    Vehicle::new(
        "Fiat".into(),
        "Uno".into(),
        2015,
        "Red".into(),
        plate.into(),
    )
    .unwrap()
}

#[test]
fn accepts_mercosul_plate_case_insensitively() {
    let vehicle = Vehicle::new(
        "Fiat".into(),
        "Uno".into(),
        2015,
        "Red".into(),
        "abc1d23".into(),
    )
    .unwrap();

    assert_eq!(vehicle.plate, "ABC1D23");
}

#[test]
fn rejects_malformed_plate() {
    let err = Vehicle::new(
        "Fiat".into(),
        "Uno".into(),
        2015,
        "Red".into(),
        "ABC-1234".into(),
    )
    .unwrap_err();

    assert_eq!(err.message, "Invalid plate format.");
}

#[test]
fn rejects_year_out_of_range() {
    let next_year = Utc::now().year() + 1;

    assert!(Vehicle::new("A".into(), "B".into(), 1885, "C".into(), "ABC1D23".into()).is_err());
    assert!(Vehicle::new("A".into(), "B".into(), next_year, "C".into(), "ABC1D23".into()).is_err());
}
