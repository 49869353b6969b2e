use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{invalid_input_error, Error};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardBrand {
    Amex,
    Visa,
    MasterCard,
    Unknown,
}

impl CardBrand {
    fn from_card_number(card_number: &str) -> Self {
        match card_number.chars().next() {
            Some('3') => Self::Amex,
            Some('4') => Self::Visa,
            Some('5') => Self::MasterCard,
            _ => Self::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub card_number: String,
    pub expiration_date: NaiveDate,
    pub cvv: String,
    pub brand: CardBrand,
}

/// What leaves the service about a passenger's card.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub last_four: String,
    pub expiration_date: NaiveDate,
    pub brand: CardBrand,
}

impl PaymentDetails {
    pub fn new(card_number: String, expiration_date: NaiveDate, cvv: String) -> Result<Self, Error> {
        if expiration_date <= Utc::now().date_naive() {
            return Err(invalid_input_error("Expiration date must be in the future."));
        }

        if cvv.len() != 3 || !cvv.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid_input_error("CVV must be a 3-digit number."));
        }

        if card_number.trim().is_empty() {
            return Err(invalid_input_error("Card number cannot be null or empty."));
        }

        if !card_number.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid_input_error("Card number must contain only digits."));
        }

        if card_number.len() < 13 || card_number.len() > 19 {
            return Err(invalid_input_error(
                "Card number must be between 13 and 19 digits.",
            ));
        }

        if !passes_luhn(&card_number) {
            return Err(invalid_input_error("Invalid card number."));
        }

        Ok(Self {
            brand: CardBrand::from_card_number(&card_number),
            card_number,
            expiration_date,
            cvv,
        })
    }

    pub fn summary(&self) -> PaymentSummary {
        let split = self.card_number.len().saturating_sub(4);

        PaymentSummary {
            last_four: self.card_number[split..].to_string(),
            expiration_date: self.expiration_date,
            brand: self.brand.clone(),
        }
    }
}

// digits only, checked by the caller
fn passes_luhn(card_number: &str) -> bool {
    let sum: u32 = card_number
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let digit = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = digit * 2;
                doubled / 10 + doubled % 10
            } else {
                digit
            }
        })
        .sum();

    sum % 10 == 0
}

#[cfg(test)]
pub(crate) fn sample_payment_details() -> PaymentDetails {
    use chrono::Duration;

    PaymentDetails::new(
        "4111111111111111".into(),
        Utc::now().date_naive() + Duration::days(365),
        "123".into(),
    )
    .unwrap()
}

#[test]
fn derives_brand_from_first_digit() {
    let details = sample_payment_details();

    assert_eq!(details.brand, CardBrand::Visa);
    assert_eq!(details.summary().last_four, "1111");
}

#[test]
fn rejects_card_failing_luhn() {
    use chrono::Duration;

    let err = PaymentDetails::new(
        "4111111111111112".into(),
        Utc::now().date_naive() + Duration::days(30),
        "123".into(),
    )
    .unwrap_err();

    assert_eq!(err.message, "Invalid card number.");
}

#[test]
fn rejects_expired_card_and_bad_cvv() {
    use chrono::Duration;

    let today = Utc::now().date_naive();

    assert!(PaymentDetails::new("4111111111111111".into(), today, "123".into()).is_err());
    assert!(PaymentDetails::new(
        "4111111111111111".into(),
        today + Duration::days(30),
        "12a".into()
    )
    .is_err());
}
