use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{PaymentDetails, PaymentSummary};
use crate::error::{already_set_error, Error};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    pub id: Uuid,
    pub payment_details: PaymentDetails,
    pub has_active_request: bool,
}

/// Passenger as exposed to callers, with the card masked.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PassengerView {
    pub id: Uuid,
    pub payment_details: PaymentSummary,
    pub has_active_request: bool,
}

impl Passenger {
    pub fn new(user_id: Uuid, payment_details: PaymentDetails) -> Self {
        Self {
            id: user_id,
            payment_details,
            has_active_request: false,
        }
    }

    pub fn status_name(&self) -> &'static str {
        match self.has_active_request {
            true => "active",
            false => "inactive",
        }
    }

    #[tracing::instrument(skip(self), fields(passenger_id = %self.id))]
    pub fn set_has_active_request(&mut self, has_active_request: bool) -> Result<(), Error> {
        if self.has_active_request == has_active_request {
            return Err(already_set_error(
                "Request status is already set to the requested value.",
            ));
        }

        self.has_active_request = has_active_request;
        Ok(())
    }

    pub fn update_payment_details(&mut self, payment_details: PaymentDetails) {
        self.payment_details = payment_details;
    }
}

impl From<&Passenger> for PassengerView {
    fn from(passenger: &Passenger) -> Self {
        Self {
            id: passenger.id,
            payment_details: passenger.payment_details.summary(),
            has_active_request: passenger.has_active_request,
        }
    }
}

#[test]
fn new_passenger_has_no_active_request() {
    use crate::entities::payment_details::sample_payment_details;

    let passenger = Passenger::new(Uuid::new_v4(), sample_payment_details());

    assert!(!passenger.has_active_request);
    assert_eq!(passenger.status_name(), "inactive");
}

#[test]
fn activity_flag_is_exclusively_flippable() {
    use crate::entities::payment_details::sample_payment_details;

    let mut passenger = Passenger::new(Uuid::new_v4(), sample_payment_details());

    assert!(passenger.set_has_active_request(false).is_err());
    passenger.set_has_active_request(true).unwrap();
    assert!(passenger.set_has_active_request(true).is_err());
    passenger.set_has_active_request(false).unwrap();
}

#[test]
fn view_masks_card_number() {
    use crate::entities::payment_details::sample_payment_details;

    let passenger = Passenger::new(Uuid::new_v4(), sample_payment_details());
    let view = PassengerView::from(&passenger);

    let json = serde_json::to_string(&view).unwrap();
    assert!(!json.contains("4111111111111111"));
    assert!(!json.contains("cvv"));
}
