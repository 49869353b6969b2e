use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Fare;
use crate::error::{ride_already_ended_error, Error};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ride {
    pub id: Uuid,
    pub ride_request_id: Uuid,
    pub driver_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub fare: Fare,
}

impl Ride {
    /// Starts a ride now. The fare must already carry its computed total.
    pub fn new(ride_request_id: Uuid, driver_id: Uuid, fare: Fare) -> Self {
        Self {
            id: Uuid::new_v4(),
            ride_request_id,
            driver_id,
            start_time: Utc::now(),
            end_time: None,
            fare,
        }
    }

    pub fn has_ended(&self) -> bool {
        self.end_time.is_some()
    }

    #[tracing::instrument(skip(self), fields(ride_id = %self.id))]
    pub fn end(&mut self) -> Result<(), Error> {
        if self.has_ended() {
            return Err(ride_already_ended_error());
        }

        self.end_time = Some(Utc::now());
        Ok(())
    }
}

#[test]
fn ride_ends_exactly_once() {
    use rust_decimal::Decimal;

    let fare = Fare::new(Decimal::from(10), Decimal::ONE).unwrap();
    let mut ride = Ride::new(Uuid::new_v4(), Uuid::new_v4(), fare);

    assert!(!ride.has_ended());
    ride.end().unwrap();
    assert!(ride.end_time.unwrap() >= ride.start_time);

    let err = ride.end().unwrap_err();
    assert_eq!(err.message, "The ride has already ended.");
}
