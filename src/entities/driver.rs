use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Vehicle;
use crate::error::{already_set_error, Error};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub vehicle: Vehicle,
    pub is_available: bool,
}

impl Driver {
    /// A driver shares its id with the user it belongs to.
    pub fn new(user_id: Uuid, vehicle: Vehicle) -> Self {
        Self {
            id: user_id,
            vehicle,
            is_available: true,
        }
    }

    pub fn status_name(&self) -> &'static str {
        match self.is_available {
            true => "available",
            false => "unavailable",
        }
    }

    /// Flips availability. Re-asserting the current value is rejected.
    #[tracing::instrument(skip(self), fields(driver_id = %self.id))]
    pub fn set_available(&mut self, is_available: bool) -> Result<(), Error> {
        if self.is_available == is_available {
            return Err(already_set_error(
                "Availability status is already set to the requested value.",
            ));
        }

        self.is_available = is_available;
        Ok(())
    }

    pub fn update_vehicle(&mut self, vehicle: Vehicle) {
        self.vehicle = vehicle;
    }
}

#[test]
fn new_driver_is_available() {
    use crate::entities::vehicle::sample_vehicle;

    let driver = Driver::new(Uuid::new_v4(), sample_vehicle("ABC1D23"));

    assert!(driver.is_available);
    assert_eq!(driver.status_name(), "available");
}

#[test]
fn set_available_rejects_current_value() {
    use crate::entities::vehicle::sample_vehicle;
    use crate::error::ErrorKind;

    let mut driver = Driver::new(Uuid::new_v4(), sample_vehicle("ABC1D23"));

    let err = driver.set_available(true).unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadySet);

    driver.set_available(false).unwrap();
    assert!(!driver.is_available);
    assert!(driver.set_available(false).is_err());
}
