use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{already_set_error, invalid_input_error, invalid_transition_error, Error};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RideRequest {
    pub id: Uuid,
    pub passenger_id: Uuid,
    pub start_location: String,
    pub end_location: String,
    pub distance: Decimal,
    pub preferences: String,
    pub status: Status,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    InProgress,
    Completed,
    Canceled,
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }

    /// Pending -> InProgress -> Completed, Pending -> Canceled.
    pub fn can_transition_to(&self, next: Status) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::Pending, Self::Canceled)
                | (Self::InProgress, Self::Completed)
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl RideRequest {
    pub fn new(
        passenger_id: Uuid,
        start_location: &str,
        end_location: &str,
        distance: Decimal,
        preferences: Option<String>,
    ) -> Result<Self, Error> {
        if start_location.trim().is_empty() {
            return Err(invalid_input_error("StartLocation cannot be null or empty."));
        }

        if end_location.trim().is_empty() {
            return Err(invalid_input_error("EndLocation cannot be null or empty."));
        }

        if distance <= Decimal::ZERO {
            return Err(invalid_input_error("Distance must be greater than zero."));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            passenger_id,
            start_location: start_location.trim().to_string(),
            end_location: end_location.trim().to_string(),
            distance,
            preferences: preferences.unwrap_or_default(),
            status: Status::Pending,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == Status::Pending
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Moves the request along its state machine. Assigning the current
    /// status again is an error, as is any edge not in the machine.
    #[tracing::instrument(skip(self), fields(ride_request_id = %self.id, from = %self.status))]
    pub fn update_status(&mut self, status: Status) -> Result<(), Error> {
        if self.status == status {
            return Err(already_set_error(
                "Status is already set to the requested value.",
            ));
        }

        if !self.status.can_transition_to(status) {
            return Err(invalid_transition_error(format!(
                "Cannot move a ride request from {} to {}.",
                self.status, status
            )));
        }

        self.status = status;
        Ok(())
    }
}

#[cfg(test)]
fn sample_request() -> RideRequest {
    RideRequest::new(
        Uuid::new_v4(),
        "  Rua A, 10 ",
        "Rua B, 20",
        Decimal::from(5),
        None,
    )
    .unwrap()
}

#[test]
fn new_request_is_pending_and_trimmed() {
    let request = sample_request();

    assert_eq!(request.status, Status::Pending);
    assert_eq!(request.start_location, "Rua A, 10");
    assert_eq!(request.preferences, "");
}

#[test]
fn rejects_blank_locations_and_non_positive_distance() {
    let passenger_id = Uuid::new_v4();

    assert!(RideRequest::new(passenger_id, " ", "B", Decimal::ONE, None).is_err());
    assert!(RideRequest::new(passenger_id, "A", "", Decimal::ONE, None).is_err());
    assert!(RideRequest::new(passenger_id, "A", "B", Decimal::ZERO, None).is_err());
}

#[test]
fn same_status_is_rejected() {
    use crate::error::ErrorKind;

    let mut request = sample_request();

    let err = request.update_status(Status::Pending).unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadySet);
}

#[test]
fn only_machine_edges_are_reachable() {
    let mut request = sample_request();
    request.update_status(Status::InProgress).unwrap();
    assert!(request.update_status(Status::Pending).is_err());
    assert!(request.update_status(Status::Canceled).is_err());
    request.update_status(Status::Completed).unwrap();

    for next in [Status::Pending, Status::InProgress, Status::Canceled] {
        assert!(request.update_status(next).is_err());
    }

    let mut request = sample_request();
    assert!(request.update_status(Status::Completed).is_err());
    request.update_status(Status::Canceled).unwrap();

    for next in [Status::Pending, Status::InProgress, Status::Completed] {
        assert!(request.update_status(next).is_err());
    }
}
