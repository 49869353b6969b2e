use uuid::Uuid;

use crate::entities::RideRequestStatus;

pub const DRIVER_LISTS: &str = "driver:list*";
pub const PASSENGER_LISTS: &str = "passenger:list*";
pub const RIDE_REQUEST_LISTS: &str = "riderequest:list*";
pub const RIDE_LISTS: &str = "ride:list*";

pub fn driver(id: Uuid) -> String {
    format!("driver:{}", id)
}

pub fn drivers() -> String {
    "driver:list".into()
}

pub fn available_drivers() -> String {
    "driver:list:available".into()
}

pub fn passenger(id: Uuid) -> String {
    format!("passenger:{}", id)
}

pub fn passengers() -> String {
    "passenger:list".into()
}

pub fn ride_request(id: Uuid) -> String {
    format!("riderequest:{}", id)
}

pub fn ride_requests() -> String {
    "riderequest:list".into()
}

pub fn ride_requests_by_passenger(passenger_id: Uuid) -> String {
    format!("riderequest:list:active:passenger:{}", passenger_id)
}

pub fn ride_requests_by_status(status: RideRequestStatus) -> String {
    format!("riderequest:list:active:status:{}", status.name())
}

pub fn ride(id: Uuid) -> String {
    format!("ride:{}", id)
}

pub fn rides() -> String {
    "ride:list".into()
}

pub fn rides_by_driver(driver_id: Uuid) -> String {
    format!("ride:list:active:driver:{}", driver_id)
}

#[test]
fn list_keys_fall_under_their_invalidation_pattern() {
    let prefix = |pattern: &str| pattern.trim_end_matches('*').to_string();

    assert!(available_drivers().starts_with(&prefix(DRIVER_LISTS)));
    assert!(ride_requests_by_status(RideRequestStatus::InProgress)
        .starts_with(&prefix(RIDE_REQUEST_LISTS)));
    assert!(rides_by_driver(Uuid::nil()).starts_with(&prefix(RIDE_LISTS)));
    assert!(!ride(Uuid::nil()).starts_with(&prefix(RIDE_LISTS)));
}
