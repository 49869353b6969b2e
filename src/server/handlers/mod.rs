pub mod drivers;
pub mod passengers;
pub mod ride_requests;
pub mod rides;
