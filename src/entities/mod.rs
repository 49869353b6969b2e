mod driver;
mod fare;
mod passenger;
mod payment_details;
mod ride;
mod ride_request;
mod vehicle;

pub use driver::Driver;
pub use fare::{Fare, PRICE_PER_DISTANCE_UNIT};
pub use passenger::{Passenger, PassengerView};
pub use payment_details::{CardBrand, PaymentDetails, PaymentSummary};
pub use ride::Ride;
pub use ride_request::{RideRequest, Status as RideRequestStatus};
pub use vehicle::Vehicle;
