//! Persistence port.
//!
//! Read paths go straight to a [`Store`]. Every mutation runs inside a
//! [`UnitOfWork`] obtained from [`Store::begin`]: aggregates are fetched with
//! a row lock, mutated in memory, written back, and the whole change set is
//! committed at once. Dropping a unit of work without committing discards it.
//!
//! Operations that touch several aggregates take their locks in the order
//! ride -> driver -> ride request -> passenger.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{Driver, Passenger, Ride, RideRequest, RideRequestStatus};
use crate::error::Error;

#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Tx: UnitOfWork;

    async fn begin(&self) -> Result<Self::Tx, Error>;

    async fn find_driver(&self, id: Uuid) -> Result<Option<Driver>, Error>;
    async fn list_drivers(&self) -> Result<Vec<Driver>, Error>;
    async fn list_available_drivers(&self) -> Result<Vec<Driver>, Error>;

    async fn find_passenger(&self, id: Uuid) -> Result<Option<Passenger>, Error>;
    async fn list_passengers(&self) -> Result<Vec<Passenger>, Error>;

    async fn find_ride_request(&self, id: Uuid) -> Result<Option<RideRequest>, Error>;
    async fn list_ride_requests(&self) -> Result<Vec<RideRequest>, Error>;
    async fn list_ride_requests_by_passenger(
        &self,
        passenger_id: Uuid,
    ) -> Result<Vec<RideRequest>, Error>;
    async fn list_ride_requests_by_status(
        &self,
        status: RideRequestStatus,
    ) -> Result<Vec<RideRequest>, Error>;

    async fn find_ride(&self, id: Uuid) -> Result<Option<Ride>, Error>;
    async fn list_rides(&self) -> Result<Vec<Ride>, Error>;
    async fn list_rides_by_driver(&self, driver_id: Uuid) -> Result<Vec<Ride>, Error>;
}

/// One transaction. Fetches lock the returned row until commit or drop.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn fetch_driver_for_update(&mut self, id: Uuid) -> Result<Option<Driver>, Error>;
    async fn driver_plate_exists(&mut self, plate: &str) -> Result<bool, Error>;
    async fn insert_driver(&mut self, driver: &Driver) -> Result<(), Error>;
    async fn update_driver(&mut self, driver: &Driver) -> Result<(), Error>;
    async fn delete_driver(&mut self, id: Uuid) -> Result<(), Error>;

    async fn fetch_passenger_for_update(&mut self, id: Uuid) -> Result<Option<Passenger>, Error>;
    async fn insert_passenger(&mut self, passenger: &Passenger) -> Result<(), Error>;
    async fn update_passenger(&mut self, passenger: &Passenger) -> Result<(), Error>;
    /// Deleting a passenger cascades to their ride requests and the rides
    /// bound to those requests.
    async fn delete_passenger(&mut self, id: Uuid) -> Result<(), Error>;
    /// Ids of the passenger's ride requests and of the rides bound to them.
    async fn passenger_history(&mut self, passenger_id: Uuid)
        -> Result<(Vec<Uuid>, Vec<Uuid>), Error>;

    async fn fetch_ride_request_for_update(
        &mut self,
        id: Uuid,
    ) -> Result<Option<RideRequest>, Error>;
    async fn insert_ride_request(&mut self, request: &RideRequest) -> Result<(), Error>;
    async fn update_ride_request(&mut self, request: &RideRequest) -> Result<(), Error>;
    async fn delete_ride_request(&mut self, id: Uuid) -> Result<(), Error>;

    async fn fetch_ride_for_update(&mut self, id: Uuid) -> Result<Option<Ride>, Error>;
    async fn fetch_ride_by_request_for_update(
        &mut self,
        ride_request_id: Uuid,
    ) -> Result<Option<Ride>, Error>;
    async fn insert_ride(&mut self, ride: &Ride) -> Result<(), Error>;
    async fn update_ride(&mut self, ride: &Ride) -> Result<(), Error>;
    async fn delete_ride(&mut self, id: Uuid) -> Result<(), Error>;

    /// Applies every staged change atomically. `Ok(false)` means nothing was
    /// applied.
    async fn commit(self) -> Result<bool, Error>;
}
