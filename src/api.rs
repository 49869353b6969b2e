use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::{
    Driver, PassengerView, PaymentDetails, Ride, RideRequest, RideRequestStatus, Vehicle,
};
use crate::error::Error;

#[async_trait]
pub trait DriverAPI {
    async fn register_driver(&self, user_id: Uuid, vehicle: Vehicle) -> Result<Driver, Error>;
    async fn find_driver(&self, id: Uuid) -> Result<Driver, Error>;
    async fn list_drivers(&self) -> Result<Vec<Driver>, Error>;
    async fn list_available_drivers(&self) -> Result<Vec<Driver>, Error>;
    async fn update_vehicle(&self, id: Uuid, vehicle: Vehicle) -> Result<Driver, Error>;
    async fn delete_driver(&self, id: Uuid) -> Result<(), Error>;
}

#[async_trait]
pub trait PassengerAPI {
    async fn register_passenger(
        &self,
        user_id: Uuid,
        payment_details: PaymentDetails,
    ) -> Result<PassengerView, Error>;
    async fn find_passenger(&self, id: Uuid) -> Result<PassengerView, Error>;
    async fn list_passengers(&self) -> Result<Vec<PassengerView>, Error>;
    async fn update_payment_details(
        &self,
        id: Uuid,
        payment_details: PaymentDetails,
    ) -> Result<PassengerView, Error>;
    async fn delete_passenger(&self, id: Uuid) -> Result<(), Error>;
}

#[async_trait]
pub trait RideRequestAPI {
    async fn create_ride_request(
        &self,
        passenger_id: Uuid,
        start_location: String,
        end_location: String,
        distance: Decimal,
        preferences: Option<String>,
    ) -> Result<RideRequest, Error>;
    async fn find_ride_request(&self, id: Uuid) -> Result<RideRequest, Error>;
    async fn list_ride_requests(&self) -> Result<Vec<RideRequest>, Error>;
    async fn list_ride_requests_by_passenger(
        &self,
        passenger_id: Uuid,
    ) -> Result<Vec<RideRequest>, Error>;
    async fn list_ride_requests_by_status(
        &self,
        status: RideRequestStatus,
    ) -> Result<Vec<RideRequest>, Error>;
    async fn update_ride_request_status(
        &self,
        id: Uuid,
        status: RideRequestStatus,
    ) -> Result<RideRequest, Error>;
    async fn cancel_ride_request(&self, id: Uuid) -> Result<RideRequest, Error>;
    async fn delete_ride_request(&self, id: Uuid) -> Result<(), Error>;
}

#[async_trait]
pub trait RideAPI {
    async fn create_ride(
        &self,
        driver_id: Uuid,
        ride_request_id: Uuid,
        base_fare: Decimal,
        surge_multiplier: Decimal,
    ) -> Result<Ride, Error>;
    async fn end_ride(&self, id: Uuid) -> Result<Ride, Error>;
    async fn delete_ride(&self, id: Uuid) -> Result<(), Error>;
    async fn find_ride(&self, id: Uuid) -> Result<Ride, Error>;
    async fn list_rides(&self) -> Result<Vec<Ride>, Error>;
    async fn list_rides_by_driver(&self, driver_id: Uuid) -> Result<Vec<Ride>, Error>;
}

pub trait API: DriverAPI + PassengerAPI + RideRequestAPI + RideAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
