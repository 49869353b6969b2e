use super::helpers::{
    commit, fetch_driver_for_update, fetch_passenger_for_update, fetch_ride_for_update,
    fetch_ride_request_for_update,
};
use super::Engine;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    api::RideAPI,
    cache::keys,
    db::{Store, UnitOfWork},
    entities::{Fare, Ride, RideRequestStatus},
    error::{
        driver_not_available_error, nothing_found_error, ride_already_ended_error,
        ride_in_progress_error, ride_not_found_error, ride_request_not_pending_error, Error,
        ErrorKind,
    },
};

#[async_trait]
impl<S: Store> RideAPI for Engine<S> {
    /// Pairs an available driver with a pending request. The driver row is
    /// locked first, so two calls for the same driver serialize and the
    /// second one sees it unavailable.
    #[tracing::instrument(skip(self))]
    async fn create_ride(
        &self,
        driver_id: Uuid,
        ride_request_id: Uuid,
        base_fare: Decimal,
        surge_multiplier: Decimal,
    ) -> Result<Ride, Error> {
        let ride = self
            .within_deadline(async {
                let mut tx = self.store.begin().await?;

                let mut driver = fetch_driver_for_update(&mut tx, driver_id).await?;
                if !driver.is_available {
                    tracing::info!("driver is not available");
                    return Err(driver_not_available_error());
                }

                let mut request = fetch_ride_request_for_update(&mut tx, ride_request_id).await?;
                if !request.is_pending() {
                    tracing::info!("ride request is {}, cannot start a ride", request.status);
                    return Err(ride_request_not_pending_error());
                }

                let mut fare = Fare::new(base_fare, surge_multiplier)?;
                fare.calculate_total(request.distance)?;

                driver.set_available(false)?;
                request.update_status(RideRequestStatus::InProgress)?;
                let ride = Ride::new(request.id, driver.id, fare);

                tx.update_driver(&driver).await?;
                tx.update_ride_request(&request).await?;
                tx.insert_ride(&ride).await?;

                commit(tx).await?;

                tracing::info!(ride_id = %ride.id, total = %ride.fare.total, "ride started");

                Ok::<_, Error>(ride)
            })
            .await?;

        self.forget(
            &[keys::driver(driver_id), keys::ride_request(ride_request_id)],
            &[
                keys::DRIVER_LISTS,
                keys::RIDE_REQUEST_LISTS,
                keys::RIDE_LISTS,
            ],
        )
        .await;
        self.remember(&keys::ride(ride.id), &ride).await;

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn end_ride(&self, id: Uuid) -> Result<Ride, Error> {
        let (ride, passenger_id) = self
            .within_deadline(async {
                let mut tx = self.store.begin().await?;

                let mut ride = fetch_ride_for_update(&mut tx, id).await?;
                if ride.has_ended() {
                    tracing::info!("ride has already ended");
                    return Err(ride_already_ended_error());
                }

                let mut driver = fetch_driver_for_update(&mut tx, ride.driver_id).await?;
                let mut request = fetch_ride_request_for_update(&mut tx, ride.ride_request_id).await?;
                let mut passenger =
                    fetch_passenger_for_update(&mut tx, request.passenger_id).await?;

                ride.end()?;
                request.update_status(RideRequestStatus::Completed)?;
                driver.set_available(true)?;
                passenger.set_has_active_request(false)?;

                tx.update_ride(&ride).await?;
                tx.update_driver(&driver).await?;
                tx.update_ride_request(&request).await?;
                tx.update_passenger(&passenger).await?;

                commit(tx).await?;

                tracing::info!("ride ended");

                Ok::<_, Error>((ride, passenger.id))
            })
            .await?;

        self.forget(
            &[
                keys::driver(ride.driver_id),
                keys::ride_request(ride.ride_request_id),
                keys::passenger(passenger_id),
            ],
            &[
                keys::RIDE_LISTS,
                keys::DRIVER_LISTS,
                keys::RIDE_REQUEST_LISTS,
                keys::PASSENGER_LISTS,
            ],
        )
        .await;
        self.remember(&keys::ride(id), &ride).await;

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_ride(&self, id: Uuid) -> Result<(), Error> {
        self.within_deadline(async {
            let mut tx = self.store.begin().await?;

            let ride = fetch_ride_for_update(&mut tx, id).await?;
            if !ride.has_ended() {
                tracing::info!("ride has not ended, cannot delete");
                return Err(ride_in_progress_error());
            }

            let request = fetch_ride_request_for_update(&mut tx, ride.ride_request_id).await?;
            if request.status != RideRequestStatus::Completed {
                tracing::info!("ride request is {}, cannot delete ride", request.status);
                return Err(ride_in_progress_error());
            }

            tx.delete_ride(ride.id).await?;

            commit(tx).await
        })
        .await?;

        self.forget(&[keys::ride(id)], &[keys::RIDE_LISTS]).await;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_ride(&self, id: Uuid) -> Result<Ride, Error> {
        let key = keys::ride(id);
        if let Some(ride) = self.cached(&key).await {
            return Ok(ride);
        }

        let ride = self
            .within_deadline(self.store.find_ride(id))
            .await?
            .ok_or_else(ride_not_found_error)?;

        self.remember(&key, &ride).await;

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn list_rides(&self) -> Result<Vec<Ride>, Error> {
        let key = keys::rides();
        if let Some(rides) = self.cached(&key).await {
            return Ok(rides);
        }

        let rides = self.within_deadline(self.store.list_rides()).await?;
        if rides.is_empty() {
            return Err(nothing_found_error(
                ErrorKind::RideNotFound,
                "No rides found.",
            ));
        }

        self.remember(&key, &rides).await;

        Ok(rides)
    }

    #[tracing::instrument(skip(self))]
    async fn list_rides_by_driver(&self, driver_id: Uuid) -> Result<Vec<Ride>, Error> {
        let key = keys::rides_by_driver(driver_id);
        if let Some(rides) = self.cached(&key).await {
            return Ok(rides);
        }

        let rides = self
            .within_deadline(self.store.list_rides_by_driver(driver_id))
            .await?;
        if rides.is_empty() {
            return Err(nothing_found_error(
                ErrorKind::RideNotFound,
                "No rides found for this driver.",
            ));
        }

        self.remember(&key, &rides).await;

        Ok(rides)
    }
}
