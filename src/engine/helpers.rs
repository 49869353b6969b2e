use uuid::Uuid;

use crate::{
    db::UnitOfWork,
    entities::{Driver, Passenger, Ride, RideRequest},
    error::{
        commit_failed_error, driver_not_found_error, passenger_not_found_error,
        ride_not_found_error, ride_request_not_found_error, Error,
    },
};

#[tracing::instrument(skip(tx))]
pub async fn fetch_driver_for_update<U: UnitOfWork>(tx: &mut U, id: Uuid) -> Result<Driver, Error> {
    tx.fetch_driver_for_update(id)
        .await?
        .ok_or_else(driver_not_found_error)
}

#[tracing::instrument(skip(tx))]
pub async fn fetch_passenger_for_update<U: UnitOfWork>(
    tx: &mut U,
    id: Uuid,
) -> Result<Passenger, Error> {
    tx.fetch_passenger_for_update(id)
        .await?
        .ok_or_else(passenger_not_found_error)
}

#[tracing::instrument(skip(tx))]
pub async fn fetch_ride_request_for_update<U: UnitOfWork>(
    tx: &mut U,
    id: Uuid,
) -> Result<RideRequest, Error> {
    tx.fetch_ride_request_for_update(id)
        .await?
        .ok_or_else(ride_request_not_found_error)
}

#[tracing::instrument(skip(tx))]
pub async fn fetch_ride_for_update<U: UnitOfWork>(tx: &mut U, id: Uuid) -> Result<Ride, Error> {
    tx.fetch_ride_for_update(id)
        .await?
        .ok_or_else(ride_not_found_error)
}

#[tracing::instrument(skip(tx))]
pub async fn commit<U: UnitOfWork>(tx: U) -> Result<(), Error> {
    if !tx.commit().await? {
        tracing::warn!("commit did not apply, changes discarded");
        return Err(commit_failed_error());
    }

    Ok(())
}
