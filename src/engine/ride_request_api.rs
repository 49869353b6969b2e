use super::helpers::{commit, fetch_passenger_for_update, fetch_ride_request_for_update};
use super::Engine;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    api::RideRequestAPI,
    cache::keys,
    db::{Store, UnitOfWork},
    entities::{RideRequest, RideRequestStatus},
    error::{
        cannot_cancel_non_pending_error, cannot_delete_active_request_error,
        nothing_found_error, passenger_has_active_request_error, ride_not_ended_error,
        ride_request_not_found_error, Error, ErrorKind,
    },
};

#[async_trait]
impl<S: Store> RideRequestAPI for Engine<S> {
    #[tracing::instrument(skip(self))]
    async fn create_ride_request(
        &self,
        passenger_id: Uuid,
        start_location: String,
        end_location: String,
        distance: Decimal,
        preferences: Option<String>,
    ) -> Result<RideRequest, Error> {
        let request = self
            .within_deadline(async {
                let mut tx = self.store.begin().await?;

                let mut passenger = fetch_passenger_for_update(&mut tx, passenger_id).await?;

                if passenger.has_active_request {
                    tracing::info!("passenger already has an active ride request");
                    return Err(passenger_has_active_request_error());
                }

                let request = RideRequest::new(
                    passenger.id,
                    &start_location,
                    &end_location,
                    distance,
                    preferences,
                )?;
                passenger.set_has_active_request(true)?;

                tx.insert_ride_request(&request).await?;
                tx.update_passenger(&passenger).await?;

                commit(tx).await?;

                Ok::<_, Error>(request)
            })
            .await?;

        self.forget(
            &[keys::passenger(passenger_id)],
            &[keys::RIDE_REQUEST_LISTS, keys::PASSENGER_LISTS],
        )
        .await;
        self.remember(&keys::ride_request(request.id), &request).await;

        Ok(request)
    }

    #[tracing::instrument(skip(self))]
    async fn find_ride_request(&self, id: Uuid) -> Result<RideRequest, Error> {
        let key = keys::ride_request(id);
        if let Some(request) = self.cached(&key).await {
            return Ok(request);
        }

        let request = self
            .within_deadline(self.store.find_ride_request(id))
            .await?
            .ok_or_else(ride_request_not_found_error)?;

        self.remember(&key, &request).await;

        Ok(request)
    }

    #[tracing::instrument(skip(self))]
    async fn list_ride_requests(&self) -> Result<Vec<RideRequest>, Error> {
        let key = keys::ride_requests();
        if let Some(requests) = self.cached(&key).await {
            return Ok(requests);
        }

        let requests = self
            .within_deadline(self.store.list_ride_requests())
            .await?;
        if requests.is_empty() {
            return Err(nothing_found_error(
                ErrorKind::RideRequestNotFound,
                "No ride requests found.",
            ));
        }

        self.remember(&key, &requests).await;

        Ok(requests)
    }

    #[tracing::instrument(skip(self))]
    async fn list_ride_requests_by_passenger(
        &self,
        passenger_id: Uuid,
    ) -> Result<Vec<RideRequest>, Error> {
        let key = keys::ride_requests_by_passenger(passenger_id);
        if let Some(requests) = self.cached(&key).await {
            return Ok(requests);
        }

        let requests = self
            .within_deadline(self.store.list_ride_requests_by_passenger(passenger_id))
            .await?;
        if requests.is_empty() {
            return Err(nothing_found_error(
                ErrorKind::RideRequestNotFound,
                "No ride requests found for this passenger.",
            ));
        }

        self.remember(&key, &requests).await;

        Ok(requests)
    }

    #[tracing::instrument(skip(self))]
    async fn list_ride_requests_by_status(
        &self,
        status: RideRequestStatus,
    ) -> Result<Vec<RideRequest>, Error> {
        let key = keys::ride_requests_by_status(status);
        if let Some(requests) = self.cached(&key).await {
            return Ok(requests);
        }

        let requests = self
            .within_deadline(self.store.list_ride_requests_by_status(status))
            .await?;
        if requests.is_empty() {
            return Err(nothing_found_error(
                ErrorKind::RideRequestNotFound,
                format!("No ride requests found with status {}.", status),
            ));
        }

        self.remember(&key, &requests).await;

        Ok(requests)
    }

    #[tracing::instrument(skip(self))]
    async fn update_ride_request_status(
        &self,
        id: Uuid,
        status: RideRequestStatus,
    ) -> Result<RideRequest, Error> {
        let request = self
            .within_deadline(async {
                let mut tx = self.store.begin().await?;

                // a live ride only completes its request through end_ride
                if let Some(ride) = tx.fetch_ride_by_request_for_update(id).await? {
                    if !ride.has_ended() {
                        tracing::info!(ride_id = %ride.id, "ride has not ended, refusing status change");
                        return Err(ride_not_ended_error());
                    }
                }

                let mut request = fetch_ride_request_for_update(&mut tx, id).await?;
                request.update_status(status)?;
                tx.update_ride_request(&request).await?;

                // a terminal request no longer counts against the passenger
                if status.is_terminal() {
                    let mut passenger =
                        fetch_passenger_for_update(&mut tx, request.passenger_id).await?;

                    if passenger.has_active_request {
                        passenger.set_has_active_request(false)?;
                        tx.update_passenger(&passenger).await?;
                    }
                }

                commit(tx).await?;

                Ok::<_, Error>(request)
            })
            .await?;

        self.forget(
            &[keys::passenger(request.passenger_id)],
            &[keys::RIDE_REQUEST_LISTS, keys::PASSENGER_LISTS],
        )
        .await;
        self.remember(&keys::ride_request(id), &request).await;

        Ok(request)
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_ride_request(&self, id: Uuid) -> Result<RideRequest, Error> {
        let request = self
            .within_deadline(async {
                let mut tx = self.store.begin().await?;

                let mut request = fetch_ride_request_for_update(&mut tx, id).await?;

                if !request.is_pending() {
                    tracing::info!("ride request is {}, cannot cancel", request.status);
                    return Err(cannot_cancel_non_pending_error());
                }

                let mut passenger =
                    fetch_passenger_for_update(&mut tx, request.passenger_id).await?;

                request.update_status(RideRequestStatus::Canceled)?;
                passenger.set_has_active_request(false)?;

                tx.update_ride_request(&request).await?;
                tx.update_passenger(&passenger).await?;

                commit(tx).await?;

                Ok::<_, Error>(request)
            })
            .await?;

        self.forget(
            &[keys::passenger(request.passenger_id)],
            &[keys::RIDE_REQUEST_LISTS, keys::PASSENGER_LISTS],
        )
        .await;
        self.remember(&keys::ride_request(id), &request).await;

        Ok(request)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_ride_request(&self, id: Uuid) -> Result<(), Error> {
        self.within_deadline(async {
            let mut tx = self.store.begin().await?;

            let request = fetch_ride_request_for_update(&mut tx, id).await?;

            if request.status != RideRequestStatus::Canceled {
                tracing::info!("ride request is {}, cannot delete", request.status);
                return Err(cannot_delete_active_request_error());
            }

            tx.delete_ride_request(request.id).await?;

            commit(tx).await
        })
        .await?;

        self.forget(&[keys::ride_request(id)], &[keys::RIDE_REQUEST_LISTS])
            .await;

        Ok(())
    }
}
