use super::helpers::{commit, fetch_passenger_for_update};
use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::PassengerAPI,
    cache::keys,
    db::{Store, UnitOfWork},
    entities::{Passenger, PassengerView, PaymentDetails},
    error::{
        nothing_found_error, passenger_has_active_request_error, passenger_not_found_error,
        Error, ErrorKind,
    },
};

#[async_trait]
impl<S: Store> PassengerAPI for Engine<S> {
    #[tracing::instrument(skip(self, payment_details))]
    async fn register_passenger(
        &self,
        user_id: Uuid,
        payment_details: PaymentDetails,
    ) -> Result<PassengerView, Error> {
        let passenger = self
            .within_deadline(async {
                let mut tx = self.store.begin().await?;

                let passenger = Passenger::new(user_id, payment_details);
                tx.insert_passenger(&passenger).await?;

                commit(tx).await?;

                Ok::<_, Error>(passenger)
            })
            .await?;

        self.forget(&[], &[keys::PASSENGER_LISTS]).await;

        Ok(PassengerView::from(&passenger))
    }

    #[tracing::instrument(skip(self))]
    async fn find_passenger(&self, id: Uuid) -> Result<PassengerView, Error> {
        let key = keys::passenger(id);
        if let Some(view) = self.cached(&key).await {
            return Ok(view);
        }

        let passenger = self
            .within_deadline(self.store.find_passenger(id))
            .await?
            .ok_or_else(passenger_not_found_error)?;
        let view = PassengerView::from(&passenger);

        self.remember(&key, &view).await;

        Ok(view)
    }

    #[tracing::instrument(skip(self))]
    async fn list_passengers(&self) -> Result<Vec<PassengerView>, Error> {
        let key = keys::passengers();
        if let Some(views) = self.cached(&key).await {
            return Ok(views);
        }

        let passengers = self.within_deadline(self.store.list_passengers()).await?;
        if passengers.is_empty() {
            return Err(nothing_found_error(
                ErrorKind::PassengerNotFound,
                "Passengers not found.",
            ));
        }

        let views: Vec<PassengerView> = passengers.iter().map(PassengerView::from).collect();

        self.remember(&key, &views).await;

        Ok(views)
    }

    #[tracing::instrument(skip(self, payment_details))]
    async fn update_payment_details(
        &self,
        id: Uuid,
        payment_details: PaymentDetails,
    ) -> Result<PassengerView, Error> {
        let passenger = self
            .within_deadline(async {
                let mut tx = self.store.begin().await?;

                let mut passenger = fetch_passenger_for_update(&mut tx, id).await?;
                passenger.update_payment_details(payment_details);
                tx.update_passenger(&passenger).await?;

                commit(tx).await?;

                Ok::<_, Error>(passenger)
            })
            .await?;

        let view = PassengerView::from(&passenger);

        self.forget(&[], &[keys::PASSENGER_LISTS]).await;
        self.remember(&keys::passenger(id), &view).await;

        Ok(view)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_passenger(&self, id: Uuid) -> Result<(), Error> {
        let (request_ids, ride_ids) = self
            .within_deadline(async {
                let mut tx = self.store.begin().await?;

                let passenger = fetch_passenger_for_update(&mut tx, id).await?;

                if passenger.has_active_request {
                    tracing::info!("passenger has an active ride request, refusing to delete");
                    return Err(passenger_has_active_request_error());
                }

                let history = tx.passenger_history(passenger.id).await?;
                tx.delete_passenger(passenger.id).await?;

                commit(tx).await?;

                Ok::<_, Error>(history)
            })
            .await?;

        let cascaded: Vec<String> = std::iter::once(keys::passenger(id))
            .chain(request_ids.into_iter().map(keys::ride_request))
            .chain(ride_ids.into_iter().map(keys::ride))
            .collect();

        self.forget(
            &cascaded,
            &[
                keys::PASSENGER_LISTS,
                keys::RIDE_REQUEST_LISTS,
                keys::RIDE_LISTS,
            ],
        )
        .await;

        Ok(())
    }
}
