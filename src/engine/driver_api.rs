use super::helpers::{commit, fetch_driver_for_update};
use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::DriverAPI,
    cache::keys,
    db::{Store, UnitOfWork},
    entities::{Driver, Vehicle},
    error::{
        driver_not_found_error, driver_on_ride_error, driver_plate_taken_error,
        nothing_found_error, Error, ErrorKind,
    },
};

#[async_trait]
impl<S: Store> DriverAPI for Engine<S> {
    #[tracing::instrument(skip(self))]
    async fn register_driver(&self, user_id: Uuid, vehicle: Vehicle) -> Result<Driver, Error> {
        let driver = self
            .within_deadline(async {
                let mut tx = self.store.begin().await?;

                if tx.driver_plate_exists(&vehicle.plate).await? {
                    tracing::info!("plate {} already registered", vehicle.plate);
                    return Err(driver_plate_taken_error());
                }

                let driver = Driver::new(user_id, vehicle);
                tx.insert_driver(&driver).await?;

                commit(tx).await?;

                Ok::<_, Error>(driver)
            })
            .await?;

        self.forget(&[], &[keys::DRIVER_LISTS]).await;

        Ok(driver)
    }

    #[tracing::instrument(skip(self))]
    async fn find_driver(&self, id: Uuid) -> Result<Driver, Error> {
        let key = keys::driver(id);
        if let Some(driver) = self.cached(&key).await {
            return Ok(driver);
        }

        let driver = self
            .within_deadline(self.store.find_driver(id))
            .await?
            .ok_or_else(driver_not_found_error)?;

        self.remember(&key, &driver).await;

        Ok(driver)
    }

    #[tracing::instrument(skip(self))]
    async fn list_drivers(&self) -> Result<Vec<Driver>, Error> {
        let key = keys::drivers();
        if let Some(drivers) = self.cached(&key).await {
            return Ok(drivers);
        }

        let drivers = self.within_deadline(self.store.list_drivers()).await?;
        if drivers.is_empty() {
            return Err(nothing_found_error(
                ErrorKind::DriverNotFound,
                "Driver not found.",
            ));
        }

        self.remember(&key, &drivers).await;

        Ok(drivers)
    }

    #[tracing::instrument(skip(self))]
    async fn list_available_drivers(&self) -> Result<Vec<Driver>, Error> {
        let key = keys::available_drivers();
        if let Some(drivers) = self.cached(&key).await {
            return Ok(drivers);
        }

        let drivers = self
            .within_deadline(self.store.list_available_drivers())
            .await?;
        if drivers.is_empty() {
            return Err(nothing_found_error(
                ErrorKind::DriverNotFound,
                "No available drivers found.",
            ));
        }

        self.remember(&key, &drivers).await;

        Ok(drivers)
    }

    #[tracing::instrument(skip(self))]
    async fn update_vehicle(&self, id: Uuid, vehicle: Vehicle) -> Result<Driver, Error> {
        let driver = self
            .within_deadline(async {
                let mut tx = self.store.begin().await?;

                let mut driver = fetch_driver_for_update(&mut tx, id).await?;

                if driver.vehicle.plate != vehicle.plate
                    && tx.driver_plate_exists(&vehicle.plate).await?
                {
                    tracing::info!("plate {} already registered", vehicle.plate);
                    return Err(driver_plate_taken_error());
                }

                driver.update_vehicle(vehicle);
                tx.update_driver(&driver).await?;

                commit(tx).await?;

                Ok::<_, Error>(driver)
            })
            .await?;

        self.forget(&[], &[keys::DRIVER_LISTS]).await;
        self.remember(&keys::driver(id), &driver).await;

        Ok(driver)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_driver(&self, id: Uuid) -> Result<(), Error> {
        self.within_deadline(async {
            let mut tx = self.store.begin().await?;

            let driver = fetch_driver_for_update(&mut tx, id).await?;

            if !driver.is_available {
                tracing::info!("driver is serving a ride, refusing to delete");
                return Err(driver_on_ride_error());
            }

            tx.delete_driver(driver.id).await?;

            commit(tx).await
        })
        .await?;

        self.forget(&[keys::driver(id)], &[keys::DRIVER_LISTS]).await;

        Ok(())
    }
}
