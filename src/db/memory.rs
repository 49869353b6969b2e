use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{Store, UnitOfWork};
use crate::entities::{Driver, Passenger, Ride, RideRequest, RideRequestStatus};
use crate::error::{conflict_error, Error};

#[derive(Clone, Debug, Default)]
struct Tables {
    drivers: HashMap<Uuid, Driver>,
    passengers: HashMap<Uuid, Passenger>,
    ride_requests: HashMap<Uuid, RideRequest>,
    rides: HashMap<Uuid, Ride>,
}

/// In-process store for tests and local runs.
///
/// A unit of work holds the only lock on the tables for its whole lifetime,
/// so writers are fully serialized. Changes are staged on a copy and swapped
/// in on commit.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    failing_commits: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next commit report failure and discard its changes.
    pub fn fail_next_commit(&self) {
        self.failing_commits.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryUnitOfWork;

    async fn begin(&self) -> Result<Self::Tx, Error> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();

        Ok(MemoryUnitOfWork {
            guard,
            staged,
            failing_commits: self.failing_commits.clone(),
        })
    }

    async fn find_driver(&self, id: Uuid) -> Result<Option<Driver>, Error> {
        Ok(self.tables.lock().await.drivers.get(&id).cloned())
    }

    async fn list_drivers(&self) -> Result<Vec<Driver>, Error> {
        Ok(self.tables.lock().await.drivers.values().cloned().collect())
    }

    async fn list_available_drivers(&self) -> Result<Vec<Driver>, Error> {
        let tables = self.tables.lock().await;

        Ok(tables
            .drivers
            .values()
            .filter(|driver| driver.is_available)
            .cloned()
            .collect())
    }

    async fn find_passenger(&self, id: Uuid) -> Result<Option<Passenger>, Error> {
        Ok(self.tables.lock().await.passengers.get(&id).cloned())
    }

    async fn list_passengers(&self) -> Result<Vec<Passenger>, Error> {
        Ok(self.tables.lock().await.passengers.values().cloned().collect())
    }

    async fn find_ride_request(&self, id: Uuid) -> Result<Option<RideRequest>, Error> {
        Ok(self.tables.lock().await.ride_requests.get(&id).cloned())
    }

    async fn list_ride_requests(&self) -> Result<Vec<RideRequest>, Error> {
        Ok(self
            .tables
            .lock()
            .await
            .ride_requests
            .values()
            .cloned()
            .collect())
    }

    async fn list_ride_requests_by_passenger(
        &self,
        passenger_id: Uuid,
    ) -> Result<Vec<RideRequest>, Error> {
        let tables = self.tables.lock().await;

        Ok(tables
            .ride_requests
            .values()
            .filter(|request| request.passenger_id == passenger_id)
            .cloned()
            .collect())
    }

    async fn list_ride_requests_by_status(
        &self,
        status: RideRequestStatus,
    ) -> Result<Vec<RideRequest>, Error> {
        let tables = self.tables.lock().await;

        Ok(tables
            .ride_requests
            .values()
            .filter(|request| request.status == status)
            .cloned()
            .collect())
    }

    async fn find_ride(&self, id: Uuid) -> Result<Option<Ride>, Error> {
        Ok(self.tables.lock().await.rides.get(&id).cloned())
    }

    async fn list_rides(&self) -> Result<Vec<Ride>, Error> {
        Ok(self.tables.lock().await.rides.values().cloned().collect())
    }

    async fn list_rides_by_driver(&self, driver_id: Uuid) -> Result<Vec<Ride>, Error> {
        let tables = self.tables.lock().await;

        Ok(tables
            .rides
            .values()
            .filter(|ride| ride.driver_id == driver_id)
            .cloned()
            .collect())
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
    failing_commits: Arc<AtomicUsize>,
}

impl MemoryUnitOfWork {
    fn plate_taken_by_other(&self, driver: &Driver) -> bool {
        self.staged
            .drivers
            .values()
            .any(|other| other.id != driver.id && other.vehicle.plate == driver.vehicle.plate)
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn fetch_driver_for_update(&mut self, id: Uuid) -> Result<Option<Driver>, Error> {
        Ok(self.staged.drivers.get(&id).cloned())
    }

    async fn driver_plate_exists(&mut self, plate: &str) -> Result<bool, Error> {
        Ok(self
            .staged
            .drivers
            .values()
            .any(|driver| driver.vehicle.plate == plate))
    }

    async fn insert_driver(&mut self, driver: &Driver) -> Result<(), Error> {
        if self.staged.drivers.contains_key(&driver.id) || self.plate_taken_by_other(driver) {
            return Err(conflict_error());
        }

        self.staged.drivers.insert(driver.id, driver.clone());
        Ok(())
    }

    async fn update_driver(&mut self, driver: &Driver) -> Result<(), Error> {
        if self.plate_taken_by_other(driver) {
            return Err(conflict_error());
        }

        self.staged.drivers.insert(driver.id, driver.clone());
        Ok(())
    }

    async fn delete_driver(&mut self, id: Uuid) -> Result<(), Error> {
        self.staged.drivers.remove(&id);
        Ok(())
    }

    async fn fetch_passenger_for_update(&mut self, id: Uuid) -> Result<Option<Passenger>, Error> {
        Ok(self.staged.passengers.get(&id).cloned())
    }

    async fn insert_passenger(&mut self, passenger: &Passenger) -> Result<(), Error> {
        if self.staged.passengers.contains_key(&passenger.id) {
            return Err(conflict_error());
        }

        self.staged.passengers.insert(passenger.id, passenger.clone());
        Ok(())
    }

    async fn update_passenger(&mut self, passenger: &Passenger) -> Result<(), Error> {
        self.staged.passengers.insert(passenger.id, passenger.clone());
        Ok(())
    }

    async fn delete_passenger(&mut self, id: Uuid) -> Result<(), Error> {
        let (request_ids, _) = self.passenger_history(id).await?;

        self.staged.passengers.remove(&id);
        self.staged
            .ride_requests
            .retain(|_, request| request.passenger_id != id);
        self.staged
            .rides
            .retain(|_, ride| !request_ids.contains(&ride.ride_request_id));
        Ok(())
    }

    async fn passenger_history(
        &mut self,
        passenger_id: Uuid,
    ) -> Result<(Vec<Uuid>, Vec<Uuid>), Error> {
        let request_ids: Vec<Uuid> = self
            .staged
            .ride_requests
            .values()
            .filter(|request| request.passenger_id == passenger_id)
            .map(|request| request.id)
            .collect();
        let ride_ids = self
            .staged
            .rides
            .values()
            .filter(|ride| request_ids.contains(&ride.ride_request_id))
            .map(|ride| ride.id)
            .collect();

        Ok((request_ids, ride_ids))
    }

    async fn fetch_ride_request_for_update(
        &mut self,
        id: Uuid,
    ) -> Result<Option<RideRequest>, Error> {
        Ok(self.staged.ride_requests.get(&id).cloned())
    }

    async fn insert_ride_request(&mut self, request: &RideRequest) -> Result<(), Error> {
        let passenger_busy = self.staged.ride_requests.values().any(|other| {
            other.passenger_id == request.passenger_id && other.is_active() && request.is_active()
        });

        if passenger_busy {
            return Err(conflict_error());
        }

        self.staged.ride_requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn update_ride_request(&mut self, request: &RideRequest) -> Result<(), Error> {
        self.staged.ride_requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn delete_ride_request(&mut self, id: Uuid) -> Result<(), Error> {
        self.staged.ride_requests.remove(&id);
        self.staged.rides.retain(|_, ride| ride.ride_request_id != id);
        Ok(())
    }

    async fn fetch_ride_for_update(&mut self, id: Uuid) -> Result<Option<Ride>, Error> {
        Ok(self.staged.rides.get(&id).cloned())
    }

    async fn fetch_ride_by_request_for_update(
        &mut self,
        ride_request_id: Uuid,
    ) -> Result<Option<Ride>, Error> {
        Ok(self
            .staged
            .rides
            .values()
            .find(|ride| ride.ride_request_id == ride_request_id)
            .cloned())
    }

    async fn insert_ride(&mut self, ride: &Ride) -> Result<(), Error> {
        let driver_busy = self
            .staged
            .rides
            .values()
            .any(|other| other.driver_id == ride.driver_id && !other.has_ended());
        let request_taken = self
            .staged
            .rides
            .values()
            .any(|other| other.ride_request_id == ride.ride_request_id);

        if driver_busy || request_taken {
            return Err(conflict_error());
        }

        self.staged.rides.insert(ride.id, ride.clone());
        Ok(())
    }

    async fn update_ride(&mut self, ride: &Ride) -> Result<(), Error> {
        self.staged.rides.insert(ride.id, ride.clone());
        Ok(())
    }

    async fn delete_ride(&mut self, id: Uuid) -> Result<(), Error> {
        self.staged.rides.remove(&id);
        Ok(())
    }

    async fn commit(mut self) -> Result<bool, Error> {
        let failing = self
            .failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if failing {
            tracing::warn!("discarding staged changes, commit reported failure");
            return Ok(false);
        }

        *self.guard = self.staged;
        Ok(true)
    }
}

#[test]
fn dropped_unit_of_work_leaves_tables_untouched() {
    use crate::entities::{Passenger, PaymentDetails};
    use chrono::{Duration, Utc};
    use tokio_test::block_on;

    let store = MemoryStore::new();
    let passenger = Passenger::new(
        Uuid::new_v4(),
        PaymentDetails::new(
            "4111111111111111".into(),
            Utc::now().date_naive() + Duration::days(90),
            "123".into(),
        )
        .unwrap(),
    );

    block_on(async {
        let mut tx = store.begin().await.unwrap();
        tx.insert_passenger(&passenger).await.unwrap();
        drop(tx);

        assert!(store.find_passenger(passenger.id).await.unwrap().is_none());

        let mut tx = store.begin().await.unwrap();
        tx.insert_passenger(&passenger).await.unwrap();
        assert!(tx.commit().await.unwrap());

        assert!(store.find_passenger(passenger.id).await.unwrap().is_some());
    });
}

#[test]
fn failed_commit_discards_changes() {
    use crate::entities::{Passenger, PaymentDetails};
    use chrono::{Duration, Utc};
    use tokio_test::block_on;

    let store = MemoryStore::new();
    let passenger = Passenger::new(
        Uuid::new_v4(),
        PaymentDetails::new(
            "4111111111111111".into(),
            Utc::now().date_naive() + Duration::days(90),
            "123".into(),
        )
        .unwrap(),
    );

    store.fail_next_commit();

    block_on(async {
        let mut tx = store.begin().await.unwrap();
        tx.insert_passenger(&passenger).await.unwrap();
        assert!(!tx.commit().await.unwrap());

        assert!(store.find_passenger(passenger.id).await.unwrap().is_none());
    });
}
