mod common;

use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::Decimal;

use vemquecabe::api::{DriverAPI, RideAPI, RideRequestAPI};
use vemquecabe::db::MemoryStore;
use vemquecabe::entities::RideRequestStatus;
use vemquecabe::error::ErrorKind;

use common::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_driver_two_simultaneous_rides() {
    for _ in 0..20 {
        let api = Arc::new(engine(MemoryStore::new()));
        let driver = register_driver(api.as_ref(), "ABC1D23").await;
        let first = register_passenger(api.as_ref()).await;
        let second = register_passenger(api.as_ref()).await;
        let first_request = request_ride(api.as_ref(), first.id, 5).await;
        let second_request = request_ride(api.as_ref(), second.id, 7).await;

        let driver_id = driver.id;
        let tasks = [first_request.id, second_request.id].map(|request_id| {
            let api = api.clone();
            tokio::spawn(async move {
                api.create_ride(driver_id, request_id, Decimal::from(10), Decimal::ONE)
                    .await
            })
        });

        let results: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        let successes = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(successes, 1);

        let failure = results.into_iter().find_map(Result::err).unwrap();
        assert!(matches!(
            failure.kind,
            ErrorKind::DriverNotAvailable | ErrorKind::Conflict
        ));

        assert_eq!(api.list_rides_by_driver(driver.id).await.unwrap().len(), 1);
        assert_eq!(
            api.list_ride_requests_by_status(RideRequestStatus::Pending)
                .await
                .unwrap()
                .len(),
            1
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_request_two_simultaneous_drivers() {
    for _ in 0..20 {
        let api = Arc::new(engine(MemoryStore::new()));
        let first = register_driver(api.as_ref(), "ABC1D23").await;
        let second = register_driver(api.as_ref(), "XYZ9K87").await;
        let passenger = register_passenger(api.as_ref()).await;
        let request = request_ride(api.as_ref(), passenger.id, 5).await;

        let request_id = request.id;
        let tasks = [first.id, second.id].map(|driver_id| {
            let api = api.clone();
            tokio::spawn(async move {
                api.create_ride(driver_id, request_id, Decimal::from(10), Decimal::ONE)
                    .await
            })
        });

        let results: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);

        let failure = results.into_iter().find_map(Result::err).unwrap();
        assert_eq!(failure.kind, ErrorKind::RideRequestNotPending);

        assert_eq!(api.list_available_drivers().await.unwrap().len(), 1);
    }
}
