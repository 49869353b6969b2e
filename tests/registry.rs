mod common;

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use vemquecabe::api::{DriverAPI, PassengerAPI, RideAPI, RideRequestAPI};
use vemquecabe::cache::{keys, Cache, MemoryCache};
use vemquecabe::db::MemoryStore;
use vemquecabe::entities::{CardBrand, Driver, RideRequest, RideRequestStatus};
use vemquecabe::error::{Category, ErrorKind};

use common::*;

#[tokio::test]
async fn plates_are_unique() {
    let api = engine(MemoryStore::new());
    register_driver(&api, "ABC1D23").await;

    let err = api
        .register_driver(Uuid::new_v4(), vehicle("abc1d23"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::DriverPlateTaken);
    assert_eq!(err.category(), Category::Conflict);
}

#[tokio::test]
async fn same_user_cannot_register_twice() {
    let api = engine(MemoryStore::new());
    let driver = register_driver(&api, "ABC1D23").await;

    let err = api
        .register_driver(driver.id, vehicle("XYZ9K87"))
        .await
        .unwrap_err();

    assert_eq!(err.category(), Category::Conflict);
}

#[tokio::test]
async fn update_vehicle_rechecks_plate() {
    let api = engine(MemoryStore::new());
    let driver = register_driver(&api, "ABC1D23").await;
    let other = register_driver(&api, "XYZ9K87").await;

    let err = api
        .update_vehicle(driver.id, vehicle("XYZ9K87"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DriverPlateTaken);

    let updated = api
        .update_vehicle(driver.id, vehicle("BRA2E19"))
        .await
        .unwrap();
    assert_eq!(updated.vehicle.plate, "BRA2E19");

    // keeping the current plate is not a clash with itself
    api.update_vehicle(other.id, vehicle("XYZ9K87"))
        .await
        .unwrap();
}

#[tokio::test]
async fn empty_lists_are_not_found() {
    let api = engine(MemoryStore::new());

    let err = api.list_drivers().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::DriverNotFound);

    let err = api.list_available_drivers().await.unwrap_err();
    assert_eq!(err.message, "No available drivers found.");

    let err = api.list_passengers().await.unwrap_err();
    assert_eq!(err.message, "Passengers not found.");

    let err = api.list_ride_requests().await.unwrap_err();
    assert_eq!(err.message, "No ride requests found.");

    let err = api.list_rides().await.unwrap_err();
    assert_eq!(err.message, "No rides found.");

    let err = api.list_rides_by_driver(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.message, "No rides found for this driver.");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn available_drivers_exclude_busy_ones() {
    let api = engine(MemoryStore::new());
    let busy = register_driver(&api, "ABC1D23").await;
    let idle = register_driver(&api, "XYZ9K87").await;
    let passenger = register_passenger(&api).await;
    let request = request_ride(&api, passenger.id, 5).await;

    api.create_ride(busy.id, request.id, Decimal::from(10), Decimal::ONE)
        .await
        .unwrap();

    let available = api.list_available_drivers().await.unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].id, idle.id);
    assert_eq!(api.list_drivers().await.unwrap().len(), 2);
}

#[tokio::test]
async fn driver_on_a_ride_cannot_be_deleted() {
    let api = engine(MemoryStore::new());
    let driver = register_driver(&api, "ABC1D23").await;
    let passenger = register_passenger(&api).await;
    let request = request_ride(&api, passenger.id, 5).await;
    let ride = api
        .create_ride(driver.id, request.id, Decimal::from(10), Decimal::ONE)
        .await
        .unwrap();

    let err = api.delete_driver(driver.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::DriverOnRide);

    api.end_ride(ride.id).await.unwrap();
    api.delete_driver(driver.id).await.unwrap();

    let err = api.find_driver(driver.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::DriverNotFound);
}

#[tokio::test]
async fn passenger_view_masks_card() {
    let api = engine(MemoryStore::new());
    let passenger = register_passenger(&api).await;

    let view = api.find_passenger(passenger.id).await.unwrap();

    assert_eq!(view.payment_details.last_four, "1111");
    assert_eq!(view.payment_details.brand, CardBrand::Visa);
    assert!(!view.has_active_request);
}

#[tokio::test]
async fn passenger_with_active_request_cannot_be_deleted() {
    let api = engine(MemoryStore::new());
    let passenger = register_passenger(&api).await;
    let request = request_ride(&api, passenger.id, 5).await;

    let err = api.delete_passenger(passenger.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::PassengerHasActiveRequest);

    api.cancel_ride_request(request.id).await.unwrap();
    api.delete_passenger(passenger.id).await.unwrap();

    assert_eq!(
        api.find_passenger(passenger.id).await.unwrap_err().kind,
        ErrorKind::PassengerNotFound
    );
    assert_eq!(
        api.find_ride_request(request.id).await.unwrap_err().kind,
        ErrorKind::RideRequestNotFound
    );
}

#[tokio::test]
async fn update_payment_details_replaces_card() {
    let api = engine(MemoryStore::new());
    let passenger = register_passenger(&api).await;

    let details = vemquecabe::entities::PaymentDetails::new(
        "5555555555554444".into(),
        chrono::Utc::now().date_naive() + chrono::Duration::days(30),
        "321".into(),
    )
    .unwrap();

    let view = api
        .update_payment_details(passenger.id, details)
        .await
        .unwrap();

    assert_eq!(view.payment_details.last_four, "4444");
    assert_eq!(view.payment_details.brand, CardBrand::MasterCard);
}

#[tokio::test]
async fn requests_can_be_listed_by_passenger_and_status() {
    let api = engine(MemoryStore::new());
    let first = register_passenger(&api).await;
    let second = register_passenger(&api).await;
    let canceled = request_ride(&api, first.id, 5).await;
    api.cancel_ride_request(canceled.id).await.unwrap();
    request_ride(&api, first.id, 3).await;
    request_ride(&api, second.id, 4).await;

    assert_eq!(
        api.list_ride_requests_by_passenger(first.id)
            .await
            .unwrap()
            .len(),
        2
    );
    assert_eq!(
        api.list_ride_requests_by_status(RideRequestStatus::Pending)
            .await
            .unwrap()
            .len(),
        2
    );
    assert_eq!(
        api.list_ride_requests_by_status(RideRequestStatus::Completed)
            .await
            .unwrap_err()
            .kind,
        ErrorKind::RideRequestNotFound
    );
    assert_eq!(api.list_ride_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn deleting_a_passenger_removes_their_ride_history() {
    let api = cached_engine(MemoryStore::new());
    let driver = register_driver(&api, "ABC1D23").await;
    let passenger = register_passenger(&api).await;
    let request = request_ride(&api, passenger.id, 5).await;
    let ride = api
        .create_ride(driver.id, request.id, Decimal::from(10), Decimal::ONE)
        .await
        .unwrap();
    api.end_ride(ride.id).await.unwrap();

    // warm the entity keys the delete has to drop
    api.find_ride(ride.id).await.unwrap();
    api.find_ride_request(request.id).await.unwrap();
    assert_eq!(api.list_rides_by_driver(driver.id).await.unwrap().len(), 1);

    api.delete_passenger(passenger.id).await.unwrap();

    assert_eq!(
        api.find_passenger(passenger.id).await.unwrap_err().kind,
        ErrorKind::PassengerNotFound
    );
    assert_eq!(
        api.find_ride_request(request.id).await.unwrap_err().kind,
        ErrorKind::RideRequestNotFound
    );
    assert_eq!(
        api.find_ride(ride.id).await.unwrap_err().kind,
        ErrorKind::RideNotFound
    );
    assert_eq!(
        api.list_rides_by_driver(driver.id).await.unwrap_err().kind,
        ErrorKind::RideNotFound
    );
    assert!(api.find_driver(driver.id).await.unwrap().is_available);
}

#[tokio::test]
async fn mutations_write_the_entity_through() {
    let cache = Arc::new(MemoryCache::new());
    let api = engine_with_cache(MemoryStore::new(), cache.clone());
    let driver = register_driver(&api, "ABC1D23").await;
    api.find_driver(driver.id).await.unwrap();

    api.update_vehicle(driver.id, vehicle("BRA2E19"))
        .await
        .unwrap();

    let raw = cache.get(&keys::driver(driver.id)).await.unwrap().unwrap();
    let cached: Driver = serde_json::from_str(&raw).unwrap();
    assert_eq!(cached.vehicle.plate, "BRA2E19");

    let passenger = register_passenger(&api).await;
    let request = request_ride(&api, passenger.id, 5).await;
    let canceled = api.cancel_ride_request(request.id).await.unwrap();

    let raw = cache
        .get(&keys::ride_request(request.id))
        .await
        .unwrap()
        .unwrap();
    let cached: RideRequest = serde_json::from_str(&raw).unwrap();
    assert_eq!(cached.status, canceled.status);
}

#[tokio::test]
async fn cached_reads_see_lifecycle_changes() {
    let api = cached_engine(MemoryStore::new());
    let driver = register_driver(&api, "ABC1D23").await;
    let passenger = register_passenger(&api).await;

    assert!(api.find_driver(driver.id).await.unwrap().is_available);
    assert_eq!(api.list_available_drivers().await.unwrap().len(), 1);
    assert!(!api.find_passenger(passenger.id).await.unwrap().has_active_request);

    let request = request_ride(&api, passenger.id, 5).await;
    assert!(api.find_passenger(passenger.id).await.unwrap().has_active_request);

    let ride = api
        .create_ride(driver.id, request.id, Decimal::from(10), Decimal::ONE)
        .await
        .unwrap();

    assert!(!api.find_driver(driver.id).await.unwrap().is_available);
    assert!(api.list_available_drivers().await.is_err());
    assert_eq!(
        api.find_ride_request(request.id).await.unwrap().status,
        RideRequestStatus::InProgress
    );

    assert!(api.find_ride(ride.id).await.unwrap().end_time.is_none());
    api.end_ride(ride.id).await.unwrap();

    assert!(api.find_ride(ride.id).await.unwrap().end_time.is_some());
    assert!(api.find_driver(driver.id).await.unwrap().is_available);
    assert!(!api.find_passenger(passenger.id).await.unwrap().has_active_request);
    assert_eq!(
        api.list_ride_requests_by_status(RideRequestStatus::Completed)
            .await
            .unwrap()
            .len(),
        1
    );
}
