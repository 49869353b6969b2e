mod common;

use std::time::Duration;

use rust_decimal::Decimal;
use uuid::Uuid;

use vemquecabe::api::{DriverAPI, RideAPI, RideRequestAPI};
use vemquecabe::db::{MemoryStore, Store};
use vemquecabe::entities::RideRequestStatus;
use vemquecabe::error::{Category, ErrorKind};

use common::*;

#[tokio::test]
async fn create_request_marks_passenger_active() {
    let api = engine(MemoryStore::new());
    let passenger = register_passenger(&api).await;

    let request = api
        .create_ride_request(
            passenger.id,
            "  Av. Paulista, 1000 ".into(),
            "Rua Augusta, 500".into(),
            Decimal::from(5),
            None,
        )
        .await
        .unwrap();

    assert_eq!(request.status, RideRequestStatus::Pending);
    assert_eq!(request.start_location, "Av. Paulista, 1000");
    assert_eq!(request.preferences, "");
    assert_activity_flag_consistent(&api, passenger.id).await;
}

#[tokio::test]
async fn create_request_for_unknown_passenger_fails() {
    let api = engine(MemoryStore::new());

    let err = api
        .create_ride_request(
            Uuid::new_v4(),
            "A".into(),
            "B".into(),
            Decimal::ONE,
            None,
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::PassengerNotFound);
    assert!(err.is_not_found());
}

#[tokio::test]
async fn second_active_request_is_rejected() {
    let api = engine(MemoryStore::new());
    let passenger = register_passenger(&api).await;
    request_ride(&api, passenger.id, 5).await;

    let err = api
        .create_ride_request(
            passenger.id,
            "Rua A".into(),
            "Rua B".into(),
            Decimal::from(3),
            Some("quiet".into()),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::PassengerHasActiveRequest);
    assert_eq!(err.category(), Category::Conflict);
    assert_eq!(err.message, "Passenger already has an active ride request.");
}

#[tokio::test]
async fn invalid_request_leaves_passenger_inactive() {
    let api = engine(MemoryStore::new());
    let passenger = register_passenger(&api).await;

    let err = api
        .create_ride_request(
            passenger.id,
            "Rua A".into(),
            "   ".into(),
            Decimal::from(3),
            None,
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidInput);
    assert_activity_flag_consistent(&api, passenger.id).await;
}

#[tokio::test]
async fn create_ride_computes_fare_and_locks_driver() {
    let api = engine(MemoryStore::new());
    let driver = register_driver(&api, "ABC1D23").await;
    let passenger = register_passenger(&api).await;
    let request = request_ride(&api, passenger.id, 5).await;

    let ride = api
        .create_ride(driver.id, request.id, Decimal::from(10), Decimal::new(15, 1))
        .await
        .unwrap();

    assert_eq!(ride.fare.total, Decimal::from(30));
    assert_eq!(ride.driver_id, driver.id);
    assert!(ride.end_time.is_none());
    assert!(!api.find_driver(driver.id).await.unwrap().is_available);
    assert_eq!(
        api.find_ride_request(request.id).await.unwrap().status,
        RideRequestStatus::InProgress
    );
    assert_activity_flag_consistent(&api, passenger.id).await;
}

#[tokio::test]
async fn create_ride_checks_driver_then_request() {
    let api = engine(MemoryStore::new());
    let driver = register_driver(&api, "ABC1D23").await;
    let passenger = register_passenger(&api).await;
    let request = request_ride(&api, passenger.id, 5).await;

    let err = api
        .create_ride(Uuid::new_v4(), request.id, Decimal::from(10), Decimal::ONE)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DriverNotFound);

    let err = api
        .create_ride(driver.id, Uuid::new_v4(), Decimal::from(10), Decimal::ONE)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RideRequestNotFound);

    api.cancel_ride_request(request.id).await.unwrap();
    let err = api
        .create_ride(driver.id, request.id, Decimal::from(10), Decimal::ONE)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RideRequestNotPending);
    assert!(err.is_invalid_operation());
}

#[tokio::test]
async fn invalid_fare_changes_nothing() {
    let api = engine(MemoryStore::new());
    let driver = register_driver(&api, "ABC1D23").await;
    let passenger = register_passenger(&api).await;
    let request = request_ride(&api, passenger.id, 5).await;

    let err = api
        .create_ride(driver.id, request.id, Decimal::ZERO, Decimal::ONE)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidInput);

    let err = api
        .create_ride(driver.id, request.id, Decimal::from(10), Decimal::new(5, 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidInput);

    assert!(api.find_driver(driver.id).await.unwrap().is_available);
    assert!(api.find_ride_request(request.id).await.unwrap().is_pending());
}

#[tokio::test]
async fn busy_driver_cannot_take_another_ride() {
    let api = engine(MemoryStore::new());
    let driver = register_driver(&api, "ABC1D23").await;
    let first = register_passenger(&api).await;
    let second = register_passenger(&api).await;
    let first_request = request_ride(&api, first.id, 5).await;
    let second_request = request_ride(&api, second.id, 8).await;

    api.create_ride(driver.id, first_request.id, Decimal::from(10), Decimal::ONE)
        .await
        .unwrap();

    let err = api
        .create_ride(driver.id, second_request.id, Decimal::from(10), Decimal::ONE)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::DriverNotAvailable);
    assert_eq!(err.message, "The driver is not available.");
    assert!(api
        .find_ride_request(second_request.id)
        .await
        .unwrap()
        .is_pending());
}

#[tokio::test]
async fn in_progress_request_cannot_be_canceled() {
    let api = engine(MemoryStore::new());
    let driver = register_driver(&api, "ABC1D23").await;
    let passenger = register_passenger(&api).await;
    let request = request_ride(&api, passenger.id, 5).await;
    api.create_ride(driver.id, request.id, Decimal::from(10), Decimal::ONE)
        .await
        .unwrap();

    let err = api.cancel_ride_request(request.id).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::CannotCancelNonPending);
    assert_eq!(err.message, "Only pending ride requests can be canceled.");
}

#[tokio::test]
async fn ride_in_progress_cannot_be_deleted() {
    let api = engine(MemoryStore::new());
    let driver = register_driver(&api, "ABC1D23").await;
    let passenger = register_passenger(&api).await;
    let request = request_ride(&api, passenger.id, 5).await;
    let ride = api
        .create_ride(driver.id, request.id, Decimal::from(10), Decimal::ONE)
        .await
        .unwrap();

    let err = api.delete_ride(ride.id).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::RideInProgress);
    assert_eq!(err.message, "Cannot delete a ride that is in progress.");
    assert!(api.find_ride(ride.id).await.is_ok());
}

#[tokio::test]
async fn live_ride_keeps_its_request_in_progress() {
    let api = engine(MemoryStore::new());
    let driver = register_driver(&api, "ABC1D23").await;
    let passenger = register_passenger(&api).await;
    let request = request_ride(&api, passenger.id, 5).await;
    let ride = api
        .create_ride(driver.id, request.id, Decimal::from(10), Decimal::ONE)
        .await
        .unwrap();

    let err = api
        .update_ride_request_status(request.id, RideRequestStatus::Completed)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RideInProgress);
    assert_eq!(err.message, "The ride for this request has not ended yet.");
    assert_eq!(
        api.find_ride_request(request.id).await.unwrap().status,
        RideRequestStatus::InProgress
    );

    let err = api.delete_ride(ride.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::RideInProgress);

    api.end_ride(ride.id).await.unwrap();
    assert!(api.find_driver(driver.id).await.unwrap().is_available);
    assert_activity_flag_consistent(&api, passenger.id).await;

    let err = api
        .update_ride_request_status(request.id, RideRequestStatus::Completed)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadySet);

    api.delete_ride(ride.id).await.unwrap();
    api.delete_driver(driver.id).await.unwrap();
}

#[tokio::test]
async fn ending_a_ride_releases_everyone() {
    let api = engine(MemoryStore::new());
    let driver = register_driver(&api, "ABC1D23").await;
    let passenger = register_passenger(&api).await;
    let request = request_ride(&api, passenger.id, 5).await;
    let ride = api
        .create_ride(driver.id, request.id, Decimal::from(10), Decimal::new(15, 1))
        .await
        .unwrap();

    let ended = api.end_ride(ride.id).await.unwrap();

    assert!(ended.end_time.is_some());
    assert_eq!(ended.fare.total, ride.fare.total);
    assert!(api.find_driver(driver.id).await.unwrap().is_available);
    assert_eq!(
        api.find_ride_request(request.id).await.unwrap().status,
        RideRequestStatus::Completed
    );
    assert_activity_flag_consistent(&api, passenger.id).await;

    let err = api.end_ride(ride.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::RideAlreadyEnded);
    assert_eq!(err.message, "The ride has already ended.");

    api.delete_ride(ride.id).await.unwrap();
    assert_eq!(
        api.find_ride(ride.id).await.unwrap_err().kind,
        ErrorKind::RideNotFound
    );
}

#[tokio::test]
async fn passenger_can_request_again_after_completion() {
    let api = engine(MemoryStore::new());
    let driver = register_driver(&api, "ABC1D23").await;
    let passenger = register_passenger(&api).await;
    let request = request_ride(&api, passenger.id, 5).await;
    let ride = api
        .create_ride(driver.id, request.id, Decimal::from(10), Decimal::ONE)
        .await
        .unwrap();
    api.end_ride(ride.id).await.unwrap();

    let next = request_ride(&api, passenger.id, 2).await;

    let ride = api
        .create_ride(driver.id, next.id, Decimal::from(10), Decimal::ONE)
        .await
        .unwrap();
    assert_eq!(ride.fare.total, Decimal::from(14));
    assert_eq!(api.list_rides_by_driver(driver.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn cancel_then_delete_request() {
    let api = engine(MemoryStore::new());
    let passenger = register_passenger(&api).await;
    let request = request_ride(&api, passenger.id, 5).await;

    let err = api.delete_ride_request(request.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::CannotDeleteActiveRequest);
    assert_eq!(err.message, "Cannot delete an active ride request.");

    let canceled = api.cancel_ride_request(request.id).await.unwrap();
    assert_eq!(canceled.status, RideRequestStatus::Canceled);
    assert_activity_flag_consistent(&api, passenger.id).await;

    api.delete_ride_request(request.id).await.unwrap();
    assert_eq!(
        api.find_ride_request(request.id).await.unwrap_err().kind,
        ErrorKind::RideRequestNotFound
    );
    assert_activity_flag_consistent(&api, passenger.id).await;
}

#[tokio::test]
async fn status_updates_follow_the_state_machine() {
    let api = engine(MemoryStore::new());
    let passenger = register_passenger(&api).await;
    let request = request_ride(&api, passenger.id, 5).await;

    let err = api
        .update_ride_request_status(request.id, RideRequestStatus::Pending)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadySet);
    assert!(err.is_invalid_operation());

    let err = api
        .update_ride_request_status(request.id, RideRequestStatus::Completed)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidTransition);

    api.update_ride_request_status(request.id, RideRequestStatus::Canceled)
        .await
        .unwrap();
    assert_activity_flag_consistent(&api, passenger.id).await;

    for status in [
        RideRequestStatus::Pending,
        RideRequestStatus::InProgress,
        RideRequestStatus::Completed,
    ] {
        let err = api
            .update_ride_request_status(request.id, status)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTransition);
    }

    let err = api
        .update_ride_request_status(Uuid::new_v4(), RideRequestStatus::Canceled)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RideRequestNotFound);
}

#[tokio::test]
async fn failed_commit_leaves_nothing_behind() {
    let store = MemoryStore::new();
    let api = engine(store.clone());
    let driver = register_driver(&api, "ABC1D23").await;
    let passenger = register_passenger(&api).await;
    let request = request_ride(&api, passenger.id, 5).await;

    store.fail_next_commit();
    let err = api
        .create_ride(driver.id, request.id, Decimal::from(10), Decimal::ONE)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::CommitFailed);
    assert_eq!(err.message, "Failed to commit changes to the database.");
    assert!(api.find_driver(driver.id).await.unwrap().is_available);
    assert!(api.find_ride_request(request.id).await.unwrap().is_pending());
    assert_eq!(
        api.list_rides().await.unwrap_err().kind,
        ErrorKind::RideNotFound
    );

    api.create_ride(driver.id, request.id, Decimal::from(10), Decimal::ONE)
        .await
        .unwrap();
}

#[tokio::test]
async fn blocked_operation_times_out_and_rolls_back() {
    let store = MemoryStore::new();
    let api = engine_with_timeout(store.clone(), Duration::from_millis(50));
    let passenger = register_passenger(&api).await;

    let held = store.begin().await.unwrap();

    let err = api
        .create_ride_request(
            passenger.id,
            "Rua A".into(),
            "Rua B".into(),
            Decimal::ONE,
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Timeout);
    assert_eq!(err.category(), Category::Internal);

    drop(held);

    assert_activity_flag_consistent(&api, passenger.id).await;
    request_ride(&api, passenger.id, 1).await;
}
