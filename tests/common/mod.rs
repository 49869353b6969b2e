#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use vemquecabe::api::{DriverAPI, PassengerAPI, RideRequestAPI};
use vemquecabe::cache::{MemoryCache, NoCache};
use vemquecabe::config::Config;
use vemquecabe::db::MemoryStore;
use vemquecabe::engine::Engine;
use vemquecabe::entities::{Driver, PassengerView, PaymentDetails, RideRequest, Vehicle};
use vemquecabe::error::ErrorKind;

pub fn engine(store: MemoryStore) -> Engine<MemoryStore> {
    Engine::new(store, Arc::new(NoCache), &Config::default())
}

pub fn cached_engine(store: MemoryStore) -> Engine<MemoryStore> {
    Engine::new(store, Arc::new(MemoryCache::new()), &Config::default())
}

pub fn engine_with_cache(store: MemoryStore, cache: Arc<MemoryCache>) -> Engine<MemoryStore> {
    Engine::new(store, cache, &Config::default())
}

pub fn engine_with_timeout(store: MemoryStore, timeout: Duration) -> Engine<MemoryStore> {
    let config = Config {
        operation_timeout: timeout,
        ..Config::default()
    };

    Engine::new(store, Arc::new(NoCache), &config)
}

pub fn vehicle(plate: &str) -> Vehicle {
    Vehicle::new(
        "Toyota".into(),
        "Corolla".into(),
        2020,
        "Silver".into(),
        plate.into(),
    )
    .unwrap()
}

pub fn payment_details() -> PaymentDetails {
    PaymentDetails::new(
        "4111111111111111".into(),
        Utc::now().date_naive() + chrono::Duration::days(365),
        "123".into(),
    )
    .unwrap()
}

pub async fn register_driver<A: DriverAPI>(api: &A, plate: &str) -> Driver {
    api.register_driver(Uuid::new_v4(), vehicle(plate))
        .await
        .unwrap()
}

pub async fn register_passenger<A: PassengerAPI>(api: &A) -> PassengerView {
    api.register_passenger(Uuid::new_v4(), payment_details())
        .await
        .unwrap()
}

pub async fn request_ride<A: RideRequestAPI>(
    api: &A,
    passenger_id: Uuid,
    distance: i64,
) -> RideRequest {
    api.create_ride_request(
        passenger_id,
        "Av. Paulista, 1000".into(),
        "Rua Augusta, 500".into(),
        Decimal::from(distance),
        None,
    )
    .await
    .unwrap()
}

/// The passenger flag is set exactly when a pending or in-progress request
/// exists for the passenger.
pub async fn assert_activity_flag_consistent<A>(api: &A, passenger_id: Uuid)
where
    A: PassengerAPI + RideRequestAPI,
{
    let passenger = api.find_passenger(passenger_id).await.unwrap();
    let requests = match api.list_ride_requests_by_passenger(passenger_id).await {
        Ok(requests) => requests,
        Err(err) if err.kind == ErrorKind::RideRequestNotFound => vec![],
        Err(err) => panic!("unexpected error: {}", err),
    };

    let has_active = requests.iter().any(|request| request.is_active());
    assert_eq!(passenger.has_active_request, has_active);
}
