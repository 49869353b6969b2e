use axum::extract::{Extension, Json, Path, Query};
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::entities::{RideRequest, RideRequestStatus};
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    passenger_id: Uuid,
    start_location: String,
    end_location: String,
    distance: Decimal,
    preferences: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ListParams {
    status: Option<RideRequestStatus>,
}

#[derive(Serialize, Deserialize)]
pub struct UpdateStatusParams {
    status: RideRequestStatus,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<CreateParams>,
) -> Result<(StatusCode, Json<RideRequest>), Error> {
    let request = api
        .create_ride_request(
            params.passenger_id,
            params.start_location,
            params.end_location,
            params.distance,
            params.preferences,
        )
        .await?;

    Ok((StatusCode::CREATED, request.into()))
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<RideRequest>, Error> {
    let request = api.find_ride_request(id).await?;

    Ok(request.into())
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<RideRequest>>, Error> {
    let requests = match params.status {
        Some(status) => api.list_ride_requests_by_status(status).await?,
        None => api.list_ride_requests().await?,
    };

    Ok(requests.into())
}

pub async fn list_by_passenger(
    Extension(api): Extension<DynAPI>,
    Path(passenger_id): Path<Uuid>,
) -> Result<Json<Vec<RideRequest>>, Error> {
    let requests = api.list_ride_requests_by_passenger(passenger_id).await?;

    Ok(requests.into())
}

pub async fn update_status(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
    Json(params): Json<UpdateStatusParams>,
) -> Result<Json<RideRequest>, Error> {
    let request = api.update_ride_request_status(id, params.status).await?;

    Ok(request.into())
}

pub async fn cancel(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<RideRequest>, Error> {
    let request = api.cancel_ride_request(id).await?;

    Ok(request.into())
}

pub async fn delete(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Error> {
    api.delete_ride_request(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[tokio::test]
async fn second_request_renders_conflict() {
    use std::sync::Arc;

    use axum::response::IntoResponse;
    use chrono::{Duration, Utc};

    use crate::cache::NoCache;
    use crate::config::Config;
    use crate::db::MemoryStore;
    use crate::engine::Engine;
    use crate::entities::PaymentDetails;

    let api: DynAPI = Arc::new(Engine::new(
        MemoryStore::new(),
        Arc::new(NoCache),
        &Config::default(),
    ));
    let passenger = api
        .register_passenger(
            Uuid::new_v4(),
            PaymentDetails::new(
                "4111111111111111".into(),
                Utc::now().date_naive() + Duration::days(90),
                "123".into(),
            )
            .unwrap(),
        )
        .await
        .unwrap();
    let params = || CreateParams {
        passenger_id: passenger.id,
        start_location: "Rua A".into(),
        end_location: "Rua B".into(),
        distance: Decimal::from(4),
        preferences: None,
    };

    let (status, Json(request)) = create(Extension(api.clone()), Json(params()))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request.status, RideRequestStatus::Pending);

    let err = create(Extension(api), Json(params())).await.unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
}
