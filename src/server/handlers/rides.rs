use axum::extract::{Extension, Json, Path};
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::entities::Ride;
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    driver_id: Uuid,
    ride_request_id: Uuid,
    base_fare: Decimal,
    #[serde(default = "no_surge")]
    surge_multiplier: Decimal,
}

fn no_surge() -> Decimal {
    Decimal::ONE
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<CreateParams>,
) -> Result<(StatusCode, Json<Ride>), Error> {
    let ride = api
        .create_ride(
            params.driver_id,
            params.ride_request_id,
            params.base_fare,
            params.surge_multiplier,
        )
        .await?;

    Ok((StatusCode::CREATED, ride.into()))
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<Ride>, Error> {
    let ride = api.find_ride(id).await?;

    Ok(ride.into())
}

pub async fn list(Extension(api): Extension<DynAPI>) -> Result<Json<Vec<Ride>>, Error> {
    let rides = api.list_rides().await?;

    Ok(rides.into())
}

pub async fn list_by_driver(
    Extension(api): Extension<DynAPI>,
    Path(driver_id): Path<Uuid>,
) -> Result<Json<Vec<Ride>>, Error> {
    let rides = api.list_rides_by_driver(driver_id).await?;

    Ok(rides.into())
}

pub async fn end(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<Ride>, Error> {
    let ride = api.end_ride(id).await?;

    Ok(ride.into())
}

pub async fn delete(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Error> {
    api.delete_ride(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
