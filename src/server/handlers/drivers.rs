use axum::extract::{Extension, Json, Path, Query};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::entities::{Driver, Vehicle};
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct VehicleParams {
    brand: String,
    model: String,
    year: i32,
    color: String,
    plate: String,
}

impl TryFrom<VehicleParams> for Vehicle {
    type Error = Error;

    fn try_from(params: VehicleParams) -> Result<Self, Self::Error> {
        Vehicle::new(
            params.brand,
            params.model,
            params.year,
            params.color,
            params.plate,
        )
    }
}

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    user_id: Uuid,
    vehicle: VehicleParams,
}

#[derive(Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    available: bool,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<CreateParams>,
) -> Result<(StatusCode, Json<Driver>), Error> {
    let vehicle = Vehicle::try_from(params.vehicle)?;
    let driver = api.register_driver(params.user_id, vehicle).await?;

    Ok((StatusCode::CREATED, driver.into()))
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<Driver>, Error> {
    let driver = api.find_driver(id).await?;

    Ok(driver.into())
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Driver>>, Error> {
    let drivers = match params.available {
        true => api.list_available_drivers().await?,
        false => api.list_drivers().await?,
    };

    Ok(drivers.into())
}

pub async fn update_vehicle(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
    Json(params): Json<VehicleParams>,
) -> Result<Json<Driver>, Error> {
    let driver = api.update_vehicle(id, Vehicle::try_from(params)?).await?;

    Ok(driver.into())
}

pub async fn delete(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Error> {
    api.delete_driver(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
