use axum::extract::{Extension, Json, Path};
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::entities::{PassengerView, PaymentDetails};
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct PaymentDetailsParams {
    card_number: String,
    expiration_date: NaiveDate,
    cvv: String,
}

impl TryFrom<PaymentDetailsParams> for PaymentDetails {
    type Error = Error;

    fn try_from(params: PaymentDetailsParams) -> Result<Self, Self::Error> {
        PaymentDetails::new(params.card_number, params.expiration_date, params.cvv)
    }
}

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    user_id: Uuid,
    payment_details: PaymentDetailsParams,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<CreateParams>,
) -> Result<(StatusCode, Json<PassengerView>), Error> {
    let payment_details = PaymentDetails::try_from(params.payment_details)?;
    let passenger = api
        .register_passenger(params.user_id, payment_details)
        .await?;

    Ok((StatusCode::CREATED, passenger.into()))
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<PassengerView>, Error> {
    let passenger = api.find_passenger(id).await?;

    Ok(passenger.into())
}

pub async fn list(Extension(api): Extension<DynAPI>) -> Result<Json<Vec<PassengerView>>, Error> {
    let passengers = api.list_passengers().await?;

    Ok(passengers.into())
}

pub async fn update_payment_details(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
    Json(params): Json<PaymentDetailsParams>,
) -> Result<Json<PassengerView>, Error> {
    let passenger = api
        .update_payment_details(id, PaymentDetails::try_from(params)?)
        .await?;

    Ok(passenger.into())
}

pub async fn delete(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Error> {
    api.delete_passenger(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
