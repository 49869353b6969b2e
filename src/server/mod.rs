mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, patch, post},
    Router,
};

use crate::api::{DynAPI, API};
use crate::error::{unexpected_error, Error};
use crate::server::handlers::{drivers, passengers, ride_requests, rides};

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route("/drivers", post(drivers::create).get(drivers::list))
        .route("/drivers/:id", get(drivers::find).delete(drivers::delete))
        .route("/drivers/:id/vehicle", patch(drivers::update_vehicle))
        .route("/drivers/:id/rides", get(rides::list_by_driver))
        .route("/passengers", post(passengers::create).get(passengers::list))
        .route(
            "/passengers/:id",
            get(passengers::find).delete(passengers::delete),
        )
        .route(
            "/passengers/:id/payment_details",
            patch(passengers::update_payment_details),
        )
        .route(
            "/passengers/:id/ride_requests",
            get(ride_requests::list_by_passenger),
        )
        .route(
            "/ride_requests",
            post(ride_requests::create).get(ride_requests::list),
        )
        .route(
            "/ride_requests/:id",
            get(ride_requests::find).delete(ride_requests::delete),
        )
        .route(
            "/ride_requests/:id/status",
            patch(ride_requests::update_status),
        )
        .route("/ride_requests/:id/cancel", patch(ride_requests::cancel))
        .route("/rides", post(rides::create).get(rides::list))
        .route("/rides/:id", get(rides::find).delete(rides::delete))
        .route("/rides/:id/end", patch(rides::end))
        .layer(Extension(api))
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) -> Result<(), Error> {
    let api = Arc::new(api) as DynAPI;
    let app = router(api);

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|err| {
            tracing::error!("server error: {}", err);
            unexpected_error()
        })
}
