use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::env;
use std::fmt::Debug;

/// Broad failure class. Transport layers map these onto status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    NotFound,
    Conflict,
    BadRequest,
    Internal,
}

/// Stable, machine-checkable failure kind. Callers branch on this, never on
/// the message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DriverNotFound,
    DriverNotAvailable,
    DriverOnRide,
    DriverPlateTaken,
    PassengerNotFound,
    PassengerHasActiveRequest,
    RideRequestNotFound,
    RideRequestNotPending,
    CannotCancelNonPending,
    CannotDeleteActiveRequest,
    RideNotFound,
    RideAlreadyEnded,
    RideInProgress,
    AlreadySet,
    InvalidTransition,
    InvalidInput,
    Conflict,
    CommitFailed,
    Timeout,
    EnvVar,
    Database,
    Cache,
    Unexpected,
}

impl ErrorKind {
    pub fn category(&self) -> Category {
        match self {
            Self::DriverNotFound
            | Self::PassengerNotFound
            | Self::RideRequestNotFound
            | Self::RideNotFound => Category::NotFound,
            Self::DriverPlateTaken | Self::PassengerHasActiveRequest | Self::Conflict => {
                Category::Conflict
            }
            Self::DriverNotAvailable
            | Self::DriverOnRide
            | Self::RideRequestNotPending
            | Self::CannotCancelNonPending
            | Self::CannotDeleteActiveRequest
            | Self::RideAlreadyEnded
            | Self::RideInProgress
            | Self::AlreadySet
            | Self::InvalidTransition
            | Self::InvalidInput
            | Self::CommitFailed => Category::BadRequest,
            Self::Timeout | Self::EnvVar | Self::Database | Self::Cache | Self::Unexpected => {
                Category::Internal
            }
        }
    }

    /// Precondition violations on an existing aggregate: wrong status for the
    /// transition, re-asserting the current state, unavailable driver.
    pub fn is_invalid_operation(&self) -> bool {
        matches!(
            self,
            Self::DriverNotAvailable
                | Self::DriverOnRide
                | Self::RideRequestNotPending
                | Self::CannotCancelNonPending
                | Self::CannotDeleteActiveRequest
                | Self::RideAlreadyEnded
                | Self::RideInProgress
                | Self::AlreadySet
                | Self::InvalidTransition
        )
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == Category::NotFound
    }

    pub fn is_invalid_operation(&self) -> bool {
        self.kind.is_invalid_operation()
    }
}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        // 23505: unique_violation, raised by the one-active-ride/one-active-request indexes
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                tracing::warn!("unique constraint violated: {}", db_err.message());
                return conflict_error();
            }
        }

        database_error(err)
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        cache_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        cache_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.category() {
            Category::NotFound => (StatusCode::NOT_FOUND, self.message.as_str()),
            Category::Conflict => (StatusCode::CONFLICT, self.message.as_str()),
            Category::BadRequest => (StatusCode::BAD_REQUEST, self.message.as_str()),
            Category::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        };

        let body = Json(json!({
            "kind": self.kind,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub fn driver_not_found_error() -> Error {
    Error::new(ErrorKind::DriverNotFound, "Driver with ID not found.")
}

pub fn driver_not_available_error() -> Error {
    Error::new(ErrorKind::DriverNotAvailable, "The driver is not available.")
}

pub fn driver_on_ride_error() -> Error {
    Error::new(
        ErrorKind::DriverOnRide,
        "Cannot remove a driver that is serving a ride.",
    )
}

pub fn driver_plate_taken_error() -> Error {
    Error::new(
        ErrorKind::DriverPlateTaken,
        "An error occurred while trying to register the driver.",
    )
}

pub fn passenger_not_found_error() -> Error {
    Error::new(ErrorKind::PassengerNotFound, "Passenger with ID not found.")
}

pub fn passenger_has_active_request_error() -> Error {
    Error::new(
        ErrorKind::PassengerHasActiveRequest,
        "Passenger already has an active ride request.",
    )
}

pub fn ride_request_not_found_error() -> Error {
    Error::new(ErrorKind::RideRequestNotFound, "Ride request with ID not found.")
}

pub fn ride_request_not_pending_error() -> Error {
    Error::new(
        ErrorKind::RideRequestNotPending,
        "Ride request is not in a valid state to start a ride.",
    )
}

pub fn cannot_cancel_non_pending_error() -> Error {
    Error::new(
        ErrorKind::CannotCancelNonPending,
        "Only pending ride requests can be canceled.",
    )
}

pub fn cannot_delete_active_request_error() -> Error {
    Error::new(
        ErrorKind::CannotDeleteActiveRequest,
        "Cannot delete an active ride request.",
    )
}

pub fn ride_not_found_error() -> Error {
    Error::new(ErrorKind::RideNotFound, "Ride with ID not found.")
}

pub fn ride_already_ended_error() -> Error {
    Error::new(ErrorKind::RideAlreadyEnded, "The ride has already ended.")
}

pub fn ride_in_progress_error() -> Error {
    Error::new(
        ErrorKind::RideInProgress,
        "Cannot delete a ride that is in progress.",
    )
}

pub fn ride_not_ended_error() -> Error {
    Error::new(
        ErrorKind::RideInProgress,
        "The ride for this request has not ended yet.",
    )
}

pub fn already_set_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::AlreadySet, message)
}

pub fn invalid_transition_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidTransition, message)
}

pub fn invalid_input_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidInput, message)
}

/// Empty result for a list query.
pub fn nothing_found_error(kind: ErrorKind, message: impl Into<String>) -> Error {
    Error::new(kind, message)
}

pub fn conflict_error() -> Error {
    Error::new(
        ErrorKind::Conflict,
        "The resource was modified by a concurrent operation.",
    )
}

pub fn commit_failed_error() -> Error {
    Error::new(
        ErrorKind::CommitFailed,
        "Failed to commit changes to the database.",
    )
}

pub fn timeout_error() -> Error {
    Error::new(ErrorKind::Timeout, "The operation did not finish in time.")
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error::new(ErrorKind::EnvVar, "environment variable error")
}

pub fn database_error<T: Debug>(err: T) -> Error {
    tracing::error!("database error: {:?}", err);
    Error::new(ErrorKind::Database, "database error")
}

pub fn cache_error<T: Debug>(err: T) -> Error {
    tracing::warn!("cache error: {:?}", err);
    Error::new(ErrorKind::Cache, "cache error")
}

pub fn unexpected_error() -> Error {
    Error::new(ErrorKind::Unexpected, "unexpected error")
}

#[test]
fn categories_follow_taxonomy() {
    assert_eq!(driver_not_found_error().category(), Category::NotFound);
    assert_eq!(
        passenger_has_active_request_error().category(),
        Category::Conflict
    );
    assert_eq!(commit_failed_error().category(), Category::BadRequest);
    assert_eq!(timeout_error().category(), Category::Internal);
}

#[test]
fn already_set_counts_as_invalid_operation() {
    let err = already_set_error("Status is already set to the requested value.");

    assert!(err.is_invalid_operation());
    assert!(!driver_not_found_error().is_invalid_operation());
}
