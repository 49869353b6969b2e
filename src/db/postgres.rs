use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    types::Json,
    Executor, Pool, Postgres, Row, Transaction,
};
use uuid::Uuid;

use super::{Store, UnitOfWork};
use crate::entities::{Driver, Passenger, Ride, RideRequest, RideRequestStatus};
use crate::error::Error;

type Database = Postgres;

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: Pool<Database>,
}

impl PgStore {
    #[tracing::instrument(name = "PgStore::new", skip(db_uri))]
    pub async fn new(db_uri: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_uri)
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: Pool<Database>) -> Result<Self, Error> {
        // TODO: move this to sqlx migrations
        pool.execute("CREATE TABLE IF NOT EXISTS drivers (id UUID PRIMARY KEY, status VARCHAR NOT NULL, plate VARCHAR NOT NULL UNIQUE, created_at TIMESTAMPTZ NOT NULL DEFAULT now(), data JSONB NOT NULL)")
            .await?;
        pool.execute("CREATE TABLE IF NOT EXISTS passengers (id UUID PRIMARY KEY, status VARCHAR NOT NULL, created_at TIMESTAMPTZ NOT NULL DEFAULT now(), data JSONB NOT NULL)")
            .await?;
        pool.execute("CREATE TABLE IF NOT EXISTS ride_requests (id UUID PRIMARY KEY, passenger_id UUID NOT NULL, status VARCHAR NOT NULL, created_at TIMESTAMPTZ NOT NULL DEFAULT now(), data JSONB NOT NULL, CONSTRAINT fk_ride_request_passenger FOREIGN KEY(passenger_id) REFERENCES passengers(id) ON DELETE CASCADE)")
            .await?;
        pool.execute("CREATE UNIQUE INDEX IF NOT EXISTS ride_requests_one_active_per_passenger ON ride_requests (passenger_id) WHERE status IN ('pending', 'in_progress')")
            .await?;
        pool.execute("CREATE TABLE IF NOT EXISTS rides (id UUID PRIMARY KEY, ride_request_id UUID NOT NULL UNIQUE, driver_id UUID NOT NULL, ended BOOLEAN NOT NULL, created_at TIMESTAMPTZ NOT NULL DEFAULT now(), data JSONB NOT NULL, CONSTRAINT fk_ride_ride_request FOREIGN KEY(ride_request_id) REFERENCES ride_requests(id) ON DELETE CASCADE)")
            .await?;
        pool.execute("CREATE UNIQUE INDEX IF NOT EXISTS rides_one_active_per_driver ON rides (driver_id) WHERE NOT ended")
            .await?;

        Ok(Self { pool })
    }
}

fn decode<T: DeserializeOwned + 'static>(row: &PgRow) -> Result<T, Error> {
    let Json(value): Json<T> = row.try_get("data")?;

    Ok(value)
}

fn decode_all<T: DeserializeOwned + 'static>(rows: Vec<PgRow>) -> Result<Vec<T>, Error> {
    rows.iter().map(decode).collect()
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgUnitOfWork;

    async fn begin(&self) -> Result<Self::Tx, Error> {
        let tx = self.pool.begin().await?;

        Ok(PgUnitOfWork { tx })
    }

    #[tracing::instrument(skip(self))]
    async fn find_driver(&self, id: Uuid) -> Result<Option<Driver>, Error> {
        let mut conn = self.pool.acquire().await?;

        conn.fetch_optional(sqlx::query("SELECT data FROM drivers WHERE id = $1").bind(id))
            .await?
            .as_ref()
            .map(decode)
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn list_drivers(&self) -> Result<Vec<Driver>, Error> {
        let mut conn = self.pool.acquire().await?;

        let rows = conn
            .fetch_all(sqlx::query("SELECT data FROM drivers ORDER BY created_at"))
            .await?;

        decode_all(rows)
    }

    #[tracing::instrument(skip(self))]
    async fn list_available_drivers(&self) -> Result<Vec<Driver>, Error> {
        let mut conn = self.pool.acquire().await?;

        let rows = conn
            .fetch_all(sqlx::query(
                "SELECT data FROM drivers WHERE status = 'available' ORDER BY created_at",
            ))
            .await?;

        decode_all(rows)
    }

    #[tracing::instrument(skip(self))]
    async fn find_passenger(&self, id: Uuid) -> Result<Option<Passenger>, Error> {
        let mut conn = self.pool.acquire().await?;

        conn.fetch_optional(sqlx::query("SELECT data FROM passengers WHERE id = $1").bind(id))
            .await?
            .as_ref()
            .map(decode)
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn list_passengers(&self) -> Result<Vec<Passenger>, Error> {
        let mut conn = self.pool.acquire().await?;

        let rows = conn
            .fetch_all(sqlx::query("SELECT data FROM passengers ORDER BY created_at"))
            .await?;

        decode_all(rows)
    }

    #[tracing::instrument(skip(self))]
    async fn find_ride_request(&self, id: Uuid) -> Result<Option<RideRequest>, Error> {
        let mut conn = self.pool.acquire().await?;

        conn.fetch_optional(sqlx::query("SELECT data FROM ride_requests WHERE id = $1").bind(id))
            .await?
            .as_ref()
            .map(decode)
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn list_ride_requests(&self) -> Result<Vec<RideRequest>, Error> {
        let mut conn = self.pool.acquire().await?;

        let rows = conn
            .fetch_all(sqlx::query("SELECT data FROM ride_requests ORDER BY created_at"))
            .await?;

        decode_all(rows)
    }

    #[tracing::instrument(skip(self))]
    async fn list_ride_requests_by_passenger(
        &self,
        passenger_id: Uuid,
    ) -> Result<Vec<RideRequest>, Error> {
        let mut conn = self.pool.acquire().await?;

        let rows = conn
            .fetch_all(
                sqlx::query(
                    "SELECT data FROM ride_requests WHERE passenger_id = $1 ORDER BY created_at",
                )
                .bind(passenger_id),
            )
            .await?;

        decode_all(rows)
    }

    #[tracing::instrument(skip(self))]
    async fn list_ride_requests_by_status(
        &self,
        status: RideRequestStatus,
    ) -> Result<Vec<RideRequest>, Error> {
        let mut conn = self.pool.acquire().await?;

        let rows = conn
            .fetch_all(
                sqlx::query("SELECT data FROM ride_requests WHERE status = $1 ORDER BY created_at")
                    .bind(status.name()),
            )
            .await?;

        decode_all(rows)
    }

    #[tracing::instrument(skip(self))]
    async fn find_ride(&self, id: Uuid) -> Result<Option<Ride>, Error> {
        let mut conn = self.pool.acquire().await?;

        conn.fetch_optional(sqlx::query("SELECT data FROM rides WHERE id = $1").bind(id))
            .await?
            .as_ref()
            .map(decode)
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn list_rides(&self) -> Result<Vec<Ride>, Error> {
        let mut conn = self.pool.acquire().await?;

        let rows = conn
            .fetch_all(sqlx::query("SELECT data FROM rides ORDER BY created_at"))
            .await?;

        decode_all(rows)
    }

    #[tracing::instrument(skip(self))]
    async fn list_rides_by_driver(&self, driver_id: Uuid) -> Result<Vec<Ride>, Error> {
        let mut conn = self.pool.acquire().await?;

        let rows = conn
            .fetch_all(
                sqlx::query("SELECT data FROM rides WHERE driver_id = $1 ORDER BY created_at")
                    .bind(driver_id),
            )
            .await?;

        decode_all(rows)
    }
}

/// A Postgres transaction. Rows fetched here stay locked (`FOR UPDATE`) until
/// the transaction commits or is dropped, which serializes competing
/// lifecycle operations on the same driver, request, ride or passenger.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Database>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    #[tracing::instrument(skip(self))]
    async fn fetch_driver_for_update(&mut self, id: Uuid) -> Result<Option<Driver>, Error> {
        self.tx
            .fetch_optional(sqlx::query("SELECT data FROM drivers WHERE id = $1 FOR UPDATE").bind(id))
            .await?
            .as_ref()
            .map(decode)
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn driver_plate_exists(&mut self, plate: &str) -> Result<bool, Error> {
        let row = self
            .tx
            .fetch_one(
                sqlx::query("SELECT EXISTS (SELECT 1 FROM drivers WHERE plate = $1) AS taken")
                    .bind(plate),
            )
            .await?;

        Ok(row.try_get("taken")?)
    }

    #[tracing::instrument(skip(self, driver), fields(driver_id = %driver.id))]
    async fn insert_driver(&mut self, driver: &Driver) -> Result<(), Error> {
        self.tx
            .execute(
                sqlx::query("INSERT INTO drivers (id, status, plate, data) VALUES ($1, $2, $3, $4)")
                    .bind(driver.id)
                    .bind(driver.status_name())
                    .bind(&driver.vehicle.plate)
                    .bind(Json(driver)),
            )
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, driver), fields(driver_id = %driver.id))]
    async fn update_driver(&mut self, driver: &Driver) -> Result<(), Error> {
        self.tx
            .execute(
                sqlx::query("UPDATE drivers SET status = $2, plate = $3, data = $4 WHERE id = $1")
                    .bind(driver.id)
                    .bind(driver.status_name())
                    .bind(&driver.vehicle.plate)
                    .bind(Json(driver)),
            )
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_driver(&mut self, id: Uuid) -> Result<(), Error> {
        self.tx
            .execute(sqlx::query("DELETE FROM drivers WHERE id = $1").bind(id))
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_passenger_for_update(&mut self, id: Uuid) -> Result<Option<Passenger>, Error> {
        self.tx
            .fetch_optional(
                sqlx::query("SELECT data FROM passengers WHERE id = $1 FOR UPDATE").bind(id),
            )
            .await?
            .as_ref()
            .map(decode)
            .transpose()
    }

    #[tracing::instrument(skip(self, passenger), fields(passenger_id = %passenger.id))]
    async fn insert_passenger(&mut self, passenger: &Passenger) -> Result<(), Error> {
        self.tx
            .execute(
                sqlx::query("INSERT INTO passengers (id, status, data) VALUES ($1, $2, $3)")
                    .bind(passenger.id)
                    .bind(passenger.status_name())
                    .bind(Json(passenger)),
            )
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, passenger), fields(passenger_id = %passenger.id))]
    async fn update_passenger(&mut self, passenger: &Passenger) -> Result<(), Error> {
        self.tx
            .execute(
                sqlx::query("UPDATE passengers SET status = $2, data = $3 WHERE id = $1")
                    .bind(passenger.id)
                    .bind(passenger.status_name())
                    .bind(Json(passenger)),
            )
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_passenger(&mut self, id: Uuid) -> Result<(), Error> {
        self.tx
            .execute(sqlx::query("DELETE FROM passengers WHERE id = $1").bind(id))
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn passenger_history(
        &mut self,
        passenger_id: Uuid,
    ) -> Result<(Vec<Uuid>, Vec<Uuid>), Error> {
        let requests = self
            .tx
            .fetch_all(
                sqlx::query("SELECT id FROM ride_requests WHERE passenger_id = $1")
                    .bind(passenger_id),
            )
            .await?;
        let rides = self
            .tx
            .fetch_all(
                sqlx::query("SELECT rides.id FROM rides JOIN ride_requests ON rides.ride_request_id = ride_requests.id WHERE ride_requests.passenger_id = $1")
                    .bind(passenger_id),
            )
            .await?;

        let request_ids = requests
            .iter()
            .map(|row| row.try_get("id"))
            .collect::<Result<Vec<Uuid>, _>>()?;
        let ride_ids = rides
            .iter()
            .map(|row| row.try_get("id"))
            .collect::<Result<Vec<Uuid>, _>>()?;

        Ok((request_ids, ride_ids))
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_ride_request_for_update(
        &mut self,
        id: Uuid,
    ) -> Result<Option<RideRequest>, Error> {
        self.tx
            .fetch_optional(
                sqlx::query("SELECT data FROM ride_requests WHERE id = $1 FOR UPDATE").bind(id),
            )
            .await?
            .as_ref()
            .map(decode)
            .transpose()
    }

    #[tracing::instrument(skip(self, request), fields(ride_request_id = %request.id))]
    async fn insert_ride_request(&mut self, request: &RideRequest) -> Result<(), Error> {
        self.tx
            .execute(
                sqlx::query(
                    "INSERT INTO ride_requests (id, passenger_id, status, data) VALUES ($1, $2, $3, $4)",
                )
                .bind(request.id)
                .bind(request.passenger_id)
                .bind(request.status.name())
                .bind(Json(request)),
            )
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, request), fields(ride_request_id = %request.id))]
    async fn update_ride_request(&mut self, request: &RideRequest) -> Result<(), Error> {
        self.tx
            .execute(
                sqlx::query("UPDATE ride_requests SET status = $2, data = $3 WHERE id = $1")
                    .bind(request.id)
                    .bind(request.status.name())
                    .bind(Json(request)),
            )
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_ride_request(&mut self, id: Uuid) -> Result<(), Error> {
        self.tx
            .execute(sqlx::query("DELETE FROM ride_requests WHERE id = $1").bind(id))
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_ride_for_update(&mut self, id: Uuid) -> Result<Option<Ride>, Error> {
        self.tx
            .fetch_optional(sqlx::query("SELECT data FROM rides WHERE id = $1 FOR UPDATE").bind(id))
            .await?
            .as_ref()
            .map(decode)
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_ride_by_request_for_update(
        &mut self,
        ride_request_id: Uuid,
    ) -> Result<Option<Ride>, Error> {
        self.tx
            .fetch_optional(
                sqlx::query("SELECT data FROM rides WHERE ride_request_id = $1 FOR UPDATE")
                    .bind(ride_request_id),
            )
            .await?
            .as_ref()
            .map(decode)
            .transpose()
    }

    #[tracing::instrument(skip(self, ride), fields(ride_id = %ride.id))]
    async fn insert_ride(&mut self, ride: &Ride) -> Result<(), Error> {
        self.tx
            .execute(
                sqlx::query(
                    "INSERT INTO rides (id, ride_request_id, driver_id, ended, data) VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(ride.id)
                .bind(ride.ride_request_id)
                .bind(ride.driver_id)
                .bind(ride.has_ended())
                .bind(Json(ride)),
            )
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, ride), fields(ride_id = %ride.id))]
    async fn update_ride(&mut self, ride: &Ride) -> Result<(), Error> {
        self.tx
            .execute(
                sqlx::query("UPDATE rides SET ended = $2, data = $3 WHERE id = $1")
                    .bind(ride.id)
                    .bind(ride.has_ended())
                    .bind(Json(ride)),
            )
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_ride(&mut self, id: Uuid) -> Result<(), Error> {
        self.tx
            .execute(sqlx::query("DELETE FROM rides WHERE id = $1").bind(id))
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn commit(self) -> Result<bool, Error> {
        match self.tx.commit().await {
            Ok(()) => Ok(true),
            Err(err) => {
                tracing::error!("commit failed: {:?}", err);
                Ok(false)
            }
        }
    }
}
