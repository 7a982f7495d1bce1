//! `SQLite` implementation of [`EntityStore`].

use std::marker::PhantomData;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use reefhub_app::ports::EntityStore;
use reefhub_domain::error::{NotFoundError, ReefHubError};
use reefhub_domain::record::Record;

use crate::error::StorageError;

struct Wrapper<T>(T);

impl<T> Wrapper<T> {
    fn maybe(value: Option<Self>) -> Option<T> {
        value.map(|w| w.0)
    }
}

impl<'r, T: Record> FromRow<'r, SqliteRow> for Wrapper<T> {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let data: String = row.try_get("data")?;
        serde_json::from_str(&data)
            .map(Self)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))
    }
}

const INSERT: &str = "INSERT INTO records (kind, id, name, data) VALUES (?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT data FROM records WHERE kind = ? AND id = ?";
const SELECT_ALL: &str = "SELECT data FROM records WHERE kind = ? ORDER BY seq";
const UPDATE: &str = "UPDATE records SET name = ?, data = ? WHERE kind = ? AND id = ?";
const DELETE: &str = "DELETE FROM records WHERE kind = ? AND id = ?";

/// `SQLite`-backed store for records of kind `T`.
///
/// Records are kept as JSON documents, so opaque step and target payloads
/// come back exactly as they were written.
pub struct SqliteEntityStore<T> {
    pool: SqlitePool,
    _record: PhantomData<fn() -> T>,
}

impl<T> SqliteEntityStore<T> {
    /// Create a new store backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }
}

impl<T: Record + Unpin> EntityStore<T> for SqliteEntityStore<T> {
    async fn create(&self, mut record: T) -> Result<T, ReefHubError> {
        record.set_id(T::Id::default());
        let data = serde_json::to_string(&record).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(T::KIND)
            .bind(record.id().to_string())
            .bind(record.name())
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(record)
    }

    async fn get_by_id(&self, id: T::Id) -> Result<Option<T>, ReefHubError> {
        let row: Option<Wrapper<T>> = sqlx::query_as(SELECT_BY_ID)
            .bind(T::KIND)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<T>, ReefHubError> {
        let rows: Vec<Wrapper<T>> = sqlx::query_as(SELECT_ALL)
            .bind(T::KIND)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, record: T) -> Result<T, ReefHubError> {
        let data = serde_json::to_string(&record).map_err(StorageError::from)?;

        let result = sqlx::query(UPDATE)
            .bind(record.name())
            .bind(&data)
            .bind(T::KIND)
            .bind(record.id().to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(NotFoundError {
                entity: T::KIND,
                id: record.id().to_string(),
            }
            .into());
        }
        Ok(record)
    }

    async fn delete(&self, id: T::Id) -> Result<(), ReefHubError> {
        sqlx::query(DELETE)
            .bind(T::KIND)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}
