//! `SQLite` implementation of [`UsageRecorder`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use reefhub_app::ports::UsageRecorder;
use reefhub_domain::doser::Usage;
use reefhub_domain::error::ReefHubError;
use reefhub_domain::id::EntityId;

use crate::error::StorageError;

struct Wrapper(Usage);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let recorded_at: String = row.try_get("recorded_at")?;
        let amount: f64 = row.try_get("amount")?;

        let time = chrono::DateTime::parse_from_rfc3339(&recorded_at)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .to_utc();

        Ok(Self(Usage { time, amount }))
    }
}

const INSERT: &str = "INSERT INTO usage (entity_id, recorded_at, amount) VALUES (?, ?, ?)";
const SELECT_BY_ENTITY: &str =
    "SELECT recorded_at, amount FROM usage WHERE entity_id = ? ORDER BY seq DESC LIMIT ?";

/// `SQLite`-backed dosing usage log.
pub struct SqliteUsageStore {
    pool: SqlitePool,
}

impl SqliteUsageStore {
    /// Create a new usage store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl UsageRecorder for SqliteUsageStore {
    async fn record(&self, pump: EntityId, usage: Usage) -> Result<(), ReefHubError> {
        sqlx::query(INSERT)
            .bind(pump.as_uuid())
            .bind(usage.time.to_rfc3339())
            .bind(usage.amount)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn history(&self, pump: EntityId, limit: usize) -> Result<Vec<Usage>, ReefHubError> {
        let limit = i32::try_from(limit).unwrap_or(i32::MAX);
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_ENTITY)
            .bind(pump.as_uuid())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
