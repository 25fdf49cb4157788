//! Postgres-backed store, grounded in
//! `original_source/internal/server/storage/dbstorage.go`'s `DBStorage`
//! (there built on `pgx`; here on `sqlx`, the async Postgres driver already
//! present in the corpus). The `rt_metrics` table layout — including the
//! `mtype` column name, kept as-is rather than the more obvious `type`,
//! since `type` is a reserved word in several SQL dialects the original
//! author was clearly avoiding — matches the Go schema exactly.

use crate::error::StorageError;
use crate::MetricStore;
use async_trait::async_trait;
use rt_metrics_types::{MetricKind, MetricRecord};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::path::Path;
use std::str::FromStr;

#[derive(FromRow)]
struct MetricRow {
    id: String,
    mtype: String,
    delta: Option<i64>,
    value: Option<f64>,
    hash: Option<String>,
}

impl TryFrom<MetricRow> for MetricRecord {
    type Error = StorageError;

    fn try_from(row: MetricRow) -> Result<Self, Self::Error> {
        let kind = MetricKind::from_str(&row.mtype).map_err(StorageError::Record)?;
        Ok(MetricRecord {
            id: row.id,
            kind,
            value: row.value,
            delta: row.delta,
            hash: row.hash,
        })
    }
}

/// A `MetricStore` backed by a Postgres connection pool.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to `dsn` and ensure the `rt_metrics` table exists, mirroring
    /// `DBConnectStorage`'s `CREATE TABLE IF NOT EXISTS`.
    pub async fn connect(dsn: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new().max_connections(10).connect(dsn).await?;
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS rt_metrics (
                id TEXT UNIQUE,
                mtype TEXT,
                delta BIGINT,
                value DOUBLE PRECISION,
                hash TEXT
            )"#,
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetricStore for PostgresStore {
    async fn insert_metric(&self, record: MetricRecord) -> Result<(), StorageError> {
        insert_one(&self.pool, &record).await
    }

    async fn insert_batch(&self, records: Vec<MetricRecord>) -> Result<(), StorageError> {
        // Unlike the original loop of independent exec calls, the whole
        // batch commits (or rolls back) as a single transaction.
        let mut tx = self.pool.begin().await?;
        for record in &records {
            match record.kind {
                MetricKind::Gauge => {
                    sqlx::query(
                        r#"INSERT INTO rt_metrics (id, mtype, value, hash)
                           VALUES ($1, $2, $3, $4)
                           ON CONFLICT (id) DO UPDATE
                           SET mtype = excluded.mtype, value = excluded.value, hash = excluded.hash"#,
                    )
                    .bind(&record.id)
                    .bind(record.kind.as_str())
                    .bind(record.value)
                    .bind(&record.hash)
                    .execute(&mut *tx)
                    .await?;
                }
                MetricKind::Counter => {
                    sqlx::query(
                        r#"INSERT INTO rt_metrics (id, mtype, delta, hash)
                           VALUES ($1, $2, $3, $4)
                           ON CONFLICT (id) DO UPDATE
                           SET mtype = excluded.mtype, delta = excluded.delta + rt_metrics.delta, hash = excluded.hash"#,
                    )
                    .bind(&record.id)
                    .bind(record.kind.as_str())
                    .bind(record.delta)
                    .bind(&record.hash)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn params_update(
        &self,
        kind: MetricKind,
        id: &str,
        raw_value: &str,
    ) -> Result<(), StorageError> {
        match kind {
            MetricKind::Gauge => {
                let value: f64 = raw_value.parse().map_err(|_| StorageError::InvalidValue {
                    kind: "gauge",
                    raw: raw_value.to_string(),
                })?;
                sqlx::query(
                    r#"INSERT INTO rt_metrics (id, mtype, value)
                       VALUES ($1, $2, $3)
                       ON CONFLICT (id) DO UPDATE SET mtype = excluded.mtype, value = excluded.value"#,
                )
                .bind(id)
                .bind(kind.as_str())
                .bind(value)
                .execute(&self.pool)
                .await?;
            }
            MetricKind::Counter => {
                let delta: i64 = raw_value.parse().map_err(|_| StorageError::InvalidValue {
                    kind: "counter",
                    raw: raw_value.to_string(),
                })?;
                sqlx::query(
                    r#"INSERT INTO rt_metrics (id, mtype, delta)
                       VALUES ($1, $2, $3)
                       ON CONFLICT (id) DO UPDATE
                       SET mtype = excluded.mtype, delta = excluded.delta + rt_metrics.delta"#,
                )
                .bind(id)
                .bind(kind.as_str())
                .bind(delta)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }

    async fn read_metric(&self, kind: MetricKind, id: &str) -> Result<MetricRecord, StorageError> {
        let row = sqlx::query_as::<_, MetricRow>(
            "SELECT id, mtype, delta, value, hash FROM rt_metrics WHERE id = $1 AND mtype = $2",
        )
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::NotFound {
            id: id.to_string(),
            kind: kind.as_str(),
        })?;
        row.try_into()
    }

    async fn read_all_metrics(&self) -> Result<Vec<MetricRecord>, StorageError> {
        let rows =
            sqlx::query_as::<_, MetricRow>("SELECT id, mtype, delta, value, hash FROM rt_metrics")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn save_to_file(&self, path: &Path) -> Result<(), StorageError> {
        let metrics = self.read_all_metrics().await?;
        let data = serde_json::to_vec(&metrics)?;
        tokio::fs::write(path, data)
            .await
            .map_err(|source| StorageError::SnapshotIo {
                path: path.display().to_string(),
                source,
            })
    }

    async fn upload_from_file(&self, path: &Path) -> Result<(), StorageError> {
        let data =
            tokio::fs::read(path)
                .await
                .map_err(|source| StorageError::SnapshotIo {
                    path: path.display().to_string(),
                    source,
                })?;
        let metrics: Vec<MetricRecord> = serde_json::from_slice(&data)?;
        let mut tx = self.pool.begin().await?;
        for record in &metrics {
            match record.kind {
                MetricKind::Gauge => {
                    sqlx::query(
                        r#"INSERT INTO rt_metrics (id, mtype, value, hash)
                           VALUES ($1, $2, $3, $4)
                           ON CONFLICT (id) DO UPDATE
                           SET mtype = excluded.mtype, value = excluded.value, hash = excluded.hash"#,
                    )
                    .bind(&record.id)
                    .bind(record.kind.as_str())
                    .bind(record.value)
                    .bind(&record.hash)
                    .execute(&mut *tx)
                    .await?;
                }
                MetricKind::Counter => {
                    sqlx::query(
                        r#"INSERT INTO rt_metrics (id, mtype, delta, hash)
                           VALUES ($1, $2, $3, $4)
                           ON CONFLICT (id) DO UPDATE
                           SET mtype = excluded.mtype, delta = excluded.delta, hash = excluded.hash"#,
                    )
                    .bind(&record.id)
                    .bind(record.kind.as_str())
                    .bind(record.delta)
                    .bind(&record.hash)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

async fn insert_one(pool: &PgPool, record: &MetricRecord) -> Result<(), StorageError> {
    match record.kind {
        MetricKind::Gauge => {
            sqlx::query(
                r#"INSERT INTO rt_metrics (id, mtype, value, hash)
                   VALUES ($1, $2, $3, $4)
                   ON CONFLICT (id) DO UPDATE
                   SET mtype = excluded.mtype, value = excluded.value, hash = excluded.hash"#,
            )
            .bind(&record.id)
            .bind(record.kind.as_str())
            .bind(record.value)
            .bind(&record.hash)
            .execute(pool)
            .await?;
        }
        MetricKind::Counter => {
            sqlx::query(
                r#"INSERT INTO rt_metrics (id, mtype, delta, hash)
                   VALUES ($1, $2, $3, $4)
                   ON CONFLICT (id) DO UPDATE
                   SET mtype = excluded.mtype, delta = excluded.delta + rt_metrics.delta, hash = excluded.hash"#,
            )
            .bind(&record.id)
            .bind(record.kind.as_str())
            .bind(record.delta)
            .bind(&record.hash)
            .execute(pool)
            .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_row_converts_gauge() {
        let row = MetricRow {
            id: "Alloc".into(),
            mtype: "gauge".into(),
            delta: None,
            value: Some(3.14),
            hash: Some("abc".into()),
        };
        let record: MetricRecord = row.try_into().unwrap();
        assert_eq!(record.kind, MetricKind::Gauge);
        assert_eq!(record.value, Some(3.14));
    }

    #[test]
    fn metric_row_rejects_unknown_mtype() {
        let row = MetricRow {
            id: "X".into(),
            mtype: "histogram".into(),
            delta: None,
            value: None,
            hash: None,
        };
        let err = TryInto::<MetricRecord>::try_into(row).unwrap_err();
        assert_eq!(err.code(), "STORAGE_RECORD_INVALID");
    }
}

