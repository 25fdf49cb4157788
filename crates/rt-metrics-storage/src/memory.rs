//! In-memory store, grounded in
//! `original_source/internal/server/storage/memstorage.go`'s `MemoryStorage`:
//! two maps behind a single reader/writer lock, gauges overwrite, counters
//! accumulate.

use crate::error::StorageError;
use crate::MetricStore;
use async_trait::async_trait;
use rt_metrics_types::{MetricKind, MetricRecord};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;

#[derive(Default)]
struct Buffers {
    gauges: HashMap<String, f64>,
    counters: HashMap<String, i64>,
}

/// Thread-safe, in-process metric store. Has no persistence of its own
/// beyond the snapshot file the server worker writes through
/// [`MetricStore::save_to_file`].
#[derive(Default)]
pub struct MemoryStore {
    buffers: RwLock<Buffers>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn parse_gauge(raw: &str) -> Result<f64, StorageError> {
    raw.parse().map_err(|_| StorageError::InvalidValue {
        kind: "gauge",
        raw: raw.to_string(),
    })
}

fn parse_counter(raw: &str) -> Result<i64, StorageError> {
    raw.parse().map_err(|_| StorageError::InvalidValue {
        kind: "counter",
        raw: raw.to_string(),
    })
}

#[async_trait]
impl MetricStore for MemoryStore {
    async fn insert_metric(&self, record: MetricRecord) -> Result<(), StorageError> {
        let mut buffers = self.buffers.write().await;
        match record.kind {
            MetricKind::Gauge => {
                let value = record.value.ok_or(StorageError::InvalidValue {
                    kind: "gauge",
                    raw: "<missing value>".to_string(),
                })?;
                buffers.gauges.insert(record.id, value);
            }
            MetricKind::Counter => {
                let delta = record.delta.ok_or(StorageError::InvalidValue {
                    kind: "counter",
                    raw: "<missing delta>".to_string(),
                })?;
                *buffers.counters.entry(record.id).or_insert(0) += delta;
            }
        }
        Ok(())
    }

    async fn insert_batch(&self, records: Vec<MetricRecord>) -> Result<(), StorageError> {
        for record in records {
            self.insert_metric(record).await?;
        }
        Ok(())
    }

    async fn params_update(
        &self,
        kind: MetricKind,
        id: &str,
        raw_value: &str,
    ) -> Result<(), StorageError> {
        let mut buffers = self.buffers.write().await;
        match kind {
            MetricKind::Gauge => {
                buffers.gauges.insert(id.to_string(), parse_gauge(raw_value)?);
            }
            MetricKind::Counter => {
                *buffers.counters.entry(id.to_string()).or_insert(0) += parse_counter(raw_value)?;
            }
        }
        Ok(())
    }

    async fn read_metric(&self, kind: MetricKind, id: &str) -> Result<MetricRecord, StorageError> {
        let buffers = self.buffers.read().await;
        match kind {
            MetricKind::Gauge => buffers
                .gauges
                .get(id)
                .map(|v| MetricRecord::gauge(id, *v))
                .ok_or(StorageError::NotFound {
                    id: id.to_string(),
                    kind: "gauge",
                }),
            MetricKind::Counter => buffers
                .counters
                .get(id)
                .map(|v| MetricRecord::counter(id, *v))
                .ok_or(StorageError::NotFound {
                    id: id.to_string(),
                    kind: "counter",
                }),
        }
    }

    async fn read_all_metrics(&self) -> Result<Vec<MetricRecord>, StorageError> {
        let buffers = self.buffers.read().await;
        let mut out = Vec::with_capacity(buffers.gauges.len() + buffers.counters.len());
        out.extend(
            buffers
                .gauges
                .iter()
                .map(|(id, v)| MetricRecord::gauge(id, *v)),
        );
        out.extend(
            buffers
                .counters
                .iter()
                .map(|(id, v)| MetricRecord::counter(id, *v)),
        );
        Ok(out)
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
        let mut buffers = self.buffers.write().await;
        for record in metrics {
            match record.kind {
                MetricKind::Gauge => {
                    if let Some(value) = record.value {
                        buffers.gauges.insert(record.id, value);
                    }
                }
                MetricKind::Counter => {
                    if let Some(delta) = record.delta {
                        buffers.counters.insert(record.id, delta);
                    }
                }
            }
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Err(StorageError::NoDatabase)
    }
}
