//! Storage capability for rt-metrics: one [`MetricStore`] trait, two
//! implementors ([`memory::MemoryStore`] and [`postgres::PostgresStore`]),
//! matching `original_source/internal/server/storage`'s split between
//! `MemoryStorage` and `DBStorage` behind its `IStorage` interface.

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use rt_metrics_types::{MetricKind, MetricRecord};
use std::path::Path;

/// The storage capability every backend implements. Mirrors
/// `original_source/internal/server/storage/storage.go`'s `IStorage`
/// interface one-for-one, with the string-typed Go API tightened to
/// `MetricKind` and `&str`/`Path` where Rust's type system lets us.
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Insert or update one metric. Gauges overwrite, counters accumulate.
    async fn insert_metric(&self, record: MetricRecord) -> Result<(), StorageError>;

    /// Insert or update a batch of metrics. Implementors that back onto a
    /// transactional database commit the whole batch atomically.
    async fn insert_batch(&self, records: Vec<MetricRecord>) -> Result<(), StorageError>;

    /// Update a single metric from the path-parameter form
    /// (`/update/:type/:name/:value`), parsing `raw_value` according to
    /// `kind`.
    async fn params_update(
        &self,
        kind: MetricKind,
        id: &str,
        raw_value: &str,
    ) -> Result<(), StorageError>;

    /// Fetch one metric's current value.
    async fn read_metric(&self, kind: MetricKind, id: &str) -> Result<MetricRecord, StorageError>;

    /// Fetch every stored metric.
    async fn read_all_metrics(&self) -> Result<Vec<MetricRecord>, StorageError>;

    /// Serialize every stored metric as a JSON array to `path`.
    async fn save_to_file(&self, path: &Path) -> Result<(), StorageError>;

    /// Restore metrics from a JSON array previously written by
    /// [`MetricStore::save_to_file`]. Both gauges and counters are
    /// overwritten to the persisted value rather than accumulated, so a
    /// restart does not double-count a counter that was already flushed.
    async fn upload_from_file(&self, path: &Path) -> Result<(), StorageError>;

    /// Check connectivity. `MemoryStore` always fails (there is no
    /// database); `PostgresStore` round-trips a trivial query. Neither
    /// implementation panics.
    async fn ping(&self) -> Result<(), StorageError>;
}
