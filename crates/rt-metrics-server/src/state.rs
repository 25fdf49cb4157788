//! Shared handler state, built once in `main` and cloned (cheaply, via
//! `Arc`) into every axum extractor and the RPC listener.

use rt_metrics_crypto::RsaPrivateKey;
use rt_metrics_storage::MetricStore;
use std::path::PathBuf;
use std::sync::Arc;

pub struct AppState {
    pub store: Arc<dyn MetricStore>,
    /// HMAC signing key; empty disables verification (spec §4.1/§7).
    pub key: Vec<u8>,
    /// Present iff `--crypto-key` was configured; enables the decrypt leg
    /// of the middleware chain.
    pub private_key: Option<RsaPrivateKey>,
    /// `Some(path)` selects synchronous-on-write snapshotting; `None` means
    /// an interval-driven background task owns snapshotting instead.
    pub sync_snapshot_path: Option<PathBuf>,
}

impl AppState {
    /// Snapshot the store to `sync_snapshot_path` if synchronous mode is
    /// configured. Called by every mutating handler after a successful
    /// write, per spec §4.10.
    pub async fn maybe_sync_snapshot(&self) -> Result<(), rt_metrics_storage::StorageError> {
        if let Some(path) = &self.sync_snapshot_path {
            self.store.save_to_file(path).await?;
        }
        Ok(())
    }
}
