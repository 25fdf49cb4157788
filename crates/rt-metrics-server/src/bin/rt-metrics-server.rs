use clap::Parser;
use rt_metrics_config::{ServerArgs, ServerConfig};
use rt_metrics_server::{build_router, snapshot, AppState};
use rt_metrics_storage::{MemoryStore, MetricStore, PostgresStore};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rt_metrics_telemetry::init_tracing()?;

    let args = ServerArgs::parse();
    let config = ServerConfig::load(args)?;

    let private_key = match &config.crypto_key {
        Some(path) => match rt_metrics_crypto::keys::load_private_key(path) {
            Ok(key) => Some(key),
            Err(e) => {
                error!(error = %e, path = %path.display(), "failed to load private key, exiting");
                return Err(e.into());
            }
        },
        None => None,
    };

    let store: Arc<dyn MetricStore> = match &config.database_dsn {
        Some(dsn) => {
            info!("server starting with postgres store");
            Arc::new(PostgresStore::connect(dsn).await?)
        }
        None => {
            info!("server starting with in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    if config.restore {
        info!(path = %config.store_file.display(), "restoring store from snapshot");
        if let Err(e) = store.upload_from_file(&config.store_file).await {
            error!(error = %e, "snapshot restore failed; continuing with an empty store");
        }
    }

    let sync_snapshot_path = (config.store_interval.is_zero()).then(|| config.store_file.clone());

    let state = Arc::new(AppState {
        store: store.clone(),
        key: config.key.clone(),
        private_key,
        sync_snapshot_path,
    });

    let router = build_router(state.clone(), config.trusted_subnet);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let snapshot_task = if !config.store_interval.is_zero() {
        let store = store.clone();
        let path = config.store_file.clone();
        let interval = config.store_interval;
        let shutdown_rx = shutdown_rx.clone();
        Some(tokio::spawn(snapshot::run(
            store, path, interval, shutdown_rx,
        )))
    } else {
        None
    };

    // The RPC leg binds all interfaces rather than parsing `config.address`'s
    // host part, since that part may be a hostname (e.g. "localhost") that
    // is meaningful for outbound connects but not for a bind address.
    let rpc_task = if config.rpc {
        let state = state.clone();
        let bind_ip = std::net::IpAddr::from([0, 0, 0, 0]);
        Some(tokio::spawn(async move {
            if let Err(e) = rt_metrics_server::rpc::run(state, bind_ip).await {
                error!(error = %e, "rpc listener exited");
            }
        }))
    } else {
        None
    };

    info!(address = %config.address, "server listening");
    let listener = tokio::net::TcpListener::bind(&config.address).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Some(task) = snapshot_task {
        let _ = task.await;
    }
    if let Some(task) = rpc_task {
        task.abort();
    }

    Ok(())
}
