use clap::Parser;
use rt_metrics_agent::{buffer::AgentBuffer, collectors, report::Reporter, scheduler::Scheduler};
use rt_metrics_config::{AgentArgs, AgentConfig};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use sysinfo::System;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rt_metrics_telemetry::init_tracing()?;

    let args = AgentArgs::parse();
    let config = AgentConfig::load(args)?;

    let public_key = match &config.crypto_key {
        Some(path) => match rt_metrics_crypto::keys::load_public_key(path) {
            Ok(key) => Some(key),
            Err(e) => {
                error!(error = %e, path = %path.display(), "failed to load public key, exiting");
                return Err(e.into());
            }
        },
        None => None,
    };

    info!(address = %config.address, poll_interval = ?config.poll_interval, report_interval = ?config.report_interval, "agent starting");

    let buffer = Arc::new(AgentBuffer::new());
    let scheduler = Arc::new(Scheduler::new(config.poll_interval, config.report_interval));
    let reporter = Arc::new(Reporter::new(
        config.address.clone(),
        config.key.clone(),
        public_key,
        config.rpc,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler_clone = scheduler.clone();
    let scheduler_task = tokio::spawn(async move { scheduler_clone.run(shutdown_rx).await });

    let runtime_task = {
        let buffer = buffer.clone();
        let notify = scheduler.poll_notify();
        let update_allowed = scheduler.update_allowed();
        tokio::spawn(async move {
            let mut system = System::new();
            loop {
                notify.notified().await;
                if !update_allowed.load(Ordering::SeqCst) {
                    return;
                }
                collectors::collect_runtime(&buffer, &mut system);
            }
        })
    };

    let host_task = {
        let buffer = buffer.clone();
        let notify = scheduler.poll_notify();
        let update_allowed = scheduler.update_allowed();
        tokio::spawn(async move {
            let mut system = System::new();
            loop {
                notify.notified().await;
                if !update_allowed.load(Ordering::SeqCst) {
                    return;
                }
                collectors::collect_host(&buffer, &mut system);
            }
        })
    };

    let report_task = {
        let buffer = buffer.clone();
        let notify = scheduler.report_notify();
        let update_allowed = scheduler.update_allowed();
        let batched = config.batched;
        tokio::spawn(async move {
            loop {
                notify.notified().await;
                if !update_allowed.load(Ordering::SeqCst) {
                    return;
                }
                let records = buffer.snapshot();
                if batched {
                    reporter.report_batch(records).await;
                } else {
                    reporter.report_single(records, &update_allowed).await;
                }
            }
        })
    };

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    let _ = scheduler_task.await;
    runtime_task.abort();
    host_task.abort();
    report_task.abort();

    Ok(())
}
