//! Polling/reporting rendezvous, grounded in
//! `original_source/internal/agent/scheduller/scheduller.go`'s `Scheduller`:
//! two tickers broadcast into two condition variables, and `ExitRelease`
//! wakes both once more on shutdown so no worker blocks forever. The Go
//! `sync.Cond` broadcast becomes `tokio::sync::Notify::notify_waiters`; the
//! shutdown signal becomes a `tokio::sync::watch<bool>`, following the
//! `tokio::select!` shape networking's swarm loop uses for its own
//! tick/shutdown race.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};

/// Owns the poll and report cadences and the two wake signals collectors
/// and the reporter wait on.
pub struct Scheduler {
    poll_interval: Duration,
    report_interval: Duration,
    poll_notify: Arc<Notify>,
    report_notify: Arc<Notify>,
    update_allowed: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(poll_interval: Duration, report_interval: Duration) -> Self {
        Scheduler {
            poll_interval,
            report_interval,
            poll_notify: Arc::new(Notify::new()),
            report_notify: Arc::new(Notify::new()),
            update_allowed: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn poll_notify(&self) -> Arc<Notify> {
        self.poll_notify.clone()
    }

    pub fn report_notify(&self) -> Arc<Notify> {
        self.report_notify.clone()
    }

    /// Workers that wake from a notify should check this before acting: once
    /// shutdown has started, `false` means "don't publish a half-sample".
    pub fn update_allowed(&self) -> Arc<AtomicBool> {
        self.update_allowed.clone()
    }

    /// Drive the two tickers until `shutdown` reports `true`, at which point
    /// [`Scheduler::exit_release`] runs and the loop returns.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut poll_ticker = tokio::time::interval(self.poll_interval);
        let mut report_ticker = tokio::time::interval(self.report_interval);
        poll_ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        report_ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = poll_ticker.tick() => {
                    self.poll_notify.notify_waiters();
                }
                _ = report_ticker.tick() => {
                    self.report_notify.notify_waiters();
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        self.exit_release();
                        return;
                    }
                }
            }
        }
    }

    /// Force-wake both condition variables once and mark further updates
    /// disallowed, so a worker blocked on either notify exits instead of
    /// collecting or reporting again.
    pub fn exit_release(&self) {
        self.update_allowed.store(false, Ordering::SeqCst);
        self.poll_notify.notify_waiters();
        self.report_notify.notify_waiters();
    }
}
