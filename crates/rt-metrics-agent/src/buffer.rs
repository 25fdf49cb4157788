//! The agent's in-memory sample buffer: two maps behind a `parking_lot`
//! reader/writer lock, mirroring
//! `original_source/internal/agent/storage/storage.go`'s `MemStorage`
//! shape on the collecting side rather than the serving side.

use parking_lot::RwLock;
use rt_metrics_types::MetricRecord;
use std::collections::HashMap;

#[derive(Default)]
struct Buffers {
    gauges: HashMap<String, f64>,
    counters: HashMap<String, i64>,
}

/// Thread-safe buffer the collectors write into and the reporter drains
/// from. Short, CPU-only critical sections justify a sync lock inside the
/// async collector/reporter tasks, matching the original's `sync.RWMutex`.
#[derive(Default)]
pub struct AgentBuffer {
    buffers: RwLock<Buffers>,
}

impl AgentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_gauge(&self, id: impl Into<String>, value: f64) {
        self.buffers.write().gauges.insert(id.into(), value);
    }

    pub fn add_counter(&self, id: impl Into<String>, delta: i64) {
        *self.buffers.write().counters.entry(id.into()).or_insert(0) += delta;
    }

    pub fn gauge(&self, id: &str) -> Option<f64> {
        self.buffers.read().gauges.get(id).copied()
    }

    pub fn counter(&self, id: &str) -> Option<i64> {
        self.buffers.read().counters.get(id).copied()
    }

    /// Snapshot the whole buffer as a flat list of records, the shape the
    /// reporter sends on the wire.
    pub fn snapshot(&self) -> Vec<MetricRecord> {
        let buffers = self.buffers.read();
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
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_overwrites_counter_accumulates() {
        let buf = AgentBuffer::new();
        buf.set_gauge("Alloc", 1.0);
        buf.set_gauge("Alloc", 2.0);
        buf.add_counter("PollCount", 1);
        buf.add_counter("PollCount", 1);

        assert_eq!(buf.gauge("Alloc"), Some(2.0));
        assert_eq!(buf.counter("PollCount"), Some(2));
    }

    #[test]
    fn snapshot_contains_every_recorded_metric() {
        let buf = AgentBuffer::new();
        buf.set_gauge("Alloc", 1.0);
        buf.add_counter("PollCount", 5);
        let snapshot = buf.snapshot();
        assert_eq!(snapshot.len(), 2);
    }
}
