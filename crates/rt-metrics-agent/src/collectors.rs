//! Runtime and host metric collectors. Grounded in
//! `original_source/internal/agent/storage/storage.go::CollectRuntimeMetrics`
//! for the gauge name list, and in spec's host-collector addition
//! (`TotalMemory`/`FreeMemory`/`CPUutilizationN`) for the `sysinfo`-backed
//! half.

use crate::buffer::AgentBuffer;
use rand::Rng;
use sysinfo::System;

/// The 27 fixed gauge names `CollectRuntime` always populates, in the order
/// the Go source assigns them. Rust has no equivalent of `runtime.MemStats`;
/// fields with a believable OS-level analogue are sourced from this
/// process's own memory accounting via `sysinfo`, the rest are reported as
/// `0.0` (documented below) rather than invented.
const RUNTIME_GAUGE_NAMES: &[&str] = &[
    "Alloc",
    "BuckHashSys",
    "Frees",
    "GCCPUFraction",
    "GCSys",
    "HeapAlloc",
    "HeapIdle",
    "HeapInuse",
    "HeapObjects",
    "HeapReleased",
    "HeapSys",
    "LastGC",
    "Lookups",
    "MCacheInuse",
    "MCacheSys",
    "MSpanInuse",
    "MSpanSys",
    "Mallocs",
    "NextGC",
    "NumForcedGC",
    "NumGC",
    "OtherSys",
    "PauseTotalNs",
    "StackInuse",
    "StackSys",
    "Sys",
    "TotalAlloc",
];

/// Populate the 27 runtime gauges plus `RandomValue`, and increment
/// `PollCount`, exactly once per call.
pub fn collect_runtime(buffer: &AgentBuffer, system: &mut System) {
    for &name in RUNTIME_GAUGE_NAMES {
        buffer.set_gauge(name, 0.0);
    }

    if let Some(pid) = sysinfo::get_current_pid().ok() {
        system.refresh_process(pid);
        if let Some(process) = system.process(pid) {
            let resident = process.memory() as f64;
            let virtual_mem = process.virtual_memory() as f64;
            buffer.set_gauge("Alloc", resident);
            buffer.set_gauge("HeapAlloc", resident);
            buffer.set_gauge("HeapInuse", resident);
            buffer.set_gauge("TotalAlloc", resident);
            buffer.set_gauge("Sys", virtual_mem);
            buffer.set_gauge("HeapSys", virtual_mem);
        }
    }

    let random_value: f64 = rand::thread_rng().gen();
    buffer.set_gauge("RandomValue", random_value);
    buffer.add_counter("PollCount", 1);
}

/// Populate `TotalMemory`, `FreeMemory`, and one `CPUutilization<N>` gauge
/// per logical CPU (1-indexed, matching the "N" in the spec's naming).
pub fn collect_host(buffer: &AgentBuffer, system: &mut System) {
    system.refresh_memory();
    system.refresh_cpu_usage();

    buffer.set_gauge("TotalMemory", system.total_memory() as f64);
    buffer.set_gauge("FreeMemory", system.free_memory() as f64);
    for (i, cpu) in system.cpus().iter().enumerate() {
        buffer.set_gauge(format!("CPUutilization{}", i + 1), cpu.cpu_usage() as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_runtime_populates_all_27_gauges_plus_random_value() {
        let buffer = AgentBuffer::new();
        let mut system = System::new();
        collect_runtime(&buffer, &mut system);

        for &name in RUNTIME_GAUGE_NAMES {
            assert!(buffer.gauge(name).is_some(), "missing gauge {name}");
        }
        assert!(buffer.gauge("RandomValue").is_some());
        assert_eq!(buffer.counter("PollCount"), Some(1));
    }

    #[test]
    fn collect_runtime_increments_poll_count_once_per_call() {
        let buffer = AgentBuffer::new();
        let mut system = System::new();
        collect_runtime(&buffer, &mut system);
        collect_runtime(&buffer, &mut system);
        collect_runtime(&buffer, &mut system);
        assert_eq!(buffer.counter("PollCount"), Some(3));
    }

    #[test]
    fn collect_runtime_resamples_random_value_every_call() {
        let buffer = AgentBuffer::new();
        let mut system = System::new();
        collect_runtime(&buffer, &mut system);
        let first = buffer.gauge("RandomValue").unwrap();
        collect_runtime(&buffer, &mut system);
        let second = buffer.gauge("RandomValue").unwrap();
        // Astronomically unlikely to collide; a direct regression check
        // that this isn't cached from the first call.
        assert_ne!(first, second);
    }

    #[test]
    fn collect_host_populates_memory_and_per_cpu_gauges() {
        let buffer = AgentBuffer::new();
        let mut system = System::new();
        collect_host(&buffer, &mut system);
        assert!(buffer.gauge("TotalMemory").is_some());
        assert!(buffer.gauge("FreeMemory").is_some());
    }
}
