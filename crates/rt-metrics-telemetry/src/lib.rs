//! Structured logging initialization shared by the agent and server
//! binaries, modeled directly on the kernel's own telemetry crate.

pub mod init;

pub use init::init_tracing;
