//! Host-resident metrics agent: samples runtime/OS metrics on a schedule
//! and reports them to a central server over HTTP and, optionally, a binary
//! RPC leg.

pub mod buffer;
pub mod collectors;
pub mod report;
pub mod scheduler;

pub use buffer::AgentBuffer;
pub use report::Reporter;
pub use scheduler::Scheduler;
