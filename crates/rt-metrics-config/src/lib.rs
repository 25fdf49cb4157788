//! Layered CLI/env/config-file configuration for both binaries: flags and
//! environment variables (via `clap`'s `env` feature) take precedence over
//! a JSON config file, which takes precedence over built-in defaults.

pub mod agent;
pub mod duration;
pub mod error;
pub mod file;
pub mod server;

pub use agent::{AgentArgs, AgentConfig};
pub use error::ConfigError;
pub use server::{ServerArgs, ServerConfig};
