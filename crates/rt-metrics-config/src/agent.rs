//! Agent configuration, layered flags > env > config file > defaults, per
//! `original_source/config/agent/settings/settings.go` and its
//! `ParseFromFile` precedence rule.

use crate::duration::{de_duration_opt, parse_duration};
use crate::error::ConfigError;
use crate::file::load_file;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ADDRESS: &str = "localhost:8080";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(4);

/// Raw CLI/env arguments. Every field is `Option` so "not supplied" can be
/// told apart from "supplied as the zero value", which the merge with the
/// config-file layer depends on.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "rt-metrics-agent",
    about = "Host-resident runtime and OS metrics collector"
)]
pub struct AgentArgs {
    /// Server host:port to report to.
    #[arg(short = 'a', long, env = "ADDRESS")]
    pub address: Option<String>,

    /// How often to sample runtime/host metrics.
    #[arg(long = "poll-interval", short = 'p', env = "POLL_INTERVAL", value_parser = parse_duration)]
    pub poll_interval: Option<Duration>,

    /// How often to report the buffer to the server.
    #[arg(long = "report-interval", short = 'r', env = "REPORT_INTERVAL", value_parser = parse_duration)]
    pub report_interval: Option<Duration>,

    /// Send the whole buffer as one batch instead of one record per request.
    #[arg(short = 'b', long, env = "BATCHED")]
    pub batched: Option<bool>,

    /// Additionally report over the binary RPC leg.
    #[arg(short = 'g', long = "rpc", env = "GRPC")]
    pub rpc: Option<bool>,

    /// HMAC signing key; empty or absent disables signing.
    #[arg(short = 'k', long = "key", env = "KEY")]
    pub key: Option<String>,

    /// SSH authorized-key-format RSA public key used to envelope-encrypt
    /// outbound requests.
    #[arg(long = "crypto-key", env = "CRYPTO_KEY")]
    pub crypto_key: Option<PathBuf>,

    /// Path to a lowest-precedence JSON config file.
    #[arg(short = 'c', long, env = "CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AgentFileConfig {
    address: Option<String>,
    #[serde(deserialize_with = "de_duration_opt")]
    poll_interval: Option<Duration>,
    #[serde(deserialize_with = "de_duration_opt")]
    report_interval: Option<Duration>,
    batched: Option<bool>,
    rpc: Option<bool>,
    key: Option<String>,
    crypto_key: Option<PathBuf>,
}

/// Fully resolved agent configuration, after merging flags/env over the
/// config file over built-in defaults.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub address: String,
    pub poll_interval: Duration,
    pub report_interval: Duration,
    pub batched: bool,
    pub rpc: bool,
    pub key: Vec<u8>,
    pub crypto_key: Option<PathBuf>,
}

impl AgentConfig {
    pub fn load(args: AgentArgs) -> Result<Self, ConfigError> {
        let file: AgentFileConfig = match &args.config {
            Some(path) => load_file(path)?,
            None => AgentFileConfig::default(),
        };
        Ok(AgentConfig {
            address: args
                .address
                .or(file.address)
                .unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            poll_interval: args
                .poll_interval
                .or(file.poll_interval)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            report_interval: args
                .report_interval
                .or(file.report_interval)
                .unwrap_or(DEFAULT_REPORT_INTERVAL),
            batched: args.batched.or(file.batched).unwrap_or(false),
            rpc: args.rpc.or(file.rpc).unwrap_or(false),
            key: args.key.or(file.key).unwrap_or_default().into_bytes(),
            crypto_key: args.crypto_key.or(file.crypto_key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_supplied() {
        let cfg = AgentConfig::load(AgentArgs::default()).unwrap();
        assert_eq!(cfg.address, DEFAULT_ADDRESS);
        assert_eq!(cfg.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(cfg.report_interval, DEFAULT_REPORT_INTERVAL);
        assert!(!cfg.batched);
        assert!(cfg.key.is_empty());
    }

    #[test]
    fn flags_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.json");
        std::fs::write(&path, r#"{"address": "from-file:9000", "batched": true}"#).unwrap();

        let args = AgentArgs {
            address: Some("from-flag:9000".to_string()),
            config: Some(path),
            ..Default::default()
        };
        let cfg = AgentConfig::load(args).unwrap();
        assert_eq!(cfg.address, "from-flag:9000");
        // Not overridden by the flag layer, so the file value survives.
        assert!(cfg.batched);
    }

    #[test]
    fn file_duration_field_accepts_plain_seconds_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.json");
        std::fs::write(&path, r#"{"poll_interval": "10s"}"#).unwrap();
        let args = AgentArgs {
            config: Some(path),
            ..Default::default()
        };
        let cfg = AgentConfig::load(args).unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_secs(10));
    }
}
