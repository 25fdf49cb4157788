//! Server configuration, layered the same way as [`crate::agent::AgentConfig`],
//! grounded in `original_source/config/server/settings/settings.go` plus the
//! trusted-subnet and RPC additions from the external-interfaces section.

use crate::duration::{de_duration_opt, parse_duration};
use crate::error::ConfigError;
use crate::file::load_file;
use clap::Parser;
use ipnetwork::IpNetwork;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ADDRESS: &str = "localhost:8080";
pub const DEFAULT_STORE_FILE: &str = "devops-metrics-db.json";
pub const DEFAULT_STORE_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "rt-metrics-server",
    about = "Central storage and query server for reported metrics"
)]
pub struct ServerArgs {
    /// Address the HTTP listener binds.
    #[arg(short = 'a', long, env = "ADDRESS")]
    pub address: Option<String>,

    /// Restore the store from `store_file` at startup.
    #[arg(short = 'r', long, env = "RESTORE")]
    pub restore: Option<bool>,

    /// Snapshot file path.
    #[arg(short = 'f', long = "store-file", env = "STORE_FILE")]
    pub store_file: Option<PathBuf>,

    /// Snapshot interval; `0` snapshots synchronously on every write.
    #[arg(short = 'i', long = "store-interval", env = "STORE_INTERVAL", value_parser = parse_duration)]
    pub store_interval: Option<Duration>,

    /// HMAC signing key; empty or absent disables verification.
    #[arg(short = 'k', long = "key", env = "KEY")]
    pub key: Option<String>,

    /// Postgres DSN. Absent selects the in-memory store.
    #[arg(short = 'd', long = "database-dsn", env = "DATABASE_DSN")]
    pub database_dsn: Option<String>,

    /// PKCS#8 PEM RSA private key used to decrypt enveloped request bodies.
    #[arg(long = "crypto-key", env = "CRYPTO_KEY")]
    pub crypto_key: Option<PathBuf>,

    /// CIDR subnet allowed to reach the request surface; absent disables
    /// the filter.
    #[arg(short = 't', long = "trusted-subnet", env = "TRUSTED_SUBNET")]
    pub trusted_subnet: Option<String>,

    /// Additionally listen for the binary RPC leg.
    #[arg(short = 'g', long = "rpc", env = "GRPC")]
    pub rpc: Option<bool>,

    /// Path to a lowest-precedence JSON config file.
    #[arg(short = 'c', long, env = "CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    address: Option<String>,
    restore: Option<bool>,
    store_file: Option<PathBuf>,
    #[serde(deserialize_with = "de_duration_opt")]
    store_interval: Option<Duration>,
    key: Option<String>,
    database_dsn: Option<String>,
    crypto_key: Option<PathBuf>,
    trusted_subnet: Option<String>,
    rpc: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: String,
    pub restore: bool,
    pub store_file: PathBuf,
    pub store_interval: Duration,
    pub key: Vec<u8>,
    pub database_dsn: Option<String>,
    pub crypto_key: Option<PathBuf>,
    pub trusted_subnet: Option<IpNetwork>,
    pub rpc: bool,
}

impl ServerConfig {
    pub fn load(args: ServerArgs) -> Result<Self, ConfigError> {
        let file: ServerFileConfig = match &args.config {
            Some(path) => load_file(path)?,
            None => ServerFileConfig::default(),
        };

        let trusted_subnet_raw = args.trusted_subnet.or(file.trusted_subnet);
        let trusted_subnet = trusted_subnet_raw
            .map(|raw| {
                raw.parse::<IpNetwork>()
                    .map_err(|source| ConfigError::TrustedSubnet { raw, source })
            })
            .transpose()?;

        Ok(ServerConfig {
            address: args
                .address
                .or(file.address)
                .unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            restore: args.restore.or(file.restore).unwrap_or(false),
            store_file: args
                .store_file
                .or(file.store_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE)),
            store_interval: args
                .store_interval
                .or(file.store_interval)
                .unwrap_or(DEFAULT_STORE_INTERVAL),
            key: args.key.or(file.key).unwrap_or_default().into_bytes(),
            database_dsn: args.database_dsn.or(file.database_dsn),
            crypto_key: args.crypto_key.or(file.crypto_key),
            trusted_subnet,
            rpc: args.rpc.or(file.rpc).unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_supplied() {
        let cfg = ServerConfig::load(ServerArgs::default()).unwrap();
        assert_eq!(cfg.address, DEFAULT_ADDRESS);
        assert_eq!(cfg.store_interval, DEFAULT_STORE_INTERVAL);
        assert!(!cfg.restore);
        assert!(cfg.trusted_subnet.is_none());
        assert!(cfg.database_dsn.is_none());
    }

    #[test]
    fn trusted_subnet_parses_cidr() {
        let args = ServerArgs {
            trusted_subnet: Some("192.168.0.0/24".to_string()),
            ..Default::default()
        };
        let cfg = ServerConfig::load(args).unwrap();
        let subnet = cfg.trusted_subnet.unwrap();
        assert!(subnet.contains("192.168.0.42".parse().unwrap()));
        assert!(!subnet.contains("10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn invalid_trusted_subnet_is_rejected() {
        let args = ServerArgs {
            trusted_subnet: Some("not-a-cidr".to_string()),
            ..Default::default()
        };
        assert!(ServerConfig::load(args).is_err());
    }

    #[test]
    fn file_layer_fills_gaps_left_by_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.json");
        std::fs::write(
            &path,
            r#"{"database_dsn": "postgres://localhost/rt_metrics", "store_interval": 2000000000}"#,
        )
        .unwrap();
        let args = ServerArgs {
            config: Some(path),
            ..Default::default()
        };
        let cfg = ServerConfig::load(args).unwrap();
        assert_eq!(
            cfg.database_dsn.as_deref(),
            Some("postgres://localhost/rt_metrics")
        );
        assert_eq!(cfg.store_interval, Duration::from_secs(2));
    }
}
