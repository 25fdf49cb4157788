use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid trusted subnet {raw:?}: {source}")]
    TrustedSubnet {
        raw: String,
        #[source]
        source: ipnetwork::IpNetworkError,
    },
}
