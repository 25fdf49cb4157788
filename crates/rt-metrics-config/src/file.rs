use crate::error::ConfigError;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Load and parse a JSON config file, the lowest-precedence layer beneath
/// CLI flags and environment variables.
pub fn load_file<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
        path: path.display().to_string(),
        source,
    })
}
