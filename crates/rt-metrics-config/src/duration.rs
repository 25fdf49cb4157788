//! Duration parsing shared by flag values and config-file fields. CLI/env
//! durations are always human strings (`"5s"`); config-file durations may
//! additionally be a bare integer, interpreted as nanoseconds, per §6.

use serde::Deserialize;
use std::time::Duration;

/// `clap` value parser for `-p`/`-r`/`-i`-style duration flags.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    humantime::parse_duration(raw).map_err(|e| e.to_string())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DurationRepr {
    Nanos(u64),
    Human(String),
}

/// `serde(deserialize_with)` helper for an `Option<Duration>` config-file
/// field that accepts either a duration string or a bare nanosecond count.
pub fn de_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let repr = DurationRepr::deserialize(deserializer)?;
    match repr {
        DurationRepr::Nanos(n) => Ok(Some(Duration::from_nanos(n))),
        DurationRepr::Human(s) => humantime::parse_duration(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
