//! Canonical metric record shared by the agent, the server, and the wire
//! encoders (`rt-metrics-crypto`'s signing, `rt-metrics-rpc`'s binary frame,
//! and the server's JSON handlers all operate on this single type).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two metric kinds a record can carry. `gauge` stores a last-observed
/// value; `counter` stores a monotonically-accumulated delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

impl std::str::FromStr for MetricKind {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gauge" => Ok(MetricKind::Gauge),
            "counter" => Ok(MetricKind::Counter),
            other => Err(RecordError::WrongType(other.to_string())),
        }
    }
}

/// Errors raised while constructing, validating or interpreting a
/// [`MetricRecord`]. These map 1:1 to the "Input errors" and "Auth errors"
/// categories of the error taxonomy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("unknown metric type: {0}")]
    WrongType(String),
    #[error("record of type {kind} must carry exactly one of value/delta")]
    Malformed { kind: &'static str },
    #[error("failed to parse numeric value {raw:?} for {kind} metric")]
    BadValue { kind: &'static str, raw: String },
}

/// The single wire and storage element: a named, typed metric sample plus
/// an optional HMAC tag.
///
/// `value`/`delta` are serialized as absent (not `null`) when unset, which
/// is the idiomatic Rust rendering of the Go struct's `omitempty` tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl MetricRecord {
    /// Build a gauge record with no hash set.
    pub fn gauge(id: impl Into<String>, value: f64) -> Self {
        MetricRecord {
            id: id.into(),
            kind: MetricKind::Gauge,
            value: Some(value),
            delta: None,
            hash: None,
        }
    }

    /// Build a counter record with no hash set.
    pub fn counter(id: impl Into<String>, delta: i64) -> Self {
        MetricRecord {
            id: id.into(),
            kind: MetricKind::Counter,
            value: None,
            delta: Some(delta),
            hash: None,
        }
    }

    /// Checks the "exactly one of value/delta is set; type agrees"
    /// invariant from spec §3.
    pub fn validate(&self) -> Result<(), RecordError> {
        match self.kind {
            MetricKind::Gauge => {
                if self.value.is_some() && self.delta.is_none() {
                    Ok(())
                } else {
                    Err(RecordError::Malformed { kind: "gauge" })
                }
            }
            MetricKind::Counter => {
                if self.delta.is_some() && self.value.is_none() {
                    Ok(())
                } else {
                    Err(RecordError::Malformed { kind: "counter" })
                }
            }
        }
    }

    /// The canonical signing string from spec §4.1:
    /// `"<id>:gauge:<value %f>"` or `"<id>:counter:<delta>"`.
    ///
    /// Gauge formatting uses six-digit fixed-point (never scientific
    /// notation), matching Go's default `%f` verb so HMAC tags agree
    /// byte-for-byte across implementations.
    pub fn canonical_string(&self) -> Result<String, RecordError> {
        match self.kind {
            MetricKind::Gauge => {
                let v = self
                    .value
                    .ok_or(RecordError::Malformed { kind: "gauge" })?;
                Ok(format!("{}:gauge:{:.6}", self.id, v))
            }
            MetricKind::Counter => {
                let d = self
                    .delta
                    .ok_or(RecordError::Malformed { kind: "counter" })?;
                Ok(format!("{}:counter:{}", self.id, d))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_canonical_string_uses_six_digit_fixed_point() {
        let m = MetricRecord::gauge("Alloc", 3.14);
        assert_eq!(m.canonical_string().unwrap(), "Alloc:gauge:3.140000");
    }

    #[test]
    fn counter_canonical_string_is_plain_decimal() {
        let m = MetricRecord::counter("PollCount", 7);
        assert_eq!(m.canonical_string().unwrap(), "PollCount:counter:7");
    }

    #[test]
    fn negative_counter_delta_has_no_special_formatting() {
        let m = MetricRecord::counter("Drift", -12);
        assert_eq!(m.canonical_string().unwrap(), "Drift:counter:-12");
    }

    #[test]
    fn validate_rejects_gauge_with_delta_set() {
        let mut m = MetricRecord::gauge("Alloc", 1.0);
        m.delta = Some(1);
        assert!(m.validate().is_err());
    }

    #[test]
    fn validate_rejects_counter_without_delta() {
        let m = MetricRecord {
            id: "X".into(),
            kind: MetricKind::Counter,
            value: None,
            delta: None,
            hash: None,
        };
        assert!(m.validate().is_err());
    }

    #[test]
    fn hash_is_omitted_from_json_when_unset() {
        let m = MetricRecord::gauge("Alloc", 3.14);
        let json = serde_json::to_string(&m).unwrap();
        assert!(!json.contains("hash"));
        assert!(!json.contains("delta"));
    }

    #[test]
    fn json_roundtrip_preserves_fields() {
        let mut m = MetricRecord::counter("PollCount", 42);
        m.hash = Some("deadbeef".into());
        let json = serde_json::to_string(&m).unwrap();
        let back: MetricRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }

    #[test]
    fn kind_from_str_rejects_unknown() {
        assert!("bogus".parse::<MetricKind>().is_err());
    }

    proptest::proptest! {
        #[test]
        fn gauge_canonical_string_is_deterministic(v in proptest::num::f64::NORMAL) {
            let a = MetricRecord::gauge("M", v).canonical_string().unwrap();
            let b = MetricRecord::gauge("M", v).canonical_string().unwrap();
            proptest::prop_assert_eq!(a, b);
        }

        #[test]
        fn counter_canonical_string_is_deterministic(d in proptest::num::i64::ANY) {
            let a = MetricRecord::counter("M", d).canonical_string().unwrap();
            let b = MetricRecord::counter("M", d).canonical_string().unwrap();
            proptest::prop_assert_eq!(a, b);
        }
    }
}
