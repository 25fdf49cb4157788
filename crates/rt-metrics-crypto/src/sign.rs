//! HMAC-SHA256 signing of [`MetricRecord`]s over the canonical string from
//! spec §4.1. Grounded in `original_source/internal/agent/storage/
//! storage.go::ConvertToMetricsJSON` and the server-side verification in
//! `original_source/internal/server/handlers/handlers.go`.

use hmac::{Hmac, Mac};
use rt_metrics_types::{MetricRecord, RecordError};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

fn tag(canonical: &str, key: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(canonical.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Populate `record.hash` with the HMAC-SHA256 tag of its canonical string.
/// No-op (clears the hash) when `key` is empty, matching the Go source's
/// "empty key disables signing" behavior.
pub fn sign(mut record: MetricRecord, key: &[u8]) -> Result<MetricRecord, RecordError> {
    if key.is_empty() {
        record.hash = None;
        return Ok(record);
    }
    let canonical = record.canonical_string()?;
    record.hash = Some(tag(&canonical, key));
    Ok(record)
}

/// Recompute the HMAC-SHA256 tag for `record` and compare it against
/// `record.hash` in constant time. Returns `false` (not an error) for any
/// record with no hash set, since an absent hash can never match a
/// non-empty key's tag.
pub fn verify(record: &MetricRecord, key: &[u8]) -> bool {
    if key.is_empty() {
        return true;
    }
    let Some(given) = record.hash.as_deref() else {
        return false;
    };
    let Ok(canonical) = record.canonical_string() else {
        return false;
    };
    let expected = tag(&canonical, key);
    let ok = expected.as_bytes().ct_eq(given.as_bytes());
    bool::from(ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let m = MetricRecord::gauge("Alloc", 3.14);
        let signed = sign(m, b"test").unwrap();
        assert!(verify(&signed, b"test"));
    }

    #[test]
    fn verify_fails_with_wrong_key() {
        let m = MetricRecord::gauge("Alloc", 3.14);
        let signed = sign(m, b"test").unwrap();
        assert!(!verify(&signed, b"other"));
    }

    #[test]
    fn verify_fails_on_tampered_value() {
        let m = MetricRecord::gauge("Alloc", 1.0);
        let signed = sign(m, b"test").unwrap();
        let tampered = MetricRecord {
            value: Some(2.0),
            ..signed
        };
        assert!(!verify(&tampered, b"test"));
    }

    #[test]
    fn empty_key_disables_signing() {
        let m = MetricRecord::gauge("Alloc", 3.14);
        let signed = sign(m, b"").unwrap();
        assert!(signed.hash.is_none());
        assert!(verify(&signed, b""));
    }

    #[test]
    fn counter_signing_uses_delta_in_canonical_string() {
        let m = MetricRecord::counter("PollCount", 7);
        let signed = sign(m, b"k").unwrap();
        assert!(verify(&signed, b"k"));
        let mut tampered = signed.clone();
        tampered.delta = Some(8);
        assert!(!verify(&tampered, b"k"));
    }
}
