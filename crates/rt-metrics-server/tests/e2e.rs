//! End-to-end scenarios from spec §8 that need more than one crate wired
//! together: snapshot restore across two store instances, and an encrypted
//! request travelling through the full middleware chain.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use rt_metrics_server::{build_router, AppState};
use rt_metrics_storage::{MemoryStore, MetricStore};
use rt_metrics_types::MetricRecord;
use std::sync::Arc;
use tower::ServiceExt;

fn test_state(store: Arc<dyn MetricStore>, private_key: Option<RsaPrivateKey>) -> Arc<AppState> {
    Arc::new(AppState {
        store,
        key: Vec::new(),
        private_key,
        sync_snapshot_path: None,
    })
}

/// Scenario 5: a store is snapshotted, then a fresh store restores from
/// that file and reports the same two records — counter value 3, not 6,
/// since restore overwrites rather than accumulates.
#[tokio::test]
async fn snapshot_restore_yields_an_equivalent_store() {
    let original: Arc<dyn MetricStore> = Arc::new(MemoryStore::new());
    original
        .insert_metric(MetricRecord::gauge("Alloc", 3.14))
        .await
        .unwrap();
    original
        .insert_metric(MetricRecord::counter("Counter", 3))
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    original.save_to_file(&path).await.unwrap();

    let restored: Arc<dyn MetricStore> = Arc::new(MemoryStore::new());
    restored.upload_from_file(&path).await.unwrap();

    let mut metrics = restored.read_all_metrics().await.unwrap();
    metrics.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0].id, "Alloc");
    assert_eq!(metrics[0].value, Some(3.14));
    assert_eq!(metrics[1].id, "Counter");
    assert_eq!(metrics[1].delta, Some(3));

    // save -> restore -> save produces an identical file.
    let resaved = dir.path().join("resnapshot.json");
    restored.save_to_file(&resaved).await.unwrap();
    let mut first: Vec<MetricRecord> =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    let mut second: Vec<MetricRecord> =
        serde_json::from_slice(&std::fs::read(&resaved).unwrap()).unwrap();
    first.sort_by(|a, b| a.id.cmp(&b.id));
    second.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(first, second);
}

/// Scenario 6: the agent encrypts a multi-chunk request body with the
/// server's public half; the server's decrypt middleware recovers the
/// plaintext and the handler behaves exactly as the unencrypted case.
#[tokio::test]
async fn envelope_encrypted_update_is_decrypted_and_applied() {
    let mut rng = OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, 1024).expect("generate test key");
    let public_key = rsa::RsaPublicKey::from(&private_key);

    let store: Arc<dyn MetricStore> = Arc::new(MemoryStore::new());
    let state = test_state(store, Some(private_key));
    let router = build_router(state, None);

    let record = MetricRecord::gauge("Alloc", 3.14);
    let plaintext = serde_json::to_vec(&record).unwrap();
    let ciphertext = rt_metrics_crypto::envelope::encrypt(&plaintext, &public_key).unwrap();

    let res = router
        .clone()
        .oneshot(
            Request::post("/update/")
                .body(Body::from(ciphertext))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = router
        .oneshot(Request::get("/value/gauge/Alloc").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(String::from_utf8(bytes.to_vec()).unwrap(), "3.14");
}
