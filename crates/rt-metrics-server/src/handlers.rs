//! The HTTP request surface of spec §4.8, one handler per route.

use crate::error::AppError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json};
use rt_metrics_types::{MetricKind, MetricRecord};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

/// `GET /` — a full dump of every stored metric, rendered as a small HTML
/// table (spec calls this "full HTML/JSON dump"; HTML is chosen here since
/// every other route already speaks JSON or plain text).
pub async fn root_handler(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let metrics = state.store.read_all_metrics().await?;
    let mut body = String::from("<html><body><table>\n");
    for m in metrics {
        let value = match m.kind {
            MetricKind::Gauge => m.value.map(|v| v.to_string()).unwrap_or_default(),
            MetricKind::Counter => m.delta.map(|d| d.to_string()).unwrap_or_default(),
        };
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            m.id,
            m.kind.as_str(),
            value
        ));
    }
    body.push_str("</table></body></html>");
    Ok(Html(body))
}

/// `GET /ping` — storage healthcheck.
pub async fn ping_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "ping failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// `GET /value/:type/:name` — plain-text current value; 404 if absent or
/// the type path segment is unrecognized.
pub async fn value_path_handler(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<String, AppError> {
    let kind = MetricKind::from_str(&kind)
        .map_err(|_| AppError::NotFound(format!("unknown metric type {kind}")))?;
    let record = state.store.read_metric(kind, &id).await?;
    match record.kind {
        MetricKind::Gauge => Ok(record.value.unwrap_or_default().to_string()),
        MetricKind::Counter => Ok(record.delta.unwrap_or_default().to_string()),
    }
}

#[derive(Deserialize)]
pub struct ValueRequest {
    id: String,
    #[serde(rename = "type")]
    kind: MetricKind,
}

/// `POST /value/` — JSON lookup; response carries a recomputed `hash` when
/// signing is configured.
pub async fn value_json_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ValueRequest>,
) -> Result<Json<MetricRecord>, AppError> {
    let record = state.store.read_metric(payload.kind, &payload.id).await?;
    let record = rt_metrics_crypto::sign::sign(record, &state.key)
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(record))
}

/// `POST /update/` — single signed record; a malformed record (wrong
/// value/delta presence for its type) or a hash mismatch is a client
/// error, not a silent drop (unlike the batch path).
pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    Json(record): Json<MetricRecord>,
) -> Result<StatusCode, AppError> {
    record
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if !state.key.is_empty() && !rt_metrics_crypto::sign::verify(&record, &state.key) {
        return Err(AppError::BadRequest("hash mismatch".to_string()));
    }
    state.store.insert_metric(record).await?;
    state.maybe_sync_snapshot().await?;
    Ok(StatusCode::OK)
}

/// `POST /updates/` — batch insert; records that are malformed or whose
/// hash fails verification are silently dropped rather than rejecting the
/// whole request (spec §7).
pub async fn updates_handler(
    State(state): State<Arc<AppState>>,
    Json(records): Json<Vec<MetricRecord>>,
) -> Result<StatusCode, AppError> {
    let survivors: Vec<MetricRecord> = records
        .into_iter()
        .filter(|r| r.validate().is_ok())
        .filter(|r| state.key.is_empty() || rt_metrics_crypto::sign::verify(r, &state.key))
        .collect();
    // spec.md's batch endpoint documents only 200/500 — no 400 case. Map
    // unconditionally to Internal rather than going through AppError's
    // generic `From<StorageError>`, which would turn a batch-layer
    // `InvalidValue`/`Record` error into a 400 that has no client-visible
    // meaning here (auth failures are already silently dropped above).
    state
        .store
        .insert_batch(survivors)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    state.maybe_sync_snapshot().await?;
    Ok(StatusCode::OK)
}

/// `POST /update/:type/:name/:value` — legacy path-parameter variant,
/// routed into `ParamsUpdate`'s 200/400/501 tri-state.
pub async fn update_params_handler(
    State(state): State<Arc<AppState>>,
    Path((kind, id, raw_value)): Path<(String, String, String)>,
) -> Result<StatusCode, AppError> {
    let kind = MetricKind::from_str(&kind)
        .map_err(|_| AppError::WrongType(format!("unknown metric type {kind}")))?;
    state
        .store
        .params_update(kind, &id, &raw_value)
        .await
        .map_err(|e| match e {
            rt_metrics_storage::StorageError::InvalidValue { .. } => {
                AppError::BadRequest(e.to_string())
            }
            other => AppError::Internal(other.into()),
        })?;
    state.maybe_sync_snapshot().await?;
    Ok(StatusCode::OK)
}

/// `POST /update/gauge/`, `POST /update/counter/` — explicit 404, the id
/// path segment is simply missing from these routes.
pub async fn missing_id_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}
