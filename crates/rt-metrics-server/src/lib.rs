//! Central storage and query server: the HTTP request surface of spec
//! §4.8, the CIDR/decrypt/decompress/compress middleware chain of §4.9,
//! the optional binary RPC listener, and the file-snapshot worker of
//! §4.10 — all sharing one [`state::AppState`] and one [`MetricStore`].

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod rpc;
pub mod snapshot;
pub mod state;

pub use state::AppState;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use ipnetwork::IpNetwork;
use rt_metrics_crypto::RsaPrivateKey;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Build the full axum `Router`, middleware chain included, over `state`.
///
/// Layers are registered innermost-first (`compress` closest to the
/// handlers, `cidr` outermost), so that on the way in a request meets
/// CIDR filter -> decrypt -> decompress -> handler in that order, and on
/// the way out only `compress` (the sole layer that touches the response)
/// does anything before the response reaches the client — exactly the
/// chain spec §4.9 describes. `TraceLayer`/`CatchPanicLayer` wrap the whole
/// chain, the same ambient request-logging pair `http-rpc-gateway` puts
/// outermost in its own `ServiceBuilder` stack.
pub fn build_router(state: Arc<AppState>, trusted_subnet: Option<IpNetwork>) -> Router {
    let private_key: Arc<Option<RsaPrivateKey>> = Arc::new(state.private_key.clone());

    Router::new()
        .route("/", get(handlers::root_handler))
        .route("/ping", get(handlers::ping_handler))
        .route("/value/:type/:name", get(handlers::value_path_handler))
        .route("/value/", post(handlers::value_json_handler))
        .route("/update/", post(handlers::update_handler))
        .route("/updates/", post(handlers::updates_handler))
        .route(
            "/update/:type/:name/:value",
            post(handlers::update_params_handler),
        )
        .route("/update/gauge/", post(handlers::missing_id_handler))
        .route("/update/counter/", post(handlers::missing_id_handler))
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::compress_middleware))
        .layer(axum::middleware::from_fn(middleware::decompress_middleware))
        .layer(from_fn_with_state(private_key, middleware::decrypt_middleware))
        .layer(from_fn_with_state(
            trusted_subnet,
            middleware::cidr_filter_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::new())
                .layer(TraceLayer::new_for_http()),
        )
}
