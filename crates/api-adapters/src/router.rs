//! Router configuration.

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{health_check, replies, threads, AppState};
use crate::middleware::{cors_policy, security_headers};

/// Builds the full application router.
///
/// # Developer Note
/// The API is nested under `/api` so the binary can mount a front-end at `/b/`
/// (the redirect target of every successful POST) without touching routes here.
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let api = Router::new()
        .route(
            "/threads/{board}",
            get(threads::list_threads)
                .post(threads::create_thread)
                .put(threads::report_thread)
                .delete(threads::delete_thread),
        )
        .route(
            "/replies/{board}",
            get(replies::show_thread)
                .post(replies::create_reply)
                .put(replies::report_reply)
                .delete(replies::delete_reply),
        );

    Router::new()
        .nest("/api", api)
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id())
                // Outside CORS so preflight answers get the headers too.
                .layer(middleware::from_fn(security_headers))
                .layer(cors_policy(cors_origins)),
        )
        .with_state(state)
}
