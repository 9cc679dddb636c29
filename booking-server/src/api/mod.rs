//! HTTP API
//!
//! - [`health`] - 健康检查
//! - [`webhook`] - 网站预订入口

pub mod health;
pub mod webhook;

use axum::Router;
use http::{HeaderName, HeaderValue};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Health API - public route
        .merge(health::router())
        // Website booking form
        .merge(webhook::router())
}

/// Build a fully configured application with middleware and state
pub fn build_app(state: ServerState) -> Router {
    build_router()
        // CORS - any origin may post the booking form
        .layer(CorsLayer::permissive())
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // Propagate request ID to response (inner, sees the generated ID)
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        // Request ID - Generate unique ID for each request (outermost)
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .with_state(state)
}
