use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use std::time::{Duration, Instant};
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tracing::Instrument;

fn request_id(request: &Request) -> &str {
    request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown")
}

fn log_outcome(status: StatusCode, elapsed: Duration) {
    let duration_ms = elapsed.as_millis() as u64;
    if status.is_server_error() {
        tracing::error!(%status, duration_ms, "request failed");
    } else if status.is_client_error() {
        tracing::warn!(%status, duration_ms, "request rejected");
    } else {
        tracing::info!(%status, duration_ms, "request completed");
    }
}

/// Runs the request inside a span carrying its id, method and uri, and logs
/// the outcome at a level matching the status class.
pub async fn log_request(request: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "request",
        request_id = %request_id(&request),
        method = %request.method(),
        uri = %request.uri(),
    );

    async move {
        let start = Instant::now();
        tracing::debug!("incoming request");
        let response = next.run(request).await;
        log_outcome(response.status(), start.elapsed());
        response
    }
    .instrument(span)
    .await
}

pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}
