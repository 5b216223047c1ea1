//! Request logging middleware.
//!
//! Logs method and path before the handler runs, then status and elapsed
//! time after it returns, whatever the outcome. The response passes through
//! untouched.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

pub async fn log_requests(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    info!(%request_id, "Request: {} {}", method, path);

    let response = next.run(req).await;

    info!(
        %request_id,
        "Response: {} returned in {:.2} ms",
        response.status().as_u16(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    response
}
