use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::{error, warn};

pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let status = response.status();
    if status.is_server_error() {
        error!("{} {} failed with {}", method, path, status);
    } else if status.is_client_error() {
        warn!("{} {} rejected with {}", method, path, status);
    }

    response
}
