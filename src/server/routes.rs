//! Router definition and the permissive CORS the browser upload page needs.

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;

use crate::server::{handlers, AppState};

/// Build the API router.
pub fn create_router(state: &AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/upload", post(handlers::upload_handler))
        .route("/download/:code", get(handlers::download_handler))
        .layer(DefaultBodyLimit::max(state.config.body_limit))
        .layer(middleware::from_fn(cors))
        .with_state(state.clone())
}

/// Allow any origin; the service is meant to be reached from a page served
/// elsewhere. Preflights are answered without touching the handlers.
async fn cors(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(&mut response);
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(&mut response);
    response
}

fn apply_cors_headers(response: &mut Response) {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}
