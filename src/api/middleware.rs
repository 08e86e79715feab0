//! Cross-cutting request middleware: request ids and CORS.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer, ExposeHeaders};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id for handler extraction via `Extension`.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Attach a request id (client-supplied or freshly minted) to the request
/// extensions and echo it on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// CORS layer: wildcard origins open everything up; with explicit origins
/// only those origins and the methods the router actually serves are
/// admitted.
pub fn create_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let expose = ExposeHeaders::list([HeaderName::from_static(REQUEST_ID_HEADER)]);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(expose)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(
                allowed_origins
                    .iter()
                    .filter_map(|o| o.parse::<HeaderValue>().ok()),
            ))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
            .expose_headers(expose)
    }
}
