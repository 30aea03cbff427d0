use axum::http::{HeaderName, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
];

/// CORS layer for the configured origins; `*` or an empty list mirrors the
/// request origin.
pub fn create_cors_layer(allowed_origins: &[String], api_key_header: &str) -> CorsLayer {
    let mut allowed_headers = vec![
        HeaderName::from_static("content-type"),
        HeaderName::from_static("authorization"),
        HeaderName::from_static("x-requested-with"),
        HeaderName::from_static("x-acting-user"),
    ];
    match HeaderName::try_from(api_key_header.to_ascii_lowercase()) {
        Ok(name) => allowed_headers.push(name),
        Err(e) => tracing::warn!("CORS: Invalid API key header '{}': {}", api_key_header, e),
    }

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        tracing::debug!("CORS: Allowing all origins (development mode)");
        return CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(ALLOWED_METHODS)
            .allow_headers(allowed_headers)
            .allow_credentials(true);
    }

    let origins: Vec<_> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS: No valid origins configured, falling back to permissive mode");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(ALLOWED_METHODS)
            .allow_headers(allowed_headers)
            .allow_credentials(false)
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(ALLOWED_METHODS)
            .allow_headers(allowed_headers)
            .allow_credentials(true)
    }
}
