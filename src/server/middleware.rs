//! Middleware applied uniformly to every route: CORS and request logging.

use actix_cors::Cors;
use actix_web::http::{header::HeaderName, Method};
use actix_web::middleware;
use tracing::debug;

use crate::config::CorsSettings;

fn is_wildcard(values: &[String]) -> bool {
    values.is_empty() || values.iter().any(|v| v == "*")
}

/// Build the CORS policy from configuration using actix-cors.
///
/// `"*"` (or an empty list) means "any" for origins, methods and headers.
pub fn build_cors(settings: &CorsSettings) -> Cors {
    let mut cors = Cors::default();

    if is_wildcard(&settings.allowed_origins) {
        cors = cors.allow_any_origin();
    } else {
        for origin in &settings.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    if is_wildcard(&settings.allowed_methods) {
        cors = cors.allow_any_method();
    } else {
        let methods: Vec<Method> = settings
            .allowed_methods
            .iter()
            .filter_map(|m| m.parse().ok())
            .collect();
        cors = cors.allowed_methods(methods);
    }

    if is_wildcard(&settings.allowed_headers) {
        cors = cors.allow_any_header();
    } else {
        let headers: Vec<HeaderName> = settings
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        cors = cors.allowed_headers(headers);
    }

    if settings.allow_credentials {
        cors = cors.supports_credentials();
    }

    debug!(
        origins = ?settings.allowed_origins,
        credentials = settings.allow_credentials,
        "CORS policy configured"
    );

    cors.max_age(settings.max_age)
}

/// Build the request logger middleware.
pub fn request_logger() -> middleware::Logger {
    middleware::Logger::new("%a \"%r\" %s %b %Dms")
}
