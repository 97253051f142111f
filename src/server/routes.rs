//! Route registration and handlers.
//!
//! Every dataset route is the same handler; the route registry decides
//! which table a matched path serves.

use actix_web::http::header::ContentType;
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::config::HEALTH_ROUTE;
use crate::error::ApiError;
use crate::output::{describe, JsonOutput};

use super::AppState;

/// Register one GET resource per registry entry plus the index and health routes
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    for (path, _) in state.registry.iter() {
        cfg.service(web::resource(path).route(web::get().to(serve_dataset)));
    }

    cfg.service(web::resource(state.route_prefix.as_str()).route(web::get().to(list_datasets)))
        .route(HEALTH_ROUTE, web::get().to(healthcheck));
}

/// Serve every record of the dataset registered for the matched path
async fn serve_dataset(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let pattern = req.match_pattern();
    let path = pattern.as_deref().unwrap_or_else(|| req.path());

    let name = state
        .registry
        .resolve(path)
        .ok_or_else(|| ApiError::NotFound(req.path().to_string()))?;
    let dataset = state.store.dataset(name)?;
    let body = JsonOutput::compact().to_vec(&dataset.table)?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(body))
}

/// Describe the configured datasets
async fn list_datasets(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(describe(&state.store, &state.registry))
}

async fn healthcheck(state: web::Data<AppState>) -> HttpResponse {
    let unavailable = state.store.unavailable_count();
    HttpResponse::Ok().json(json!({
        "status": if unavailable == 0 { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "datasets": state.store.len(),
        "unavailable": unavailable,
    }))
}

/// Fallback for any path not in the registry
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotFound(req.path().to_string()))
}
