//! HTTP surface
//!
//! Stateless read-only routes over an immutable [`DatasetStore`]. The
//! store is built once before the server starts and shared by every
//! worker through [`web::Data`].

mod middleware;
mod routes;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, HttpServer};
use tracing::info;

use crate::config::{Config, CorsSettings};
use crate::store::{DatasetStore, RouteRegistry};

pub use middleware::{build_cors, request_logger};
pub use routes::not_found;

/// Shared, read-only state behind every handler
#[derive(Debug)]
pub struct AppState {
    pub store: DatasetStore,
    pub registry: RouteRegistry,
    /// Path of the dataset index route
    pub route_prefix: String,
}

impl AppState {
    pub fn new(store: DatasetStore, registry: RouteRegistry, route_prefix: impl Into<String>) -> Self {
        Self {
            store,
            registry,
            route_prefix: route_prefix.into(),
        }
    }

    /// State for `store`, with routes taken from `config`
    pub fn from_config(config: &Config, store: DatasetStore) -> Self {
        Self::new(
            store,
            RouteRegistry::from_config(config),
            config.data.route_prefix.clone(),
        )
    }
}

/// Assemble the application: routes, CORS, request logging, JSON 404s
pub fn build_app(
    state: web::Data<AppState>,
    cors: &CorsSettings,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let routes_state = state.clone();

    App::new()
        .wrap(request_logger())
        .wrap(build_cors(cors))
        .app_data(state)
        .configure(move |cfg| routes::configure(cfg, &routes_state))
        .default_service(web::to(not_found))
}

/// Bind and serve until the process is asked to stop
pub async fn run(config: &Config, state: AppState) -> std::io::Result<()> {
    let state = web::Data::new(state);
    let cors = config.cors.clone();
    let addr = (config.server.host.clone(), config.server.port);

    info!(
        host = %config.server.host,
        port = config.server.port,
        routes = state.registry.len(),
        "starting HTTP server"
    );

    let mut server = HttpServer::new(move || build_app(state.clone(), &cors));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(addr)?.run().await
}
