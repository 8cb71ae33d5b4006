mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::SiteConfig;
use crate::db::Database;
use crate::form::ListTypeRegistry;

/// Shared state for every request.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub site: SiteConfig,
    pub list_types: Arc<ListTypeRegistry>,
}

impl AppState {
    pub fn new(db: Database, site: SiteConfig) -> Self {
        Self {
            db,
            site,
            list_types: Arc::new(ListTypeRegistry::default()),
        }
    }
}

pub fn create_router(db: Database, site: SiteConfig) -> Router {
    create_router_with_state(AppState::new(db, site))
}

pub fn create_router_with_state(state: AppState) -> Router {
    let api = Router::new()
        // Activity view
        .route("/modules/{id}/view", get(handlers::view_module))
        // Lists
        .route(
            "/modules/{id}/lists",
            get(handlers::list_lists).post(handlers::submit_list_form),
        )
        .route("/modules/{id}/lists/form", get(handlers::get_list_form))
        .route("/lists/{id}/levels", get(handlers::list_levels))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_login));

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
