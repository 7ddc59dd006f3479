pub mod admin;
pub mod booking;
pub mod calendar;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let public: Router<Arc<AppState>> = Router::new()
        .route("/booking/:slug", get(booking::organization_info))
        .route("/booking/:slug/slots", get(booking::available_slots))
        .route("/booking/:slug/book", post(booking::book))
        .route(
            "/booking/:slug/visits/:visit_id",
            get(calendar::download_ics),
        )
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/health", get(health::health))
        .merge(public)
        .route("/api/admin/orgs", post(admin::upsert_organization))
        .route("/api/admin/orgs/:slug/visits", get(admin::list_visits))
        .route("/api/admin/orgs/:slug/clients", get(admin::list_clients))
        .route("/api/admin/orgs/:slug/services", post(admin::create_service))
        .route(
            "/api/admin/visits/:id/status",
            post(admin::update_visit_status),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
