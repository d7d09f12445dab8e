// routes.rs - public tracking/registration plus the staff-only admin surface
use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use tower_http::trace::TraceLayer;
use serde_json::json;

use crate::{
    handler::{
        auth::auth_handler,
        conversions::conversions_handler,
        registrants::{referrals_handler, registrant_admin_handler, registrants_handler},
        tracking::tracking_handler,
    },
    middleware::auth,
    AppState,
};

// Health check handler
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Staff-only routes (require the allow-list gate)
    let staff_routes = Router::new()
        .nest("/registrants", registrant_admin_handler())
        .nest("/referrals", referrals_handler())
        .nest("/conversions", conversions_handler())
        .layer(middleware::from_fn(auth));

    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/referral-tracking", tracking_handler())
        .nest("/registrants", registrants_handler())
        .merge(staff_routes)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}
