//! CRM API router. Mounts every endpoint under /api; everything except login
//! sits behind the bearer-token middleware.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;

use crate::auth::require_auth;
use crate::handlers::{self, ManagementState};

pub fn management_router(state: ManagementState) -> Router {
    let auth = Arc::clone(&state.auth);

    let protected = Router::new()
        // Auth
        .route("/api/auth/me", get(handlers::current_user))
        .route("/api/auth/logout", post(handlers::handle_logout))
        // Customers
        .route("/api/customers", get(handlers::list_customers).post(handlers::create_customer))
        .route("/api/customers/analytics/overview", get(handlers::customer_analytics))
        .route(
            "/api/customers/:id",
            get(handlers::get_customer).put(handlers::update_customer).delete(handlers::delete_customer),
        )
        // Orders
        .route("/api/orders", get(handlers::list_orders).post(handlers::create_order))
        .route("/api/orders/analytics/overview", get(handlers::order_analytics))
        .route("/api/orders/:id", get(handlers::get_order).delete(handlers::delete_order))
        .route("/api/orders/:id/status", patch(handlers::update_order_status))
        // Campaigns
        .route("/api/campaigns", get(handlers::list_campaigns).post(handlers::create_campaign))
        .route("/api/campaigns/preview-audience", post(handlers::preview_audience))
        .route("/api/campaigns/analytics/overview", get(handlers::campaign_analytics))
        .route(
            "/api/campaigns/:id",
            get(handlers::get_campaign).put(handlers::update_campaign).delete(handlers::delete_campaign),
        )
        .route("/api/campaigns/:id/start", post(handlers::start_campaign))
        .route("/api/campaigns/:id/pause", post(handlers::pause_campaign))
        // Segments
        .route("/api/segments/insights", post(handlers::segment_insights))
        // Audit log
        .route("/api/audit-log", get(handlers::audit_log))
        .route_layer(middleware::from_fn_with_state(auth, require_auth));

    Router::new()
        .route("/api/auth/login", post(handlers::handle_login))
        .merge(protected)
        .with_state(state)
}
