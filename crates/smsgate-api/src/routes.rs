//! API routes

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{campaigns, gateways, health, messages, send, webhook};
use crate::AppState;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    // Health check routes
    let health_routes = Router::new()
        .route("/", get(health::health))
        .route("/ready", get(health::readiness));

    // Send routes
    let send_routes = Router::new()
        .route("/", post(send::send_sms))
        .route("/bulk", post(send::send_bulk));

    // Campaign routes
    let campaign_routes = Router::new()
        .route("/", get(campaigns::list_campaigns))
        .route("/", post(campaigns::create_campaign))
        .route("/:campaign_id", get(campaigns::get_campaign))
        .route("/:campaign_id", delete(campaigns::delete_campaign))
        .route("/:campaign_id/messages", get(campaigns::list_campaign_messages))
        .route("/:campaign_id/stats", get(campaigns::get_campaign_stats))
        .route("/:campaign_id/start", post(campaigns::start_campaign))
        .route("/:campaign_id/pause", post(campaigns::pause_campaign))
        .route("/:campaign_id/cancel", post(campaigns::cancel_campaign))
        .route("/:campaign_id/advance", post(campaigns::advance_campaign));

    // Outbox routes
    let outbox_routes = Router::new()
        .route("/", get(messages::list_outbox))
        .route("/:id", delete(messages::delete_outbox));

    // Inbox routes
    let inbox_routes = Router::new()
        .route("/", get(messages::list_inbox))
        .route("/unread", get(messages::unread_count))
        .route("/read-all", post(messages::mark_all_read))
        .route("/:id/read", post(messages::mark_read))
        .route("/:id", delete(messages::delete_inbox));

    // Gateway and port routes
    let gateway_routes = Router::new()
        .route("/", get(gateways::list_gateways))
        .route("/", post(gateways::create_gateway))
        .route("/:id/default", post(gateways::set_default_gateway))
        .route(
            "/:gateway_id/ports/:port_number",
            put(gateways::update_port),
        );

    let api_v1 = Router::new()
        .nest("/send", send_routes)
        .nest("/campaigns", campaign_routes)
        .nest("/outbox", outbox_routes)
        .nest("/inbox", inbox_routes)
        .nest("/gateways", gateway_routes)
        .route("/ports", get(gateways::list_ports))
        .route("/stats", get(gateways::get_stats))
        .route("/settings/spam-interval", put(gateways::set_spam_interval));

    // The hardware webhook keeps its historical path and answers in
    // plain text
    let webhook_routes = Router::new().route(
        "/receive",
        get(webhook::receive).post(webhook::receive),
    );

    Router::new()
        .nest("/health", health_routes)
        .nest("/api/v1", api_v1)
        .nest("/api", webhook_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
