pub mod auth;
pub mod availability;
pub mod error;
pub mod orders;
pub mod pricing;
pub mod state;

use axum::routing::{get, post, put};
use axum::Router;
use state::AppState;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/v1/orders", post(orders::create_order).get(orders::list_orders))
        .route("/v1/orders/{id}", get(orders::get_order))
        .route("/v1/orders/{id}/lines", put(orders::update_lines))
        .route("/v1/orders/{id}/submit", post(orders::submit_order))
        .route("/v1/orders/{id}/transition", post(orders::transition_order))
        .route("/v1/prices/{item_id}", get(pricing::resolve_price))
        .route("/v1/availability/{item_id}", get(availability::check_availability))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
