//! API routes module

pub mod health;
pub mod products;

use axum::{routing::get, Router};

use crate::state::AppState;

/// Create all API routes.
///
/// Product endpoints are served from the root (`/addProduct`, `/products/search`, ...).
pub fn routes(state: &AppState) -> Router {
    Router::new().merge(products::router(state))
}

/// Router with the `/ready` endpoint, which checks the backing store
pub fn ready_router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
