//! Readiness check backed by the configured product store.

use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_helpers::server::{run_health_checks, HealthCheckFuture};

/// Readiness check endpoint.
///
/// Pings PostgreSQL when the catalog is stored there; the in-memory store is
/// always reachable.
pub async fn ready_handler(State(state): State<AppState>) -> Response {
    let store: HealthCheckFuture<'_> = match &state.db {
        Some(db) => Box::pin(async move {
            database::postgres::check_health(db)
                .await
                .map_err(|e| e.to_string())
        }),
        None => Box::pin(async { Ok(()) }),
    };

    match run_health_checks(vec![("database", store)]).await {
        Ok((status, json)) => (status, json).into_response(),
        Err((status, json)) => (status, json).into_response(),
    }
}
