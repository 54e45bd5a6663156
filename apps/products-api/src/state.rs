//! Application state management

use database::postgres::DatabaseConnection;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// PostgreSQL pool; `None` when the catalog is kept in memory
    pub db: Option<DatabaseConnection>,
}
