use sea_orm::DatabaseConnection;
use tracing::debug;

use crate::common::DatabaseError;

/// Verify the pool can still reach PostgreSQL.
///
/// Used by readiness probes; a failure maps to `503` at the HTTP layer.
pub async fn check_health(db: &DatabaseConnection) -> Result<(), DatabaseError> {
    debug!("Running PostgreSQL health check");

    db.ping()
        .await
        .map_err(|e| DatabaseError::HealthCheckFailed(format!("PostgreSQL ping failed: {e}")))?;

    debug!("PostgreSQL health check passed");
    Ok(())
}
