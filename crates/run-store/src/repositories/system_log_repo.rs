//! System log repository: append-only audit trail (spec §4.8, §6).

use crate::repositories::run_repo::store_err;
use crate::rows::{log_kind_to_str, SystemLogRow};
use run_core::errors::Result;
use run_core::models::{SystemLog, SystemLogKind};
use sqlx::PgPool;

const LOG_COLUMNS: &str = "id, run_id, kind, message, created_at";

#[derive(Debug, Clone)]
pub struct SystemLogRepository {
    pool: PgPool,
}

impl SystemLogRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn append(
        &self,
        run_id: Option<&str>,
        kind: SystemLogKind,
        message: &str,
    ) -> Result<SystemLog> {
        let row = sqlx::query_as::<_, SystemLogRow>(&format!(
            r"
            INSERT INTO system_logs (run_id, kind, message)
            VALUES ($1, $2, $3)
            RETURNING {LOG_COLUMNS}
            "
        ))
        .bind(run_id)
        .bind(log_kind_to_str(kind))
        .bind(message)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        row.into_domain()
    }
}
