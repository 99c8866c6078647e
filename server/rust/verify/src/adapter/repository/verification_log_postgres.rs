use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entity::VerificationLog;
use crate::domain::repository::VerificationLogRepository;

/// VerificationLogPostgresRepository は VerificationLogRepository の
/// PostgreSQL 実装。INSERT のみを発行する追記専用リポジトリ。
pub struct VerificationLogPostgresRepository {
    pool: PgPool,
}

impl VerificationLogPostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationLogRepository for VerificationLogPostgresRepository {
    async fn append(&self, log: &VerificationLog) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO verification_logs (id, slip_code, staff_id, result, details, scanner_id, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(log.id)
        .bind(&log.slip_code)
        .bind(&log.staff_id)
        .bind(&log.result)
        .bind(&log.details)
        .bind(&log.scanner_id)
        .bind(log.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
