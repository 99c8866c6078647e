use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entity::Slip;
use crate::domain::repository::SlipRepository;

/// SlipPostgresRepository は SlipRepository の PostgreSQL 実装。
///
/// 使用済み遷移は `WHERE used = false` 付きの単一 UPDATE で行う。
/// 条件と更新が 1 文で原子的に評価されるため、複数プロセスで動かしても
/// 同一コードの並行引換で行を獲得できるのは 1 つだけになる。
pub struct SlipPostgresRepository {
    pool: PgPool,
}

impl SlipPostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlipRepository for SlipPostgresRepository {
    async fn find_by_code(&self, code: &str) -> anyhow::Result<Option<Slip>> {
        let row: Option<SlipRow> = sqlx::query_as(
            r#"
            SELECT code, expires_at, used, used_at, used_by, metadata, created_at
            FROM slips
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn mark_used_if_unused(
        &self,
        code: &str,
        used_by: &str,
        used_at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Slip>> {
        let row: Option<SlipRow> = sqlx::query_as(
            r#"
            UPDATE slips
            SET used = true, used_at = $2, used_by = $3
            WHERE code = $1 AND used = false
            RETURNING code, expires_at, used, used_at, used_by, metadata, created_at
            "#,
        )
        .bind(code)
        .bind(used_at)
        .bind(used_by)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn create_if_absent(&self, slip: &Slip) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO slips (code, expires_at, used, used_at, used_by, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(&slip.code)
        .bind(slip.expires_at)
        .bind(slip.used)
        .bind(slip.used_at)
        .bind(&slip.used_by)
        .bind(&slip.metadata)
        .bind(slip.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// SlipRow は DB から取得した行を表す中間構造体。
#[derive(Debug, sqlx::FromRow)]
struct SlipRow {
    code: String,
    expires_at: Option<DateTime<Utc>>,
    used: bool,
    used_at: Option<DateTime<Utc>>,
    used_by: Option<String>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<SlipRow> for Slip {
    fn from(row: SlipRow) -> Self {
        Slip {
            code: row.code,
            expires_at: row.expires_at,
            used: row.used,
            used_at: row.used_at,
            used_by: row.used_by,
            metadata: row.metadata,
            created_at: row.created_at,
        }
    }
}
