//! 開発用シードツール: テスト用スリップ SLIP-TEST-001 を作成する。

use chrono::{Duration, Utc};
use tracing::info;

use qslip_verify_server::adapter::repository::SlipPostgresRepository;
use qslip_verify_server::domain::entity::Slip;
use qslip_verify_server::domain::repository::SlipRepository;
use qslip_verify_server::infrastructure::logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init_logger("dev", "text");

    let url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL is required"))?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await?;

    let repo = SlipPostgresRepository::new(pool);
    let slip = Slip::new(
        "SLIP-TEST-001",
        Some(Utc::now() + Duration::minutes(5)),
        serde_json::json!({ "source": "seed" }),
    );

    if repo.create_if_absent(&slip).await? {
        info!(code = %slip.code, "created test slip");
    } else {
        info!(code = %slip.code, "test slip already exists, skipped");
    }

    Ok(())
}
