use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use qslip_verify_server::adapter::handler::{router, AppState};
use qslip_verify_server::adapter::repository::{
    InMemorySlipRepository, InMemoryVerificationLogRepository, SlipPostgresRepository,
    VerificationLogPostgresRepository,
};
use qslip_verify_server::domain::repository::{SlipRepository, VerificationLogRepository};
use qslip_verify_server::infrastructure::config::Config;
use qslip_verify_server::infrastructure::{logger, JwksVerifierAdapter, TokenVerifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logger
    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    logger::init_logger(&environment, &log_format);

    // Config
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());
    let cfg = Config::load(&config_path)?;

    info!(
        app_name = %cfg.app.name,
        version = %cfg.app.version,
        environment = %cfg.app.environment,
        "starting verify server"
    );

    // Token verifier (JWKS)
    let jwks_verifier = Arc::new(qslip_auth::JwksVerifier::new(
        &cfg.auth.jwks_url,
        &cfg.auth.issuer,
        &cfg.auth.audience,
        cfg.auth.jwks_requests_per_minute,
    ));
    let token_verifier: Arc<dyn TokenVerifier> = Arc::new(JwksVerifierAdapter::new(jwks_verifier));

    // Database pool (optional)
    let db_pool = if let Some(ref db_config) = cfg.database {
        let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| db_config.url.clone());
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .connect(&url)
            .await?;
        info!("database connection pool established");
        Some(pool)
    } else if let Ok(url) = std::env::var("DATABASE_URL") {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&url)
            .await?;
        info!("database connection pool established from DATABASE_URL");
        Some(pool)
    } else {
        info!("no database configured, using in-memory repositories");
        None
    };

    // Slip repository (PostgreSQL or in-memory)
    let slip_repo: Arc<dyn SlipRepository> = if let Some(ref pool) = db_pool {
        Arc::new(SlipPostgresRepository::new(pool.clone()))
    } else {
        Arc::new(InMemorySlipRepository::new())
    };

    // Verification log repository (PostgreSQL or in-memory)
    let audit_repo: Arc<dyn VerificationLogRepository> = if let Some(ref pool) = db_pool {
        Arc::new(VerificationLogPostgresRepository::new(pool.clone()))
    } else {
        Arc::new(InMemoryVerificationLogRepository::new())
    };

    let state = AppState::new(
        token_verifier,
        slip_repo,
        audit_repo,
        cfg.auth.required_role.clone(),
        db_pool,
    );
    let app = router(state);

    let host: std::net::IpAddr = cfg.server.host.parse()?;
    let addr = SocketAddr::from((host, cfg.server.port));
    info!("REST server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
