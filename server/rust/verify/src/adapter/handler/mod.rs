pub mod health;
pub mod verify_handler;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::adapter::middleware::auth::auth_middleware;
use crate::domain::repository::{SlipRepository, VerificationLogRepository};
use crate::infrastructure::TokenVerifier;
use crate::usecase::{RedeemSlipUseCase, ValidateTokenUseCase, VerificationRecorder};

/// AppState はアプリケーション全体の共有状態を表す。
#[derive(Clone)]
pub struct AppState {
    pub validate_token_uc: Arc<ValidateTokenUseCase>,
    pub redeem_slip_uc: Arc<RedeemSlipUseCase>,
    pub db_pool: Option<sqlx::PgPool>,
}

impl AppState {
    pub fn new(
        token_verifier: Arc<dyn TokenVerifier>,
        slip_repo: Arc<dyn SlipRepository>,
        audit_repo: Arc<dyn VerificationLogRepository>,
        required_role: String,
        db_pool: Option<sqlx::PgPool>,
    ) -> Self {
        let recorder = Arc::new(VerificationRecorder::new(audit_repo));
        Self {
            validate_token_uc: Arc::new(ValidateTokenUseCase::new(token_verifier)),
            redeem_slip_uc: Arc::new(RedeemSlipUseCase::new(slip_repo, recorder, required_role)),
            db_pool,
        }
    }
}

/// Build the REST API router.
pub fn router(state: AppState) -> Router {
    // 引換エンドポイントは Bearer トークン検証を通す
    let protected = Router::new()
        .route("/queue/verify/{slip_code}", post(verify_handler::verify_slip))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Public endpoints (no auth required)
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/readyz", get(health::readyz));

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
