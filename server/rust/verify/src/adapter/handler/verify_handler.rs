use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;

use super::AppState;
use crate::domain::entity::AuthenticatedStaff;
use crate::usecase::RedemptionOutcome;

/// POST /queue/verify/{slip_code} のリクエストボディ。
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(default)]
    pub scanner_id: Option<String>,
}

#[utoipa::path(
    post,
    path = "/queue/verify/{slip_code}",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Slip verified"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Caller lacks the required role"),
        (status = 404, description = "Slip not found"),
        (status = 409, description = "Slip already used"),
        (status = 410, description = "Slip expired"),
        (status = 500, description = "Unexpected storage fault"),
    )
)]
pub async fn verify_slip(
    State(state): State<AppState>,
    Path(slip_code): Path<String>,
    Extension(staff): Extension<AuthenticatedStaff>,
    Json(req): Json<VerifyRequest>,
) -> Response {
    match state
        .redeem_slip_uc
        .execute(&slip_code, &staff, req.scanner_id.as_deref())
        .await
    {
        Ok(outcome) => outcome_response(&outcome),
        Err(e) => {
            tracing::error!(slip_code, error = %e, "verify request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "code": "SERVER_ERROR",
                    "message": "An error occurred"
                })),
            )
                .into_response()
        }
    }
}

/// 引換結果を対応するステータスコードとレスポンスボディに写像する。
fn outcome_response(outcome: &RedemptionOutcome) -> Response {
    match outcome {
        RedemptionOutcome::Success { code, used_at } => (
            StatusCode::OK,
            Json(serde_json::json!({
                "code": "OK",
                "message": "Slip verified",
                "slip": { "code": code, "usedAt": used_at }
            })),
        )
            .into_response(),
        RedemptionOutcome::Forbidden => (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "code": "FORBIDDEN",
                "message": "User not authorized to verify slips"
            })),
        )
            .into_response(),
        RedemptionOutcome::InvalidSlip => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "code": "INVALID_SLIP",
                "message": "Slip not found"
            })),
        )
            .into_response(),
        RedemptionOutcome::AlreadyUsed { used_at } => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "code": "ALREADY_USED",
                "message": "This slip has already been used",
                "usedAt": used_at
            })),
        )
            .into_response(),
        RedemptionOutcome::ExpiredSlip { expires_at } => (
            StatusCode::GONE,
            Json(serde_json::json!({
                "code": "EXPIRED_SLIP",
                "message": "Slip expired",
                "expiresAt": expires_at
            })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_success_response_shape() {
        let used_at = Utc::now();
        let response = outcome_response(&RedemptionOutcome::Success {
            code: "SLIP-TEST-001".to_string(),
            used_at,
        });
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["code"], "OK");
        assert_eq!(json["slip"]["code"], "SLIP-TEST-001");
        assert!(json["slip"]["usedAt"].is_string());
    }

    #[tokio::test]
    async fn test_already_used_carries_used_at() {
        let used_at = Utc::now();
        let response = outcome_response(&RedemptionOutcome::AlreadyUsed {
            used_at: Some(used_at),
        });
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let json = body_json(response).await;
        assert_eq!(json["code"], "ALREADY_USED");
        assert!(json["usedAt"].is_string());
    }

    #[tokio::test]
    async fn test_expired_carries_expires_at() {
        let expires_at = Utc::now();
        let response = outcome_response(&RedemptionOutcome::ExpiredSlip { expires_at });
        assert_eq!(response.status(), StatusCode::GONE);

        let json = body_json(response).await;
        assert_eq!(json["code"], "EXPIRED_SLIP");
        assert!(json["expiresAt"].is_string());
    }

    #[tokio::test]
    async fn test_forbidden_and_invalid_statuses() {
        assert_eq!(
            outcome_response(&RedemptionOutcome::Forbidden).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            outcome_response(&RedemptionOutcome::InvalidSlip).status(),
            StatusCode::NOT_FOUND
        );
    }
}
