use axum::{
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapter::handler::AppState;

/// Authorization ヘッダーから Bearer トークンを取り出すヘルパー。
/// 成功した場合はトークン文字列を返す。ヘッダーがない・形式が違う場合は None を返す。
pub fn extract_bearer_token<B>(req: &Request<B>) -> Option<String> {
    let auth_header = req.headers().get(axum::http::header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// auth_middleware は Bearer トークンを検証し、Request extension に
/// AuthenticatedStaff を格納する axum ミドルウェア。
/// トークンが存在しないか無効な場合は 401 を返す。失敗理由は区別しない。
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer_token(&req) {
        Some(t) => t,
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "code": "UNAUTHORIZED",
                    "message": "Missing bearer token"
                })),
            )
                .into_response();
        }
    };

    match state.validate_token_uc.execute(&token).await {
        Ok(staff) => {
            req.extensions_mut().insert(staff);
            next.run(req).await
        }
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "code": "UNAUTHORIZED",
                "message": "Invalid token"
            })),
        )
            .into_response(),
    }
}
