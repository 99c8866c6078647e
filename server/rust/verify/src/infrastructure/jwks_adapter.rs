use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::entity::AuthenticatedStaff;
use crate::infrastructure::TokenVerifier;

/// JwksVerifierAdapter はライブラリの JwksVerifier をサーバーの
/// TokenVerifier に適合させる。
pub struct JwksVerifierAdapter {
    verifier: Arc<qslip_auth::JwksVerifier>,
}

impl JwksVerifierAdapter {
    pub fn new(verifier: Arc<qslip_auth::JwksVerifier>) -> Self {
        Self { verifier }
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifierAdapter {
    async fn verify_token(&self, token: &str) -> anyhow::Result<AuthenticatedStaff> {
        let claims = self.verifier.verify_token(token).await.map_err(|e| {
            // インフラ障害（レート制限・鍵取得失敗）も含め、詳細はここで
            // ログに残す。呼び出し側には理由を区別させない。
            match e {
                qslip_auth::AuthError::RateLimited | qslip_auth::AuthError::JwksFetchFailed(_) => {
                    tracing::warn!(error = %e, "signing key resolution failed");
                }
                qslip_auth::AuthError::InvalidToken(_) => {
                    tracing::debug!(error = %e, "token rejected");
                }
            }
            anyhow::anyhow!("{}", e)
        })?;
        Ok(convert_claims(claims))
    }
}

/// ライブラリの Claims からリクエストスコープの係員識別を構築する。
/// ロールクレームの単一文字列/配列の揺れはライブラリ側で正規化済み。
fn convert_claims(claims: qslip_auth::Claims) -> AuthenticatedStaff {
    AuthenticatedStaff {
        subject: claims.sub.clone(),
        email: claims.email.clone(),
        roles: claims.role_set(),
    }
}
