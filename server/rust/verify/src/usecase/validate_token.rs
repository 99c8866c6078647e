use std::sync::Arc;

use crate::domain::entity::AuthenticatedStaff;
use crate::infrastructure::TokenVerifier;

/// ValidateTokenError はトークン検証の失敗を表す。
///
/// 解決できない署名鍵は攻撃者が持ち込んだ偽トークンと呼び出し側からは
/// 区別がつかないため、失敗理由は一切区別しない。詳細は検証器の内部ログに残る。
#[derive(Debug, thiserror::Error)]
pub enum ValidateTokenError {
    #[error("unauthorized")]
    Unauthorized,
}

/// ValidateTokenUseCase は Bearer トークン検証ユースケース。
pub struct ValidateTokenUseCase {
    verifier: Arc<dyn TokenVerifier>,
}

impl ValidateTokenUseCase {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }

    /// トークンを検証し、係員識別を返す。
    pub async fn execute(&self, token: &str) -> Result<AuthenticatedStaff, ValidateTokenError> {
        self.verifier
            .verify_token(token)
            .await
            .map_err(|_| ValidateTokenError::Unauthorized)
    }
}
