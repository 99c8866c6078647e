pub mod config;
pub mod jwks_adapter;
pub mod logger;

use crate::domain::entity::AuthenticatedStaff;

/// TokenVerifier は Bearer トークン検証を抽象化するトレイト。
/// 失敗理由は内部ログ用であり、呼び出し側の境界では区別せず 401 に丸める。
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify_token(&self, token: &str) -> anyhow::Result<AuthenticatedStaff>;
}

pub use jwks_adapter::JwksVerifierAdapter;
