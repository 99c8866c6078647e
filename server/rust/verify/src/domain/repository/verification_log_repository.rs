use async_trait::async_trait;

use crate::domain::entity::VerificationLog;

/// VerificationLogRepository は監査ログの追記専用インターフェース。
/// このコアに読み取り API は不要。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationLogRepository: Send + Sync {
    /// 監査エントリを追記する。
    async fn append(&self, log: &VerificationLog) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_append() {
        let mut mock = MockVerificationLogRepository::new();
        mock.expect_append().returning(|_| Ok(()));

        let log = VerificationLog::new("SLIP-001", "staff-1", "OK", None, None);
        assert!(mock.append(&log).await.is_ok());
    }
}
