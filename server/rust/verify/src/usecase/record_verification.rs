use std::sync::Arc;

use crate::domain::entity::VerificationLog;
use crate::domain::repository::VerificationLogRepository;

/// VerificationRecorder は監査記録ユースケース。
///
/// 監査の失敗が既に確定した引換結果を変えたり遅らせたりしてはならないため、
/// `record` は呼び出し元にエラーを返さない。記録に失敗した判断は
/// 観測ログ（tracing::error）にのみ残る。
pub struct VerificationRecorder {
    audit_repo: Arc<dyn VerificationLogRepository>,
}

impl VerificationRecorder {
    pub fn new(audit_repo: Arc<dyn VerificationLogRepository>) -> Self {
        Self { audit_repo }
    }

    /// 監査エントリを追記する。失敗してもパニックもエラー伝播もしない。
    pub async fn record(
        &self,
        slip_code: &str,
        staff_id: &str,
        result: &str,
        details: Option<serde_json::Value>,
        scanner_id: Option<&str>,
    ) {
        let log = VerificationLog::new(
            slip_code,
            staff_id,
            result,
            details,
            scanner_id.map(String::from),
        );

        if let Err(e) = self.audit_repo.append(&log).await {
            tracing::error!(
                slip_code,
                staff_id,
                result,
                error = %e,
                "failed to append verification log"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::verification_log_repository::MockVerificationLogRepository;

    #[tokio::test]
    async fn test_record_appends_log() {
        let mut mock = MockVerificationLogRepository::new();
        mock.expect_append()
            .withf(|log| {
                log.slip_code == "SLIP-001"
                    && log.staff_id == "staff-1"
                    && log.result == "OK"
                    && log.scanner_id.as_deref() == Some("counter-1")
            })
            .times(1)
            .returning(|_| Ok(()));

        let recorder = VerificationRecorder::new(Arc::new(mock));
        recorder
            .record("SLIP-001", "staff-1", "OK", None, Some("counter-1"))
            .await;
    }

    #[tokio::test]
    async fn test_record_swallows_repository_failure() {
        let mut mock = MockVerificationLogRepository::new();
        mock.expect_append()
            .returning(|_| Err(anyhow::anyhow!("audit store unavailable")));

        let recorder = VerificationRecorder::new(Arc::new(mock));
        // パニックもエラーも起きないこと
        recorder
            .record("SLIP-001", "unknown", "SERVER_ERROR", None, None)
            .await;
    }
}
