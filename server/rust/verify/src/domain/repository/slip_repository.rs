use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entity::Slip;

/// SlipRepository はスリップ永続化のインターフェース。
///
/// `mark_used_if_unused` が本システムの正しさを支える唯一の原子操作であり、
/// 実装はストレージ境界の単一の条件付き更新（used フラグの compare-and-swap）
/// として提供しなければならない。アプリケーション側のロックによる
/// read-then-write は許されない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlipRepository: Send + Sync {
    /// コードでスリップを検索する。
    async fn find_by_code(&self, code: &str) -> anyhow::Result<Option<Slip>>;

    /// 未使用の場合に限り used / used_at / used_by を設定し、更新後の
    /// スリップを返す。既に使用済み（または消失）の場合は None。
    /// 同一コードへの並行呼び出しのうち Some を受け取るのは高々 1 つ。
    async fn mark_used_if_unused(
        &self,
        code: &str,
        used_by: &str,
        used_at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Slip>>;

    /// 同一コードが存在しない場合のみ作成する（発行・シード用）。
    /// 作成した場合 true、既存だった場合 false を返す。
    async fn create_if_absent(&self, slip: &Slip) -> anyhow::Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_slip_repository() {
        let mut mock = MockSlipRepository::new();
        mock.expect_find_by_code().returning(|_| Ok(None));

        let result = mock.find_by_code("SLIP-001").await.unwrap();
        assert!(result.is_none());
    }
}
