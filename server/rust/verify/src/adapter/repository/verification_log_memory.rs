use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entity::VerificationLog;
use crate::domain::repository::VerificationLogRepository;

/// InMemoryVerificationLogRepository は開発・テスト用のインメモリ監査ログ。
pub struct InMemoryVerificationLogRepository {
    logs: RwLock<Vec<VerificationLog>>,
}

impl InMemoryVerificationLogRepository {
    pub fn new() -> Self {
        Self {
            logs: RwLock::new(Vec::new()),
        }
    }

    /// 記録済みエントリのスナップショットを返す。テスト用ヘルパー。
    pub async fn entries(&self) -> Vec<VerificationLog> {
        self.logs.read().await.clone()
    }

    /// 記録済みエントリ数を返す。テスト用ヘルパー。
    pub async fn count(&self) -> usize {
        self.logs.read().await.len()
    }
}

impl Default for InMemoryVerificationLogRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VerificationLogRepository for InMemoryVerificationLogRepository {
    async fn append(&self, log: &VerificationLog) -> anyhow::Result<()> {
        self.logs.write().await.push(log.clone());
        Ok(())
    }
}
