use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::entity::Slip;
use crate::domain::repository::SlipRepository;

/// InMemorySlipRepository は開発・テスト用のインメモリ実装。
///
/// `mark_used_if_unused` は write lock の内側で used フラグを検査して
/// 更新するため、単一プロセス内では PostgreSQL 実装と同じ
/// compare-and-swap 意味論になる。
pub struct InMemorySlipRepository {
    slips: RwLock<HashMap<String, Slip>>,
}

impl InMemorySlipRepository {
    pub fn new() -> Self {
        Self {
            slips: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySlipRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SlipRepository for InMemorySlipRepository {
    async fn find_by_code(&self, code: &str) -> anyhow::Result<Option<Slip>> {
        let slips = self.slips.read().await;
        Ok(slips.get(code).cloned())
    }

    async fn mark_used_if_unused(
        &self,
        code: &str,
        used_by: &str,
        used_at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Slip>> {
        let mut slips = self.slips.write().await;
        let Some(slip) = slips.get_mut(code) else {
            return Ok(None);
        };
        if slip.used {
            return Ok(None);
        }
        slip.used = true;
        slip.used_at = Some(used_at);
        slip.used_by = Some(used_by.to_string());
        Ok(Some(slip.clone()))
    }

    async fn create_if_absent(&self, slip: &Slip) -> anyhow::Result<bool> {
        let mut slips = self.slips.write().await;
        if slips.contains_key(&slip.code) {
            return Ok(false);
        }
        slips.insert(slip.code.clone(), slip.clone());
        Ok(true)
    }
}
