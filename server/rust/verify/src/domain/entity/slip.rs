use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Slip は 1 回限り引換可能なスリップ（引換券）を表すドメインエンティティ。
///
/// 不変条件: `used == true` のとき `used_at` と `used_by` はともに非 null であり、
/// 一度 true になった `used` と一度設定された `used_at` は以後変化しない。
/// この遷移はリポジトリの条件付き更新でのみ行われる。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slip {
    pub code: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by: Option<String>,
    /// 発行元が付与する不透明なメタデータ。コアは解釈しない。
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Slip {
    /// 未使用スリップを作成する（発行・シード用）。
    pub fn new(
        code: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            code: code.into(),
            expires_at,
            used: false,
            used_at: None,
            used_by: None,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// 評価時刻 `at` において期限切れかどうかを返す。期限なしは常に false。
    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        self.expires_at.map(|e| e < at).unwrap_or(false)
    }
}
