use std::collections::HashSet;

/// 主体が解決できなかった場合の番兵値。
pub const UNKNOWN_STAFF: &str = "unknown";

/// AuthenticatedStaff は検証済みトークンから構築した係員の識別を表す。
/// リクエストごとに生成され、リクエスト完了とともに破棄される（永続化しない）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedStaff {
    /// 安定した主体識別子（トークンの sub クレーム）
    pub subject: String,
    /// 表示用メールアドレス
    pub email: Option<String>,
    /// 正規化済みロール集合
    pub roles: HashSet<String>,
}

impl AuthenticatedStaff {
    /// 指定ロールを保持しているかを返す。
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// 監査記録と used_by に用いる識別子を返す。
    /// フォールバック順は subject → email → "unknown"。
    pub fn staff_id(&self) -> &str {
        if !self.subject.is_empty() {
            return &self.subject;
        }
        if let Some(ref email) = self.email {
            if !email.is_empty() {
                return email;
            }
        }
        UNKNOWN_STAFF
    }
}
