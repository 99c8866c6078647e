use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// VerificationLog は 1 回の検証判断を記録する監査エントリを表す。
///
/// 追記専用であり、このコアからは更新も削除もしない。`slip_code` は提示された
/// コードそのものを記録するため、実在しないスリップのコードも含まれる。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationLog {
    pub id: Uuid,
    pub slip_code: String,
    pub staff_id: String,
    /// HTTP レスポンスの code と同一の結果コード（OK / FORBIDDEN / ...）
    pub result: String,
    /// 結果固有の不透明ペイロード（{"usedAt": ...} など）。未解釈で保存する。
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    pub scanner_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl VerificationLog {
    /// 新しい監査エントリを作成する。
    pub fn new(
        slip_code: impl Into<String>,
        staff_id: impl Into<String>,
        result: impl Into<String>,
        details: Option<serde_json::Value>,
        scanner_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            slip_code: slip_code.into(),
            staff_id: staff_id.into(),
            result: result.into(),
            details,
            scanner_id,
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_log_new() {
        let log = VerificationLog::new(
            "SLIP-001",
            "staff-1",
            "INVALID_SLIP",
            Some(serde_json::json!({"note": "not found"})),
            Some("counter-1".to_string()),
        );
        assert!(!log.id.is_nil());
        assert_eq!(log.slip_code, "SLIP-001");
        assert_eq!(log.staff_id, "staff-1");
        assert_eq!(log.result, "INVALID_SLIP");
        assert_eq!(log.details.as_ref().unwrap()["note"], "not found");
        assert_eq!(log.scanner_id.as_deref(), Some("counter-1"));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let log = VerificationLog::new("SLIP-001", "staff-1", "OK", None, None);
        let json = serde_json::to_string(&log).unwrap();
        let back: VerificationLog = serde_json::from_str(&json).unwrap();
        assert_eq!(log, back);
    }
}
