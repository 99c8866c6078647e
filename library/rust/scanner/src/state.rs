//! スキャンループの状態定義。

/// ScanState はスキャンループの状態を表す。
///
/// 遷移は `Idle → Scanning → Submitting → Cooldown → Scanning` を基本とし、
/// `Error` には Scanning（カメラなし）または Submitting（通信失敗）から到達する。
/// 手動リセットはどの状態からでも Scanning に戻す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    Submitting,
    Cooldown,
    Error,
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScanState::Idle => "idle",
            ScanState::Scanning => "scanning",
            ScanState::Submitting => "submitting",
            ScanState::Cooldown => "cooldown",
            ScanState::Error => "error",
        };
        f.write_str(s)
    }
}

/// ScanStatus は状態と表示用メッセージの組を表す。
/// watch チャネル経由で UI に配信される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanStatus {
    pub state: ScanState,
    pub message: String,
}

impl ScanStatus {
    pub fn new(state: ScanState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(ScanState::Scanning.to_string(), "scanning");
        assert_eq!(ScanState::Cooldown.to_string(), "cooldown");
    }

    #[test]
    fn test_status_new() {
        let status = ScanStatus::new(ScanState::Error, "No camera found");
        assert_eq!(status.state, ScanState::Error);
        assert_eq!(status.message, "No camera found");
    }
}
