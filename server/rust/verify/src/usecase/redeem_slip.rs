use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::entity::AuthenticatedStaff;
use crate::domain::repository::SlipRepository;
use crate::usecase::record_verification::VerificationRecorder;

/// RedemptionOutcome は引換判断の終端結果を表す。
///
/// いずれもドメイン上の正常な制御フローであり、エラーではない。
/// `result_code` は監査記録と HTTP レスポンスの双方で同じ値を使う。
#[derive(Debug, Clone, PartialEq)]
pub enum RedemptionOutcome {
    Success {
        code: String,
        used_at: DateTime<Utc>,
    },
    Forbidden,
    InvalidSlip,
    AlreadyUsed {
        used_at: Option<DateTime<Utc>>,
    },
    ExpiredSlip {
        expires_at: DateTime<Utc>,
    },
}

impl RedemptionOutcome {
    /// 監査記録・レスポンスボディ共通の結果コードを返す。
    pub fn result_code(&self) -> &'static str {
        match self {
            RedemptionOutcome::Success { .. } => "OK",
            RedemptionOutcome::Forbidden => "FORBIDDEN",
            RedemptionOutcome::InvalidSlip => "INVALID_SLIP",
            RedemptionOutcome::AlreadyUsed { .. } => "ALREADY_USED",
            RedemptionOutcome::ExpiredSlip { .. } => "EXPIRED_SLIP",
        }
    }
}

/// RedeemError は引換処理が結果を確定できなかった障害を表す。
#[derive(Debug, thiserror::Error)]
pub enum RedeemError {
    #[error("storage error: {0}")]
    Storage(String),
}

/// RedeemSlipUseCase はスリップ引換の状態機械を駆動するユースケース。
///
/// 評価順序は固定: 認可 → 存在 → 使用済み → 期限切れ → 原子的遷移。
/// 未使用から使用済みへの遷移はリポジトリの条件付き更新 1 回で行い、
/// 同一コードへの並行試行のうち Success を観測するのは厳密に 1 つ。
/// どの結果も返却前にちょうど 1 回監査記録される。
pub struct RedeemSlipUseCase {
    slip_repo: Arc<dyn SlipRepository>,
    recorder: Arc<VerificationRecorder>,
    required_role: String,
}

impl RedeemSlipUseCase {
    pub fn new(
        slip_repo: Arc<dyn SlipRepository>,
        recorder: Arc<VerificationRecorder>,
        required_role: String,
    ) -> Self {
        Self {
            slip_repo,
            recorder,
            required_role,
        }
    }

    pub async fn execute(
        &self,
        slip_code: &str,
        staff: &AuthenticatedStaff,
        scanner_id: Option<&str>,
    ) -> Result<RedemptionOutcome, RedeemError> {
        let staff_id = staff.staff_id();

        // 認可はスリップ参照より先。スリップ状態には一切触れない。
        if !staff.has_role(&self.required_role) {
            let outcome = RedemptionOutcome::Forbidden;
            self.recorder
                .record(
                    slip_code,
                    staff_id,
                    outcome.result_code(),
                    Some(serde_json::json!({ "note": "missing required role" })),
                    scanner_id,
                )
                .await;
            return Ok(outcome);
        }

        let slip = match self.slip_repo.find_by_code(slip_code).await {
            Ok(slip) => slip,
            Err(e) => {
                return self
                    .storage_failure(slip_code, staff_id, scanner_id, e)
                    .await
            }
        };

        let Some(slip) = slip else {
            let outcome = RedemptionOutcome::InvalidSlip;
            self.recorder
                .record(
                    slip_code,
                    staff_id,
                    outcome.result_code(),
                    Some(serde_json::json!({ "note": "not found" })),
                    scanner_id,
                )
                .await;
            return Ok(outcome);
        };

        if slip.used {
            let outcome = RedemptionOutcome::AlreadyUsed {
                used_at: slip.used_at,
            };
            self.recorder
                .record(
                    slip_code,
                    staff_id,
                    outcome.result_code(),
                    Some(serde_json::json!({ "usedAt": slip.used_at })),
                    scanner_id,
                )
                .await;
            return Ok(outcome);
        }

        let now = Utc::now();
        if slip.is_expired(now) {
            // is_expired は expires_at が Some の場合のみ true を返す
            let expires_at = slip.expires_at.unwrap_or(now);
            let outcome = RedemptionOutcome::ExpiredSlip { expires_at };
            self.recorder
                .record(
                    slip_code,
                    staff_id,
                    outcome.result_code(),
                    Some(serde_json::json!({ "expiresAt": expires_at })),
                    scanner_id,
                )
                .await;
            return Ok(outcome);
        }

        // 条件付き更新。敗者はここで None を受け取り AlreadyUsed を観測する。
        match self
            .slip_repo
            .mark_used_if_unused(slip_code, staff_id, now)
            .await
        {
            Ok(Some(updated)) => {
                let outcome = RedemptionOutcome::Success {
                    code: updated.code.clone(),
                    used_at: updated.used_at.unwrap_or(now),
                };
                self.recorder
                    .record(
                        slip_code,
                        staff_id,
                        outcome.result_code(),
                        Some(serde_json::json!({ "usedBy": updated.used_by })),
                        scanner_id,
                    )
                    .await;
                Ok(outcome)
            }
            Ok(None) => {
                // 競合に敗れた試行。勝者が確定させた used_at を読み直して返す。
                let used_at = self
                    .slip_repo
                    .find_by_code(slip_code)
                    .await
                    .ok()
                    .flatten()
                    .and_then(|s| s.used_at);
                let outcome = RedemptionOutcome::AlreadyUsed { used_at };
                self.recorder
                    .record(
                        slip_code,
                        staff_id,
                        outcome.result_code(),
                        Some(serde_json::json!({ "usedAt": used_at })),
                        scanner_id,
                    )
                    .await;
                Ok(outcome)
            }
            Err(e) => {
                self.storage_failure(slip_code, staff_id, scanner_id, e)
                    .await
            }
        }
    }

    /// ストレージ障害。結果を確定できないが、判断の痕跡は監査に残す。
    async fn storage_failure(
        &self,
        slip_code: &str,
        staff_id: &str,
        scanner_id: Option<&str>,
        e: anyhow::Error,
    ) -> Result<RedemptionOutcome, RedeemError> {
        tracing::error!(slip_code, error = %e, "slip storage failure");
        self.recorder
            .record(
                slip_code,
                staff_id,
                "SERVER_ERROR",
                Some(serde_json::json!({ "error": e.to_string() })),
                scanner_id,
            )
            .await;
        Err(RedeemError::Storage(e.to_string()))
    }
}
