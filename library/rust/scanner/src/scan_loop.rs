//! 連続スキャン制御ループ。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio_util::sync::CancellationToken;

use crate::client::{VerifyClient, VerifyOutcome};
use crate::device::{CaptureProvider, ScanError};
use crate::state::{ScanState, ScanStatus};

/// デフォルトのクールダウン。係員が結果を読む間にカメラを止め、
/// 1 枚のスリップがレンズを横切る間の重複送信を防ぐ。
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(2);

/// デコード待ちの終わり方。
enum DecodeWait {
    Cancelled,
    Reset,
    Decoded(Result<String, ScanError>),
}

/// ScanLoop は decode → submit → cooldown → resume のサイクルを駆動する。
///
/// 不変条件:
/// - アクティブなデコードストリームは常に高々 1 本。
/// - ストリームは Submitting に入る前に必ず解放される。
/// - キャンセル時には保持中のデバイスとクールダウンタイマーが解放される。
/// - どの結果（通信失敗を含む）でもループは停止せず、再開がスケジュールされる。
pub struct ScanLoop {
    provider: Arc<dyn CaptureProvider>,
    client: Arc<dyn VerifyClient>,
    cooldown: Duration,
    status_tx: watch::Sender<ScanStatus>,
    reset: Notify,
}

impl ScanLoop {
    pub fn new(
        provider: Arc<dyn CaptureProvider>,
        client: Arc<dyn VerifyClient>,
        cooldown: Duration,
    ) -> Self {
        let (status_tx, _) = watch::channel(ScanStatus::new(ScanState::Idle, "Scanner idle"));
        Self {
            provider,
            client,
            cooldown,
            status_tx,
            reset: Notify::new(),
        }
    }

    /// 現在の状態を購読するレシーバを返す。
    pub fn status(&self) -> watch::Receiver<ScanStatus> {
        self.status_tx.subscribe()
    }

    /// 手動リセット。アクティブなストリームを止め、クールダウンを
    /// 待たずに Scanning へ戻す。どの状態からでも有効。
    pub fn reset(&self) {
        self.reset.notify_one();
    }

    fn set_status(&self, state: ScanState, message: impl Into<String>) {
        // 購読者がいなくても送信自体は失敗しない設計にする
        let _ = self.status_tx.send(ScanStatus::new(state, message.into()));
    }

    /// ループ本体。`cancel` の発火で停止し、保持資源を解放して戻る。
    pub async fn run(&self, cancel: CancellationToken) {
        self.set_status(ScanState::Scanning, "Point the camera to the QR");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            // --- Scanning: デバイス取得 ---
            let mut stream = match self.provider.open().await {
                Ok(s) => s,
                Err(ScanError::NoCamera) => {
                    self.set_status(ScanState::Error, "No camera found");
                    // 自動リトライしない。Reset か teardown を待つ。
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = self.reset.notified() => {
                            self.set_status(ScanState::Scanning, "Scanner reset");
                            continue;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "capture device open failed");
                    self.set_status(ScanState::Error, format!("Camera error: {}", e));
                    if !self.cooldown_or_stop(&cancel).await {
                        break;
                    }
                    continue;
                }
            };
            self.set_status(ScanState::Scanning, "Point the camera to the QR");

            // --- デコード待ち（キャンセル・リセットと競合させる） ---
            // デコードの future はこのブロックを抜ける時点で破棄され、
            // ストリームへの可変借用もそこで終わる。
            let wait = {
                let next = stream.next_code();
                tokio::pin!(next);
                tokio::select! {
                    _ = cancel.cancelled() => DecodeWait::Cancelled,
                    _ = self.reset.notified() => DecodeWait::Reset,
                    result = &mut next => DecodeWait::Decoded(result),
                }
            };

            // どの経路でも送信前・停止前にストリームを解放する
            drop(stream);

            let code = match wait {
                DecodeWait::Cancelled => break,
                DecodeWait::Reset => {
                    self.set_status(ScanState::Scanning, "Scanner reset");
                    continue;
                }
                DecodeWait::Decoded(Err(e)) => {
                    tracing::warn!(error = %e, "decode stream failed");
                    self.set_status(ScanState::Error, format!("Camera error: {}", e));
                    if !self.cooldown_or_stop(&cancel).await {
                        break;
                    }
                    continue;
                }
                DecodeWait::Decoded(Ok(code)) => code,
            };

            // --- Submitting ---
            self.set_status(ScanState::Submitting, format!("Verifying {}...", code));
            let outcome = self.client.submit(&code).await;

            let state = match outcome {
                VerifyOutcome::NetworkError(_) => ScanState::Error,
                _ => ScanState::Cooldown,
            };
            self.set_status(state, outcome.display_message());

            // --- Cooldown → 再開 ---
            if !self.cooldown_or_stop(&cancel).await {
                break;
            }
        }

        self.set_status(ScanState::Idle, "Scanner stopped");
    }

    /// クールダウンを 1 回待つ。Reset は即座に待ちを打ち切って再開する。
    /// 戻り値 false はキャンセルによる停止要求。
    async fn cooldown_or_stop(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = self.reset.notified() => {
                self.set_status(ScanState::Scanning, "Scanner reset");
                true
            }
            _ = tokio::time::sleep(self.cooldown) => true,
        }
    }
}
