//! 検証ゲートウェイへの送信クライアント。

use serde::Deserialize;

/// VerifyOutcome は 1 回の送信の最終結果を表す。
///
/// 通信失敗も構造化された拒否も等しく「その試行の終端」であり、
/// ループはどの結果でもクールダウン後に再開する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// スリップは受理され使用済みになった。
    Ok { code: String, used_at: String },
    /// ゲートウェイが構造化された理由付きで拒否した（ALREADY_USED など）。
    Rejected { code: String, message: String },
    /// 送信自体が失敗した（接続不可・タイムアウト等）。
    NetworkError(String),
}

impl VerifyOutcome {
    /// 表示用メッセージを整形する。
    pub fn display_message(&self) -> String {
        match self {
            VerifyOutcome::Ok { code, used_at } => {
                format!("Verified: {} at {}", code, used_at)
            }
            VerifyOutcome::Rejected { code, message } => format!("{}: {}", code, message),
            VerifyOutcome::NetworkError(e) => format!("Network error: {}", e),
        }
    }
}

/// VerifyClient はデコード済みペイロードのゲートウェイ送信を抽象化するトレイト。
#[async_trait::async_trait]
pub trait VerifyClient: Send + Sync {
    /// スリップコードを送信し、結果を返す。失敗しない（失敗も結果として返す）。
    async fn submit(&self, slip_code: &str) -> VerifyOutcome;
}

/// ゲートウェイのレスポンスボディ。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    slip: Option<SlipBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlipBody {
    code: String,
    used_at: String,
}

/// HttpVerifyClient は HTTP 経由で検証ゲートウェイに送信するデフォルト実装。
pub struct HttpVerifyClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    scanner_id: String,
}

impl HttpVerifyClient {
    pub fn new(base_url: &str, token: &str, scanner_id: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            scanner_id: scanner_id.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl VerifyClient for HttpVerifyClient {
    async fn submit(&self, slip_code: &str) -> VerifyOutcome {
        let url = format!(
            "{}/queue/verify/{}",
            self.base_url,
            urlencoding::encode(slip_code)
        );

        let result = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "scannerId": self.scanner_id }))
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(slip_code, error = %e, "verify request failed");
                return VerifyOutcome::NetworkError(e.to_string());
            }
        };

        let body: VerifyResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(slip_code, error = %e, "verify response decode failed");
                return VerifyOutcome::NetworkError(e.to_string());
            }
        };

        if body.code == "OK" {
            if let Some(slip) = body.slip {
                return VerifyOutcome::Ok {
                    code: slip.code,
                    used_at: slip.used_at,
                };
            }
        }
        VerifyOutcome::Rejected {
            code: body.code,
            message: body.message,
        }
    }
}
