//! JWKS 検証器: 公開鍵を kid 単位でキャッシュし、JWT トークンを検証する。
//!
//! 鍵ローテーションは TTL ではなくキャッシュミス時の再フェッチで追随する。
//! 未知の kid が提示されるたびにディスカバリエンドポイントへ問い合わせるため、
//! フェッチ回数は 1 分窓のレートリミッタで保護する。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use crate::claims::Claims;

/// AuthError は認証エラーを表す。
///
/// `RateLimited` と `JwksFetchFailed` はインフラ障害であり、呼び出し側の
/// 境界では 401 に丸められる（詳細は内部ログにのみ残す）。
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("JWKS fetch failed: {0}")]
    JwksFetchFailed(String),

    #[error("JWKS fetch rate limit exceeded")]
    RateLimited,
}

/// JWKS レスポンスの構造体。
#[derive(Debug, Clone, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

/// 個々の JWK 鍵。
#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    #[allow(dead_code)]
    kty: String,
    n: String,
    e: String,
}

/// JwkKey は取得した JWK 鍵の公開情報。
#[derive(Debug, Clone)]
pub struct JwkKey {
    pub kid: String,
    pub n: String,
    pub e: String,
}

/// JwksFetcher は JWKS エンドポイントからの鍵取得を抽象化するトレイト。
#[async_trait::async_trait]
pub trait JwksFetcher: Send + Sync {
    async fn fetch_keys(&self, jwks_url: &str) -> Result<Vec<JwkKey>, AuthError>;
}

/// DefaultJwksFetcher は HTTP 経由で JWKS を取得するデフォルト実装。
pub struct DefaultJwksFetcher;

#[async_trait::async_trait]
impl JwksFetcher for DefaultJwksFetcher {
    async fn fetch_keys(&self, jwks_url: &str) -> Result<Vec<JwkKey>, AuthError> {
        let resp: JwksResponse = reqwest::get(jwks_url)
            .await
            .map_err(|e| AuthError::JwksFetchFailed(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchFailed(e.to_string()))?;

        Ok(resp
            .keys
            .into_iter()
            .map(|k| JwkKey {
                kid: k.kid,
                n: k.n,
                e: k.e,
            })
            .collect())
    }
}

/// キャッシュ済みの鍵。取得時刻とともに保持する。
struct CachedKey {
    key: JwkKey,
    #[allow(dead_code)]
    fetched_at: Instant,
}

/// 1 分窓のフェッチカウンタ。
struct FetchWindow {
    window_start: Instant,
    count: u32,
}

/// JwksVerifier はディスカバリエンドポイントから公開鍵を取得し、
/// JWT トークンの署名・発行者・オーディエンス・有効期間を検証する。
///
/// プロセス全体で共有するキャッシュとして生成し、リクエストごとに
/// 共有参照で利用する。明示的な破棄は不要。
pub struct JwksVerifier {
    jwks_url: String,
    issuer: String,
    audience: String,
    requests_per_minute: u32,
    cache: Arc<RwLock<HashMap<String, CachedKey>>>,
    fetch_window: Arc<Mutex<FetchWindow>>,
    fetcher: Arc<dyn JwksFetcher>,
}

impl JwksVerifier {
    /// 新しい JwksVerifier を生成する。
    pub fn new(jwks_url: &str, issuer: &str, audience: &str, requests_per_minute: u32) -> Self {
        Self::with_fetcher(
            jwks_url,
            issuer,
            audience,
            requests_per_minute,
            Arc::new(DefaultJwksFetcher),
        )
    }

    /// カスタムフェッチャーを使う JwksVerifier を生成する（テスト用）。
    pub fn with_fetcher(
        jwks_url: &str,
        issuer: &str,
        audience: &str,
        requests_per_minute: u32,
        fetcher: Arc<dyn JwksFetcher>,
    ) -> Self {
        Self {
            jwks_url: jwks_url.to_string(),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            requests_per_minute,
            cache: Arc::new(RwLock::new(HashMap::new())),
            fetch_window: Arc::new(Mutex::new(FetchWindow {
                window_start: Instant::now(),
                count: 0,
            })),
            fetcher,
        }
    }

    /// JWT トークン文字列を検証し、Claims を返す。
    pub async fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("missing kid in header".into()))?;

        let jwk = self.get_signing_key(&kid).await?;

        let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let data = decode::<Claims>(token, &key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        // nbf の検証（exp は decode が検証済み）
        if let Some(nbf) = data.claims.nbf {
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs();
            if nbf > now {
                return Err(AuthError::InvalidToken("token not yet valid".into()));
            }
        }

        Ok(data.claims)
    }

    /// kid に対応する公開鍵を返す。キャッシュミス時はフェッチして補充する。
    pub async fn get_signing_key(&self, kid: &str) -> Result<JwkKey, AuthError> {
        // Read lock でキャッシュを確認
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(kid) {
                return Ok(cached.key.clone());
            }
        }

        // Write lock で再取得。同一 kid への同時ミスはここで直列化され、
        // 後続はダブルチェックでフェッチせずに返る。
        let mut cache = self.cache.write().await;

        if let Some(cached) = cache.get(kid) {
            return Ok(cached.key.clone());
        }

        self.consume_fetch_slot().await?;

        let keys = self.fetcher.fetch_keys(&self.jwks_url).await?;
        let fetched_at = Instant::now();
        for key in keys {
            cache.insert(key.kid.clone(), CachedKey { key, fetched_at });
        }

        cache
            .get(kid)
            .map(|c| c.key.clone())
            .ok_or_else(|| AuthError::InvalidToken(format!("unknown kid: {}", kid)))
    }

    /// フェッチ窓のカウンタを 1 消費する。上限超過時は RateLimited を返す。
    async fn consume_fetch_slot(&self) -> Result<(), AuthError> {
        let mut window = self.fetch_window.lock().await;

        if window.window_start.elapsed() >= Duration::from_secs(60) {
            window.window_start = Instant::now();
            window.count = 0;
        }

        if window.count >= self.requests_per_minute {
            tracing::warn!(
                jwks_url = %self.jwks_url,
                limit = self.requests_per_minute,
                "JWKS fetch rate limit exceeded"
            );
            return Err(AuthError::RateLimited);
        }

        window.count += 1;
        Ok(())
    }

    /// キャッシュを無効化する。鍵の強制ローテーション時に使用。
    pub async fn invalidate_cache(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
    }

    /// キャッシュ済みの鍵数を返す。テスト用ヘルパー。
    pub async fn cached_key_count(&self) -> usize {
        self.cache.read().await.len()
    }
}
