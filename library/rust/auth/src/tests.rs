//! テスト: JWKS 鍵キャッシュ + JWT 検証

use crate::verifier::{AuthError, JwkKey, JwksFetcher, JwksVerifier};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rand::rngs::OsRng;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const TEST_ISSUER: &str = "https://login.example.com/tenant-1/v2.0";
const TEST_AUDIENCE: &str = "qslip-api";
const TEST_KID: &str = "test-key-1";

/// テスト用の RSA 鍵ペアを生成する。
fn generate_test_keypair(kid: &str) -> (RsaPrivateKey, JwkKey) {
    let private_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
    let public_key = private_key.to_public_key();

    let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
    let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());

    let jwk_key = JwkKey {
        kid: kid.into(),
        n,
        e,
    };

    (private_key, jwk_key)
}

/// テスト用の Claims（jsonwebtoken 用のシリアライズ可能な形式）。
#[derive(Serialize)]
struct TestClaims {
    sub: String,
    iss: String,
    aud: String,
    exp: u64,
    iat: u64,
    email: String,
    roles: Vec<String>,
}

fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn default_claims() -> TestClaims {
    let now = now_epoch();
    TestClaims {
        sub: "staff-uuid-1234".into(),
        iss: TEST_ISSUER.into(),
        aud: TEST_AUDIENCE.into(),
        exp: now + 900,
        iat: now,
        email: "hanako.suzuki@example.com".into(),
        roles: vec!["counter".into()],
    }
}

/// 任意のシリアライズ可能な Claims から署名済みトークンを生成する。
fn sign_token<T: Serialize>(private_key: &RsaPrivateKey, kid: &str, claims: &T) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.into());

    let pem = private_key
        .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
        .unwrap();
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();

    encode(&header, claims, &key).unwrap()
}

/// モック JWKS フェッチャー。
struct MockFetcher {
    keys: Vec<JwkKey>,
}

#[async_trait::async_trait]
impl JwksFetcher for MockFetcher {
    async fn fetch_keys(&self, _jwks_url: &str) -> Result<Vec<JwkKey>, AuthError> {
        Ok(self.keys.clone())
    }
}

/// フェッチ回数を記録するフェッチャー。
struct CountingFetcher {
    keys: Vec<JwkKey>,
    count: Arc<tokio::sync::Mutex<u32>>,
}

#[async_trait::async_trait]
impl JwksFetcher for CountingFetcher {
    async fn fetch_keys(&self, _jwks_url: &str) -> Result<Vec<JwkKey>, AuthError> {
        let mut count = self.count.lock().await;
        *count += 1;
        Ok(self.keys.clone())
    }
}

/// 常に失敗するフェッチャー。
struct FailingFetcher;

#[async_trait::async_trait]
impl JwksFetcher for FailingFetcher {
    async fn fetch_keys(&self, _jwks_url: &str) -> Result<Vec<JwkKey>, AuthError> {
        Err(AuthError::JwksFetchFailed("connection refused".into()))
    }
}

fn make_verifier(rpm: u32, fetcher: Arc<dyn JwksFetcher>) -> JwksVerifier {
    JwksVerifier::with_fetcher(
        "https://login.example.com/tenant-1/discovery/v2.0/keys",
        TEST_ISSUER,
        TEST_AUDIENCE,
        rpm,
        fetcher,
    )
}

// --- 検証成功・クレーム抽出 ---

#[tokio::test]
async fn test_verify_token_success() {
    let (priv_key, jwk_key) = generate_test_keypair(TEST_KID);
    let token = sign_token(&priv_key, TEST_KID, &default_claims());

    let verifier = make_verifier(10, Arc::new(MockFetcher { keys: vec![jwk_key] }));

    let claims = verifier.verify_token(&token).await.unwrap();
    assert_eq!(claims.sub, "staff-uuid-1234");
    assert_eq!(claims.iss, TEST_ISSUER);
    assert_eq!(claims.audience(), Some(TEST_AUDIENCE));
    assert!(claims.has_role("counter"));
    assert_eq!(claims.email.as_deref(), Some("hanako.suzuki@example.com"));
}

#[tokio::test]
async fn test_verify_token_single_string_role_claim() {
    let (priv_key, jwk_key) = generate_test_keypair(TEST_KID);
    let now = now_epoch();
    let claims = serde_json::json!({
        "sub": "staff-1",
        "iss": TEST_ISSUER,
        "aud": TEST_AUDIENCE,
        "exp": now + 900,
        "iat": now,
        "roles": "counter",
    });
    let token = sign_token(&priv_key, TEST_KID, &claims);

    let verifier = make_verifier(10, Arc::new(MockFetcher { keys: vec![jwk_key] }));

    let claims = verifier.verify_token(&token).await.unwrap();
    assert_eq!(claims.roles(), &["counter"]);
}

// --- 検証失敗 ---

#[tokio::test]
async fn test_verify_token_expired() {
    let (priv_key, jwk_key) = generate_test_keypair(TEST_KID);
    let mut claims = default_claims();
    claims.exp = now_epoch() - 3600; // 1時間前に期限切れ
    let token = sign_token(&priv_key, TEST_KID, &claims);

    let verifier = make_verifier(10, Arc::new(MockFetcher { keys: vec![jwk_key] }));

    let result = verifier.verify_token(&token).await;
    assert!(matches!(result, Err(AuthError::InvalidToken(_))));
}

#[tokio::test]
async fn test_verify_token_not_yet_valid() {
    let (priv_key, jwk_key) = generate_test_keypair(TEST_KID);
    let now = now_epoch();
    let claims = serde_json::json!({
        "sub": "staff-1",
        "iss": TEST_ISSUER,
        "aud": TEST_AUDIENCE,
        "exp": now + 7200,
        "nbf": now + 3600,
        "iat": now,
    });
    let token = sign_token(&priv_key, TEST_KID, &claims);

    let verifier = make_verifier(10, Arc::new(MockFetcher { keys: vec![jwk_key] }));

    let result = verifier.verify_token(&token).await;
    assert!(matches!(result, Err(AuthError::InvalidToken(_))));
}

#[tokio::test]
async fn test_verify_token_wrong_issuer() {
    let (priv_key, jwk_key) = generate_test_keypair(TEST_KID);
    let mut claims = default_claims();
    claims.iss = "https://login.example.com/other-tenant/v2.0".into();
    let token = sign_token(&priv_key, TEST_KID, &claims);

    let verifier = make_verifier(10, Arc::new(MockFetcher { keys: vec![jwk_key] }));

    let result = verifier.verify_token(&token).await;
    assert!(matches!(result, Err(AuthError::InvalidToken(_))));
}

#[tokio::test]
async fn test_verify_token_wrong_audience() {
    let (priv_key, jwk_key) = generate_test_keypair(TEST_KID);
    let mut claims = default_claims();
    claims.aud = "other-api".into();
    let token = sign_token(&priv_key, TEST_KID, &claims);

    let verifier = make_verifier(10, Arc::new(MockFetcher { keys: vec![jwk_key] }));

    let result = verifier.verify_token(&token).await;
    assert!(matches!(result, Err(AuthError::InvalidToken(_))));
}

#[tokio::test]
async fn test_verify_token_untrusted_key() {
    // JWKS に載っている鍵とは別の秘密鍵で署名されたトークン
    let (_trusted_key, jwk_key) = generate_test_keypair(TEST_KID);
    let (attacker_key, _) = generate_test_keypair(TEST_KID);
    let token = sign_token(&attacker_key, TEST_KID, &default_claims());

    let verifier = make_verifier(10, Arc::new(MockFetcher { keys: vec![jwk_key] }));

    let result = verifier.verify_token(&token).await;
    assert!(matches!(result, Err(AuthError::InvalidToken(_))));
}

#[tokio::test]
async fn test_verify_token_missing_kid() {
    let (priv_key, jwk_key) = generate_test_keypair(TEST_KID);
    let pem = priv_key.to_pkcs1_pem(rsa::pkcs1::LineEnding::LF).unwrap();
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
    // kid なしヘッダー
    let token = encode(&Header::new(Algorithm::RS256), &default_claims(), &key).unwrap();

    let verifier = make_verifier(10, Arc::new(MockFetcher { keys: vec![jwk_key] }));

    let result = verifier.verify_token(&token).await;
    match result {
        Err(AuthError::InvalidToken(msg)) => assert!(msg.contains("kid")),
        other => panic!("unexpected result: {:?}", other),
    }
}

// --- キャッシュ・レート制限 ---

#[tokio::test]
async fn test_cache_hit_skips_fetch() {
    let (priv_key, jwk_key) = generate_test_keypair(TEST_KID);
    let token = sign_token(&priv_key, TEST_KID, &default_claims());

    let count = Arc::new(tokio::sync::Mutex::new(0));
    let verifier = make_verifier(
        10,
        Arc::new(CountingFetcher {
            keys: vec![jwk_key],
            count: count.clone(),
        }),
    );

    verifier.verify_token(&token).await.unwrap();
    verifier.verify_token(&token).await.unwrap();
    verifier.verify_token(&token).await.unwrap();

    assert_eq!(*count.lock().await, 1);
    assert_eq!(verifier.cached_key_count().await, 1);
}

#[tokio::test]
async fn test_unknown_kid_refetches() {
    // 鍵ローテーション: 新しい kid の提示でキャッシュミス → 再フェッチ
    let (old_key, old_jwk) = generate_test_keypair("old-key");
    let (new_key, new_jwk) = generate_test_keypair("new-key");

    let count = Arc::new(tokio::sync::Mutex::new(0));
    let verifier = make_verifier(
        10,
        Arc::new(CountingFetcher {
            keys: vec![old_jwk, new_jwk],
            count: count.clone(),
        }),
    );

    let old_token = sign_token(&old_key, "old-key", &default_claims());
    let new_token = sign_token(&new_key, "new-key", &default_claims());

    verifier.verify_token(&old_token).await.unwrap();
    // 同一ドキュメントの全鍵がキャッシュされるため、new-key は追加フェッチ不要
    verifier.verify_token(&new_token).await.unwrap();

    assert_eq!(*count.lock().await, 1);
    assert_eq!(verifier.cached_key_count().await, 2);
}

#[tokio::test]
async fn test_rate_limited_fetch_fails_fast() {
    let verifier = make_verifier(1, Arc::new(MockFetcher { keys: vec![] }));

    // 1 回目はフェッチ枠を消費し、鍵が見つからず InvalidToken
    let result = verifier.get_signing_key("missing-1").await;
    assert!(matches!(result, Err(AuthError::InvalidToken(_))));

    // 2 回目は窓内の上限超過で RateLimited
    let result = verifier.get_signing_key("missing-2").await;
    assert!(matches!(result, Err(AuthError::RateLimited)));
}

#[tokio::test]
async fn test_fetch_failure_is_distinguishable() {
    let verifier = make_verifier(10, Arc::new(FailingFetcher));

    let result = verifier.get_signing_key("any-kid").await;
    assert!(matches!(result, Err(AuthError::JwksFetchFailed(_))));
}

#[tokio::test]
async fn test_concurrent_misses_fetch_once() {
    let (priv_key, jwk_key) = generate_test_keypair(TEST_KID);
    let token = sign_token(&priv_key, TEST_KID, &default_claims());

    let count = Arc::new(tokio::sync::Mutex::new(0));
    let verifier = Arc::new(make_verifier(
        10,
        Arc::new(CountingFetcher {
            keys: vec![jwk_key],
            count: count.clone(),
        }),
    ));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let verifier = verifier.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            verifier.verify_token(&token).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    // 同時ミスは write lock で直列化され、フェッチは 1 回に収束する
    assert_eq!(*count.lock().await, 1);
}

#[tokio::test]
async fn test_invalidate_cache_forces_refetch() {
    let (priv_key, jwk_key) = generate_test_keypair(TEST_KID);
    let token = sign_token(&priv_key, TEST_KID, &default_claims());

    let count = Arc::new(tokio::sync::Mutex::new(0));
    let verifier = make_verifier(
        10,
        Arc::new(CountingFetcher {
            keys: vec![jwk_key],
            count: count.clone(),
        }),
    );

    verifier.verify_token(&token).await.unwrap();
    verifier.invalidate_cache().await;
    assert_eq!(verifier.cached_key_count().await, 0);

    verifier.verify_token(&token).await.unwrap();
    assert_eq!(*count.lock().await, 2);
}
