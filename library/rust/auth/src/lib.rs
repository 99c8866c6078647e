//! qslip-auth: 窓口スキャナー向け JWT JWKS 検証ライブラリ
//!
//! リモートのディスカバリエンドポイントから公開鍵を取得して kid 単位で
//! キャッシュし、Bearer トークンの署名・発行者・オーディエンス・有効期限を
//! 検証する。鍵のフェッチは 1 分窓のレート制限で保護される。
//!
//! # 使い方
//!
//! ```ignore
//! use qslip_auth::JwksVerifier;
//!
//! let verifier = JwksVerifier::new(
//!     "https://login.example.com/tenant/discovery/v2.0/keys",
//!     "https://login.example.com/tenant/v2.0",
//!     "qslip-api",
//!     10, // JWKS fetch 回数/分
//! );
//!
//! let claims = verifier.verify_token("eyJ...").await?;
//! ```

pub mod claims;
pub mod verifier;

pub use claims::Claims;
pub use verifier::{AuthError, DefaultJwksFetcher, JwkKey, JwksFetcher, JwksVerifier};

#[cfg(test)]
mod tests;
