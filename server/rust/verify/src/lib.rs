//! qslip-verify-server: スリップ検証ゲートウェイ
//!
//! QR コードに埋め込まれたスリップコードを窓口スキャナーから受け取り、
//! Bearer トークン認証・ロール認可・1 回限りの原子的な引換遷移・監査記録を
//! 行う HTTP サービス。

pub mod adapter;
pub mod domain;
pub mod infrastructure;
pub mod usecase;
