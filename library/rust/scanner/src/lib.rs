//! qslip-scanner: 窓口スキャナーの連続スキャン制御ループ
//!
//! 映像入力デバイスからの QR デコード、検証ゲートウェイへの送信、
//! クールダウン後の再開、という 1 サイクルを明示的な状態機械として駆動する。
//! デコードストリームは送信前に必ず解放され、teardown 時にも
//! CancellationToken 経由で確実に解放される。
//!
//! デコーダ自体はブラックボックスであり、[`CaptureStream`] トレイトの
//! 実装としてアプリケーション側から注入する。

pub mod client;
pub mod device;
pub mod scan_loop;
pub mod state;

pub use client::{HttpVerifyClient, VerifyClient, VerifyOutcome};
pub use device::{CaptureProvider, CaptureStream, ScanError};
pub use scan_loop::ScanLoop;
pub use state::{ScanState, ScanStatus};
