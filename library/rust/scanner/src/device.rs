//! 映像入力デバイスの抽象化。

/// ScanError はデバイス取得・デコードに関するエラーを表す。
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// 利用可能な映像入力デバイスが存在しない。
    #[error("no camera found")]
    NoCamera,

    /// デバイスまたはデコードストリームの障害。
    #[error("capture device error: {0}")]
    Device(String),
}

/// CaptureProvider は映像入力デバイスの列挙と取得を抽象化するトレイト。
#[async_trait::async_trait]
pub trait CaptureProvider: Send + Sync {
    /// 最初に見つかったデバイスを開き、デコードストリームを返す。
    /// デバイスが 1 台も無い場合は [`ScanError::NoCamera`]。
    async fn open(&self) -> Result<Box<dyn CaptureStream>, ScanError>;
}

/// CaptureStream は開いたデバイス上のブラックボックス QR デコーダを表す。
///
/// ストリームは drop によってデバイスごと解放される。ループはデコード成功後、
/// 送信に移る前に必ずストリームを drop する。キャンセルを含むすべての
/// 経路でストリームがスコープを抜けるため、デバイスリークは起きない。
#[async_trait::async_trait]
pub trait CaptureStream: Send {
    /// 次に映った QR コードをデコードし、テキストペイロードを返す。
    async fn next_code(&mut self) -> Result<String, ScanError>;
}
