//! 構造化ログの初期化。
//! tracing クレートを使用し、JSON またはテキスト形式の構造化ログを出力する。

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// init_logger は tracing-subscriber を初期化する。
/// 環境に応じてログレベルを設定し、format に応じて出力形式を切り替える。
///
/// - dev: debug
/// - staging: info
/// - prod: warn
///
/// format が "text" の場合はプレーンテキスト出力、それ以外は JSON 出力。
/// RUST_LOG が設定されている場合はそちらを優先する。
pub fn init_logger(env: &str, format: &str) {
    let default_filter = match env {
        "dev" => "debug",
        "staging" => "info",
        _ => "warn",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);

    if format == "text" {
        registry
            .with(fmt::layer().with_target(true))
            .init();
    } else {
        registry
            .with(fmt::layer().json().with_target(true))
            .init();
    }
}
