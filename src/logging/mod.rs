//! ログシステム
//!
//! - 診断ログ: `tracing` + `tracing-subscriber`（[`init_tracing`]）
//! - アプリケーションログ/監査ログ: 1行JSONの構造化ロガー（[`Logger`]）。
//!   メタデータは出力前に [`crate::masking`] でマスクされる。

pub mod entry;
pub mod sink;
pub mod structured;

pub use entry::{AuditEntry, LogEntry};
pub use sink::{LogSink, LogStream, MemorySink, StdioSink};
pub use structured::{AuditFields, LogFields, LogLevel, Logger};

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// 診断ログ設定
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// フィルタ式 (例: `info`, `portfolio_guard=debug,tower_http=info`)
    pub filter: String,
    /// JSON形式で出力
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl TracingConfig {
    /// フィルタ式を指定
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// JSON出力制御
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// 診断ログを初期化（stderrへ出力）
///
/// `RUST_LOG` が設定されていればそちらを優先する。
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))?;

    tracing::debug!(filter = %config.filter, json = config.json, "tracing initialized");
    Ok(())
}
