//! ログ出力先

use std::io::Write;
use std::sync::Mutex;

/// 出力ストリーム
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    /// 標準出力 (info, debug, audit)
    Stdout,
    /// 標準エラー (error, warn)
    Stderr,
}

/// 1行単位のログ出力先
///
/// 書き込み失敗はリクエスト処理を止めてはならないため、エラーは返さない。
pub trait LogSink: Send + Sync {
    fn write_line(&self, stream: LogStream, line: &str);
}

/// 標準出力/標準エラーへの出力
#[derive(Debug, Clone, Copy, Default)]
pub struct StdioSink;

impl LogSink for StdioSink {
    fn write_line(&self, stream: LogStream, line: &str) {
        let result = match stream {
            LogStream::Stdout => writeln!(std::io::stdout().lock(), "{}", line),
            LogStream::Stderr => writeln!(std::io::stderr().lock(), "{}", line),
        };
        if let Err(e) = result {
            tracing::debug!(error = %e, "failed to write log line");
        }
    }
}

/// メモリ出力（テスト用）
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(LogStream, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 書き込まれた行
    pub fn lines(&self) -> Vec<(LogStream, String)> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// 書き込まれた行をJSONとして解析（解析できない行は除外）
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.lines()
            .iter()
            .filter_map(|(_, line)| serde_json::from_str(line).ok())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).is_empty()
    }

    pub fn clear(&self) {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, stream: LogStream, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((stream, line.to_string()));
    }
}
