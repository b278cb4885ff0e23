//! 構造化ロガー
//!
//! `error` / `warn` / `info` / `debug` の4レベルと、常に出力される `audit` を提供する。
//! 最小レベル未満の呼び出しはレコードを組み立てずに破棄する。

use super::entry::{AuditEntry, LogEntry, AUDIT_RECORD_TYPE};
use super::sink::{LogSink, LogStream, StdioSink};
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::masking::PiiMasker;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// User-Agent の最大長（文字数）
pub const MAX_USER_AGENT_LEN: usize = 100;

/// actor 未指定時の値
pub const DEFAULT_ACTOR: &str = "system";

/// ログレベル（詳細度の昇順: error < warn < info < debug）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// レコードの `level` 値
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// レコードの `status` 値
    pub fn status(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warning",
            LogLevel::Info => "success",
            LogLevel::Debug => "debug",
        }
    }

    /// `tracing` の EnvFilter 表記
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    fn stream(&self) -> LogStream {
        match self {
            LogLevel::Error | LogLevel::Warn => LogStream::Stderr,
            LogLevel::Info | LogLevel::Debug => LogStream::Stdout,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter())
    }
}

impl FromStr for LogLevel {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown log level: {}",
                other
            ))),
        }
    }
}

/// レベル付きログの入力
#[derive(Debug, Clone, Default)]
pub struct LogFields {
    pub actor: Option<String>,
    pub action: String,
    pub message: String,
    pub metadata: Option<Value>,
}

impl LogFields {
    pub fn new(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            actor: None,
            action: action.into(),
            message: message.into(),
            metadata: None,
        }
    }

    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// 監査ログの入力
#[derive(Debug, Clone, Default)]
pub struct AuditFields {
    pub actor: String,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<String>,
    pub outcome: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// 構造化ロガー
#[derive(Clone)]
pub struct Logger {
    min_level: LogLevel,
    environment: String,
    sink: Arc<dyn LogSink>,
    clock: Arc<dyn Clock>,
    masker: Arc<PiiMasker>,
}

impl Logger {
    pub fn new(
        min_level: LogLevel,
        environment: impl Into<String>,
        sink: Arc<dyn LogSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            min_level,
            environment: environment.into(),
            sink,
            clock,
            masker: Arc::new(PiiMasker::new()),
        }
    }

    /// 設定から作成（標準出力/標準エラー、システム時計）
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.log_level,
            config.environment.clone(),
            Arc::new(StdioSink),
            Arc::new(SystemClock),
        )
    }

    /// マスキングエンジンを差し替え
    pub fn with_masker(mut self, masker: Arc<PiiMasker>) -> Self {
        self.masker = masker;
        self
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// そのレベルが出力対象か
    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.min_level
    }

    pub fn error(&self, fields: LogFields) {
        self.log(LogLevel::Error, fields);
    }

    pub fn warn(&self, fields: LogFields) {
        self.log(LogLevel::Warn, fields);
    }

    pub fn info(&self, fields: LogFields) {
        self.log(LogLevel::Info, fields);
    }

    pub fn debug(&self, fields: LogFields) {
        self.log(LogLevel::Debug, fields);
    }

    /// レベル付きログを出力
    pub fn log(&self, level: LogLevel, fields: LogFields) {
        if !self.enabled(level) {
            return;
        }

        let entry = LogEntry {
            timestamp: self.timestamp(),
            level: level.label(),
            actor: fields.actor.unwrap_or_else(|| DEFAULT_ACTOR.to_string()),
            action: fields.action,
            status: level.status(),
            message: fields.message,
            metadata: fields.metadata.map(|m| self.masker.mask_value(&m)),
            environment: self.environment.clone(),
        };

        self.emit(level.stream(), &entry);
    }

    /// 監査ログを出力（レベル設定に関係なく常に出力）
    pub fn audit(&self, fields: AuditFields) {
        let entry = AuditEntry {
            timestamp: self.timestamp(),
            record_type: AUDIT_RECORD_TYPE,
            actor: self.masker.mask_str(&fields.actor),
            action: fields.action,
            resource: fields.resource,
            resource_id: fields.resource_id,
            outcome: fields.outcome,
            ip: fields.ip.map(|ip| self.masker.mask_str(&ip)),
            user_agent: fields
                .user_agent
                .map(|ua| ua.chars().take(MAX_USER_AGENT_LEN).collect()),
        };

        self.emit(LogStream::Stdout, &entry);
    }

    fn timestamp(&self) -> String {
        self.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn emit<T: Serialize>(&self, stream: LogStream, record: &T) {
        match serde_json::to_string(record) {
            Ok(line) => self.sink.write_line(stream, &line),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize log record");
                let fallback = serde_json::json!({
                    "timestamp": self.timestamp(),
                    "level": "ERROR",
                    "message": "log record could not be serialized",
                });
                self.sink.write_line(LogStream::Stderr, &fallback.to_string());
            }
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .field("environment", &self.environment)
            .finish()
    }
}
