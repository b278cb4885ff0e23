//! ログレコード
//!
//! いずれも書き込み専用で、シリアライズ後は読み戻さない。

use serde::Serialize;
use serde_json::Value;

/// レベル付きログレコード
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: String,
    pub level: &'static str,
    pub actor: String,
    pub action: String,
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    pub environment: String,
}

/// 監査ログレコード（レベル設定に関係なく常に出力）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub record_type: &'static str,
    pub actor: String,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<String>,
    pub outcome: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// 監査レコードの `type` 値
pub const AUDIT_RECORD_TYPE: &str = "AUDIT";
