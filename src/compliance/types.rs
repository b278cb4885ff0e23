//! Compliance Types
//!
//! 同意・保持ポリシーに関連する型定義

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// 同意の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentType {
    /// お問い合わせフォームの送信内容の処理
    ContactForm,
    /// マーケティング連絡
    Marketing,
    /// アクセス解析
    Analytics,
}

impl ConsentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentType::ContactForm => "contact_form",
            ConsentType::Marketing => "marketing",
            ConsentType::Analytics => "analytics",
        }
    }
}

impl fmt::Display for ConsentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsentType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contact_form" => Ok(ConsentType::ContactForm),
            "marketing" => Ok(ConsentType::Marketing),
            "analytics" => Ok(ConsentType::Analytics),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown consent type: {}",
                other
            ))),
        }
    }
}

/// 同意取得時刻
///
/// フォームからは ISO-8601 文字列か、エポックミリ秒の数値で届く。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConsentTimestamp {
    Text(String),
    EpochMillis(i64),
}

impl ConsentTimestamp {
    /// UTC時刻として解釈（解釈できなければ `None`）
    ///
    /// オフセットなしの日時と日付のみの形式は UTC とみなす。
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        match self {
            ConsentTimestamp::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms),
            ConsentTimestamp::Text(raw) => parse_iso8601(raw.trim()),
        }
    }
}

fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }

    // %.f は小数部なしも受け付ける
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl From<&str> for ConsentTimestamp {
    fn from(raw: &str) -> Self {
        ConsentTimestamp::Text(raw.to_string())
    }
}

impl From<String> for ConsentTimestamp {
    fn from(raw: String) -> Self {
        ConsentTimestamp::Text(raw)
    }
}

impl<'de> Deserialize<'de> for ConsentTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(raw) => ConsentTimestamp::Text(raw),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
                .map(ConsentTimestamp::EpochMillis)
                .unwrap_or_else(|| ConsentTimestamp::Text(n.to_string())),
            // 想定外の型は解釈不能な時刻として残す
            other => ConsentTimestamp::Text(other.to_string()),
        })
    }
}

/// 同意フラグを真偽値として読む
///
/// チェックボックスの `"on"` なども同意とみなす。
/// 空文字・0・`null`・`false` は未同意。
fn truthy_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::Bool(b) => Some(b),
        Value::String(s) => Some(!s.is_empty()),
        Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan())),
        Value::Array(_) | Value::Object(_) => Some(true),
    })
}

/// フォームから送信された同意データ
///
/// 例: `{"contact_form": true, "marketing": false, "timestamp": "2026-01-05T10:00:00.000Z"}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentData {
    #[serde(
        default,
        deserialize_with = "truthy_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_form: Option<bool>,
    #[serde(
        default,
        deserialize_with = "truthy_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub marketing: Option<bool>,
    #[serde(
        default,
        deserialize_with = "truthy_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub analytics: Option<bool>,
    /// 同意取得時刻
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<ConsentTimestamp>,
}

impl ConsentData {
    /// 指定種別の同意が与えられているか（未指定は `false`）
    pub fn is_given(&self, consent_type: ConsentType) -> bool {
        let flag = match consent_type {
            ConsentType::ContactForm => self.contact_form,
            ConsentType::Marketing => self.marketing,
            ConsentType::Analytics => self.analytics,
        };
        flag.unwrap_or(false)
    }

    /// 指定種別の同意を設定
    pub fn with(mut self, consent_type: ConsentType, given: bool) -> Self {
        let slot = match consent_type {
            ConsentType::ContactForm => &mut self.contact_form,
            ConsentType::Marketing => &mut self.marketing,
            ConsentType::Analytics => &mut self.analytics,
        };
        *slot = Some(given);
        self
    }

    /// 同意取得時刻を設定
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(ConsentTimestamp::Text(
            timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        ));
        self
    }
}

/// 単一種別の同意記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    #[serde(rename = "type")]
    pub consent_type: ConsentType,
    pub given: bool,
    pub timestamp: String,
}

impl From<ConsentRecord> for ConsentData {
    fn from(record: ConsentRecord) -> Self {
        ConsentData {
            timestamp: Some(record.timestamp.into()),
            ..ConsentData::default()
        }
        .with(record.consent_type, record.given)
    }
}

/// 同意検証エラーコード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentErrorCode {
    /// 同意が存在しない、または拒否されている
    ConsentRequired,
    /// 同意取得から24時間以上経過
    ConsentExpired,
}

impl ConsentErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentErrorCode::ConsentRequired => "CONSENT_REQUIRED",
            ConsentErrorCode::ConsentExpired => "CONSENT_EXPIRED",
        }
    }
}

/// 同意検証結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsentValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ConsentErrorCode>,
}

impl ConsentValidation {
    pub fn valid() -> Self {
        Self {
            valid: true,
            message: None,
            code: None,
        }
    }

    pub fn invalid(code: ConsentErrorCode, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
            code: Some(code),
        }
    }
}

/// 保存用の同意証跡（生のIP・User-Agentは保持しない）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentProof {
    pub consent_type: ConsentType,
    pub timestamp: DateTime<Utc>,
    /// SHA-256 の先頭16桁（hex）
    pub ip_hash: String,
    /// SHA-256 の先頭16桁（hex）
    pub user_agent_hash: String,
    /// プライバシーポリシーのバージョン
    pub version: String,
}
