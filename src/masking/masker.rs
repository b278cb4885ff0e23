//! PIIマスキングエンジン
//!
//! 任意にネストした JSON 値を、構造を保ったままマスクしたコピーに変換する。

use super::rules::{EmailRule, Ipv4Rule, MaskingRule, PhoneRule, MASK};
use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// キー名にこれらの部分文字列を含むと値全体を置換する（小文字比較）
pub const SENSITIVE_KEYS: &[&str] = &["email", "phone", "ip", "password", "name", "address"];

/// 値全体置換時の `*` の最大数
const MAX_REDACTION_STARS: usize = 8;

/// マスキングエンジン
pub struct PiiMasker {
    /// 文字列ルール（登録順に適用）
    rules: Vec<Box<dyn MaskingRule>>,
    /// センシティブキーの部分文字列
    sensitive_keys: Vec<String>,
}

impl PiiMasker {
    /// デフォルトルール（メール → 電話番号 → IPv4）で作成
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(EmailRule),
                Box::new(PhoneRule),
                Box::new(Ipv4Rule),
            ],
            sensitive_keys: SENSITIVE_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// ルールなし（キー名によるマスクのみ）
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            sensitive_keys: SENSITIVE_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// 文字列ルールを末尾に追加
    pub fn with_rule(mut self, rule: impl MaskingRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// センシティブキーを追加
    pub fn with_sensitive_key(mut self, key: impl Into<String>) -> Self {
        self.sensitive_keys.push(key.into().to_lowercase());
        self
    }

    /// 登録済みルール名
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// 文字列に全ルールを1回ずつ適用
    pub fn mask_str(&self, input: &str) -> String {
        let mut current = input.to_string();
        for rule in &self.rules {
            if let Cow::Owned(next) = rule.apply(&current) {
                current = next;
            }
        }
        current
    }

    /// キー名がセンシティブか
    pub fn is_sensitive_key(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.sensitive_keys.iter().any(|s| key.contains(s.as_str()))
    }

    /// 値をマスク
    ///
    /// 文字列はルール適用、配列は要素ごと、オブジェクトはキー名判定の上で再帰。
    /// `null`・数値・真偽値はそのまま返す。
    pub fn mask_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.mask_str(s)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.mask_value(v)).collect()),
            Value::Object(map) => Value::Object(self.mask_map(map)),
            other => other.clone(),
        }
    }

    /// オブジェクトをマスク
    pub fn mask_map(&self, map: &Map<String, Value>) -> Map<String, Value> {
        map.iter()
            .map(|(key, value)| {
                let masked = if self.is_sensitive_key(key) {
                    redact_whole(value)
                } else {
                    self.mask_value(value)
                };
                (key.clone(), masked)
            })
            .collect()
    }

    /// 値が存在しない場合はそのまま `None`
    pub fn mask_optional(&self, value: Option<&Value>) -> Option<Value> {
        value.map(|v| self.mask_value(v))
    }

    /// シリアライズ可能な任意の値をマスク
    ///
    /// シリアライズできない値は内容を推測せず `"***"` に置換する。
    pub fn mask_serializable<T: Serialize + ?Sized>(&self, value: &T) -> Value {
        match serde_json::to_value(value) {
            Ok(v) => self.mask_value(&v),
            Err(e) => {
                tracing::debug!(error = %e, "value could not be serialized for masking, redacting");
                Value::String(MASK.to_string())
            }
        }
    }
}

impl Default for PiiMasker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PiiMasker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PiiMasker")
            .field("rules", &self.rule_names())
            .field("sensitive_keys", &self.sensitive_keys)
            .finish()
    }
}

/// 値全体を置換
///
/// 3文字以上の文字列は先頭と末尾の1文字を残し、間を最大8個の `*` にする。
/// それ以外（2文字以下の文字列、文字列以外の値）は `"***"`。
pub fn redact_whole(value: &Value) -> Value {
    match value {
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            if chars.len() > 2 {
                let stars = (chars.len() - 2).min(MAX_REDACTION_STARS);
                Value::String(format!(
                    "{}{}{}",
                    chars[0],
                    "*".repeat(stars),
                    chars[chars.len() - 1]
                ))
            } else {
                Value::String(MASK.to_string())
            }
        }
        _ => Value::String(MASK.to_string()),
    }
}
