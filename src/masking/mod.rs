//! PII Masking
//!
//! ログ出力前に個人情報を不可逆に部分マスクする。
//!
//! ## 文字列ルール（登録順に1回ずつ適用）
//!
//! 1. メールアドレス: `user@example.com` → `u***@example.com`
//! 2. 電話番号: 先頭3文字 + `***` + 末尾2文字
//! 3. IPv4: `192.168.1.100` → `192.168.***`
//!
//! ## キー名ルール
//!
//! キー名（小文字化）が `email`, `phone`, `ip`, `password`, `name`, `address`
//! のいずれかを含む場合、値全体を [`redact_whole`] で置換する。
//!
//! ## 使用例
//!
//! ```rust
//! use portfolio_guard::masking::mask_pii;
//! use serde_json::json;
//!
//! let masked = mask_pii(&json!({ "note": "user@example.com", "phone": "555-123-4567" }));
//! assert_eq!(masked["note"], "u***@example.com");
//! assert_eq!(masked["phone"], "5********7");
//! ```

pub mod masker;
pub mod rules;

pub use masker::{redact_whole, PiiMasker, SENSITIVE_KEYS};
pub use rules::{EmailRule, Ipv4Rule, MaskingRule, PatternRule, PhoneRule, MASK};

use once_cell::sync::Lazy;
use serde_json::Value;

static DEFAULT_MASKER: Lazy<PiiMasker> = Lazy::new(PiiMasker::new);

/// デフォルトルールで値をマスク
pub fn mask_pii(value: &Value) -> Value {
    DEFAULT_MASKER.mask_value(value)
}

/// デフォルトルールで文字列をマスク
pub fn mask_str(value: &str) -> String {
    DEFAULT_MASKER.mask_str(value)
}
