//! マスキングルール定義
//!
//! 文字列中のPIIを検出・置換するルール。各ルールは独立しており、
//! [`super::PiiMasker`] が登録順に1回ずつ適用する。

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

/// マスク文字列
pub const MASK: &str = "***";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z0-9._%+-])[A-Za-z0-9._%+-]*@([A-Za-z0-9.-]+\.[A-Za-z]{2,})").unwrap()
});
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap()
});
static IPV4_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,3})\.(\d{1,3})\.\d{1,3}\.\d{1,3}\b").unwrap());

/// 文字列マスキングルール
pub trait MaskingRule: Send + Sync {
    /// ルール名
    fn name(&self) -> &str;

    /// 入力に含まれる全てのマッチを置換する。マッチがなければ借用のまま返す。
    fn apply<'a>(&self, input: &'a str) -> Cow<'a, str>;
}

/// メールアドレス: `user@example.com` → `u***@example.com`
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailRule;

impl MaskingRule for EmailRule {
    fn name(&self) -> &str {
        "email"
    }

    fn apply<'a>(&self, input: &'a str) -> Cow<'a, str> {
        EMAIL_RE.replace_all(input, "${1}***@${2}")
    }
}

/// 電話番号: マッチ範囲の先頭3文字 + `***` + 末尾2文字
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneRule;

impl MaskingRule for PhoneRule {
    fn name(&self) -> &str {
        "phone"
    }

    fn apply<'a>(&self, input: &'a str) -> Cow<'a, str> {
        PHONE_RE.replace_all(input, |caps: &Captures| keep_ends(&caps[0], 3, 2))
    }
}

/// IPv4アドレス: `192.168.1.100` → `192.168.***`
#[derive(Debug, Clone, Copy, Default)]
pub struct Ipv4Rule;

impl MaskingRule for Ipv4Rule {
    fn name(&self) -> &str {
        "ipv4"
    }

    fn apply<'a>(&self, input: &'a str) -> Cow<'a, str> {
        IPV4_RE.replace_all(input, "${1}.${2}.***")
    }
}

/// 任意の正規表現ルール（国民ID番号などの追加用）
pub struct PatternRule {
    name: String,
    pattern: Regex,
    replacement: String,
}

impl PatternRule {
    /// `replacement` は `regex` の置換構文（`${1}` など）を使える
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }
}

impl MaskingRule for PatternRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply<'a>(&self, input: &'a str) -> Cow<'a, str> {
        self.pattern.replace_all(input, self.replacement.as_str())
    }
}

/// 先頭 `prefix` 文字と末尾 `suffix` 文字を残して間を `***` にする
fn keep_ends(matched: &str, prefix: usize, suffix: usize) -> String {
    let chars: Vec<char> = matched.chars().collect();
    let head: String = chars.iter().take(prefix).collect();
    let tail: String = chars[chars.len().saturating_sub(suffix)..].iter().collect();
    format!("{}{}{}", head, MASK, tail)
}
