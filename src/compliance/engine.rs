//! Compliance Engine
//!
//! 同意チェックとデータ保持期間の計算を行う。
//! 設定は起動時に読み込んだ [`AppConfig`] を参照し、現在時刻は [`Clock`] から取得する。

use super::notice::{self, Locale, NoticeKey};
use super::types::*;
use crate::clock::Clock;
use crate::config::AppConfig;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// 同意の有効期間（時間）。データ保持期間とは独立。
pub const CONSENT_VALIDITY_HOURS: i64 = 24;

/// プライバシーポリシーのバージョン
pub const CONSENT_POLICY_VERSION: &str = "1.0";

/// 永続化前に除去するフィールド
pub const NON_PERSISTED_FIELDS: &[&str] = &["consent", "captcha", "_csrf"];

/// 証跡に保存するハッシュの長さ（hex文字数）
const PROOF_HASH_LEN: usize = 16;

/// コンプライアンスエンジン
#[derive(Clone)]
pub struct ComplianceEngine {
    config: Arc<AppConfig>,
    clock: Arc<dyn Clock>,
}

impl ComplianceEngine {
    /// 新しいコンプライアンスエンジンを作成
    pub fn new(config: Arc<AppConfig>, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    /// 同意を検証
    ///
    /// 想定内の失敗（同意なし・期限切れ）はエラーではなく
    /// `valid: false` の [`ConsentValidation`] として返す。
    pub fn validate_consent(
        &self,
        consent: Option<&ConsentData>,
        required: ConsentType,
    ) -> ConsentValidation {
        if !self.config.require_consent {
            return ConsentValidation::valid();
        }

        let consent = match consent {
            Some(c) if c.is_given(required) => c,
            _ => {
                return ConsentValidation::invalid(
                    ConsentErrorCode::ConsentRequired,
                    format!("Consent for {} is required", required),
                )
            }
        };

        if let Some(timestamp) = consent.timestamp.as_ref() {
            let expired = match timestamp.parse() {
                Some(given_at) => {
                    self.clock.now() - given_at > Duration::hours(CONSENT_VALIDITY_HOURS)
                }
                None => {
                    // 解釈できない時刻は期限切れとして扱う
                    tracing::debug!(?timestamp, "unparseable consent timestamp");
                    true
                }
            };

            if expired {
                return ConsentValidation::invalid(
                    ConsentErrorCode::ConsentExpired,
                    "Consent has expired, please confirm again",
                );
            }
        }

        ConsentValidation::valid()
    }

    /// データ保持期間（日）
    pub fn retention_days(&self) -> u32 {
        self.config.data_retention_days
    }

    fn retention_window(&self) -> Duration {
        Duration::days(i64::from(self.retention_days()))
    }

    /// 保持期間を超過しているか
    pub fn is_data_expired(&self, created_at: DateTime<Utc>) -> bool {
        self.clock.now() - created_at > self.retention_window()
    }

    /// これより前に作成されたデータは保持期間超過
    ///
    /// 保持期間が表現可能な日時の範囲を超える場合は `DateTime::<Utc>::MIN_UTC`。
    pub fn retention_cutoff(&self) -> DateTime<Utc> {
        self.clock
            .now()
            .checked_sub_signed(self.retention_window())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// レコードを (保持, 期限切れ) に分割
    ///
    /// 定期的な削除ジョブが外部ストアに対して使う。
    pub fn partition_expired<T, F>(&self, records: Vec<T>, created_at_of: F) -> (Vec<T>, Vec<T>)
    where
        F: Fn(&T) -> DateTime<Utc>,
    {
        let now = self.clock.now();
        let window = self.retention_window();
        records
            .into_iter()
            .partition(|record| now - created_at_of(record) <= window)
    }

    /// お問い合わせデータを保存用に整形
    ///
    /// 保存してはならないフィールドを除去し、文字列値の前後空白を除く。
    /// PIIのマスキングはログ出力時に別途行う。
    pub fn sanitize_contact_data(&self, data: &Map<String, Value>) -> Map<String, Value> {
        data.iter()
            .filter(|(key, _)| !NON_PERSISTED_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => Value::String(s.trim().to_string()),
                    other => other.clone(),
                };
                (key.clone(), value)
            })
            .collect()
    }

    /// 同意証跡を作成（IPとUser-Agentはハッシュのみ保持）
    pub fn create_consent_record(
        &self,
        consent_type: ConsentType,
        ip: &str,
        user_agent: &str,
    ) -> ConsentProof {
        ConsentProof {
            consent_type,
            timestamp: self.clock.now(),
            ip_hash: short_hash(ip),
            user_agent_hash: short_hash(user_agent),
            version: CONSENT_POLICY_VERSION.to_string(),
        }
    }

    /// ロケール別のプライバシー通知文
    ///
    /// 不明なロケール・キーは既定値にフォールバックする。
    pub fn privacy_notice(&self, locale: &str, key: &str) -> String {
        self.notice(Locale::parse(locale), NoticeKey::parse(key))
    }

    pub fn notice(&self, locale: Locale, key: NoticeKey) -> String {
        notice::render(locale, key, self.retention_days())
    }
}

impl std::fmt::Debug for ComplianceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplianceEngine")
            .field("require_consent", &self.config.require_consent)
            .field("retention_days", &self.config.data_retention_days)
            .finish()
    }
}

fn short_hash(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(PROOF_HASH_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn engine_with(config: AppConfig) -> ComplianceEngine {
        ComplianceEngine::new(Arc::new(config), Arc::new(FixedClock::new(now())))
    }

    fn engine() -> ComplianceEngine {
        engine_with(AppConfig::default())
    }

    fn consent_at(at: DateTime<Utc>) -> ConsentData {
        ConsentData::default()
            .with(ConsentType::ContactForm, true)
            .at(at)
    }

    #[test]
    fn test_missing_consent_is_required() {
        let result = engine().validate_consent(None, ConsentType::ContactForm);
        assert!(!result.valid);
        assert_eq!(result.code, Some(ConsentErrorCode::ConsentRequired));
    }

    #[test]
    fn test_falsy_flag_is_required() {
        let consent = ConsentData::default().with(ConsentType::ContactForm, false);
        let result = engine().validate_consent(Some(&consent), ConsentType::ContactForm);
        assert_eq!(result.code, Some(ConsentErrorCode::ConsentRequired));

        let consent = ConsentData::default().with(ConsentType::Marketing, true);
        let result = engine().validate_consent(Some(&consent), ConsentType::ContactForm);
        assert_eq!(result.code, Some(ConsentErrorCode::ConsentRequired));
    }

    #[test]
    fn test_fresh_consent_is_valid() {
        let result =
            engine().validate_consent(Some(&consent_at(now())), ConsentType::ContactForm);
        assert_eq!(result, ConsentValidation::valid());

        let untimed = ConsentData::default().with(ConsentType::ContactForm, true);
        assert!(engine()
            .validate_consent(Some(&untimed), ConsentType::ContactForm)
            .valid);
    }

    #[test]
    fn test_consent_window_boundary() {
        let exactly = consent_at(now() - Duration::hours(24));
        assert!(engine()
            .validate_consent(Some(&exactly), ConsentType::ContactForm)
            .valid);

        let stale = consent_at(now() - Duration::hours(24) - Duration::milliseconds(1));
        let result = engine().validate_consent(Some(&stale), ConsentType::ContactForm);
        assert_eq!(result.code, Some(ConsentErrorCode::ConsentExpired));
    }

    #[test]
    fn test_unparseable_timestamp_is_expired() {
        let mut consent = ConsentData::default().with(ConsentType::ContactForm, true);
        consent.timestamp = Some(ConsentTimestamp::from("yesterday"));
        let result = engine().validate_consent(Some(&consent), ConsentType::ContactForm);
        assert_eq!(result.code, Some(ConsentErrorCode::ConsentExpired));
    }

    #[test]
    fn test_disabled_gate_accepts_anything() {
        let engine = engine_with(AppConfig {
            require_consent: false,
            ..AppConfig::default()
        });
        assert!(engine.validate_consent(None, ConsentType::Marketing).valid);
    }

    #[test]
    fn test_retention_boundary() {
        let engine = engine();
        assert_eq!(engine.retention_days(), 365);
        assert!(!engine.is_data_expired(now() - Duration::days(365)));
        assert!(engine.is_data_expired(now() - Duration::days(365) - Duration::milliseconds(1)));
        assert_eq!(engine.retention_cutoff(), now() - Duration::days(365));
    }

    #[test]
    fn test_zero_retention_expires_immediately_after_creation() {
        let engine = engine_with(AppConfig {
            data_retention_days: 0,
            ..AppConfig::default()
        });
        assert!(!engine.is_data_expired(now()));
        assert!(engine.is_data_expired(now() - Duration::seconds(1)));
    }

    #[test]
    fn test_naive_and_numeric_timestamps_within_window() {
        let hour_ago = now() - Duration::hours(1);
        let texts = [
            hour_ago.format("%Y-%m-%dT%H:%M:%S").to_string(),
            hour_ago.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            hour_ago.format("%Y-%m-%d").to_string(),
        ];
        let stamps = texts
            .into_iter()
            .map(ConsentTimestamp::from)
            .chain([ConsentTimestamp::EpochMillis(hour_ago.timestamp_millis())]);

        for stamp in stamps {
            let mut consent = ConsentData::default().with(ConsentType::ContactForm, true);
            consent.timestamp = Some(stamp.clone());
            let result = engine().validate_consent(Some(&consent), ConsentType::ContactForm);
            assert!(result.valid, "{stamp:?}");
        }

        let mut stale = ConsentData::default().with(ConsentType::ContactForm, true);
        stale.timestamp = Some(ConsentTimestamp::EpochMillis(
            (now() - Duration::hours(25)).timestamp_millis(),
        ));
        let result = engine().validate_consent(Some(&stale), ConsentType::ContactForm);
        assert_eq!(result.code, Some(ConsentErrorCode::ConsentExpired));
    }

    #[test]
    fn test_retention_beyond_date_range() {
        let engine = engine_with(AppConfig {
            data_retention_days: 4_000_000_000,
            ..AppConfig::default()
        });
        assert!(!engine.is_data_expired(now()));
        assert_eq!(engine.retention_cutoff(), DateTime::<Utc>::MIN_UTC);

        let records = vec![("ancient", now() - Duration::days(100_000))];
        let (kept, expired) = engine.partition_expired(records, |(_, at)| *at);
        assert_eq!(kept.len(), 1);
        assert!(expired.is_empty());
    }

    #[test]
    fn test_partition_expired() {
        let records = vec![
            ("old", now() - Duration::days(400)),
            ("recent", now() - Duration::days(3)),
            ("edge", now() - Duration::days(365)),
        ];
        let (kept, expired) = engine().partition_expired(records, |(_, at)| *at);
        let kept: Vec<_> = kept.into_iter().map(|(name, _)| name).collect();
        let expired: Vec<_> = expired.into_iter().map(|(name, _)| name).collect();
        assert_eq!(kept, vec!["recent", "edge"]);
        assert_eq!(expired, vec!["old"]);
    }

    #[test]
    fn test_sanitize_strips_and_trims() {
        let input = json!({
            "name": "  Ana Ruiz ",
            "message": "\tHello\n",
            "budget": 5000,
            "consent": { "contact_form": true },
            "captcha": "token",
            "_csrf": "abc",
        });
        let sanitized = engine().sanitize_contact_data(input.as_object().unwrap());

        assert_eq!(sanitized.len(), 3);
        assert_eq!(sanitized["name"], "Ana Ruiz");
        assert_eq!(sanitized["message"], "Hello");
        assert_eq!(sanitized["budget"], 5000);
        assert!(!sanitized.contains_key("consent"));
        assert_eq!(input["name"], "  Ana Ruiz ");
    }

    #[test]
    fn test_consent_record_hashes() {
        let proof =
            engine().create_consent_record(ConsentType::ContactForm, "198.51.100.7", "Mozilla/5.0");
        assert_eq!(proof.timestamp, now());
        assert_eq!(proof.version, "1.0");
        assert_eq!(proof.ip_hash.len(), 16);
        assert_eq!(proof.user_agent_hash.len(), 16);
        assert!(proof.ip_hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(proof.ip_hash, proof.user_agent_hash);

        let again =
            engine().create_consent_record(ConsentType::ContactForm, "198.51.100.7", "Mozilla/5.0");
        assert_eq!(proof.ip_hash, again.ip_hash);

        let json = serde_json::to_value(&proof).unwrap();
        assert_eq!(json["consentType"], "contact_form");
        assert!(json.get("ipHash").is_some());
        assert!(!json.to_string().contains("198.51.100.7"));
    }

    #[test]
    fn test_privacy_notice_uses_retention_days() {
        let engine = engine_with(AppConfig {
            data_retention_days: 180,
            ..AppConfig::default()
        });
        let text = engine.privacy_notice("es-ES", "retention");
        assert!(text.contains("180"));
        assert_eq!(
            engine.privacy_notice("de", "nope"),
            engine.privacy_notice("en", "data_collection")
        );
    }
}
