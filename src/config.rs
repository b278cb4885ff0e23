//! アプリケーション設定
//!
//! 環境変数から起動時に一度だけ読み込み、以降は不変の [`AppConfig`] を
//! `Arc` で各コンポーネントに渡す。呼び出しごとの環境変数パースは行わない。

use crate::error::{Error, Result};
use crate::logging::LogLevel;
use secrecy::{ExposeSecret, SecretString};

/// データ保持期間のデフォルト（日）
pub const DEFAULT_RETENTION_DAYS: u32 = 365;

/// セッション有効期限のデフォルト（秒）: 7日
pub const DEFAULT_SESSION_EXPIRY_SECS: u64 = 604_800;

/// デフォルトのバインドアドレス
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// ローカル開発とみなす環境名
const LOCAL_ENVIRONMENTS: &[&str] = &["development", "test"];

/// アプリケーション設定
#[derive(Debug)]
pub struct AppConfig {
    /// 同意チェックを行うか（`REQUIRE_CONSENT=false` のときのみ無効）
    pub require_consent: bool,
    /// データ保持期間（日）
    pub data_retention_days: u32,
    /// セッショントークンの署名鍵
    pub jwt_secret: SecretString,
    /// セッション有効期限（秒）
    pub session_expiry_secs: u64,
    /// 最小ログレベル
    pub log_level: LogLevel,
    /// デプロイ環境名 (development, test, production, ...)
    pub environment: String,
    /// HTTPサーバーのバインドアドレス
    pub bind_addr: String,
    /// 初期管理者ユーザー名
    pub admin_username: Option<String>,
    /// 初期管理者パスワードハッシュ（Argon2 PHC形式）
    pub admin_password_hash: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            require_consent: true,
            data_retention_days: DEFAULT_RETENTION_DAYS,
            jwt_secret: ephemeral_secret(),
            session_expiry_secs: DEFAULT_SESSION_EXPIRY_SECS,
            log_level: LogLevel::Info,
            environment: "development".to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            admin_username: None,
            admin_password_hash: None,
        }
    }
}

impl AppConfig {
    /// プロセス環境変数から読み込み
    pub fn from_env() -> Result<Self> {
        Self::from_source(config::Environment::default())
    }

    /// 任意の環境ソースから読み込み
    ///
    /// テストでは `Environment::default().source(Some(map))` を渡す。
    pub fn from_source(source: config::Environment) -> Result<Self> {
        let settings = config::Config::builder().add_source(source).build()?;
        let get = |key: &str| {
            settings
                .get_string(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let environment = get("app_env").unwrap_or_else(|| "development".to_string());

        let require_consent = get("require_consent").as_deref() != Some("false");

        let data_retention_days = match get("data_retention_days") {
            Some(raw) => raw.parse::<u32>().unwrap_or_else(|_| {
                tracing::warn!(
                    value = %raw,
                    "DATA_RETENTION_DAYS is not a valid day count, using {}",
                    DEFAULT_RETENTION_DAYS
                );
                DEFAULT_RETENTION_DAYS
            }),
            None => DEFAULT_RETENTION_DAYS,
        };

        let session_expiry_secs = match get("session_expiry") {
            Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!(
                    value = %raw,
                    "SESSION_EXPIRY is not a valid number of seconds, using {}",
                    DEFAULT_SESSION_EXPIRY_SECS
                );
                DEFAULT_SESSION_EXPIRY_SECS
            }),
            None => DEFAULT_SESSION_EXPIRY_SECS,
        };

        let log_level = get("log_level")
            .and_then(|raw| raw.parse::<LogLevel>().ok())
            .unwrap_or(LogLevel::Info);

        let jwt_secret = match get("jwt_secret") {
            Some(secret) => SecretString::new(secret.into_boxed_str()),
            None if is_local(&environment) => {
                tracing::warn!(
                    environment = %environment,
                    "JWT_SECRET is not set; using a random per-process secret, sessions will not survive a restart"
                );
                ephemeral_secret()
            }
            None => {
                return Err(Error::Config(format!(
                    "JWT_SECRET must be set when APP_ENV is '{}'",
                    environment
                )))
            }
        };

        Ok(Self {
            require_consent,
            data_retention_days,
            jwt_secret,
            session_expiry_secs,
            log_level,
            bind_addr: get("bind_addr").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            admin_username: get("admin_username"),
            admin_password_hash: get("admin_password_hash"),
            environment,
        })
    }

    /// ローカル開発環境か（Secure属性なしのクッキーを許可）
    pub fn is_local(&self) -> bool {
        is_local(&self.environment)
    }

    /// 署名鍵のバイト列
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.expose_secret().as_bytes()
    }
}

fn is_local(environment: &str) -> bool {
    LOCAL_ENVIRONMENTS
        .iter()
        .any(|env| env.eq_ignore_ascii_case(environment))
}

fn ephemeral_secret() -> SecretString {
    let secret = format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple());
    SecretString::new(secret.into_boxed_str())
}
