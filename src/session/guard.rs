// Session Guard

use super::password::verify_password;
use super::token::{SessionClaims, SessionTokens};
use super::types::{AdminAccount, AdminCredentials, AuthError, AuthResult};
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::logging::Logger;
use axum::http::{header, HeaderMap, HeaderValue};

/// セッションクッキー名（固定）
pub const SESSION_COOKIE_NAME: &str = "admin_session";

/// ログイン成功時に発行されるセッション
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub account: AdminAccount,
    pub token: String,
    /// `Set-Cookie` ヘッダー値
    pub cookie: HeaderValue,
}

/// セッションガード
///
/// トークンの発行・検証、クッキーからのセッション取得、ログインを扱う。
/// 失効リストは持たないため、ログアウトはクッキーを消すだけで、
/// 発行済みトークンは有効期限まで有効なまま残る。
#[derive(Debug)]
pub struct SessionGuard {
    tokens: SessionTokens,
    logger: Logger,
    secure_cookie: bool,
}

impl SessionGuard {
    pub fn new(tokens: SessionTokens, logger: Logger, secure_cookie: bool) -> Self {
        Self {
            tokens,
            logger,
            secure_cookie,
        }
    }

    /// 設定から作成（ローカル環境以外では `Secure` 属性を付与）
    pub fn from_config(
        config: &AppConfig,
        clock: std::sync::Arc<dyn Clock>,
        logger: Logger,
    ) -> Self {
        Self::new(
            SessionTokens::from_config(config, clock),
            logger,
            !config.is_local(),
        )
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn generate_token(&self, admin: &AdminAccount) -> AuthResult<String> {
        self.tokens.generate_token(admin)
    }

    pub fn verify_token(&self, token: &str) -> Option<SessionClaims> {
        self.tokens.verify_token(token)
    }

    /// `Cookie` ヘッダーからセッションを取得
    pub fn get_session(&self, headers: &HeaderMap) -> Option<SessionClaims> {
        let token = session_token(headers)?;
        self.verify_token(token)
    }

    pub fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        self.get_session(headers).is_some()
    }

    /// セッションクッキー（`Set-Cookie` 値）
    pub fn session_cookie(&self, token: &str) -> AuthResult<HeaderValue> {
        self.cookie(token, self.tokens.expiry_secs())
    }

    /// セッションクッキーを削除する `Set-Cookie` 値
    pub fn clear_cookie(&self) -> AuthResult<HeaderValue> {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: u64) -> AuthResult<HeaderValue> {
        let mut cookie = format!(
            "{}={}; HttpOnly; Path=/; SameSite=Strict; Max-Age={}",
            SESSION_COOKIE_NAME, value, max_age
        );
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }

        HeaderValue::from_str(&cookie)
            .map_err(|e| AuthError::Internal(format!("Invalid cookie value: {}", e)))
    }

    /// パスワードを検証してセッションを発行
    pub fn login(&self, credentials: &AdminCredentials, password: &str) -> AuthResult<IssuedSession> {
        if !verify_password(password, &credentials.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.generate_token(&credentials.account)?;
        let cookie = self.session_cookie(&token)?;

        Ok(IssuedSession {
            account: credentials.account.clone(),
            token,
            cookie,
        })
    }
}

/// `Cookie` ヘッダー群からセッショントークンを抽出
fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE_NAME && !value.is_empty()).then_some(value)
        })
}
