// Session Token Implementation

use super::types::{AdminAccount, AuthError, AuthResult};
use crate::clock::Clock;
use crate::config::AppConfig;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// セッショントークンの種別
pub const SESSION_TOKEN_TYPE: &str = "admin_session";

/// セッションクレーム
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// 管理者ID
    pub id: i64,

    /// ユーザー名
    pub username: String,

    /// トークン種別（常に `admin_session`）
    #[serde(rename = "type")]
    pub token_type: String,

    /// 発行時刻（UNIX秒）
    pub iat: u64,

    /// 有効期限（UNIX秒）
    pub exp: u64,
}

impl SessionClaims {
    /// 指定時刻で有効か（`now < exp`）
    pub fn is_valid_at(&self, now: u64) -> bool {
        now < self.exp
    }

    pub fn account(&self) -> AdminAccount {
        AdminAccount::new(self.id, self.username.clone())
    }
}

/// セッショントークンの発行・検証
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_secs: u64,
    clock: Arc<dyn Clock>,
}

impl SessionTokens {
    pub fn new(secret: &[u8], expiry_secs: u64, clock: Arc<dyn Clock>) -> Self {
        // exp は注入された時計で判定する
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            expiry_secs,
            clock,
        }
    }

    pub fn from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(config.jwt_secret_bytes(), config.session_expiry_secs, clock)
    }

    pub fn expiry_secs(&self) -> u64 {
        self.expiry_secs
    }

    fn now_secs(&self) -> u64 {
        u64::try_from(self.clock.now().timestamp()).unwrap_or(0)
    }

    /// トークンを生成
    pub fn generate_token(&self, admin: &AdminAccount) -> AuthResult<String> {
        let now = self.now_secs();
        let claims = SessionClaims {
            id: admin.id,
            username: admin.username.clone(),
            token_type: SESSION_TOKEN_TYPE.to_string(),
            iat: now,
            exp: now.saturating_add(self.expiry_secs),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// トークンを検証
    ///
    /// 不正・改ざん・期限切れのいずれも `None` を返す。
    pub fn verify_token(&self, token: &str) -> Option<SessionClaims> {
        let claims = match decode::<SessionClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(error = %e, "session token rejected");
                return None;
            }
        };

        if claims.token_type != SESSION_TOKEN_TYPE {
            tracing::debug!(token_type = %claims.token_type, "unexpected session token type");
            return None;
        }

        if !claims.is_valid_at(self.now_secs()) {
            tracing::debug!(exp = claims.exp, "session token expired");
            return None;
        }

        Some(claims)
    }
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("expiry_secs", &self.expiry_secs)
            .finish_non_exhaustive()
    }
}
