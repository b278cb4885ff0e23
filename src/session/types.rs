// Session Types and Errors

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// セッション認証エラー型
///
/// レスポンス本文は汎用メッセージのみで、内部詳細は含めない。
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Invalid password hash: {0}")]
    InvalidPasswordHash(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// 認証結果型
pub type AuthResult<T> = Result<T, AuthError>;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AuthError::TokenGeneration(_)
            | AuthError::InvalidPasswordHash(_)
            | AuthError::Internal(_) => {
                tracing::error!(error = %self, "session error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// ログイン中の管理者
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAccount {
    pub id: i64,
    pub username: String,
}

impl AdminAccount {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

/// 保存された管理者の認証情報
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub account: AdminAccount,
    /// Argon2 PHC形式のパスワードハッシュ
    pub password_hash: String,
}

/// ログインリクエスト
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 保護されたハンドラーに渡される管理者情報
///
/// `with_auth` で保護されたルートではリクエストの extensions に格納される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub id: i64,
    pub username: String,
}

impl<S> FromRequestParts<S> for AdminIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminIdentity>()
            .cloned()
            .ok_or(AuthError::Unauthorized)
    }
}
