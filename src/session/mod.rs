//! Session Guard
//!
//! 管理者セッションの発行・検証と、管理用ルートの保護を行う。
//!
//! - 署名付きトークン（HS256）を `admin_session` クッキーで運ぶ
//! - [`with_auth`] で包んだルートだけがセッションを要求する
//! - アクセスは監査ログに記録される
//!
//! 失効リストは持たない。ログアウトはクッキーを削除するのみ。

pub mod guard;
pub mod middleware;
pub mod password;
pub mod repository;
pub mod token;
pub mod types;

pub use guard::{IssuedSession, SessionGuard, SESSION_COOKIE_NAME};
pub use middleware::{client_ip, require_admin, with_auth};
pub use password::{hash_password, verify_password};
pub use repository::{AdminRepository, InMemoryAdminRepository};
pub use token::{SessionClaims, SessionTokens, SESSION_TOKEN_TYPE};
pub use types::{
    AdminAccount, AdminCredentials, AdminIdentity, AuthError, AuthResult, LoginRequest,
};
