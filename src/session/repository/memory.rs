use super::AdminRepository;
use crate::config::AppConfig;
use crate::session::types::{AdminAccount, AdminCredentials, AuthError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory管理者リポジトリ
///
/// 開発・テスト用途、または環境変数で1名の管理者のみを設定する運用向け。
///
/// # 制限事項
/// - サーバー再起動時にデータが失われます
/// - 単一インスタンスのみ
#[derive(Clone, Default)]
pub struct InMemoryAdminRepository {
    admins: Arc<RwLock<HashMap<String, AdminCredentials>>>,
}

impl InMemoryAdminRepository {
    /// 新しいIn-memoryリポジトリを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// `ADMIN_USERNAME` / `ADMIN_PASSWORD_HASH` から初期管理者を登録
    ///
    /// どちらかが未設定なら空のリポジトリを返す（ログインは常に失敗する）。
    pub fn from_config(config: &AppConfig) -> Self {
        let mut admins = HashMap::new();

        match (&config.admin_username, &config.admin_password_hash) {
            (Some(username), Some(hash)) => {
                admins.insert(
                    username.clone(),
                    AdminCredentials {
                        account: AdminAccount::new(1, username.clone()),
                        password_hash: hash.clone(),
                    },
                );
            }
            _ => {
                tracing::warn!("ADMIN_USERNAME or ADMIN_PASSWORD_HASH not set; admin login disabled");
            }
        }

        Self {
            admins: Arc::new(RwLock::new(admins)),
        }
    }

    /// 管理者を登録（同名は上書き）
    pub async fn insert(&self, credentials: AdminCredentials) {
        let mut admins = self.admins.write().await;
        admins.insert(credentials.account.username.clone(), credentials);
    }

    pub async fn len(&self) -> usize {
        self.admins.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.admins.read().await.is_empty()
    }
}

#[async_trait]
impl AdminRepository for InMemoryAdminRepository {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminCredentials>, AuthError> {
        let admins = self.admins.read().await;
        Ok(admins.get(username).cloned())
    }
}
