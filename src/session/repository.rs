pub mod memory;

use super::types::{AdminCredentials, AuthError};
use async_trait::async_trait;

pub use memory::InMemoryAdminRepository;

/// 管理者リポジトリのトレイト
///
/// 本番ではリレーショナルストアで実装し、開発・テストではメモリ実装を使う。
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// ユーザー名で管理者を検索
    ///
    /// # Returns
    /// 見つかった場合は`Some(AdminCredentials)`、見つからない場合は`None`
    async fn find_by_username(&self, username: &str)
        -> Result<Option<AdminCredentials>, AuthError>;
}
