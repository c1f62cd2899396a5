//! ユースケース層の共通ヘルパー
//!
//! リポジトリ呼び出し結果の変換など、複数のユースケースで繰り返されるパターンを共通化する。

use hrflow_infra::InfraError;

use crate::error::ServiceError;

/// リポジトリの `Result<Option<T>, InfraError>` を `Result<T, ServiceError>` に変換する
///
/// ```ignore
/// let request = self.leave_repo.find_by_id(&id).await.or_not_found("休暇申請")?;
/// ```
pub(crate) trait FindResultExt<T> {
    /// `None` の場合は `ServiceError::NotFound`、`InfraError` の場合は `ServiceError::Database` を返す
    fn or_not_found(self, entity_name: &str) -> Result<T, ServiceError>;
}

impl<T> FindResultExt<T> for Result<Option<T>, InfraError> {
    fn or_not_found(self, entity_name: &str) -> Result<T, ServiceError> {
        self?
            .ok_or_else(|| ServiceError::NotFound(format!("{entity_name}が見つかりません")))
    }
}

/// 楽観的ロック付き更新の失敗を `ServiceError` に変換する
pub(crate) fn map_save_error(e: InfraError) -> ServiceError {
    if e.is_conflict() {
        ServiceError::Conflict(
            "休暇申請は既に更新されています。最新の情報を取得してください。".to_string(),
        )
    } else {
        ServiceError::Database(e)
    }
}
