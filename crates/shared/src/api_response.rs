//! # API レスポンスエンベロープ
//!
//! 成功レスポンスの統一形式 `{ "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// 成功レスポンスの統一型
///
/// 休暇申請・承認権限・休暇残日数など、単一データを返すエンドポイントはすべて
/// `{ "data": T }` 形式で返す。一覧は [`PaginatedResponse`](crate::PaginatedResponse) を使う。
///
/// ## 使用例
///
/// ```
/// use hrflow_shared::ApiResponse;
///
/// let response = ApiResponse::new("pending");
/// assert_eq!(response.data, "pending");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
