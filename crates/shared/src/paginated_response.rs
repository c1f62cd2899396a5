//! # ページネーション付きレスポンス
//!
//! オフセットベースのページネーションに対応した一覧レスポンス型。

use serde::{Deserialize, Serialize};

/// ページネーション付きレスポンス
///
/// ## JSON 形式
///
/// ```json
/// {
///   "data": [...],
///   "total": 42,
///   "next_offset": 20
/// }
/// ```
///
/// `total` は絞り込み後の全件数。`next_offset` が `null` の場合は最後のページを意味する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data:        Vec<T>,
    pub total:       usize,
    pub next_offset: Option<usize>,
}

impl<T> PaginatedResponse<T> {
    /// 全件から `offset` 件目以降の最大 `limit` 件を切り出す
    pub fn from_page(items: Vec<T>, offset: usize, limit: usize) -> Self {
        let total = items.len();
        let data: Vec<T> = items.into_iter().skip(offset).take(limit).collect();
        let end = offset.saturating_add(data.len());
        let next_offset = (end < total).then_some(end);

        Self {
            data,
            total,
            next_offset,
        }
    }
}
