//! # 共通値オブジェクト
//!
//! 複数のエンティティで共有される値オブジェクトを定義する。
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: プリミティブ型をラップし、型安全性を確保
//! - **バリデーション**: 生成時に検証し、不正な値の存在を型レベルで排除
//! - **不変性**: 一度作成したら変更不可
//!
//! ## 含まれる型
//!
//! | 型 | ラップ対象 | 用途 |
//! |---|-----------|------|
//! | [`Version`] | `u32` | 楽観的ロック用のバージョン番号 |
//! | [`LeavePeriod`] | 開始日 + 終了日 | 休暇期間（日数は両端を含む） |
//! | [`Justification`] | `String` | 申請理由 |
//! | [`OverrideJustification`] | `String` | 強制承認・強制却下の理由 |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{DomainError, RuleViolation};

// =========================================================================
// Version（バージョン番号）
// =========================================================================

/// バージョン番号（値オブジェクト）
///
/// 休暇申請の楽観的ロックに使用する。
/// 1 から始まり、承認操作が成功するたびにインクリメントされる。
///
/// # 不変条件
///
/// - バージョン番号は 1 以上
///
/// # 使用例
///
/// ```rust
/// use hrflow_domain::value_objects::Version;
///
/// let v1 = Version::initial();
/// assert_eq!(v1.as_u32(), 1);
///
/// let v2 = v1.next();
/// assert_eq!(v2.as_u32(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(u32);

impl Version {
    /// 初期バージョン（1）を作成する
    pub fn initial() -> Self {
        Self(1)
    }

    /// 指定した値からバージョンを作成する
    ///
    /// # エラー
    ///
    /// 0 の場合は `DomainError::Validation` を返す。
    pub fn new(value: u32) -> Result<Self, DomainError> {
        if value == 0 {
            return Err(DomainError::Validation(
                "バージョン番号は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 次のバージョンを返す
    ///
    /// u32 の最大値では飽和する。実運用では到達しない想定。
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// 内部の u32 値を取得する
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// i32 に変換する（DB 互換用）
    ///
    /// i32 の範囲を超える値は `i32::MAX` に丸める。
    pub fn as_i32(&self) -> i32 {
        i32::try_from(self.0).unwrap_or(i32::MAX)
    }
}

impl TryFrom<i32> for Version {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .map_err(|_| {
                DomainError::Validation("バージョン番号は 1 以上である必要があります".to_string())
            })
            .and_then(Self::new)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::initial()
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

// =========================================================================
// LeavePeriod（休暇期間）
// =========================================================================

/// 休暇期間（値オブジェクト）
///
/// # 不変条件
///
/// - `start < end`（同日の申請は受け付けない）
///
/// 日数は開始日と終了日の両方を含む暦日数で数える。
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use chrono::NaiveDate;
/// use hrflow_domain::value_objects::LeavePeriod;
///
/// let period = LeavePeriod::new(
///     NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 4, 10).unwrap(),
/// )?;
/// assert_eq!(period.day_count(), 10);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeavePeriod {
    start: NaiveDate,
    end:   NaiveDate,
}

impl LeavePeriod {
    /// 開始日と終了日から休暇期間を作成する
    ///
    /// # エラー
    ///
    /// `start >= end` の場合は [`RuleViolation::DateOrder`] を返す。
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if start >= end {
            return Err(RuleViolation::DateOrder.into());
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// 両端を含む暦日数
    pub fn day_count(&self) -> u32 {
        let days = (self.end - self.start).num_days() + 1;
        u32::try_from(days).unwrap_or(u32::MAX)
    }
}

// =========================================================================
// 申請理由
// =========================================================================

define_text! {
    /// 申請理由（値オブジェクト）
    ///
    /// 前後の空白を除去した上で 1〜1000 文字。
    pub struct Justification("申請理由", max = 1000);
}

define_text! {
    /// 強制承認・強制却下の理由（値オブジェクト）
    ///
    /// 監査ログとしてイベントに記録される。
    pub struct OverrideJustification("強制処理の理由", max = 1000);
}
