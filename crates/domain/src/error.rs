//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## 設計方針
//!
//! - **型による分類**: エラーの種類を列挙型で明示し、パターンマッチで処理可能に
//! - **thiserror 活用**: `#[error(...)]` マクロでエラーメッセージを自動生成
//! - **HTTP ステータスへのマッピング**: API 層でステータスコードに変換可能
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 値オブジェクトの形式不正 |
//! | `Rule` | 400 Bad Request | 申請・承認ルール違反（違反ルールを識別可能） |
//! | `Forbidden` | 403 Forbidden | 操作権限がない |
//! | `InvalidState` | 409 Conflict | 完了済み申請への操作 |
//!
//! 存在しないエンティティと楽観的ロックの失敗はユースケース層で扱う。
//!
//! ## 使用例
//!
//! ```rust
//! use hrflow_domain::{DomainError, RuleViolation};
//!
//! let error = DomainError::Rule(RuleViolation::DateOrder);
//! assert_eq!(error.rule().map(RuleViolation::code), Some("date_order"));
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// ビジネスロジックの実行中に発生する例外状態を表現する。
/// API 層でこのエラーを受け取り、適切な HTTP レスポンスに変換する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値の形式が不正な場合に使用する。
    ///
    /// # 例
    ///
    /// - 必須フィールドが未入力
    /// - 文字数制限の超過
    /// - 不正な列挙値
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// 業務ルール違反
    ///
    /// 申請作成・承認操作の前提条件を満たさない場合に使用する。
    /// どのルールに違反したかを [`RuleViolation`] で識別できる。
    #[error("ルール違反: {0}")]
    Rule(RuleViolation),

    /// 権限エラー
    ///
    /// 操作者のロールでは申請を処理できない場合に使用する。
    /// 認証（Authentication）ではなく認可（Authorization）の失敗を表す。
    #[error("権限がありません: {0}")]
    Forbidden(String),

    /// 状態不正エラー
    ///
    /// 承認済み・却下済みなど、既に完了した申請に対して操作しようとした場合に使用する。
    /// 同時操作で先行した承認者がいた場合もこのエラーになる。
    #[error("不正な状態です: {0}")]
    InvalidState(String),
}

impl DomainError {
    /// 業務ルール違反の場合、違反したルールを返す
    pub fn rule(&self) -> Option<&RuleViolation> {
        match self {
            Self::Rule(rule) => Some(rule),
            _ => None,
        }
    }
}

impl From<RuleViolation> for DomainError {
    fn from(rule: RuleViolation) -> Self {
        Self::Rule(rule)
    }
}

/// 申請作成・承認操作で検証される業務ルール
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    /// 開始日が終了日より前でない
    #[error("開始日は終了日より前である必要があります")]
    DateOrder,

    /// 開始日が申請日より後でない
    #[error("開始日は申請日より後の日付である必要があります")]
    StartNotInFuture,

    /// 休暇残日数の不足
    #[error("休暇残日数が不足しています（申請: {requested} 日, 残日数: {available} 日）")]
    InsufficientVacationBalance {
        /// 申請日数
        requested: u32,
        /// 残日数
        available: u32,
    },

    /// 強制承認・強制却下の理由が未入力
    #[error("強制処理には理由の入力が必要です")]
    MissingOverrideJustification,

    /// 承認ルートに申請者自身のロールが含まれる
    #[error("承認ルートに申請者自身のロールを含めることはできません: {0}")]
    SelfApproval(String),

    /// 承認ルートに同じロールが重複している
    #[error("承認ルートに同じロールが重複しています: {0}")]
    DuplicateApprover(String),
}

impl RuleViolation {
    /// API レスポンスに含めるルールコード
    pub fn code(&self) -> &'static str {
        match self {
            Self::DateOrder => "date_order",
            Self::StartNotInFuture => "start_not_in_future",
            Self::InsufficientVacationBalance { .. } => "insufficient_vacation_balance",
            Self::MissingOverrideJustification => "missing_override_justification",
            Self::SelfApproval(_) => "self_approval",
            Self::DuplicateApprover(_) => "duplicate_approver",
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(RuleViolation::DateOrder, "date_order")]
    #[case(RuleViolation::StartNotInFuture, "start_not_in_future")]
    #[case(
        RuleViolation::InsufficientVacationBalance { requested: 10, available: 5 },
        "insufficient_vacation_balance"
    )]
    #[case(RuleViolation::MissingOverrideJustification, "missing_override_justification")]
    fn test_ルールコードが識別可能(#[case] rule: RuleViolation, #[case] expected: &str) {
        assert_eq!(rule.code(), expected);
    }

    #[test]
    fn test_残日数不足のメッセージに日数が含まれる() {
        let error = DomainError::from(RuleViolation::InsufficientVacationBalance {
            requested: 10,
            available: 5,
        });

        let message = error.to_string();

        assert!(message.contains("10"));
        assert!(message.contains("5"));
    }

    #[test]
    fn test_rule_はルール違反以外でnoneを返す() {
        let error = DomainError::Forbidden("テスト".to_string());

        assert!(error.rule().is_none());
    }
}
