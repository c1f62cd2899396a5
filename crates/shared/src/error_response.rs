//! # エラーレスポンス（RFC 9457 Problem Details）
//!
//! 休暇申請サービスのエラーレスポンス構造体を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換はサービス側の責務（shared に axum 依存を入れない）
//! - 承認ルール違反は拡張メンバー `rule` に機械可読なコードを載せる

use serde::{Deserialize, Serialize};

/// error_type URI のベースパス
const ERROR_TYPE_BASE: &str = "https://hrflow.example.com/errors";

/// エラーレスポンス（RFC 9457 Problem Details）
///
/// `type` フィールドは URI で問題の種類を識別する。
/// `rule` はルール違反のときだけ出力される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title:      String,
    pub status:     u16,
    pub detail:     String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule:       Option<String>,
}

impl ErrorResponse {
    /// 汎用コンストラクタ
    ///
    /// `error_type_suffix` はベース URI に付加される（例: `"rule-violation"`）。
    pub fn new(
        error_type_suffix: &str,
        title: impl Into<String>,
        status: u16,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error_type: format!("{ERROR_TYPE_BASE}/{error_type_suffix}"),
            title: title.into(),
            status,
            detail: detail.into(),
            rule: None,
        }
    }

    /// 400 Validation Error
    pub fn validation_error(detail: impl Into<String>) -> Self {
        Self::new("validation-error", "Validation Error", 400, detail)
    }

    /// 400 Rule Violation
    ///
    /// `rule` には違反したルールのコード（例: `"date_order"`）を渡す。
    pub fn rule_violation(rule: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            rule: Some(rule.into()),
            ..Self::new("rule-violation", "Rule Violation", 400, detail)
        }
    }

    /// 403 Forbidden
    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new("forbidden", "Forbidden", 403, detail)
    }

    /// 404 Not Found
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new("not-found", "Not Found", 404, detail)
    }

    /// 409 Conflict
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new("conflict", "Conflict", 409, detail)
    }

    /// 409 Invalid State
    ///
    /// 確定済みの申請に対する操作など、状態遷移として許されない要求。
    pub fn invalid_state(detail: impl Into<String>) -> Self {
        Self::new("invalid-state", "Invalid State", 409, detail)
    }

    /// 500 Internal Server Error
    ///
    /// detail は固定値。
    pub fn internal_error() -> Self {
        Self::new(
            "internal-error",
            "Internal Server Error",
            500,
            "内部エラーが発生しました",
        )
    }

    /// 503 Service Unavailable
    pub fn service_unavailable(detail: impl Into<String>) -> Self {
        Self::new("service-unavailable", "Service Unavailable", 503, detail)
    }
}
