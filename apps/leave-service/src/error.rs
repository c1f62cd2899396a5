//! # 休暇申請サービスのエラー定義
//!
//! サービス固有のエラーと、RFC 9457 Problem Details レスポンスへの変換を定義する。
//!
//! | エラー | ステータス |
//! |-------|-----------|
//! | `Domain(Validation)` | 400 |
//! | `Domain(Rule)` | 400（`rule` 付き） |
//! | `Domain(Forbidden)` / `Forbidden` | 403 |
//! | `NotFound` | 404 |
//! | `Domain(InvalidState)` / `Conflict` / `Database(Conflict)` | 409 |
//! | `Database` | 500（detail は固定、原因はログに出力） |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hrflow_domain::DomainError;
use hrflow_infra::{InfraError, InfraErrorKind};
use hrflow_shared::{ErrorResponse, event_log::error as log_error};
use thiserror::Error;

/// 休暇申請サービスで発生するエラー
#[derive(Debug, Error)]
pub enum ServiceError {
    /// ドメイン層のエラー（バリデーション・ルール違反・権限・状態不正）
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 権限不足
    #[error("権限がありません: {0}")]
    Forbidden(String),

    /// 競合（楽観的ロック失敗）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(#[from] InfraError),
}

impl ServiceError {
    fn to_error_response(&self) -> ErrorResponse {
        match self {
            Self::Domain(DomainError::Validation(msg)) => ErrorResponse::validation_error(msg),
            Self::Domain(DomainError::Rule(rule)) => {
                ErrorResponse::rule_violation(rule.code(), rule.to_string())
            }
            Self::Domain(DomainError::Forbidden(msg)) | Self::Forbidden(msg) => {
                ErrorResponse::forbidden(msg)
            }
            Self::NotFound(msg) => ErrorResponse::not_found(msg),
            Self::Domain(DomainError::InvalidState(msg)) => ErrorResponse::invalid_state(msg),
            Self::Conflict(msg) => ErrorResponse::conflict(msg),
            Self::Database(e) => match e.kind() {
                InfraErrorKind::Conflict { .. } => ErrorResponse::conflict(
                    "休暇申請は既に更新されています。最新の情報を取得してください。",
                ),
                kind => {
                    let error_kind = match kind {
                        InfraErrorKind::Database(_) => log_error::kind::DATABASE,
                        InfraErrorKind::Serialization(_) => log_error::kind::SERIALIZATION,
                        _ => log_error::kind::INTERNAL,
                    };
                    tracing::error!(
                        error.category = log_error::category::INFRASTRUCTURE,
                        error.kind = error_kind,
                        span_trace = %e.span_trace(),
                        "データベースエラー: {}",
                        e
                    );
                    ErrorResponse::internal_error()
                }
            },
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = self.to_error_response();
        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use hrflow_domain::RuleViolation;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ServiceError::Domain(DomainError::Validation("x".into())), 400)]
    #[case(ServiceError::Domain(RuleViolation::DateOrder.into()), 400)]
    #[case(ServiceError::Domain(DomainError::Forbidden("x".into())), 403)]
    #[case(ServiceError::NotFound("従業員が見つかりません".into()), 404)]
    #[case(ServiceError::Domain(DomainError::InvalidState("x".into())), 409)]
    #[case(ServiceError::Conflict("x".into()), 409)]
    #[case(ServiceError::Database(InfraError::conflict("LeaveRequest", "1")), 409)]
    #[case(ServiceError::Database(InfraError::unexpected("boom")), 500)]
    fn test_ステータスコードへの変換(#[case] error: ServiceError, #[case] expected: u16) {
        assert_eq!(error.into_response().status().as_u16(), expected);
    }

    #[test]
    fn test_ルール違反はルールコードを含む() {
        let error = ServiceError::Domain(
            RuleViolation::InsufficientVacationBalance {
                requested: 5,
                available: 2,
            }
            .into(),
        );

        let body = error.to_error_response();

        assert_eq!(body.rule.as_deref(), Some("insufficient_vacation_balance"));
        assert_eq!(body.title, "Rule Violation");
    }

    #[test]
    fn test_内部エラーは詳細を隠す() {
        let body = ServiceError::Database(InfraError::unexpected("接続文字列: secret")).to_error_response();

        assert_eq!(body.detail, "内部エラーが発生しました");
    }
}
