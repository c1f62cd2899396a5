//! # インフラ層エラー
//!
//! リポジトリが返すエラー。種別（[`InfraErrorKind`]）に加えて、
//! エラー生成時点の [`SpanTrace`] を保持する。
//!
//! リポジトリのメソッドは `#[tracing::instrument]` で計装されているため、
//! SpanTrace から「どの申請のどの操作で失敗したか」を辿れる。
//! 500 を返すときにサービス層がこれをログに出力する。

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層エラー
#[derive(Debug, Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    #[error("データベースエラー: {0}")]
    Database(#[source] sqlx::Error),

    /// 承認進捗（JSONB）の変換失敗
    #[error("シリアライズエラー: {0}")]
    Serialization(#[source] serde_json::Error),

    /// 楽観的ロックの失敗
    ///
    /// `UPDATE ... WHERE version = $n` が 0 行だった場合に返す。
    #[error("{entity} {id} は他の操作で更新されています")]
    Conflict { entity: &'static str, id: String },

    /// 保存済みの値がドメインの不変条件を満たさない、などの想定外の状態
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

impl InfraError {
    fn capture(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    pub fn conflict(entity: &'static str, id: impl ToString) -> Self {
        Self::capture(InfraErrorKind::Conflict {
            entity,
            id: id.to_string(),
        })
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::capture(InfraErrorKind::Unexpected(message.into()))
    }

    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self.kind, InfraErrorKind::Conflict { .. })
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

impl From<sqlx::Error> for InfraError {
    fn from(source: sqlx::Error) -> Self {
        Self::capture(InfraErrorKind::Database(source))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(source: serde_json::Error) -> Self {
        Self::capture(InfraErrorKind::Serialization(source))
    }
}

/// 行からドメインモデルへの復元失敗
impl From<hrflow_domain::DomainError> for InfraError {
    fn from(source: hrflow_domain::DomainError) -> Self {
        Self::unexpected(source.to_string())
    }
}
