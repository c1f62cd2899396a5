//! # LeaveRequestRepository
//!
//! 休暇申請の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **承認進捗は JSONB**: 承認ルート・承認済みロール・イベントログを 1 カラムに保持
//! - **楽観的ロック**: `UPDATE ... WHERE id = $1 AND version = $2` で競合を検出
//! - **書き込みはトランザクション必須**: `TxContext` を引数に取る

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hrflow_domain::{
    employee::{DepartmentName, EmployeeId},
    leave::{
        ApprovalProgress,
        LeaveKind,
        LeaveRequest,
        LeaveRequestId,
        LeaveRequestRecord,
        LeaveStatus,
        VisibilityScope,
    },
    role::Role,
    value_objects::{Justification, Version},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// 一覧取得の絞り込み条件
///
/// `scope` を指定すると閲覧範囲内の申請だけを読み込む。
/// ページングは呼び出し側で行うため、結果は閲覧範囲内の全件になる。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaveRequestFilter {
    pub status: Option<LeaveStatus>,
    pub kind:   Option<LeaveKind>,
    pub scope:  Option<VisibilityScope>,
}

impl LeaveRequestFilter {
    pub fn matches(&self, request: &LeaveRequest) -> bool {
        self.status.is_none_or(|s| s == request.status())
            && self.kind.is_none_or(|k| k == request.kind())
            && self.scope.as_ref().is_none_or(|scope| scope.contains(request))
    }
}

/// 休暇申請リポジトリトレイト
#[async_trait]
pub trait LeaveRequestRepository: Send + Sync {
    /// 新規の休暇申請を保存する
    async fn insert(&self, tx: &mut TxContext, request: &LeaveRequest) -> Result<(), InfraError>;

    /// 楽観的ロック付きで休暇申請を更新する
    ///
    /// DB 上の version が `expected_version` と一致しない場合は
    /// `InfraErrorKind::Conflict` を返し、何も更新しない。
    async fn update_with_version_check(
        &self,
        tx: &mut TxContext,
        request: &LeaveRequest,
        expected_version: Version,
    ) -> Result<(), InfraError>;

    /// ID で休暇申請を取得する
    async fn find_by_id(&self, id: &LeaveRequestId) -> Result<Option<LeaveRequest>, InfraError>;

    /// 条件に一致する休暇申請を取得する
    async fn find_all(&self, filter: LeaveRequestFilter) -> Result<Vec<LeaveRequest>, InfraError>;
}

/// DB の leave_requests テーブルの行を表す中間構造体
///
/// `TryFrom` で `LeaveRequest` への変換ロジックを一箇所に集約する。
#[derive(sqlx::FromRow)]
struct LeaveRequestRow {
    id:                   Uuid,
    requester_id:         Uuid,
    requester_role:       String,
    requester_department: String,
    kind:                 String,
    start_date:           NaiveDate,
    end_date:             NaiveDate,
    justification:        String,
    status:               String,
    current_approver:     Option<String>,
    progress:             serde_json::Value,
    final_approver:       Option<Uuid>,
    overridden:           bool,
    submitted_at:         DateTime<Utc>,
    completed_at:         Option<DateTime<Utc>>,
    version:              i32,
    updated_at:           DateTime<Utc>,
}

impl TryFrom<LeaveRequestRow> for LeaveRequest {
    type Error = InfraError;

    fn try_from(row: LeaveRequestRow) -> Result<Self, Self::Error> {
        let progress: ApprovalProgress = serde_json::from_value(row.progress)?;

        Ok(LeaveRequest::from_db(LeaveRequestRecord {
            id: LeaveRequestId::from_uuid(row.id),
            requester_id: EmployeeId::from_uuid(row.requester_id),
            requester_role: Role::parse(&row.requester_role)?,
            requester_department: DepartmentName::new(row.requester_department)?,
            kind: row
                .kind
                .parse::<LeaveKind>()
                .map_err(|e| InfraError::unexpected(format!("不正な休暇種別: {e}")))?,
            start_date: row.start_date,
            end_date: row.end_date,
            justification: Justification::new(row.justification)?,
            status: row
                .status
                .parse::<LeaveStatus>()
                .map_err(|e| InfraError::unexpected(format!("不正なステータス: {e}")))?,
            current_approver: row.current_approver.as_deref().map(Role::parse).transpose()?,
            progress,
            final_approver: row.final_approver.map(EmployeeId::from_uuid),
            overridden: row.overridden,
            submitted_at: row.submitted_at,
            completed_at: row.completed_at,
            version: Version::try_from(row.version)?,
            updated_at: row.updated_at,
        })?)
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT
        id, requester_id, requester_role, requester_department, kind,
        start_date, end_date, justification, status, current_approver,
        progress, final_approver, overridden, submitted_at, completed_at,
        version, updated_at
    FROM leave_requests
"#;

fn day_count(request: &LeaveRequest) -> Result<i32, InfraError> {
    i32::try_from(request.day_count())
        .map_err(|_| InfraError::unexpected(format!("日数が大きすぎます: {}", request.day_count())))
}

/// PostgreSQL 実装の LeaveRequestRepository
#[derive(Debug, Clone)]
pub struct PostgresLeaveRequestRepository {
    pool: PgPool,
}

impl PostgresLeaveRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveRequestRepository for PostgresLeaveRequestRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(id = %request.id()))]
    async fn insert(&self, tx: &mut TxContext, request: &LeaveRequest) -> Result<(), InfraError> {
        let status: &str = request.status().into();
        let kind: &str = request.kind().into();
        let progress = serde_json::to_value(request.progress())?;

        sqlx::query(
            r#"
            INSERT INTO leave_requests (
                id, requester_id, requester_role, requester_department, kind,
                start_date, end_date, day_count, justification, status,
                current_approver, progress, final_approver, overridden,
                submitted_at, completed_at, version, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(request.id().as_uuid())
        .bind(request.requester_id().as_uuid())
        .bind(request.requester_role().as_str())
        .bind(request.requester_department().as_str())
        .bind(kind)
        .bind(request.start_date())
        .bind(request.end_date())
        .bind(day_count(request)?)
        .bind(request.justification().as_str())
        .bind(status)
        .bind(request.current_approver().map(|r| r.as_str()))
        .bind(progress)
        .bind(request.final_approver().map(|id| *id.as_uuid()))
        .bind(request.is_overridden())
        .bind(request.submitted_at())
        .bind(request.completed_at())
        .bind(request.version().as_i32())
        .bind(request.updated_at())
        .execute(tx.conn()?)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %request.id(), %expected_version))]
    async fn update_with_version_check(
        &self,
        tx: &mut TxContext,
        request: &LeaveRequest,
        expected_version: Version,
    ) -> Result<(), InfraError> {
        let status: &str = request.status().into();
        let progress = serde_json::to_value(request.progress())?;

        let result = sqlx::query(
            r#"
            UPDATE leave_requests SET
                status = $1,
                current_approver = $2,
                progress = $3,
                final_approver = $4,
                overridden = $5,
                completed_at = $6,
                version = $7,
                updated_at = $8
            WHERE id = $9 AND version = $10
            "#,
        )
        .bind(status)
        .bind(request.current_approver().map(|r| r.as_str()))
        .bind(progress)
        .bind(request.final_approver().map(|id| *id.as_uuid()))
        .bind(request.is_overridden())
        .bind(request.completed_at())
        .bind(request.version().as_i32())
        .bind(request.updated_at())
        .bind(request.id().as_uuid())
        .bind(expected_version.as_i32())
        .execute(tx.conn()?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(InfraError::conflict("LeaveRequest", request.id()));
        }

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &LeaveRequestId) -> Result<Option<LeaveRequest>, InfraError> {
        let row: Option<LeaveRequestRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        row.map(LeaveRequest::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(?filter))]
    async fn find_all(&self, filter: LeaveRequestFilter) -> Result<Vec<LeaveRequest>, InfraError> {
        let status: Option<&str> = filter.status.map(Into::into);
        let kind: Option<&str> = filter.kind.map(Into::into);
        let requester_roles: Option<Vec<&str>> = filter
            .scope
            .as_ref()
            .map(|scope| scope.requester_roles.iter().map(|r| r.as_str()).collect());
        let own: Option<Uuid> = filter
            .scope
            .as_ref()
            .and_then(|scope| scope.own.as_ref())
            .map(|id| *id.as_uuid());

        let rows: Vec<LeaveRequestRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS}
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR kind = $2)
              AND ($3::TEXT[] IS NULL OR requester_role = ANY($3) OR requester_id = $4)
            ORDER BY submitted_at DESC, id DESC"
        ))
        .bind(status)
        .bind(kind)
        .bind(requester_roles)
        .bind(own)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LeaveRequest::try_from).collect()
    }
}
