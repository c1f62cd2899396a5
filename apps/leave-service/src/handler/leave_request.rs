//! # 休暇申請ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /requests` - 休暇申請の作成
//! - `POST /requests/{id}/actions` - 承認・却下・強制処理
//! - `GET /requests` - 閲覧可能な休暇申請の一覧
//! - `GET /requests/{id}` - 休暇申請の取得
//! - `GET /requests/{id}/permissions` - 操作可否の判定
//!
//! ロール・休暇種別・判断は文字列で受け取り、ドメインの型に変換する。
//! 不正な値は 400 Validation Error になる。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use hrflow_domain::{
    DomainError,
    employee::EmployeeId,
    leave::{
        ActPermission,
        ApprovalDecision,
        ApprovalEvent,
        LeaveKind,
        LeaveRequest,
        LeaveRequestId,
        LeaveStatus,
    },
    role::Role,
    value_objects::Version,
};
use hrflow_infra::repository::LeaveRequestFilter;
use hrflow_shared::{ApiResponse, PaginatedResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    usecase::{
        ActOnLeaveRequestInput,
        LeaveRequestUseCaseImpl,
        ListLeaveRequestsInput,
        SubmitLeaveRequestInput,
        Viewer,
    },
};

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

/// 休暇申請 API の共有状態
pub struct LeaveRequestState {
    pub usecase: LeaveRequestUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 休暇申請作成リクエスト
#[derive(Debug, Deserialize)]
pub struct SubmitLeaveRequestRequest {
    pub requester_id:  Uuid,
    pub kind:          String,
    pub start_date:    NaiveDate,
    pub end_date:      NaiveDate,
    pub justification: String,
}

/// 承認操作リクエスト
#[derive(Debug, Deserialize)]
pub struct ActRequest {
    pub actor_role:             String,
    pub actor_id:               Uuid,
    pub decision:               String,
    pub override_justification: Option<String>,
    /// 楽観的ロック用バージョン（任意）
    pub version:                Option<i32>,
}

/// 閲覧者クエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ViewerQuery {
    pub viewer_role: String,
    pub viewer_id:   Uuid,
}

/// 一覧取得クエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub viewer_role: String,
    pub viewer_id:   Uuid,
    pub status:      Option<String>,
    pub kind:        Option<String>,
    pub offset:      Option<usize>,
    pub limit:       Option<usize>,
}

/// 操作可否クエリパラメータ
#[derive(Debug, Deserialize)]
pub struct PermissionQuery {
    pub actor_role: String,
    pub actor_id:   Uuid,
}

/// 休暇申請 DTO
#[derive(Debug, Serialize)]
pub struct LeaveRequestDto {
    pub id:                   Uuid,
    pub requester_id:         Uuid,
    pub requester_role:       Role,
    pub requester_department: String,
    pub kind:                 LeaveKind,
    pub start_date:           NaiveDate,
    pub end_date:             NaiveDate,
    pub day_count:            u32,
    pub justification:        String,
    pub status:               LeaveStatus,
    pub current_approver:     Option<Role>,
    pub required_approvers:   Vec<Role>,
    pub completed_approvals:  Vec<Role>,
    pub history:              Vec<ApprovalEvent>,
    pub final_approver:       Option<Uuid>,
    pub overridden:           bool,
    pub submitted_at:         String,
    pub completed_at:         Option<String>,
    pub version:              u32,
}

impl From<&LeaveRequest> for LeaveRequestDto {
    fn from(request: &LeaveRequest) -> Self {
        Self {
            id:                   *request.id().as_uuid(),
            requester_id:         *request.requester_id().as_uuid(),
            requester_role:       request.requester_role(),
            requester_department: request.requester_department().as_str().to_string(),
            kind:                 request.kind(),
            start_date:           request.start_date(),
            end_date:             request.end_date(),
            day_count:            request.day_count(),
            justification:        request.justification().as_str().to_string(),
            status:               request.status(),
            current_approver:     request.current_approver(),
            required_approvers:   request.progress().required().to_vec(),
            completed_approvals:  request.progress().completed().to_vec(),
            history:              request.progress().events().to_vec(),
            final_approver:       request.final_approver().map(|id| *id.as_uuid()),
            overridden:           request.is_overridden(),
            submitted_at:         request.submitted_at().to_rfc3339(),
            completed_at:         request.completed_at().map(|t| t.to_rfc3339()),
            version:              request.version().as_u32(),
        }
    }
}

fn parse_kind(value: &str) -> Result<LeaveKind, ServiceError> {
    value
        .parse()
        .map_err(|_| DomainError::Validation(format!("不正な休暇種別: {value}")).into())
}

fn parse_status(value: &str) -> Result<LeaveStatus, ServiceError> {
    value
        .parse()
        .map_err(|_| DomainError::Validation(format!("不正なステータス: {value}")).into())
}

fn parse_decision(value: &str) -> Result<ApprovalDecision, ServiceError> {
    value
        .parse()
        .map_err(|_| DomainError::Validation(format!("不正な判断: {value}")).into())
}

// --- ハンドラ ---

/// POST /requests
///
/// ## レスポンス
///
/// - `201 Created`: 作成された休暇申請
/// - `400 Bad Request`: バリデーションエラー、ルール違反
/// - `404 Not Found`: 申請者が存在しない
#[tracing::instrument(skip_all)]
pub async fn submit_leave_request(
    State(state): State<Arc<LeaveRequestState>>,
    Json(req): Json<SubmitLeaveRequestRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let input = SubmitLeaveRequestInput {
        requester_id:  EmployeeId::from_uuid(req.requester_id),
        kind:          parse_kind(&req.kind)?,
        start_date:    req.start_date,
        end_date:      req.end_date,
        justification: req.justification,
    };

    let request = state.usecase.submit(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(LeaveRequestDto::from(&request))),
    ))
}

/// POST /requests/{id}/actions
///
/// ## レスポンス
///
/// - `200 OK`: 遷移後の休暇申請
/// - `400 Bad Request`: バリデーションエラー、強制処理の理由なし
/// - `403 Forbidden`: 操作権限なし、自分の申請、ロール詐称
/// - `404 Not Found`: 申請または操作者が存在しない
/// - `409 Conflict`: 完了済みの申請、バージョン不一致
#[tracing::instrument(skip_all, fields(%id))]
pub async fn act_on_leave_request(
    State(state): State<Arc<LeaveRequestState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let input = ActOnLeaveRequestInput {
        actor_role:             Role::parse(&req.actor_role)?,
        actor_id:               EmployeeId::from_uuid(req.actor_id),
        decision:               parse_decision(&req.decision)?,
        override_justification: req.override_justification,
        expected_version:       req.version.map(Version::try_from).transpose()?,
    };

    let request = state
        .usecase
        .act(&LeaveRequestId::from_uuid(id), input)
        .await?;

    Ok(Json(ApiResponse::new(LeaveRequestDto::from(&request))))
}

/// GET /requests
///
/// 閲覧者に見える休暇申請を申請日時の降順で返す。
/// `limit` は 1〜100 に丸める（既定 20）。
/// 閲覧範囲と条件はクエリで絞り込み、ページングはその結果に対して行う。
#[tracing::instrument(skip_all)]
pub async fn list_leave_requests(
    State(state): State<Arc<LeaveRequestState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let input = ListLeaveRequestsInput {
        viewer: Viewer {
            role: Role::parse(&query.viewer_role)?,
            id:   EmployeeId::from_uuid(query.viewer_id),
        },
        filter: LeaveRequestFilter {
            status: query.status.as_deref().map(parse_status).transpose()?,
            kind:   query.kind.as_deref().map(parse_kind).transpose()?,
            scope:  None,
        },
    };

    let requests = state.usecase.list(input).await?;

    let items: Vec<LeaveRequestDto> = requests.iter().map(LeaveRequestDto::from).collect();
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    Ok(Json(PaginatedResponse::from_page(
        items,
        query.offset.unwrap_or(0),
        limit,
    )))
}

/// GET /requests/{id}
///
/// 閲覧範囲外の申請は 403 を返す。
#[tracing::instrument(skip_all, fields(%id))]
pub async fn get_leave_request(
    State(state): State<Arc<LeaveRequestState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ViewerQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let viewer = Viewer {
        role: Role::parse(&query.viewer_role)?,
        id:   EmployeeId::from_uuid(query.viewer_id),
    };

    let request = state
        .usecase
        .get(&LeaveRequestId::from_uuid(id), viewer)
        .await?;

    Ok(Json(ApiResponse::new(LeaveRequestDto::from(&request))))
}

/// GET /requests/{id}/permissions
///
/// 申請者本人や承認ルート外のロールには `allowed: false` を返す。
#[tracing::instrument(skip_all, fields(%id))]
pub async fn get_permissions(
    State(state): State<Arc<LeaveRequestState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<PermissionQuery>,
) -> Result<Json<ApiResponse<ActPermission>>, ServiceError> {
    let permission = state
        .usecase
        .permissions(
            &LeaveRequestId::from_uuid(id),
            Viewer {
                role: Role::parse(&query.actor_role)?,
                id:   EmployeeId::from_uuid(query.actor_id),
            },
        )
        .await?;

    Ok(Json(ApiResponse::new(permission)))
}
