//! # ルーター構築
//!
//! 依存コンポーネントからユースケースと共有状態を組み立て、axum のルーターを返す。
//! `main` は PostgreSQL 実装を、統合テストはインメモリ実装を渡す。

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use hrflow_domain::{clock::Clock, leave::ApprovalEngine, role::ApprovalPolicy};
use hrflow_infra::{
    db::{DatabaseProbe, TransactionManager},
    repository::{EmployeeRepository, LeaveRequestRepository},
};
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        EmployeeState,
        LeaveRequestState,
        ReadinessState,
        act_on_leave_request,
        get_leave_request,
        get_permissions,
        get_vacation_balance,
        health_check,
        list_leave_requests,
        readiness_check,
        submit_leave_request,
    },
    usecase::{EmployeeUseCaseImpl, LeaveRequestUseCaseImpl},
};

/// ルーターが依存するコンポーネント
pub struct AppDeps {
    pub leave_repo:    Arc<dyn LeaveRequestRepository>,
    pub employee_repo: Arc<dyn EmployeeRepository>,
    pub tx_manager:    Arc<dyn TransactionManager>,
    pub probe:         Arc<dyn DatabaseProbe>,
    pub clock:         Arc<dyn Clock>,
    pub policy:        ApprovalPolicy,
}

/// 休暇申請サービスのルーターを構築する
pub fn build_router(deps: AppDeps) -> Router {
    let leave_state = Arc::new(LeaveRequestState {
        usecase: LeaveRequestUseCaseImpl::new(
            deps.leave_repo,
            deps.employee_repo.clone(),
            deps.tx_manager,
            ApprovalEngine::new(deps.policy),
            deps.clock.clone(),
        ),
    });
    let employee_state = Arc::new(EmployeeState {
        usecase: EmployeeUseCaseImpl::new(deps.employee_repo, deps.clock),
    });
    let readiness_state = Arc::new(ReadinessState { probe: deps.probe });

    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .with_state(readiness_state)
        .route(
            "/requests",
            get(list_leave_requests).post(submit_leave_request),
        )
        .route("/requests/{id}", get(get_leave_request))
        .route("/requests/{id}/actions", post(act_on_leave_request))
        .route("/requests/{id}/permissions", get(get_permissions))
        .with_state(leave_state)
        .route(
            "/employees/{id}/vacation-balance",
            get(get_vacation_balance),
        )
        .with_state(employee_state)
        .layer(TraceLayer::new_for_http())
}
