//! # 従業員ハンドラ
//!
//! - `GET /employees/{id}/vacation-balance` - 休暇残日数

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use hrflow_domain::employee::EmployeeId;
use hrflow_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ServiceError, usecase::EmployeeUseCaseImpl};

/// 従業員 API の共有状態
pub struct EmployeeState {
    pub usecase: EmployeeUseCaseImpl,
}

/// 休暇残日数 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VacationBalanceDto {
    pub employee_id: Uuid,
    pub allotted:    u32,
    pub used:        u32,
    pub available:   u32,
}

/// GET /employees/{id}/vacation-balance
#[tracing::instrument(skip_all, fields(%id))]
pub async fn get_vacation_balance(
    State(state): State<Arc<EmployeeState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let balance = state
        .usecase
        .get_vacation_balance(&EmployeeId::from_uuid(id))
        .await?;

    Ok(Json(ApiResponse::new(VacationBalanceDto {
        employee_id: id,
        allotted:    balance.allotted(),
        used:        balance.used(),
        available:   balance.available(),
    })))
}
