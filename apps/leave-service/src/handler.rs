//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層に委譲

pub mod employee;
pub mod health;
pub mod leave_request;

pub use employee::{EmployeeState, get_vacation_balance};
pub use health::{ReadinessState, health_check, readiness_check};
pub use leave_request::{
    LeaveRequestState,
    act_on_leave_request,
    get_leave_request,
    get_permissions,
    list_leave_requests,
    submit_leave_request,
};
