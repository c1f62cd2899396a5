//! # 休暇申請ワークフロー
//!
//! 休暇申請と、その多段階承認を管理する。
//!
//! ## 概念モデル
//!
//! - **LeaveRequest**: 申請者・期間・理由と承認進捗を持つ休暇申請
//! - **ApprovalProgress**: 申請時点の承認ルート、承認済みロール、承認イベント
//! - **ApprovalEngine**: 申請の作成と承認操作の判定・実行
//! - **visible_requests**: 閲覧者ロールに応じた申請の絞り込み
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use chrono::{NaiveDate, TimeZone, Utc};
//! use hrflow_domain::{
//!     employee::{DepartmentName, Employee, EmployeeId, EmployeeName, NewEmployee},
//!     leave::{ApprovalEngine, LeaveApplication, LeaveKind, LeaveStatus},
//!     role::Role,
//! };
//!
//! let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
//! let requester = Employee::new(NewEmployee {
//!     id: EmployeeId::new(),
//!     name: EmployeeName::new("Ana Pérez")?,
//!     role: Role::Colaborador,
//!     department: DepartmentName::new("Ventas")?,
//!     hire_date: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
//! });
//!
//! let request = ApprovalEngine::default().create_request(
//!     &requester,
//!     LeaveApplication {
//!         kind: LeaveKind::Vacation,
//!         start_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
//!         end_date: NaiveDate::from_ymd_opt(2025, 4, 5).unwrap(),
//!         justification: "家族旅行".to_string(),
//!     },
//!     now,
//! )?;
//! assert_eq!(request.status(), LeaveStatus::Pending);
//! assert_eq!(request.current_approver(), Some(Role::Gerente));
//! # Ok(())
//! # }
//! ```

mod engine;
mod progress;
mod request;
mod visibility;

pub use engine::*;
pub use progress::*;
pub use request::*;
pub use visibility::*;
