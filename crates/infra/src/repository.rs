//! # リポジトリ実装
//!
//! 休暇申請と従業員ディレクトリの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **トレイト + PostgreSQL 実装**: ユースケース層はトレイトにのみ依存する
//! - **書き込みはトランザクション必須**: 書き込みメソッドは `&mut TxContext` を取る
//! - **テスタビリティ**: `test-utils` feature でインメモリ実装（[`crate::fake`]）を提供

pub mod employee_repository;
pub mod leave_request_repository;

pub use employee_repository::{EmployeeRepository, PostgresEmployeeRepository, VacationUsage};
pub use leave_request_repository::{
    LeaveRequestFilter,
    LeaveRequestRepository,
    PostgresLeaveRequestRepository,
};
