//! # HRFlow ドメイン層
//!
//! 休暇申請の承認ワークフローを担うドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! このクレートは DDD（ドメイン駆動設計）の原則に従い、以下を提供する:
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（例: LeaveRequest, Employee）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（例: LeavePeriod, Version）
//! - **ドメインサービス**: エンティティに属さないビジネスロジック（例: ApprovalEngine）
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! leave-service → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB、外部サービス）に一切依存しない。
//! 時刻も [`clock::Clock`] 経由で注入し、エンジン自体は純粋関数として振る舞う。
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`role`] - ロール、承認ルート表、承認ポリシー
//! - [`employee`] - 従業員と休暇付与日数
//! - [`leave`] - 休暇申請と承認ワークフローエンジン
//!
//! ## 使用例
//!
//! ```rust
//! use hrflow_domain::{DomainError, role::{Role, RoleHierarchy}};
//!
//! let hierarchy = RoleHierarchy::default();
//! assert!(hierarchy.required_approvers(Role::Admin).is_empty());
//!
//! let error = DomainError::Forbidden("ロール admin は承認できません".to_string());
//! assert!(error.rule().is_none());
//! ```

#[macro_use]
mod macros;

pub mod clock;
pub mod employee;
pub mod error;
pub mod leave;
pub mod role;
pub mod value_objects;

pub use error::{DomainError, RuleViolation};
