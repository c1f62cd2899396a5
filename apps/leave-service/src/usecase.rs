//! # ユースケース層
//!
//! 休暇申請サービスのアプリケーションロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリ・トランザクション・時計を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは入力の変換とレスポンス整形のみを行い、ロジックはここに集約
//! - **判断はドメイン**: 状態遷移と権限判定は `ApprovalEngine` に委譲し、ここでは永続化とログを担う
//!
//! ## モジュール構成
//!
//! - [`leave_request`]: 休暇申請の作成・承認操作・閲覧
//! - [`employee`]: 従業員の休暇残日数照会

pub mod employee;
pub(crate) mod helpers;
pub mod leave_request;

pub use employee::EmployeeUseCaseImpl;
pub use leave_request::{
    ActOnLeaveRequestInput,
    LeaveRequestUseCaseImpl,
    ListLeaveRequestsInput,
    SubmitLeaveRequestInput,
    Viewer,
};
