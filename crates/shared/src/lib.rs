//! # HRFlow 共有ユーティリティ
//!
//! 休暇申請サービス全体で使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - domain / infra / leave-service のすべてから依存される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - axum などの Web フレームワークには依存しない

pub mod api_response;
pub mod error_response;
pub mod event_log;
pub mod health;
pub mod observability;
pub mod paginated_response;

pub use api_response::ApiResponse;
pub use error_response::ErrorResponse;
pub use health::{CheckStatus, HealthResponse, ReadinessResponse, ReadinessStatus};
pub use paginated_response::PaginatedResponse;
