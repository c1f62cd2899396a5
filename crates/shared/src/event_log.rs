//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! JSON ログを `jq` で絞り込めるよう、ログフィールドの命名規約とヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! `tracing::error!` に `error.category` + `error.kind` フィールドを直接追加する。
//! 定数は [`error`] モジュールで提供。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを付与し、`tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: [`event::category`] の定数
/// - `event.action`: [`event::action`] の定数
/// - `event.result`: [`event::result`] の定数
///
/// ## 推奨フィールド
///
/// - `event.entity_type` / `event.entity_id`: 対象エンティティ
/// - `event.actor_id`: 操作者 ID
///
/// ```ignore
/// use hrflow_shared::{event_log::event, log_business_event};
///
/// log_business_event!(
///     event.category = event::category::LEAVE,
///     event.action = event::action::LEAVE_REQUESTED,
///     event.entity_type = event::entity_type::LEAVE_REQUEST,
///     event.entity_id = %request_id,
///     event.actor_id = %requester_id,
///     event.result = event::result::SUCCESS,
///     "休暇申請を受け付けた"
/// );
/// ```
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const LEAVE: &str = "leave";
    }

    /// イベントアクション
    pub mod action {
        /// 休暇申請の作成
        pub const LEAVE_REQUESTED: &str = "leave.requested";
        /// 承認ルート上の 1 段の承認
        pub const LEAVE_APPROVED_STEP: &str = "leave.approved_step";
        /// 却下
        pub const LEAVE_REJECTED: &str = "leave.rejected";
        /// 人事ロールによる手動オーバーライド
        pub const LEAVE_OVERRIDDEN: &str = "leave.overridden";
        /// 最終承認（承認済みへの遷移）
        pub const LEAVE_COMPLETED: &str = "leave.completed";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const LEAVE_REQUEST: &str = "leave_request";
        pub const EMPLOYEE: &str = "employee";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（DB）
        pub const INFRASTRUCTURE: &str = "infrastructure";
    }

    /// エラー種別
    pub mod kind {
        pub const DATABASE: &str = "database";
        pub const SERIALIZATION: &str = "serialization";
        pub const INTERNAL: &str = "internal";
    }
}
