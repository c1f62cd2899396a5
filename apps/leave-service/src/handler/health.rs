//! # ヘルスチェックハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /health` - Liveness（プロセスが応答できるか）
//! - `GET /health/ready` - Readiness（データベースに接続できるか）

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use hrflow_infra::db::DatabaseProbe;
use hrflow_shared::{CheckStatus, HealthResponse, ReadinessResponse, ReadinessStatus};

/// Readiness Check の共有状態
pub struct ReadinessState {
    pub probe: Arc<dyn DatabaseProbe>,
}

/// ヘルスチェックエンドポイント
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}

/// Readiness Check エンドポイント
///
/// 全チェック OK → 200、1 つでも失敗 → 503。
#[tracing::instrument(skip_all)]
pub async fn readiness_check(State(state): State<Arc<ReadinessState>>) -> impl IntoResponse {
    let checks = BTreeMap::from([(
        "database".to_string(),
        check_database(state.probe.as_ref()).await,
    )]);
    let response = ReadinessResponse::from_checks(checks);

    let status = match response.status {
        ReadinessStatus::Ready => StatusCode::OK,
        ReadinessStatus::NotReady => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(response))
}

/// データベースへの疎通を確認する（タイムアウト: 5 秒）
async fn check_database(probe: &dyn DatabaseProbe) -> CheckStatus {
    match tokio::time::timeout(Duration::from_secs(5), probe.ping()).await {
        Ok(Ok(())) => CheckStatus::Ok,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "readiness check: database ping failed");
            CheckStatus::Error
        }
        Err(_) => {
            tracing::warn!("readiness check: database check timed out");
            CheckStatus::Error
        }
    }
}
