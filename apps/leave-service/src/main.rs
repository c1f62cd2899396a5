//! # 休暇申請サービス サーバー
//!
//! 休暇申請の作成、承認ルートに沿った承認・却下、人事ロールによる強制処理、
//! ロールに応じた閲覧範囲での照会を提供する HTTP サービス。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `LEAVE_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `LEAVE_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `APPROVAL_POLICY_PATH` | No | 承認ポリシー JSON（未設定時は組み込みの既定値） |
//! | `LOG_FORMAT` | No | `json` または `pretty`（デフォルト: `pretty`） |
//!
//! ## 起動方法
//!
//! ```bash
//! LEAVE_PORT=3002 DATABASE_URL=postgres://... cargo run -p hrflow-leave-service
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use hrflow_domain::clock::SystemClock;
use hrflow_infra::{
    db::{self, PgDatabaseProbe, PgTransactionManager},
    repository::{PostgresEmployeeRepository, PostgresLeaveRequestRepository},
};
use hrflow_leave_service::{
    config::LeaveConfig,
    router::{AppDeps, build_router},
};
use hrflow_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(&TracingConfig::from_env("leave-service"));

    let config = LeaveConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "休暇申請サービスを起動します: {}:{}",
        config.host,
        config.port
    );

    let pool = db::connect(&config.database_url, config.pool)
        .await
        .context("データベース接続に失敗しました")?;
    db::run_migrations(&pool)
        .await
        .context("マイグレーションに失敗しました")?;
    tracing::info!("データベースに接続しました");

    let app = build_router(AppDeps {
        leave_repo:    Arc::new(PostgresLeaveRequestRepository::new(pool.clone())),
        employee_repo: Arc::new(PostgresEmployeeRepository::new(pool.clone())),
        tx_manager:    Arc::new(PgTransactionManager::new(pool.clone())),
        probe:         Arc::new(PgDatabaseProbe::new(pool)),
        clock:         Arc::new(SystemClock),
        policy:        config.approval_policy,
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("休暇申請サービスが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
