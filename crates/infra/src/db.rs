//! # データベース接続とトランザクション
//!
//! 休暇申請サービスが使う PostgreSQL 接続プール、マイグレーション、
//! トランザクション境界（[`TxContext`]）を提供する。
//!
//! 承認操作は「休暇使用日数の加算」と「申請の version 付き更新」を
//! 1 つのトランザクションで行う。どちらかが失敗すれば両方ロールバックされる。
//!
//! ```rust,ignore
//! use hrflow_infra::db::{self, PoolSettings};
//!
//! async fn example() -> Result<(), hrflow_infra::InfraError> {
//!     let pool = db::connect("postgres://localhost/hrflow", PoolSettings::default()).await?;
//!     db::run_migrations(&pool).await?;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction, postgres::PgPoolOptions};

use crate::error::InfraError;

/// 接続プールの設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// 接続プールを作成する
///
/// 起動時に一度だけ呼び、各リポジトリでプールを共有する。
#[tracing::instrument(skip(database_url))]
pub async fn connect(database_url: &str, settings: PoolSettings) -> Result<PgPool, InfraError> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// `migrations/` の未適用分を適用する
///
/// 複数インスタンスが同時に起動しても、sqlx の advisory lock で直列化される。
pub async fn run_migrations(pool: &PgPool) -> Result<(), InfraError> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| InfraError::unexpected(format!("マイグレーションに失敗しました: {e}")))
}

/// Readiness Check 用の DB 疎通確認
#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    async fn ping(&self) -> Result<(), InfraError>;
}

pub struct PgDatabaseProbe {
    pool: PgPool,
}

impl PgDatabaseProbe {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabaseProbe for PgDatabaseProbe {
    async fn ping(&self) -> Result<(), InfraError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// 書き込みリポジトリに渡すトランザクション
///
/// 書き込みメソッドは `&mut TxContext` を必須とするため、
/// トランザクション外で申請や休暇使用日数を更新するコードは書けない。
/// `commit` せずにドロップするとロールバックされる。
pub struct TxContext(Inner);

enum Inner {
    Pg(Transaction<'static, Postgres>),
    /// インメモリのリポジトリ用
    #[cfg(any(test, feature = "test-utils"))]
    Detached,
}

impl TxContext {
    /// インメモリのリポジトリと組み合わせる、DB を持たない TxContext
    #[cfg(any(test, feature = "test-utils"))]
    pub fn mock() -> Self {
        Self(Inner::Detached)
    }

    pub async fn commit(self) -> Result<(), InfraError> {
        match self.0 {
            Inner::Pg(tx) => Ok(tx.commit().await?),
            #[cfg(any(test, feature = "test-utils"))]
            Inner::Detached => Ok(()),
        }
    }

    pub(crate) fn conn(&mut self) -> Result<&mut PgConnection, InfraError> {
        match &mut self.0 {
            Inner::Pg(tx) => Ok(tx),
            #[cfg(any(test, feature = "test-utils"))]
            Inner::Detached => Err(InfraError::unexpected(
                "DB を持たない TxContext で SQL を実行しようとしました",
            )),
        }
    }
}

/// ユースケースがトランザクションを開始するための trait
///
/// ユースケースは `PgPool` を直接持たない。
#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn begin(&self) -> Result<TxContext, InfraError>;
}

pub struct PgTransactionManager {
    pool: PgPool,
}

impl PgTransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionManager for PgTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        Ok(TxContext(Inner::Pg(self.pool.begin().await?)))
    }
}
