//! # HRFlow インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! このクレートはリポジトリトレイトとその PostgreSQL 実装を提供する。
//! 外部システムの詳細をカプセル化し、ドメイン層をインフラの変更から保護する。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理、マイグレーション
//! - **トランザクション**: `TxContext` / `TransactionManager`
//! - **リポジトリ実装**: 休暇申請と従業員ディレクトリの永続化
//!
//! ## 依存関係
//!
//! ```text
//! leave-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL データベース接続管理とトランザクション
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - リポジトリ実装
//! - `fake` - テスト用インメモリ実装（`test-utils` feature）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use hrflow_infra::{db, repository::PostgresLeaveRequestRepository};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::connect("postgres://localhost/hrflow", db::PoolSettings::default()).await?;
//!     db::run_migrations(&pool).await?;
//!     let repository = PostgresLeaveRequestRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod fake;
pub mod repository;

pub use error::{InfraError, InfraErrorKind};
