//! # 休暇申請サービス ライブラリ
//!
//! ハンドラ・ユースケース・ルーター構築を公開する。
//! 統合テストはインメモリ実装を渡した [`router::build_router`] を経由して HTTP 層を検証する。

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod usecase;

// テストユーティリティ（内部実装、ドキュメントからは隠す）
#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;
