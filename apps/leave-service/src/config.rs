//! # 休暇申請サービス設定
//!
//! 環境変数からサーバーの設定を読み込む。

use std::{env, fs, path::Path};

use anyhow::{Context, bail};
use hrflow_domain::role::ApprovalPolicy;
use hrflow_infra::db::PoolSettings;

/// 休暇申請サービスの設定
#[derive(Debug, Clone)]
pub struct LeaveConfig {
    /// バインドアドレス
    pub host:            String,
    /// ポート番号
    pub port:            u16,
    /// データベース接続 URL
    pub database_url:    String,
    /// 接続プール（`DATABASE_MAX_CONNECTIONS` で最大接続数を変更できる）
    pub pool:            PoolSettings,
    /// 承認ルートと強制処理権限（`APPROVAL_POLICY_PATH` 未設定時は組み込みの既定値）
    pub approval_policy: ApprovalPolicy,
}

impl LeaveConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let Some(port) = lookup("LEAVE_PORT") else {
            bail!("LEAVE_PORT が設定されていません");
        };
        let port = port
            .parse()
            .with_context(|| format!("LEAVE_PORT は有効なポート番号である必要があります: {port}"))?;

        let Some(database_url) = lookup("DATABASE_URL") else {
            bail!("DATABASE_URL が設定されていません");
        };

        let mut pool = PoolSettings::default();
        if let Some(max) = lookup("DATABASE_MAX_CONNECTIONS") {
            pool.max_connections = max.parse().with_context(|| {
                format!("DATABASE_MAX_CONNECTIONS は正の整数である必要があります: {max}")
            })?;
        }

        let approval_policy = match lookup("APPROVAL_POLICY_PATH") {
            Some(path) => load_policy(Path::new(&path))?,
            None => ApprovalPolicy::default(),
        };

        Ok(Self {
            host: lookup("LEAVE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url,
            pool,
            approval_policy,
        })
    }
}

fn load_policy(path: &Path) -> anyhow::Result<ApprovalPolicy> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("承認ポリシーを読み込めません: {}", path.display()))?;
    ApprovalPolicy::from_json(&json)
        .with_context(|| format!("承認ポリシーが不正です: {}", path.display()))
}
