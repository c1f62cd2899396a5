//! # ロールと承認ルート
//!
//! 従業員の職位ロールと、申請者ロールごとの承認ルート（承認者ロールの並び）を管理する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`Role`] | ロール | 組織上の職位。全順序は持たない |
//! | [`RoleHierarchy`] | 承認ルート表 | 申請者ロール → 承認者ロールの並び |
//! | [`ApprovalPolicy`] | 承認ポリシー | 承認ルート表 + 強制処理権限を持つロール |
//!
//! ## 既定の承認ルート
//!
//! | 申請者 | 承認ルート |
//! |--------|-----------|
//! | colaborador | gerente → director → director_rrhh |
//! | gerente | director → director_rrhh |
//! | director | director_rrhh |
//! | rrhh | gerente_rrhh → director_rrhh |
//! | gerente_rrhh | director_rrhh |
//! | director_rrhh | なし（即時承認） |
//! | admin | なし（即時承認） |
//!
//! ## 使用例
//!
//! ```rust
//! use hrflow_domain::role::{ApprovalPolicy, Role};
//!
//! let policy = ApprovalPolicy::default();
//! assert_eq!(
//!     policy.hierarchy().required_approvers(Role::Director),
//!     vec![Role::DirectorRrhh]
//! );
//! assert!(policy.has_override_privilege(Role::Rrhh));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{DomainError, RuleViolation};

/// ロール
///
/// ワイヤー形式・DB 格納値はいずれも snake_case（例: `gerente_rrhh`）。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    /// 一般従業員
    Colaborador,
    /// マネージャー
    Gerente,
    /// ディレクター
    Director,
    /// 人事担当
    Rrhh,
    /// 人事マネージャー
    GerenteRrhh,
    /// 人事ディレクター
    DirectorRrhh,
    /// システム管理者
    Admin,
}

impl Role {
    /// 文字列からロールを解析する
    ///
    /// # エラー
    ///
    /// 未知のロール名の場合は `DomainError::Validation` を返す。
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        value
            .parse()
            .map_err(|_| DomainError::Validation(format!("不正なロール: {value}")))
    }

    /// DB 格納用の文字列表現
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// 承認ルート表
///
/// # 不変条件
///
/// - 承認ルートに申請者自身のロールを含まない（自己承認の禁止）
/// - 承認ルート内でロールが重複しない
///
/// 表に存在しないロールの承認ルートは空として扱う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Role, Vec<Role>>",
    into = "BTreeMap<Role, Vec<Role>>"
)]
pub struct RoleHierarchy {
    chains: BTreeMap<Role, Vec<Role>>,
}

impl RoleHierarchy {
    /// 任意のエントリから承認ルート表を作成する
    ///
    /// # エラー
    ///
    /// - 承認ルートに申請者自身のロールを含む場合: [`RuleViolation::SelfApproval`]
    /// - 承認ルート内でロールが重複する場合: [`RuleViolation::DuplicateApprover`]
    pub fn from_entries(
        entries: impl IntoIterator<Item = (Role, Vec<Role>)>,
    ) -> Result<Self, DomainError> {
        let chains: BTreeMap<Role, Vec<Role>> = entries.into_iter().collect();

        for (requester, chain) in &chains {
            if chain.contains(requester) {
                return Err(RuleViolation::SelfApproval(requester.to_string()).into());
            }
            if !chain.iter().all_unique() {
                return Err(RuleViolation::DuplicateApprover(requester.to_string()).into());
            }
        }

        Ok(Self { chains })
    }

    /// 申請者ロールに対する承認者ロールの並びを返す
    pub fn required_approvers(&self, role: Role) -> Vec<Role> {
        self.chains.get(&role).cloned().unwrap_or_default()
    }
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        use Role::*;

        Self {
            chains: BTreeMap::from([
                (Colaborador, vec![Gerente, Director, DirectorRrhh]),
                (Gerente, vec![Director, DirectorRrhh]),
                (Director, vec![DirectorRrhh]),
                (Rrhh, vec![GerenteRrhh, DirectorRrhh]),
                (GerenteRrhh, vec![DirectorRrhh]),
                (DirectorRrhh, vec![]),
                (Admin, vec![]),
            ]),
        }
    }
}

impl TryFrom<BTreeMap<Role, Vec<Role>>> for RoleHierarchy {
    type Error = DomainError;

    fn try_from(chains: BTreeMap<Role, Vec<Role>>) -> Result<Self, Self::Error> {
        Self::from_entries(chains)
    }
}

impl From<RoleHierarchy> for BTreeMap<Role, Vec<Role>> {
    fn from(hierarchy: RoleHierarchy) -> Self {
        hierarchy.chains
    }
}

/// 承認ポリシー
///
/// 承認ルート表と、現在の承認ステップに関係なく強制承認・強制却下できるロールの集合。
/// JSON ファイルから読み込むことで運用時に差し替えられる。
///
/// ```json
/// {
///   "hierarchy": { "colaborador": ["gerente", "director_rrhh"] },
///   "override_roles": ["rrhh", "director_rrhh"]
/// }
/// ```
///
/// 省略したフィールドは既定値になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    #[serde(default)]
    hierarchy:      RoleHierarchy,
    #[serde(default = "default_override_roles")]
    override_roles: BTreeSet<Role>,
}

fn default_override_roles() -> BTreeSet<Role> {
    BTreeSet::from([Role::Rrhh, Role::GerenteRrhh, Role::DirectorRrhh])
}

impl ApprovalPolicy {
    pub fn new(hierarchy: RoleHierarchy, override_roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            hierarchy,
            override_roles: override_roles.into_iter().collect(),
        }
    }

    /// JSON 文字列からポリシーを読み込む
    ///
    /// # エラー
    ///
    /// JSON が不正な場合、または承認ルート表の不変条件を満たさない場合は
    /// `DomainError::Validation` を返す。
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        serde_json::from_str(json)
            .map_err(|e| DomainError::Validation(format!("承認ポリシーの読み込みに失敗: {e}")))
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    pub fn override_roles(&self) -> &BTreeSet<Role> {
        &self.override_roles
    }

    /// 強制処理権限を持つか
    pub fn has_override_privilege(&self, role: Role) -> bool {
        self.override_roles.contains(&role)
    }
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self {
            hierarchy:      RoleHierarchy::default(),
            override_roles: default_override_roles(),
        }
    }
}
