//! # 承認進捗
//!
//! 申請ごとの承認ルート（申請時点でコピーされた承認者ロールの並び）、
//! 承認済みロール、承認イベントの記録を保持する。
//!
//! イベントログは追記のみで、過去のイベントが書き換えられることはない。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    employee::EmployeeId,
    role::Role,
    value_objects::OverrideJustification,
};

/// 承認者の判断
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

/// 承認操作のモード
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ApprovalMode {
    /// 承認ルートの現在ステップのロールによる通常の承認・却下
    Sequential,
    /// 強制処理権限を持つロールによる、残りステップを飛ばした承認・却下
    ManualOverride,
}

/// 承認イベント（不変）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEvent {
    pub actor_role:    Role,
    pub actor_id:      EmployeeId,
    pub at:            DateTime<Utc>,
    pub decision:      ApprovalDecision,
    pub mode:          ApprovalMode,
    /// 強制処理の理由（`ManualOverride` の場合のみ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<OverrideJustification>,
    /// 強制処理で飛ばされたロール（`required` − `completed`）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bypassed:      Vec<Role>,
}

/// 承認進捗
///
/// JSONB として保存され、読み込み時も [`ApprovalProgress::from_parts`] で検証する。
///
/// # 不変条件
///
/// - `completed` は常に `required` の先頭部分列
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "StoredProgress")]
pub struct ApprovalProgress {
    required:  Vec<Role>,
    completed: Vec<Role>,
    events:    Vec<ApprovalEvent>,
}

#[derive(Deserialize)]
struct StoredProgress {
    required:  Vec<Role>,
    completed: Vec<Role>,
    events:    Vec<ApprovalEvent>,
}

impl TryFrom<StoredProgress> for ApprovalProgress {
    type Error = DomainError;

    fn try_from(stored: StoredProgress) -> Result<Self, Self::Error> {
        Self::from_parts(stored.required, stored.completed, stored.events)
    }
}

impl ApprovalProgress {
    /// 申請時点の承認ルートから進捗を作成する
    pub fn new(required: Vec<Role>) -> Self {
        Self {
            required,
            completed: Vec::new(),
            events: Vec::new(),
        }
    }

    /// 永続化された値から復元する
    ///
    /// # エラー
    ///
    /// `completed` が `required` の先頭部分列でない場合は `DomainError::Validation` を返す。
    pub fn from_parts(
        required: Vec<Role>,
        completed: Vec<Role>,
        events: Vec<ApprovalEvent>,
    ) -> Result<Self, DomainError> {
        if !required.starts_with(&completed) {
            return Err(DomainError::Validation(
                "承認済みロールが承認ルートの先頭部分列になっていません".to_string(),
            ));
        }
        Ok(Self {
            required,
            completed,
            events,
        })
    }

    pub fn required(&self) -> &[Role] {
        &self.required
    }

    pub fn completed(&self) -> &[Role] {
        &self.completed
    }

    pub fn events(&self) -> &[ApprovalEvent] {
        &self.events
    }

    /// 次に承認すべきロール（全ステップ完了時は `None`）
    pub fn next_approver(&self) -> Option<Role> {
        self.required.get(self.completed.len()).copied()
    }

    /// まだ承認されていないロール
    pub fn remaining(&self) -> &[Role] {
        &self.required[self.completed.len()..]
    }

    pub fn is_complete(&self) -> bool {
        self.completed.len() == self.required.len()
    }

    /// 現在ステップの承認を記録する
    pub(crate) fn record_step(mut self, event: ApprovalEvent) -> Self {
        self.completed.push(event.actor_role);
        self.events.push(event);
        self
    }

    /// 承認ステップを進めずにイベントのみ記録する
    pub(crate) fn record_event(mut self, event: ApprovalEvent) -> Self {
        self.events.push(event);
        self
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_承認済みロールが先頭部分列でなければ復元できない() {
        let result = ApprovalProgress::from_parts(
            vec![Role::Gerente, Role::Director],
            vec![Role::Director],
            vec![],
        );

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_次の承認者と残りのロール() {
        let progress = ApprovalProgress::from_parts(
            vec![Role::Gerente, Role::Director, Role::DirectorRrhh],
            vec![Role::Gerente],
            vec![],
        )
        .unwrap();

        assert_eq!(progress.next_approver(), Some(Role::Director));
        assert_eq!(progress.remaining(), &[Role::Director, Role::DirectorRrhh]);
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_空の承認ルートは完了扱い() {
        let progress = ApprovalProgress::new(vec![]);

        assert_eq!(progress.next_approver(), None);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_強制処理イベントを含む進捗をjsonから復元できる() {
        let at = Utc.with_ymd_and_hms(2025, 3, 2, 10, 30, 0).unwrap();
        let progress = ApprovalProgress::new(vec![Role::Gerente, Role::Director])
            .record_step(ApprovalEvent {
                actor_role:    Role::Gerente,
                actor_id:      EmployeeId::new(),
                at,
                decision:      ApprovalDecision::Approved,
                mode:          ApprovalMode::Sequential,
                justification: None,
                bypassed:      vec![],
            })
            .record_event(ApprovalEvent {
                actor_role:    Role::Rrhh,
                actor_id:      EmployeeId::new(),
                at,
                decision:      ApprovalDecision::Rejected,
                mode:          ApprovalMode::ManualOverride,
                justification: Some(OverrideJustification::new("就業規則により不可").unwrap()),
                bypassed:      vec![Role::Director],
            });

        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["events"][1]["mode"], "manual-override");
        assert_eq!(json["events"][1]["justification"], "就業規則により不可");
        assert_eq!(json["events"][1]["bypassed"], serde_json::json!(["director"]));
        assert!(json["events"][0].get("bypassed").is_none());

        let restored: ApprovalProgress = serde_json::from_value(json).unwrap();
        assert_eq!(restored, progress);
    }

    #[test]
    fn test_先頭部分列でない進捗のjsonは読み込めない() {
        let json = serde_json::json!({
            "required": ["gerente", "director"],
            "completed": ["director"],
            "events": [],
        });

        assert!(serde_json::from_value::<ApprovalProgress>(json).is_err());
    }

    #[test]
    fn test_空白だけの強制処理理由を含むjsonは読み込めない() {
        let json = serde_json::json!({
            "required": ["gerente"],
            "completed": [],
            "events": [{
                "actor_role": "rrhh",
                "actor_id": "0195f2a4-8c1e-7000-8000-000000000001",
                "at": "2025-03-02T10:30:00Z",
                "decision": "approved",
                "mode": "manual-override",
                "justification": "   ",
                "bypassed": ["gerente"],
            }],
        });

        assert!(serde_json::from_value::<ApprovalProgress>(json).is_err());
    }

    #[test]
    fn test_モードのワイヤー表現() {
        assert_eq!(
            serde_json::to_value(ApprovalMode::ManualOverride).unwrap(),
            serde_json::json!("manual-override")
        );
        assert_eq!(ApprovalMode::Sequential.to_string(), "sequential");
    }
}
