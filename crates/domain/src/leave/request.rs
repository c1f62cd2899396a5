//! # 休暇申請
//!
//! 申請者・期間・理由と承認進捗を保持する休暇申請エンティティ。
//!
//! 状態遷移は ADT（代数的データ型）で表現し、承認待ちでない申請が
//! 現在の承認者を持つといった不正な状態を型レベルで防止する。
//!
//! ```text
//! Pending(current = role_i) ──approve──▶ Pending(current = role_i+1)
//!          │                  └──────▶ Approved（最終ステップ）
//!          ├──reject──▶ Rejected
//!          └──override──▶ Approved / Rejected
//! ```
//!
//! Approved / Rejected は終端状態で、以降の操作は `InvalidState` になる。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use super::progress::{ApprovalDecision, ApprovalEvent, ApprovalMode, ApprovalProgress};
use crate::{
    DomainError,
    employee::{DepartmentName, EmployeeId},
    role::Role,
    value_objects::{Justification, LeavePeriod, OverrideJustification, Version},
};

define_uuid_id! {
    /// 休暇申請 ID
    pub struct LeaveRequestId;
}

/// 休暇種別
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
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LeaveKind {
    /// 有給休暇（残日数を消費する）
    Vacation,
    /// 私用休暇
    PersonalLeave,
    /// 病気休暇
    MedicalLeave,
}

/// 休暇申請ステータス
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
pub enum LeaveStatus {
    /// 承認待ち
    Pending,
    /// 承認完了
    Approved,
    /// 却下
    Rejected,
}

/// 休暇申請の状態（ADT ベースステートマシン）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveRequestState {
    /// 承認待ち
    Pending(PendingState),
    /// 承認完了
    Approved(CompletedState),
    /// 却下
    Rejected(CompletedState),
}

/// Pending 状態の固有フィールド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingState {
    /// 現在の承認者ロール
    pub current: Role,
}

/// Approved/Rejected 共通の完了状態フィールド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedState {
    pub completed_at:   DateTime<Utc>,
    /// 最終判断を下した従業員（承認ルートが空で即時承認された場合は `None`）
    pub final_approver: Option<EmployeeId>,
    /// 強制処理で完了したか
    pub overridden:     bool,
}

/// 休暇申請エンティティ
///
/// 共通フィールドを外側に、状態固有フィールドを `state` enum に分離する。
///
/// ## 楽観的ロック
///
/// `version` は承認操作が成功するたびにインクリメントされる。
/// 永続化時に読み込み時点の version と一致しない場合は競合（409 Conflict）になる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveRequest {
    id:                   LeaveRequestId,
    requester_id:         EmployeeId,
    requester_role:       Role,
    requester_department: DepartmentName,
    kind:                 LeaveKind,
    period:               LeavePeriod,
    justification:        Justification,
    submitted_at:         DateTime<Utc>,
    progress:             ApprovalProgress,
    version:              Version,
    updated_at:           DateTime<Utc>,
    state:                LeaveRequestState,
}

/// 休暇申請の新規作成パラメータ
///
/// 業務ルールの検証は [`ApprovalEngine::create_request`](super::ApprovalEngine::create_request) が行う。
pub(crate) struct NewLeaveRequest {
    pub id:                   LeaveRequestId,
    pub requester_id:         EmployeeId,
    pub requester_role:       Role,
    pub requester_department: DepartmentName,
    pub kind:                 LeaveKind,
    pub period:               LeavePeriod,
    pub justification:        Justification,
    pub required:             Vec<Role>,
    pub now:                  DateTime<Utc>,
}

/// 休暇申請の DB 復元パラメータ
///
/// DB スキーマのフラット構造を表現する。`from_db()` で不変条件を検証して ADT に変換する。
pub struct LeaveRequestRecord {
    pub id:                   LeaveRequestId,
    pub requester_id:         EmployeeId,
    pub requester_role:       Role,
    pub requester_department: DepartmentName,
    pub kind:                 LeaveKind,
    pub start_date:           NaiveDate,
    pub end_date:             NaiveDate,
    pub justification:        Justification,
    pub status:               LeaveStatus,
    pub current_approver:     Option<Role>,
    pub progress:             ApprovalProgress,
    pub final_approver:       Option<EmployeeId>,
    pub overridden:           bool,
    pub submitted_at:         DateTime<Utc>,
    pub completed_at:         Option<DateTime<Utc>>,
    pub version:              Version,
    pub updated_at:           DateTime<Utc>,
}

impl LeaveRequest {
    /// 新しい休暇申請を作成する
    ///
    /// 承認ルートが空の場合は即時に承認完了となる。
    pub(crate) fn new(params: NewLeaveRequest) -> Self {
        let progress = ApprovalProgress::new(params.required);
        let state = match progress.next_approver() {
            Some(current) => LeaveRequestState::Pending(PendingState { current }),
            None => LeaveRequestState::Approved(CompletedState {
                completed_at:   params.now,
                final_approver: None,
                overridden:     false,
            }),
        };

        Self {
            id: params.id,
            requester_id: params.requester_id,
            requester_role: params.requester_role,
            requester_department: params.requester_department,
            kind: params.kind,
            period: params.period,
            justification: params.justification,
            submitted_at: params.now,
            progress,
            version: Version::initial(),
            updated_at: params.now,
            state,
        }
    }

    /// 既存のデータから復元する
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation`: 不変条件違反（例: Pending で current_approver が承認ルートの次ステップと一致しない）
    pub fn from_db(record: LeaveRequestRecord) -> Result<Self, DomainError> {
        let period = LeavePeriod::new(record.start_date, record.end_date).map_err(|_| {
            DomainError::Validation("休暇期間の開始日が終了日以降になっています".to_string())
        })?;

        let state = match record.status {
            LeaveStatus::Pending => {
                let current = record.current_approver.ok_or_else(|| {
                    DomainError::Validation(
                        "Pending の休暇申請には current_approver が必要です".to_string(),
                    )
                })?;
                if record.progress.next_approver() != Some(current) {
                    return Err(DomainError::Validation(format!(
                        "current_approver {current} が承認ルートの次ステップと一致しません"
                    )));
                }
                LeaveRequestState::Pending(PendingState { current })
            }
            LeaveStatus::Approved | LeaveStatus::Rejected => {
                if record.current_approver.is_some() {
                    return Err(DomainError::Validation(
                        "完了した休暇申請は current_approver を持てません".to_string(),
                    ));
                }
                let completed_at = record.completed_at.ok_or_else(|| {
                    DomainError::Validation(
                        "完了した休暇申請には completed_at が必要です".to_string(),
                    )
                })?;
                let completed = CompletedState {
                    completed_at,
                    final_approver: record.final_approver,
                    overridden: record.overridden,
                };
                if record.status == LeaveStatus::Approved {
                    LeaveRequestState::Approved(completed)
                } else {
                    LeaveRequestState::Rejected(completed)
                }
            }
        };

        Ok(Self {
            id: record.id,
            requester_id: record.requester_id,
            requester_role: record.requester_role,
            requester_department: record.requester_department,
            kind: record.kind,
            period,
            justification: record.justification,
            submitted_at: record.submitted_at,
            progress: record.progress,
            version: record.version,
            updated_at: record.updated_at,
            state,
        })
    }

    // Getter メソッド

    pub fn id(&self) -> &LeaveRequestId {
        &self.id
    }

    pub fn requester_id(&self) -> &EmployeeId {
        &self.requester_id
    }

    pub fn requester_role(&self) -> Role {
        self.requester_role
    }

    pub fn requester_department(&self) -> &DepartmentName {
        &self.requester_department
    }

    pub fn kind(&self) -> LeaveKind {
        self.kind
    }

    pub fn period(&self) -> LeavePeriod {
        self.period
    }

    pub fn start_date(&self) -> NaiveDate {
        self.period.start()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.period.end()
    }

    pub fn day_count(&self) -> u32 {
        self.period.day_count()
    }

    pub fn justification(&self) -> &Justification {
        &self.justification
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn progress(&self) -> &ApprovalProgress {
        &self.progress
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn state(&self) -> &LeaveRequestState {
        &self.state
    }

    pub fn status(&self) -> LeaveStatus {
        match &self.state {
            LeaveRequestState::Pending(_) => LeaveStatus::Pending,
            LeaveRequestState::Approved(_) => LeaveStatus::Approved,
            LeaveRequestState::Rejected(_) => LeaveStatus::Rejected,
        }
    }

    /// 現在の承認者ロール（承認待ちの場合のみ）
    pub fn current_approver(&self) -> Option<Role> {
        match &self.state {
            LeaveRequestState::Pending(s) => Some(s.current),
            LeaveRequestState::Approved(_) | LeaveRequestState::Rejected(_) => None,
        }
    }

    pub fn final_approver(&self) -> Option<&EmployeeId> {
        self.completed_state()
            .and_then(|s| s.final_approver.as_ref())
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_state().map(|s| s.completed_at)
    }

    pub fn is_overridden(&self) -> bool {
        self.completed_state().is_some_and(|s| s.overridden)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.state, LeaveRequestState::Pending(_))
    }

    fn completed_state(&self) -> Option<&CompletedState> {
        match &self.state {
            LeaveRequestState::Approved(s) | LeaveRequestState::Rejected(s) => Some(s),
            LeaveRequestState::Pending(_) => None,
        }
    }

    fn ensure_pending(&self) -> Result<Role, DomainError> {
        match &self.state {
            LeaveRequestState::Pending(s) => Ok(s.current),
            _ => Err(DomainError::InvalidState(format!(
                "休暇申請 {} は既に完了しています（{}）",
                self.id,
                self.status()
            ))),
        }
    }

    // 状態遷移メソッド

    /// 現在ステップを承認する
    ///
    /// 最終ステップの場合は承認完了に遷移する。
    pub(crate) fn approve_step(
        self,
        actor_role: Role,
        actor_id: EmployeeId,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let current = self.ensure_pending()?;
        if current != actor_role {
            return Err(DomainError::Forbidden(format!(
                "現在の承認者は {current} です"
            )));
        }

        let progress = self.progress.record_step(ApprovalEvent {
            actor_role,
            actor_id: actor_id.clone(),
            at: now,
            decision: ApprovalDecision::Approved,
            mode: ApprovalMode::Sequential,
            justification: None,
            bypassed: Vec::new(),
        });

        let state = match progress.next_approver() {
            Some(next) => LeaveRequestState::Pending(PendingState { current: next }),
            None => LeaveRequestState::Approved(CompletedState {
                completed_at:   now,
                final_approver: Some(actor_id),
                overridden:     false,
            }),
        };

        Ok(Self {
            progress,
            state,
            version: self.version.next(),
            updated_at: now,
            ..self
        })
    }

    /// 現在ステップで却下する
    pub(crate) fn reject_step(
        self,
        actor_role: Role,
        actor_id: EmployeeId,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let current = self.ensure_pending()?;
        if current != actor_role {
            return Err(DomainError::Forbidden(format!(
                "現在の承認者は {current} です"
            )));
        }

        let progress = self.progress.record_event(ApprovalEvent {
            actor_role,
            actor_id: actor_id.clone(),
            at: now,
            decision: ApprovalDecision::Rejected,
            mode: ApprovalMode::Sequential,
            justification: None,
            bypassed: Vec::new(),
        });

        Ok(Self {
            progress,
            state: LeaveRequestState::Rejected(CompletedState {
                completed_at:   now,
                final_approver: Some(actor_id),
                overridden:     false,
            }),
            version: self.version.next(),
            updated_at: now,
            ..self
        })
    }

    /// 残りの承認ステップを飛ばして承認・却下する
    ///
    /// 飛ばしたロールはイベントに記録し、`completed` は変更しない。
    pub(crate) fn override_decision(
        self,
        actor_role: Role,
        actor_id: EmployeeId,
        decision: ApprovalDecision,
        justification: OverrideJustification,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        self.ensure_pending()?;

        let bypassed = self.progress.remaining().to_vec();
        let progress = self.progress.record_event(ApprovalEvent {
            actor_role,
            actor_id: actor_id.clone(),
            at: now,
            decision,
            mode: ApprovalMode::ManualOverride,
            justification: Some(justification),
            bypassed,
        });

        let completed = CompletedState {
            completed_at:   now,
            final_approver: Some(actor_id),
            overridden:     true,
        };
        let state = match decision {
            ApprovalDecision::Approved => LeaveRequestState::Approved(completed),
            ApprovalDecision::Rejected => LeaveRequestState::Rejected(completed),
        };

        Ok(Self {
            progress,
            state,
            version: self.version.next(),
            updated_at: now,
            ..self
        })
    }
}
