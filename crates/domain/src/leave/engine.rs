//! # 承認ワークフローエンジン
//!
//! 休暇申請の作成、操作可否の判定、承認・却下・強制処理による状態遷移を行う。
//! エンジンは純粋で、I/O を持たない。現在時刻は呼び出し側から渡す。
//!
//! ## 操作可否の判定
//!
//! | 条件 | モード |
//! |------|-------|
//! | 操作者が申請者本人 | 操作不可 |
//! | 承認待ち かつ 操作者ロール == 現在の承認者 | `sequential` |
//! | 承認待ち かつ 操作者ロールが強制処理権限を持つ | `manual-override` |
//! | それ以外 | 操作不可 |
//!
//! ## act のエラー判定順
//!
//! 1. 完了済み → `InvalidState`
//! 2. 操作不可 → `Forbidden`
//! 3. 強制処理で理由なし → `Rule(MissingOverrideJustification)`

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::{
    progress::{ApprovalDecision, ApprovalMode},
    request::{LeaveKind, LeaveRequest, LeaveRequestId, NewLeaveRequest},
};
use crate::{
    DomainError,
    RuleViolation,
    employee::{Employee, EmployeeId},
    role::{ApprovalPolicy, Role},
    value_objects::{Justification, LeavePeriod, OverrideJustification},
};

/// 休暇申請の入力
#[derive(Debug, Clone)]
pub struct LeaveApplication {
    pub kind:          LeaveKind,
    pub start_date:    NaiveDate,
    pub end_date:      NaiveDate,
    pub justification: String,
}

/// 承認操作の入力
#[derive(Debug, Clone)]
pub struct ApprovalAction {
    pub actor_role:             Role,
    pub actor_id:               EmployeeId,
    pub decision:               ApprovalDecision,
    pub override_justification: Option<String>,
}

/// 操作可否の判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActPermission {
    pub allowed: bool,
    pub mode:    Option<ApprovalMode>,
}

impl ActPermission {
    fn allowed(mode: ApprovalMode) -> Self {
        Self {
            allowed: true,
            mode:    Some(mode),
        }
    }

    fn denied() -> Self {
        Self {
            allowed: false,
            mode:    None,
        }
    }
}

/// 承認ワークフローエンジン
#[derive(Debug, Clone, Default)]
pub struct ApprovalEngine {
    policy: ApprovalPolicy,
}

impl ApprovalEngine {
    pub fn new(policy: ApprovalPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ApprovalPolicy {
        &self.policy
    }

    /// 休暇申請を作成する
    ///
    /// 承認ルートは申請者ロールから申請時点でコピーされる。
    /// 承認ルートが空の場合、申請は即時に承認完了となる。
    ///
    /// # エラー
    ///
    /// - 開始日が終了日以降: [`RuleViolation::DateOrder`]
    /// - 開始日が申請日以前: [`RuleViolation::StartNotInFuture`]
    /// - 有給休暇で残日数不足: [`RuleViolation::InsufficientVacationBalance`]
    /// - 申請理由が空または長すぎる: `DomainError::Validation`
    pub fn create_request(
        &self,
        requester: &Employee,
        application: LeaveApplication,
        now: DateTime<Utc>,
    ) -> Result<LeaveRequest, DomainError> {
        let period = LeavePeriod::new(application.start_date, application.end_date)?;

        if period.start() <= now.date_naive() {
            return Err(RuleViolation::StartNotInFuture.into());
        }

        if application.kind == LeaveKind::Vacation {
            let available = requester.vacation(now.date_naive()).available();
            if period.day_count() > available {
                return Err(RuleViolation::InsufficientVacationBalance {
                    requested: period.day_count(),
                    available,
                }
                .into());
            }
        }

        let justification = Justification::new(application.justification)?;

        Ok(LeaveRequest::new(NewLeaveRequest {
            id: LeaveRequestId::new(),
            requester_id: requester.id().clone(),
            requester_role: requester.role(),
            requester_department: requester.department().clone(),
            kind: application.kind,
            period,
            justification,
            required: self.policy.hierarchy().required_approvers(requester.role()),
            now,
        }))
    }

    /// 操作者が申請を処理できるかを判定する
    ///
    /// 申請者本人はロールにかかわらず処理できない。
    /// 現在の承認者ロールが強制処理権限も持つ場合は `sequential` を優先する。
    pub fn can_act(
        &self,
        request: &LeaveRequest,
        actor_role: Role,
        actor_id: &EmployeeId,
    ) -> ActPermission {
        let Some(current) = request.current_approver() else {
            return ActPermission::denied();
        };
        if actor_id == request.requester_id() {
            return ActPermission::denied();
        }

        if actor_role == current {
            ActPermission::allowed(ApprovalMode::Sequential)
        } else if self.policy.has_override_privilege(actor_role) {
            ActPermission::allowed(ApprovalMode::ManualOverride)
        } else {
            ActPermission::denied()
        }
    }

    /// 承認・却下・強制処理を行い、遷移後の申請を返す
    ///
    /// 失敗時は元の申請に一切変更を加えない。
    pub fn act(
        &self,
        request: &LeaveRequest,
        action: ApprovalAction,
        now: DateTime<Utc>,
    ) -> Result<LeaveRequest, DomainError> {
        if request.is_terminal() {
            return Err(DomainError::InvalidState(format!(
                "休暇申請 {} は既に完了しています（{}）",
                request.id(),
                request.status()
            )));
        }

        let permission = self.can_act(request, action.actor_role, &action.actor_id);
        let Some(mode) = permission.mode.filter(|_| permission.allowed) else {
            let reason = if &action.actor_id == request.requester_id() {
                "自分の休暇申請は処理できません".to_string()
            } else {
                format!("ロール {} はこの休暇申請を処理できません", action.actor_role)
            };
            return Err(DomainError::Forbidden(reason));
        };

        let request = request.clone();
        match (mode, action.decision) {
            (ApprovalMode::Sequential, ApprovalDecision::Approved) => {
                request.approve_step(action.actor_role, action.actor_id, now)
            }
            (ApprovalMode::Sequential, ApprovalDecision::Rejected) => {
                request.reject_step(action.actor_role, action.actor_id, now)
            }
            (ApprovalMode::ManualOverride, decision) => {
                let justification = override_justification(action.override_justification)?;
                request.override_decision(
                    action.actor_role,
                    action.actor_id,
                    decision,
                    justification,
                    now,
                )
            }
        }
    }
}

fn override_justification(value: Option<String>) -> Result<OverrideJustification, DomainError> {
    let value = value.unwrap_or_default();
    if value.trim().is_empty() {
        return Err(RuleViolation::MissingOverrideJustification.into());
    }
    OverrideJustification::new(value)
}
