//! # 休暇申請ユースケース
//!
//! 休暇申請の作成・承認操作・閲覧を実装する。
//!
//! 状態遷移と権限判定は [`ApprovalEngine`] が行う。ここでは従業員ディレクトリによる
//! 本人確認、楽観的ロック付きの永続化、休暇残日数の消費、ビジネスイベントの記録を担う。
//!
//! 申請時の残日数チェックは承認済みの日数のみを対象とする。承認待ちの申請が
//! 複数あっても、最終承認時に付与日数を超える申請は残日数不足で失敗する。

use std::sync::Arc;

use chrono::NaiveDate;
use hrflow_domain::{
    DomainError,
    RuleViolation,
    clock::Clock,
    employee::{Employee, EmployeeId},
    leave::{
        ActPermission,
        ApprovalAction,
        ApprovalDecision,
        ApprovalEngine,
        ApprovalMode,
        LeaveApplication,
        LeaveKind,
        LeaveRequest,
        LeaveRequestId,
        LeaveStatus,
        can_view,
        visibility_scope,
        visible_requests,
    },
    role::Role,
    value_objects::Version,
};
use hrflow_infra::{
    db::{TransactionManager, TxContext},
    repository::{
        EmployeeRepository,
        LeaveRequestFilter,
        LeaveRequestRepository,
        VacationUsage,
    },
};
use hrflow_shared::{event_log::event, log_business_event};

use crate::{
    error::ServiceError,
    usecase::helpers::{FindResultExt, map_save_error},
};

/// 休暇申請の入力
#[derive(Debug, Clone)]
pub struct SubmitLeaveRequestInput {
    pub requester_id:  EmployeeId,
    pub kind:          LeaveKind,
    pub start_date:    NaiveDate,
    pub end_date:      NaiveDate,
    pub justification: String,
}

/// 承認操作の入力
///
/// `expected_version` を指定した場合、読み込んだ申請の version と一致しなければ競合とする。
#[derive(Debug, Clone)]
pub struct ActOnLeaveRequestInput {
    pub actor_role:             Role,
    pub actor_id:               EmployeeId,
    pub decision:               ApprovalDecision,
    pub override_justification: Option<String>,
    pub expected_version:       Option<Version>,
}

/// 閲覧者（名乗ったロールと従業員 ID）
#[derive(Debug, Clone)]
pub struct Viewer {
    pub role: Role,
    pub id:   EmployeeId,
}

/// 一覧取得の入力
#[derive(Debug, Clone)]
pub struct ListLeaveRequestsInput {
    pub viewer: Viewer,
    pub filter: LeaveRequestFilter,
}

/// 休暇申請ユースケース
pub struct LeaveRequestUseCaseImpl {
    leave_repo:    Arc<dyn LeaveRequestRepository>,
    employee_repo: Arc<dyn EmployeeRepository>,
    tx_manager:    Arc<dyn TransactionManager>,
    engine:        ApprovalEngine,
    clock:         Arc<dyn Clock>,
}

impl LeaveRequestUseCaseImpl {
    pub fn new(
        leave_repo: Arc<dyn LeaveRequestRepository>,
        employee_repo: Arc<dyn EmployeeRepository>,
        tx_manager: Arc<dyn TransactionManager>,
        engine: ApprovalEngine,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            leave_repo,
            employee_repo,
            tx_manager,
            engine,
            clock,
        }
    }

    /// 休暇申請を作成する
    ///
    /// 1. 申請者を従業員ディレクトリから取得
    /// 2. エンジンで申請を作成（日付・残日数・理由の検証、承認ルートのコピー）
    /// 3. 保存（承認ルートが空で即時承認された有給休暇は残日数も消費）
    #[tracing::instrument(skip_all, fields(requester_id = %input.requester_id))]
    pub async fn submit(&self, input: SubmitLeaveRequestInput) -> Result<LeaveRequest, ServiceError> {
        let requester = self.find_employee(&input.requester_id).await?;

        let request = self.engine.create_request(
            &requester,
            LeaveApplication {
                kind:          input.kind,
                start_date:    input.start_date,
                end_date:      input.end_date,
                justification: input.justification,
            },
            self.clock.now(),
        )?;

        let mut tx = self.tx_manager.begin().await?;
        self.consume_vacation_if_approved(&mut tx, &request).await?;
        self.leave_repo.insert(&mut tx, &request).await?;
        tx.commit().await?;

        log_business_event!(
            event.category = event::category::LEAVE,
            event.action = event::action::LEAVE_REQUESTED,
            event.entity_type = event::entity_type::LEAVE_REQUEST,
            event.entity_id = %request.id(),
            event.actor_id = %request.requester_id(),
            event.result = event::result::SUCCESS,
            leave.kind = %request.kind(),
            leave.day_count = request.day_count(),
            "休暇申請を受け付けた"
        );
        if request.status() == LeaveStatus::Approved {
            log_completed(&request);
        }

        Ok(request)
    }

    /// 承認・却下・強制処理を行う
    ///
    /// 1. 申請と操作者を取得し、名乗ったロールを従業員ディレクトリで検証
    /// 2. 指定があれば version を早期チェック
    /// 3. エンジンで遷移（権限・状態・理由の検証）
    /// 4. 承認完了した有給休暇は残日数を消費し、同じトランザクションで楽観的ロック付きで保存
    ///
    /// 最終承認の時点で残日数が足りない場合は `InsufficientVacationBalance` となり、申請は変更されない。
    #[tracing::instrument(skip_all, fields(%id, actor_role = %input.actor_role, actor_id = %input.actor_id))]
    pub async fn act(
        &self,
        id: &LeaveRequestId,
        input: ActOnLeaveRequestInput,
    ) -> Result<LeaveRequest, ServiceError> {
        let request = self.leave_repo.find_by_id(id).await.or_not_found("休暇申請")?;
        let actor = self.find_employee(&input.actor_id).await?;
        actor.verify_role(input.actor_role)?;

        if input
            .expected_version
            .is_some_and(|expected| expected != request.version())
        {
            return Err(ServiceError::Conflict(
                "休暇申請は既に更新されています。最新の情報を取得してください。".to_string(),
            ));
        }

        let mode = self
            .engine
            .can_act(&request, input.actor_role, &input.actor_id)
            .mode;
        let updated = self.engine.act(
            &request,
            ApprovalAction {
                actor_role:             input.actor_role,
                actor_id:               input.actor_id,
                decision:               input.decision,
                override_justification: input.override_justification,
            },
            self.clock.now(),
        )?;

        let mut tx = self.tx_manager.begin().await?;
        self.consume_vacation_if_approved(&mut tx, &updated).await?;
        self.leave_repo
            .update_with_version_check(&mut tx, &updated, request.version())
            .await
            .map_err(map_save_error)?;
        tx.commit().await?;

        log_action(&updated, actor.id(), mode, input.decision);

        Ok(updated)
    }

    /// 閲覧者に見える休暇申請を、申請日時の降順で取得する
    ///
    /// 閲覧範囲はリポジトリの検索条件に含めるため、範囲外の申請は読み込まない。
    #[tracing::instrument(skip_all, fields(viewer_role = %input.viewer.role, viewer_id = %input.viewer.id))]
    pub async fn list(&self, input: ListLeaveRequestsInput) -> Result<Vec<LeaveRequest>, ServiceError> {
        self.verify_viewer(&input.viewer).await?;

        let filter = LeaveRequestFilter {
            scope: Some(visibility_scope(input.viewer.role, &input.viewer.id)),
            ..input.filter
        };
        let requests = self.leave_repo.find_all(filter).await?;

        Ok(visible_requests(
            input.viewer.role,
            &input.viewer.id,
            requests,
        ))
    }

    /// 休暇申請を 1 件取得する
    ///
    /// 閲覧範囲外の申請は `Forbidden` とする。
    #[tracing::instrument(skip_all, fields(%id, viewer_role = %viewer.role))]
    pub async fn get(&self, id: &LeaveRequestId, viewer: Viewer) -> Result<LeaveRequest, ServiceError> {
        self.verify_viewer(&viewer).await?;

        let request = self.leave_repo.find_by_id(id).await.or_not_found("休暇申請")?;

        if !can_view(viewer.role, &viewer.id, &request) {
            return Err(ServiceError::Forbidden(
                "この休暇申請を閲覧する権限がありません".to_string(),
            ));
        }

        Ok(request)
    }

    /// 操作者がこの申請を処理できるかを返す
    ///
    /// `act` と同じく、名乗ったロールは従業員ディレクトリで検証する。
    #[tracing::instrument(skip_all, fields(%id, actor_role = %actor.role, actor_id = %actor.id))]
    pub async fn permissions(
        &self,
        id: &LeaveRequestId,
        actor: Viewer,
    ) -> Result<ActPermission, ServiceError> {
        let request = self.leave_repo.find_by_id(id).await.or_not_found("休暇申請")?;
        self.verify_viewer(&actor).await?;

        Ok(self.engine.can_act(&request, actor.role, &actor.id))
    }

    async fn find_employee(&self, id: &EmployeeId) -> Result<Employee, ServiceError> {
        self.employee_repo.find_by_id(id).await.or_not_found("従業員")
    }

    async fn verify_viewer(&self, viewer: &Viewer) -> Result<(), ServiceError> {
        let employee = self.find_employee(&viewer.id).await?;
        employee.verify_role(viewer.role)?;
        Ok(())
    }

    async fn consume_vacation_if_approved(
        &self,
        tx: &mut TxContext,
        request: &LeaveRequest,
    ) -> Result<(), ServiceError> {
        if request.kind() != LeaveKind::Vacation || request.status() != LeaveStatus::Approved {
            return Ok(());
        }

        let requester = self.find_employee(request.requester_id()).await?;
        let allotted = requester.vacation(self.clock.now().date_naive()).allotted();

        match self
            .employee_repo
            .record_vacation_usage(tx, request.requester_id(), request.day_count(), allotted)
            .await?
        {
            VacationUsage::Recorded => Ok(()),
            VacationUsage::ExceedsAllotment { available } => {
                Err(DomainError::from(RuleViolation::InsufficientVacationBalance {
                    requested: request.day_count(),
                    available,
                })
                .into())
            }
        }
    }
}

fn log_action(
    request: &LeaveRequest,
    actor_id: &EmployeeId,
    mode: Option<ApprovalMode>,
    decision: ApprovalDecision,
) {
    let action = match (mode, decision) {
        (Some(ApprovalMode::ManualOverride), _) => event::action::LEAVE_OVERRIDDEN,
        (_, ApprovalDecision::Rejected) => event::action::LEAVE_REJECTED,
        (_, ApprovalDecision::Approved) => event::action::LEAVE_APPROVED_STEP,
    };

    log_business_event!(
        event.category = event::category::LEAVE,
        event.action = action,
        event.entity_type = event::entity_type::LEAVE_REQUEST,
        event.entity_id = %request.id(),
        event.actor_id = %actor_id,
        event.result = event::result::SUCCESS,
        leave.status = %request.status(),
        leave.decision = %decision,
        "休暇申請を処理した"
    );

    if request.status() == LeaveStatus::Approved {
        log_completed(request);
    }
}

fn log_completed(request: &LeaveRequest) {
    log_business_event!(
        event.category = event::category::LEAVE,
        event.action = event::action::LEAVE_COMPLETED,
        event.entity_type = event::entity_type::LEAVE_REQUEST,
        event.entity_id = %request.id(),
        event.result = event::result::SUCCESS,
        leave.overridden = request.is_overridden(),
        "休暇申請が承認された"
    );
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use hrflow_domain::{
        DomainError,
        clock::FixedClock,
        employee::{DepartmentName, EmployeeName, NewEmployee},
    };
    use hrflow_infra::fake::{
        FakeEmployeeRepository,
        FakeLeaveRequestRepository,
        FakeTransactionManager,
    };
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    struct Setup {
        sut:           LeaveRequestUseCaseImpl,
        leave_repo:    FakeLeaveRequestRepository,
        employee_repo: FakeEmployeeRepository,
    }

    impl Setup {
        fn hire(&self, role: Role) -> Employee {
            let employee = Employee::new(NewEmployee {
                id: EmployeeId::new(),
                name: EmployeeName::new(format!("{role} さん")).unwrap(),
                role,
                department: DepartmentName::new("Ventas").unwrap(),
                hire_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            });
            self.employee_repo.add(employee.clone());
            employee
        }

        async fn used_days(&self, employee: &Employee) -> u32 {
            self.employee_repo
                .find_by_id(employee.id())
                .await
                .unwrap()
                .unwrap()
                .vacation_used()
        }
    }

    #[fixture]
    fn setup() -> Setup {
        let leave_repo = FakeLeaveRequestRepository::new();
        let employee_repo = FakeEmployeeRepository::new();
        let sut = LeaveRequestUseCaseImpl::new(
            Arc::new(leave_repo.clone()),
            Arc::new(employee_repo.clone()),
            Arc::new(FakeTransactionManager),
            ApprovalEngine::default(),
            Arc::new(FixedClock::new(now())),
        );
        Setup {
            sut,
            leave_repo,
            employee_repo,
        }
    }

    fn vacation(requester: &Employee, end_day: u32) -> SubmitLeaveRequestInput {
        SubmitLeaveRequestInput {
            requester_id:  requester.id().clone(),
            kind:          LeaveKind::Vacation,
            start_date:    date(4, 1),
            end_date:      date(4, end_day),
            justification: "家族旅行".to_string(),
        }
    }

    fn approve(actor: &Employee) -> ActOnLeaveRequestInput {
        ActOnLeaveRequestInput {
            actor_role:             actor.role(),
            actor_id:               actor.id().clone(),
            decision:               ApprovalDecision::Approved,
            override_justification: None,
            expected_version:       None,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn test_申請は承認待ちで保存される(setup: Setup) {
        let requester = setup.hire(Role::Colaborador);

        let request = setup.sut.submit(vacation(&requester, 3)).await.unwrap();

        assert_eq!(request.status(), LeaveStatus::Pending);
        assert_eq!(request.current_approver(), Some(Role::Gerente));
        assert_eq!(setup.leave_repo.all(), vec![request]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_存在しない申請者はnot_found(setup: Setup) {
        let input = SubmitLeaveRequestInput {
            requester_id:  EmployeeId::new(),
            kind:          LeaveKind::PersonalLeave,
            start_date:    date(4, 1),
            end_date:      date(4, 2),
            justification: "私用".to_string(),
        };

        let result = setup.sut.submit(input).await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
        assert!(setup.leave_repo.all().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_ルール違反は保存されない(setup: Setup) {
        let requester = setup.hire(Role::Colaborador);
        let mut input = vacation(&requester, 3);
        input.start_date = date(4, 5);

        let result = setup.sut.submit(input).await;

        assert!(matches!(result, Err(ServiceError::Domain(e)) if e.rule().is_some()));
        assert!(setup.leave_repo.all().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_全段承認で有給休暇の残日数を消費する(setup: Setup) {
        let requester = setup.hire(Role::Gerente);
        let director = setup.hire(Role::Director);
        let director_rrhh = setup.hire(Role::DirectorRrhh);
        let request = setup.sut.submit(vacation(&requester, 3)).await.unwrap();

        let step1 = setup.sut.act(request.id(), approve(&director)).await.unwrap();
        assert_eq!(step1.status(), LeaveStatus::Pending);
        assert_eq!(setup.used_days(&requester).await, 0);

        let done = setup
            .sut
            .act(request.id(), approve(&director_rrhh))
            .await
            .unwrap();

        assert_eq!(done.status(), LeaveStatus::Approved);
        assert_eq!(done.final_approver(), Some(director_rrhh.id()));
        assert_eq!(setup.used_days(&requester).await, 3);
    }

    #[rstest]
    #[tokio::test]
    async fn test_承認ルートが空なら即時承認され残日数を消費する(setup: Setup) {
        let requester = setup.hire(Role::DirectorRrhh);

        let request = setup.sut.submit(vacation(&requester, 2)).await.unwrap();

        assert_eq!(request.status(), LeaveStatus::Approved);
        assert_eq!(request.final_approver(), None);
        assert_eq!(setup.used_days(&requester).await, 2);
    }

    #[rstest]
    #[tokio::test]
    async fn test_名乗ったロールがディレクトリと異なればforbidden(setup: Setup) {
        let requester = setup.hire(Role::Colaborador);
        let impostor = setup.hire(Role::Colaborador);
        let request = setup.sut.submit(vacation(&requester, 3)).await.unwrap();

        let mut input = approve(&impostor);
        input.actor_role = Role::Gerente;
        let result = setup.sut.act(request.id(), input).await;

        assert!(matches!(
            result,
            Err(ServiceError::Domain(DomainError::Forbidden(_)))
        ));
        assert_eq!(setup.leave_repo.all(), vec![request]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_古いversion指定はconflict(setup: Setup) {
        let requester = setup.hire(Role::Colaborador);
        let gerente = setup.hire(Role::Gerente);
        let request = setup.sut.submit(vacation(&requester, 3)).await.unwrap();
        let stale = request.version();
        setup.sut.act(request.id(), approve(&gerente)).await.unwrap();

        let director = setup.hire(Role::Director);
        let mut input = approve(&director);
        input.expected_version = Some(stale);
        let result = setup.sut.act(request.id(), input).await;

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_強制却下で確定し以後の操作はinvalid_state(setup: Setup) {
        let requester = setup.hire(Role::Colaborador);
        let rrhh = setup.hire(Role::Rrhh);
        let gerente = setup.hire(Role::Gerente);
        let request = setup.sut.submit(vacation(&requester, 3)).await.unwrap();

        let rejected = setup
            .sut
            .act(
                request.id(),
                ActOnLeaveRequestInput {
                    actor_role:             Role::Rrhh,
                    actor_id:               rrhh.id().clone(),
                    decision:               ApprovalDecision::Rejected,
                    override_justification: Some("就業規則により不可".to_string()),
                    expected_version:       None,
                },
            )
            .await
            .unwrap();

        assert_eq!(rejected.status(), LeaveStatus::Rejected);
        assert!(rejected.is_overridden());
        let event = rejected.progress().events().last().unwrap();
        assert_eq!(event.mode, ApprovalMode::ManualOverride);
        assert_eq!(
            event.bypassed,
            vec![Role::Gerente, Role::Director, Role::DirectorRrhh]
        );

        let result = setup.sut.act(request.id(), approve(&gerente)).await;
        assert!(matches!(
            result,
            Err(ServiceError::Domain(DomainError::InvalidState(_)))
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn test_閲覧範囲外の申請はforbidden(setup: Setup) {
        let requester = setup.hire(Role::Director);
        let gerente = setup.hire(Role::Gerente);
        let request = setup.sut.submit(vacation(&requester, 2)).await.unwrap();

        let result = setup
            .sut
            .get(
                request.id(),
                Viewer {
                    role: Role::Gerente,
                    id:   gerente.id().clone(),
                },
            )
            .await;

        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_一覧は閲覧範囲と条件で絞り込まれる(setup: Setup) {
        let colaborador = setup.hire(Role::Colaborador);
        let director = setup.hire(Role::Director);
        let gerente = setup.hire(Role::Gerente);
        let own = setup.sut.submit(vacation(&colaborador, 2)).await.unwrap();
        setup.sut.submit(vacation(&director, 2)).await.unwrap();

        let visible = setup
            .sut
            .list(ListLeaveRequestsInput {
                viewer: Viewer {
                    role: Role::Gerente,
                    id:   gerente.id().clone(),
                },
                filter: LeaveRequestFilter {
                    status: Some(LeaveStatus::Pending),
                    ..Default::default()
                },
            })
            .await
            .unwrap();

        assert_eq!(visible, vec![own]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_permissionsは現在の承認者と強制処理権限を区別する(setup: Setup) {
        let requester = setup.hire(Role::Colaborador);
        let request = setup.sut.submit(vacation(&requester, 2)).await.unwrap();

        let as_actor = |employee: &Employee| Viewer {
            role: employee.role(),
            id:   employee.id().clone(),
        };
        let gerente = setup
            .sut
            .permissions(request.id(), as_actor(&setup.hire(Role::Gerente)))
            .await
            .unwrap();
        let rrhh = setup
            .sut
            .permissions(request.id(), as_actor(&setup.hire(Role::Rrhh)))
            .await
            .unwrap();
        let director = setup
            .sut
            .permissions(request.id(), as_actor(&setup.hire(Role::Director)))
            .await
            .unwrap();

        assert_eq!(gerente.mode, Some(ApprovalMode::Sequential));
        assert_eq!(rrhh.mode, Some(ApprovalMode::ManualOverride));
        assert!(!director.allowed);
    }

    #[rstest]
    #[tokio::test]
    async fn test_申請者本人にはpermissionsが許可されない(setup: Setup) {
        let requester = setup.hire(Role::GerenteRrhh);
        let request = setup.sut.submit(vacation(&requester, 2)).await.unwrap();

        let own = setup
            .sut
            .permissions(
                request.id(),
                Viewer {
                    role: Role::GerenteRrhh,
                    id:   requester.id().clone(),
                },
            )
            .await
            .unwrap();

        assert!(!own.allowed);
        assert_eq!(own.mode, None);
    }

    #[rstest]
    #[tokio::test]
    async fn test_permissionsでも名乗ったロールを検証する(setup: Setup) {
        let requester = setup.hire(Role::Colaborador);
        let impostor = setup.hire(Role::Colaborador);
        let request = setup.sut.submit(vacation(&requester, 2)).await.unwrap();

        let result = setup
            .sut
            .permissions(
                request.id(),
                Viewer {
                    role: Role::Rrhh,
                    id:   impostor.id().clone(),
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Domain(DomainError::Forbidden(_)))
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn test_承認待ちの申請が重なっても付与日数を超えて承認されない(setup: Setup) {
        let requester = setup.hire(Role::Colaborador);
        let rrhh = setup.hire(Role::Rrhh);
        let first = setup.sut.submit(vacation(&requester, 15)).await.unwrap();
        let second = setup.sut.submit(vacation(&requester, 15)).await.unwrap();
        let force_approve = || ActOnLeaveRequestInput {
            actor_role:             Role::Rrhh,
            actor_id:               rrhh.id().clone(),
            decision:               ApprovalDecision::Approved,
            override_justification: Some("繁忙期前の消化".to_string()),
            expected_version:       None,
        };

        let approved = setup.sut.act(first.id(), force_approve()).await.unwrap();
        assert_eq!(approved.status(), LeaveStatus::Approved);
        assert_eq!(setup.used_days(&requester).await, 15);

        let result = setup.sut.act(second.id(), force_approve()).await;

        assert!(matches!(
            result,
            Err(ServiceError::Domain(DomainError::Rule(
                RuleViolation::InsufficientVacationBalance {
                    requested: 15,
                    available: 3,
                }
            )))
        ));
        assert_eq!(setup.used_days(&requester).await, 15);
        let stored = setup.leave_repo.find_by_id(second.id()).await.unwrap().unwrap();
        assert_eq!(stored, second);
    }
}
