//! テスト用のアプリケーション組み立て
//!
//! インメモリ実装と固定時計でルーターを構築し、従業員ディレクトリへの登録を簡単にする。

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use hrflow_domain::{
    clock::FixedClock,
    employee::{DepartmentName, Employee, EmployeeId, EmployeeName, NewEmployee},
    role::{ApprovalPolicy, Role},
};
use hrflow_infra::fake::{
    FakeDatabaseProbe,
    FakeEmployeeRepository,
    FakeLeaveRequestRepository,
    FakeTransactionManager,
};

use crate::router::{AppDeps, build_router};

/// テスト用アプリケーション
///
/// ```ignore
/// let app = LeaveTestApp::new();
/// let requester = app.hire(Role::Colaborador);
/// let response = app.router().oneshot(request).await.unwrap();
/// ```
pub struct LeaveTestApp {
    pub leave_repo:    FakeLeaveRequestRepository,
    pub employee_repo: FakeEmployeeRepository,
    pub probe:         FakeDatabaseProbe,
    policy:            ApprovalPolicy,
    now:               DateTime<Utc>,
}

impl LeaveTestApp {
    pub fn new() -> Self {
        Self {
            leave_repo:    FakeLeaveRequestRepository::new(),
            employee_repo: FakeEmployeeRepository::new(),
            probe:         FakeDatabaseProbe::new(true),
            policy:        ApprovalPolicy::default(),
            now:           Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        }
    }

    pub fn with_policy(mut self, policy: ApprovalPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 固定時刻（2025-03-01T09:00:00Z）
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// 勤続 5 年（付与 18 日）の従業員を登録する
    pub fn hire(&self, role: Role) -> Employee {
        let hire_date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        self.hire_on(role, hire_date)
    }

    /// 入社日を指定して従業員を登録する
    pub fn hire_on(&self, role: Role, hire_date: NaiveDate) -> Employee {
        let employee = Employee::new(NewEmployee {
            id: EmployeeId::new(),
            name: EmployeeName::new(format!("{role} テスト")).unwrap(),
            role,
            department: DepartmentName::new("Operaciones").unwrap(),
            hire_date,
        });
        self.employee_repo.add(employee.clone());
        employee
    }

    /// 現在の状態を共有するルーターを構築する
    pub fn router(&self) -> Router {
        build_router(AppDeps {
            leave_repo:    Arc::new(self.leave_repo.clone()),
            employee_repo: Arc::new(self.employee_repo.clone()),
            tx_manager:    Arc::new(FakeTransactionManager),
            probe:         Arc::new(self.probe.clone()),
            clock:         Arc::new(FixedClock::new(self.now)),
            policy:        self.policy.clone(),
        })
    }
}

impl Default for LeaveTestApp {
    fn default() -> Self {
        Self::new()
    }
}
