//! # テスト用インメモリリポジトリ
//!
//! ユースケーステスト・統合テストで使用する Fake 実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! hrflow-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    cmp::Reverse,
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use hrflow_domain::{
    employee::{Employee, EmployeeId},
    leave::{LeaveRequest, LeaveRequestId},
    value_objects::Version,
};

use crate::{
    db::{DatabaseProbe, TransactionManager, TxContext},
    error::InfraError,
    repository::{EmployeeRepository, LeaveRequestFilter, LeaveRequestRepository, VacationUsage},
};

// ===== FakeLeaveRequestRepository =====

#[derive(Clone, Default)]
pub struct FakeLeaveRequestRepository {
    requests: Arc<Mutex<Vec<LeaveRequest>>>,
}

impl FakeLeaveRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テストデータを直接投入する
    pub fn add(&self, request: LeaveRequest) {
        self.requests.lock().unwrap().push(request);
    }

    /// 保存されている全件を取得する
    pub fn all(&self) -> Vec<LeaveRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LeaveRequestRepository for FakeLeaveRequestRepository {
    async fn insert(&self, _tx: &mut TxContext, request: &LeaveRequest) -> Result<(), InfraError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn update_with_version_check(
        &self,
        _tx: &mut TxContext,
        request: &LeaveRequest,
        expected_version: Version,
    ) -> Result<(), InfraError> {
        let mut requests = self.requests.lock().unwrap();
        let stored = requests
            .iter_mut()
            .find(|r| r.id() == request.id())
            .filter(|r| r.version() == expected_version)
            .ok_or_else(|| InfraError::conflict("LeaveRequest", request.id()))?;
        *stored = request.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &LeaveRequestId) -> Result<Option<LeaveRequest>, InfraError> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id() == id)
            .cloned())
    }

    async fn find_all(&self, filter: LeaveRequestFilter) -> Result<Vec<LeaveRequest>, InfraError> {
        let mut requests: Vec<LeaveRequest> = self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        requests.sort_by_key(|r| Reverse((r.submitted_at(), *r.id().as_uuid())));
        Ok(requests)
    }
}

// ===== FakeEmployeeRepository =====

#[derive(Clone, Default)]
pub struct FakeEmployeeRepository {
    employees: Arc<Mutex<Vec<Employee>>>,
}

impl FakeEmployeeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, employee: Employee) {
        self.employees.lock().unwrap().push(employee);
    }
}

#[async_trait]
impl EmployeeRepository for FakeEmployeeRepository {
    async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>, InfraError> {
        Ok(self
            .employees
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id() == id)
            .cloned())
    }

    async fn record_vacation_usage(
        &self,
        _tx: &mut TxContext,
        id: &EmployeeId,
        days: u32,
        allotted: u32,
    ) -> Result<VacationUsage, InfraError> {
        let mut employees = self.employees.lock().unwrap();
        let employee = employees
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or_else(|| InfraError::unexpected(format!("従業員が見つかりません: {id}")))?;

        let used = employee.vacation_used();
        if used.saturating_add(days) > allotted {
            return Ok(VacationUsage::ExceedsAllotment {
                available: allotted.saturating_sub(used),
            });
        }
        *employee = employee.clone().record_vacation_usage(days);
        Ok(VacationUsage::Recorded)
    }
}

// ===== FakeTransactionManager =====

/// Mock TxContext を返す TransactionManager
#[derive(Clone, Default)]
pub struct FakeTransactionManager;

#[async_trait]
impl TransactionManager for FakeTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        Ok(TxContext::mock())
    }
}

// ===== FakeDatabaseProbe =====

/// 疎通結果を切り替えられる DatabaseProbe
#[derive(Clone)]
pub struct FakeDatabaseProbe {
    healthy: Arc<AtomicBool>,
}

impl FakeDatabaseProbe {
    pub fn new(healthy: bool) -> Self {
        Self {
            healthy: Arc::new(AtomicBool::new(healthy)),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl DatabaseProbe for FakeDatabaseProbe {
    async fn ping(&self) -> Result<(), InfraError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(InfraError::unexpected("database unavailable"))
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use hrflow_domain::{
        employee::{DepartmentName, EmployeeName, NewEmployee},
        leave::{
            ApprovalAction,
            ApprovalDecision,
            ApprovalEngine,
            LeaveApplication,
            LeaveKind,
            LeaveStatus,
            visibility_scope,
        },
        role::Role,
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::InfraErrorKind;

    fn requester() -> Employee {
        Employee::new(NewEmployee {
            id:         EmployeeId::new(),
            name:       EmployeeName::new("Ana Pérez").unwrap(),
            role:       Role::Colaborador,
            department: DepartmentName::new("Ventas").unwrap(),
            hire_date:  NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
        })
    }

    fn request(kind: LeaveKind) -> LeaveRequest {
        ApprovalEngine::default()
            .create_request(
                &requester(),
                LeaveApplication {
                    kind,
                    start_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2025, 4, 3).unwrap(),
                    justification: "通院".to_string(),
                },
                Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
            )
            .unwrap()
    }

    #[tokio::test]
    async fn test_古いversionでの更新は競合になる() {
        let repo = FakeLeaveRequestRepository::new();
        let original = request(LeaveKind::Vacation);
        repo.add(original.clone());

        let approved = ApprovalEngine::default()
            .act(
                &original,
                ApprovalAction {
                    actor_role:             Role::Gerente,
                    actor_id:               EmployeeId::new(),
                    decision:               ApprovalDecision::Approved,
                    override_justification: None,
                },
                Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap(),
            )
            .unwrap();
        let mut tx = TxContext::mock();

        repo.update_with_version_check(&mut tx, &approved, original.version())
            .await
            .unwrap();
        let second = repo
            .update_with_version_check(&mut tx, &approved, original.version())
            .await;

        assert!(matches!(
            second.unwrap_err().kind(),
            InfraErrorKind::Conflict { .. }
        ));
        assert_eq!(repo.all(), vec![approved]);
    }

    #[tokio::test]
    async fn test_find_allは条件で絞り込む() {
        let repo = FakeLeaveRequestRepository::new();
        repo.add(request(LeaveKind::Vacation));
        repo.add(request(LeaveKind::MedicalLeave));

        let medical = repo
            .find_all(LeaveRequestFilter {
                status: Some(LeaveStatus::Pending),
                kind: Some(LeaveKind::MedicalLeave),
                ..Default::default()
            })
            .await
            .unwrap();
        let approved = repo
            .find_all(LeaveRequestFilter {
                status: Some(LeaveStatus::Approved),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(medical.len(), 1);
        assert_eq!(medical[0].kind(), LeaveKind::MedicalLeave);
        assert!(approved.is_empty());
    }

    #[tokio::test]
    async fn test_find_allは閲覧範囲外の申請を返さない() {
        let repo = FakeLeaveRequestRepository::new();
        let own = request(LeaveKind::Vacation);
        repo.add(own.clone());
        repo.add(request(LeaveKind::Vacation));

        let visible = repo
            .find_all(LeaveRequestFilter {
                scope: Some(visibility_scope(Role::Colaborador, own.requester_id())),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(visible, vec![own]);
    }

    #[tokio::test]
    async fn test_休暇使用日数は付与日数を超えて記録されない() {
        let repo = FakeEmployeeRepository::new();
        let employee = requester();
        repo.add(employee.clone());
        let mut tx = TxContext::mock();

        let first = repo
            .record_vacation_usage(&mut tx, employee.id(), 15, 18)
            .await
            .unwrap();
        let second = repo
            .record_vacation_usage(&mut tx, employee.id(), 15, 18)
            .await
            .unwrap();

        assert_eq!(first, VacationUsage::Recorded);
        assert_eq!(second, VacationUsage::ExceedsAllotment { available: 3 });
        let stored = repo.find_by_id(employee.id()).await.unwrap().unwrap();
        assert_eq!(stored.vacation_used(), 15);
    }
}
