//! 従業員ユースケース

use std::sync::Arc;

use hrflow_domain::{
    clock::Clock,
    employee::{EmployeeId, VacationBalance},
};
use hrflow_infra::repository::EmployeeRepository;

use crate::{error::ServiceError, usecase::helpers::FindResultExt};

/// 従業員ユースケース
pub struct EmployeeUseCaseImpl {
    employee_repo: Arc<dyn EmployeeRepository>,
    clock:         Arc<dyn Clock>,
}

impl EmployeeUseCaseImpl {
    pub fn new(employee_repo: Arc<dyn EmployeeRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            employee_repo,
            clock,
        }
    }

    /// 本日時点の休暇残日数を取得する
    #[tracing::instrument(skip_all, fields(%employee_id))]
    pub async fn get_vacation_balance(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<VacationBalance, ServiceError> {
        let employee = self
            .employee_repo
            .find_by_id(employee_id)
            .await
            .or_not_found("従業員")?;

        Ok(employee.vacation(self.clock.now().date_naive()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use hrflow_domain::{
        clock::FixedClock,
        employee::{DepartmentName, Employee, EmployeeName, NewEmployee},
        role::Role,
    };
    use hrflow_infra::fake::FakeEmployeeRepository;
    use pretty_assertions::assert_eq;

    use super::*;

    fn sut_at(repo: &FakeEmployeeRepository, y: i32, m: u32, d: u32) -> EmployeeUseCaseImpl {
        let now = Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap();
        EmployeeUseCaseImpl::new(Arc::new(repo.clone()), Arc::new(FixedClock::new(now)))
    }

    fn carla(repo: &FakeEmployeeRepository) -> Employee {
        let employee = Employee::new(NewEmployee {
            id:         EmployeeId::new(),
            name:       EmployeeName::new("Carla Ruiz").unwrap(),
            role:       Role::Gerente,
            department: DepartmentName::new("Finanzas").unwrap(),
            hire_date:  NaiveDate::from_ymd_opt(2020, 5, 2).unwrap(),
        })
        .record_vacation_usage(3);
        repo.add(employee.clone());
        employee
    }

    #[tokio::test]
    async fn test_勤続年数に応じた残日数を返す() {
        let repo = FakeEmployeeRepository::new();
        let employee = carla(&repo);

        let balance = sut_at(&repo, 2025, 5, 2)
            .get_vacation_balance(employee.id())
            .await
            .unwrap();

        assert_eq!(balance, VacationBalance::new(18, 3));
        assert_eq!(balance.available(), 15);
    }

    #[tokio::test]
    async fn test_付与日数は照会日の勤続年数で決まる() {
        let repo = FakeEmployeeRepository::new();
        let employee = carla(&repo);

        let before = sut_at(&repo, 2025, 5, 1)
            .get_vacation_balance(employee.id())
            .await
            .unwrap();
        let after = sut_at(&repo, 2025, 5, 2)
            .get_vacation_balance(employee.id())
            .await
            .unwrap();

        assert_eq!(before.allotted(), 14);
        assert_eq!(after.allotted(), 18);
    }

    #[tokio::test]
    async fn test_存在しない従業員はnot_found() {
        let repo = FakeEmployeeRepository::new();
        let sut = sut_at(&repo, 2025, 5, 2);

        let result = sut.get_vacation_balance(&EmployeeId::new()).await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
