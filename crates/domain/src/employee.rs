//! # 従業員
//!
//! 申請者・承認者の身元情報（ロール、部署）と休暇残日数を表現する。
//! 従業員ディレクトリはサービスにとっての ID プロバイダであり、
//! 申請者のロール・部署は申請時にここから解決される。
//!
//! ## 休暇付与日数
//!
//! | 勤続年数（満） | 年間付与日数 |
//! |--------------|------------|
//! | 1 年未満 | 0 |
//! | 1〜4 年 | 14 |
//! | 5 年以上 | 18 |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{DomainError, role::Role};

define_uuid_id! {
    /// 従業員 ID（一意識別子）
    pub struct EmployeeId;
}

define_text! {
    /// 従業員名（値オブジェクト）
    pub struct EmployeeName("従業員名", max = 100), redacted;
}

define_text! {
    /// 部署名（値オブジェクト）
    pub struct DepartmentName("部署名", max = 100);
}

/// 勤続年数に応じた年間休暇付与日数
pub fn annual_vacation_days(hire_date: NaiveDate, today: NaiveDate) -> u32 {
    match today.years_since(hire_date).unwrap_or(0) {
        0 => 0,
        1..=4 => 14,
        _ => 18,
    }
}

/// 休暇残日数（値オブジェクト）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VacationBalance {
    allotted: u32,
    used:     u32,
}

impl VacationBalance {
    pub fn new(allotted: u32, used: u32) -> Self {
        Self { allotted, used }
    }

    pub fn allotted(&self) -> u32 {
        self.allotted
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    /// 残日数（付与日数 − 使用日数、0 未満にはならない）
    pub fn available(&self) -> u32 {
        self.allotted.saturating_sub(self.used)
    }

}

/// 従業員エンティティ
///
/// 付与日数は保持せず、入社日と基準日から都度計算する。
///
/// # 不変条件
///
/// - `vacation_used` は承認済みの休暇申請（種別 vacation）の日数合計と一致する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    id:            EmployeeId,
    name:          EmployeeName,
    role:          Role,
    department:    DepartmentName,
    hire_date:     NaiveDate,
    vacation_used: u32,
}

/// 従業員の新規作成パラメータ
pub struct NewEmployee {
    pub id:         EmployeeId,
    pub name:       EmployeeName,
    pub role:       Role,
    pub department: DepartmentName,
    pub hire_date:  NaiveDate,
}

/// 従業員の DB 復元パラメータ
pub struct EmployeeRecord {
    pub id:            EmployeeId,
    pub name:          EmployeeName,
    pub role:          Role,
    pub department:    DepartmentName,
    pub hire_date:     NaiveDate,
    pub vacation_used: u32,
}

impl Employee {
    /// 新しい従業員を作成する（使用日数 0）
    pub fn new(params: NewEmployee) -> Self {
        Self {
            id:            params.id,
            name:          params.name,
            role:          params.role,
            department:    params.department,
            hire_date:     params.hire_date,
            vacation_used: 0,
        }
    }

    /// 既存のデータから復元する
    pub fn from_db(record: EmployeeRecord) -> Self {
        Self {
            id:            record.id,
            name:          record.name,
            role:          record.role,
            department:    record.department,
            hire_date:     record.hire_date,
            vacation_used: record.vacation_used,
        }
    }

    pub fn id(&self) -> &EmployeeId {
        &self.id
    }

    pub fn name(&self) -> &EmployeeName {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn department(&self) -> &DepartmentName {
        &self.department
    }

    pub fn hire_date(&self) -> NaiveDate {
        self.hire_date
    }

    /// 承認済みの休暇日数の合計
    pub fn vacation_used(&self) -> u32 {
        self.vacation_used
    }

    /// 基準日時点の休暇残日数
    pub fn vacation(&self, today: NaiveDate) -> VacationBalance {
        VacationBalance::new(
            annual_vacation_days(self.hire_date, today),
            self.vacation_used,
        )
    }

    /// 承認された休暇日数を使用済みとして記録する
    pub fn record_vacation_usage(self, days: u32) -> Self {
        Self {
            vacation_used: self.vacation_used.saturating_add(days),
            ..self
        }
    }

    /// 操作者として名乗ったロールがディレクトリ上のロールと一致するか検証する
    ///
    /// # エラー
    ///
    /// 一致しない場合は `DomainError::Forbidden` を返す。
    pub fn verify_role(&self, claimed: Role) -> Result<(), DomainError> {
        if self.role != claimed {
            return Err(DomainError::Forbidden(format!(
                "従業員 {} のロールは {} ではありません",
                self.id, claimed
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2025, 3, 1)
    }

    #[fixture]
    fn employee() -> Employee {
        Employee::new(NewEmployee {
            id:         EmployeeId::new(),
            name:       EmployeeName::new("Ana Pérez").unwrap(),
            role:       Role::Colaborador,
            department: DepartmentName::new("Ventas").unwrap(),
            hire_date:  date(2020, 1, 15),
        })
    }

    #[rstest]
    #[case(date(2025, 1, 1), date(2025, 3, 1), 0)]
    #[case(date(2024, 3, 2), date(2025, 3, 1), 0)]
    #[case(date(2024, 3, 1), date(2025, 3, 1), 14)]
    #[case(date(2021, 3, 2), date(2025, 3, 1), 14)]
    #[case(date(2020, 3, 1), date(2025, 3, 1), 18)]
    #[case(date(2026, 1, 1), date(2025, 3, 1), 0)]
    fn test_勤続年数に応じた付与日数(
        #[case] hire_date: NaiveDate,
        #[case] today: NaiveDate,
        #[case] expected: u32,
    ) {
        assert_eq!(annual_vacation_days(hire_date, today), expected);
    }

    #[rstest]
    fn test_新規従業員の残日数は付与日数と一致する(employee: Employee) {
        assert_eq!(employee.vacation(today()), VacationBalance::new(18, 0));
        assert_eq!(employee.vacation(today()).available(), 18);
    }

    #[rstest]
    fn test_休暇使用で残日数が減る(employee: Employee) {
        let employee = employee.record_vacation_usage(5);

        assert_eq!(employee.vacation(today()).used(), 5);
        assert_eq!(employee.vacation(today()).available(), 13);
    }

    #[test]
    fn test_復元した従業員の付与日数は勤続年数から計算される() {
        let employee = Employee::from_db(EmployeeRecord {
            id:            EmployeeId::new(),
            name:          EmployeeName::new("Luis Gómez").unwrap(),
            role:          Role::Gerente,
            department:    DepartmentName::new("Operaciones").unwrap(),
            hire_date:     date(2021, 6, 1),
            vacation_used: 4,
        });

        assert_eq!(employee.vacation(date(2022, 5, 31)), VacationBalance::new(0, 4));
        assert_eq!(employee.vacation(date(2022, 6, 1)), VacationBalance::new(14, 4));
        assert_eq!(employee.vacation(date(2026, 6, 1)).available(), 14);
    }

    #[test]
    fn test_残日数は0未満にならない() {
        assert_eq!(VacationBalance::new(5, 8).available(), 0);
    }

    #[rstest]
    fn test_ロールが一致すれば検証に成功する(employee: Employee) {
        assert!(employee.verify_role(Role::Colaborador).is_ok());
    }

    #[rstest]
    fn test_ロールが一致しなければforbidden(employee: Employee) {
        assert!(matches!(
            employee.verify_role(Role::DirectorRrhh),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn test_従業員名のdebug出力はマスクされる() {
        let name = EmployeeName::new("Ana Pérez").unwrap();

        assert!(format!("{name:?}").contains("[REDACTED]"));
    }
}
