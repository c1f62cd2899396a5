//! # EmployeeRepository
//!
//! 従業員ディレクトリへのアクセスを担当するリポジトリ。
//! サービスにとっての ID プロバイダであり、申請者・操作者のロールと部署、
//! 休暇の使用日数を提供する。付与日数は入社日から計算するため保存しない。

use async_trait::async_trait;
use chrono::NaiveDate;
use hrflow_domain::{
    employee::{DepartmentName, Employee, EmployeeId, EmployeeName, EmployeeRecord},
    role::Role,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// 従業員リポジトリトレイト
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// ID で従業員を取得する
    async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>, InfraError>;

    /// 承認された休暇日数を使用日数に加算する
    ///
    /// 加算後の使用日数が `allotted` を超える場合は何も更新せず
    /// [`VacationUsage::ExceedsAllotment`] を返す。判定は更新と同じ文で行うため、
    /// 同じ従業員の申請が並行して承認されても付与日数を超えない。
    ///
    /// 休暇申請の更新と同じトランザクションで呼び出す。
    async fn record_vacation_usage(
        &self,
        tx: &mut TxContext,
        id: &EmployeeId,
        days: u32,
        allotted: u32,
    ) -> Result<VacationUsage, InfraError>;
}

/// 休暇使用日数の記録結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VacationUsage {
    Recorded,
    /// 付与日数を超えるため記録しなかった
    ExceedsAllotment { available: u32 },
}

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    id:            Uuid,
    name:          String,
    role:          String,
    department:    String,
    hire_date:     NaiveDate,
    vacation_used: i32,
}

fn non_negative(value: i32, column: &str) -> Result<u32, InfraError> {
    u32::try_from(value)
        .map_err(|_| InfraError::unexpected(format!("{column} が負の値です: {value}")))
}

fn to_i32(days: u32) -> Result<i32, InfraError> {
    i32::try_from(days).map_err(|_| InfraError::unexpected(format!("日数が大きすぎます: {days}")))
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = InfraError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        Ok(Employee::from_db(EmployeeRecord {
            id:            EmployeeId::from_uuid(row.id),
            name:          EmployeeName::new(row.name)?,
            role:          Role::parse(&row.role)?,
            department:    DepartmentName::new(row.department)?,
            hire_date:     row.hire_date,
            vacation_used: non_negative(row.vacation_used, "vacation_used")?,
        }))
    }
}

/// PostgreSQL 実装の EmployeeRepository
#[derive(Debug, Clone)]
pub struct PostgresEmployeeRepository {
    pool: PgPool,
}

impl PostgresEmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeRepository for PostgresEmployeeRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>, InfraError> {
        let row: Option<EmployeeRow> = sqlx::query_as(
            r#"
            SELECT id, name, role, department, hire_date, vacation_used
            FROM employees
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Employee::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id, days, allotted))]
    async fn record_vacation_usage(
        &self,
        tx: &mut TxContext,
        id: &EmployeeId,
        days: u32,
        allotted: u32,
    ) -> Result<VacationUsage, InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE employees SET
                vacation_used = vacation_used + $1,
                updated_at = NOW()
            WHERE id = $2 AND vacation_used + $1 <= $3
            "#,
        )
        .bind(to_i32(days)?)
        .bind(id.as_uuid())
        .bind(to_i32(allotted)?)
        .execute(tx.conn()?)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(VacationUsage::Recorded);
        }

        let used: Option<i32> =
            sqlx::query_scalar("SELECT vacation_used FROM employees WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(tx.conn()?)
                .await?;
        let used = used
            .ok_or_else(|| InfraError::unexpected(format!("従業員が見つかりません: {id}")))?;

        Ok(VacationUsage::ExceedsAllotment {
            available: allotted.saturating_sub(non_negative(used, "vacation_used")?),
        })
    }
}
