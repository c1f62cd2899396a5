//! # 閲覧範囲
//!
//! 閲覧者のロールに応じて、閲覧可能な休暇申請を絞り込む。
//!
//! | 閲覧者ロール | 閲覧可能な申請 |
//! |------------|--------------|
//! | director_rrhh, gerente_rrhh | すべて |
//! | rrhh | 申請者ロールが colaborador / gerente / rrhh |
//! | director | 申請者ロールが colaborador / gerente、または本人の申請 |
//! | gerente | 申請者ロールが colaborador、または本人の申請 |
//! | colaborador, admin | 本人の申請のみ |
//!
//! 一覧取得では [`visibility_scope`] をリポジトリの検索条件として渡し、
//! 閲覧範囲外の行を読み込まない。

use std::cmp::Reverse;

use itertools::Itertools;
use strum::IntoEnumIterator;

use super::request::LeaveRequest;
use crate::{employee::EmployeeId, role::Role};

/// 閲覧者が申請を閲覧できるか
pub fn can_view(viewer_role: Role, viewer_id: &EmployeeId, request: &LeaveRequest) -> bool {
    let own = request.requester_id() == viewer_id;
    let requester_role = request.requester_role();

    match viewer_role {
        Role::DirectorRrhh | Role::GerenteRrhh => true,
        Role::Rrhh => matches!(
            requester_role,
            Role::Colaborador | Role::Gerente | Role::Rrhh
        ),
        Role::Director => matches!(requester_role, Role::Colaborador | Role::Gerente) || own,
        Role::Gerente => requester_role == Role::Colaborador || own,
        Role::Colaborador | Role::Admin => own,
    }
}

/// 閲覧範囲（検索条件）
///
/// 申請者ロールが `requester_roles` に含まれるか、申請者が `own` 本人であれば閲覧可能。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityScope {
    pub requester_roles: Vec<Role>,
    pub own:             Option<EmployeeId>,
}

impl VisibilityScope {
    pub fn contains(&self, request: &LeaveRequest) -> bool {
        self.requester_roles.contains(&request.requester_role())
            || self.own.as_ref() == Some(request.requester_id())
    }
}

/// 閲覧者の閲覧範囲を検索条件として返す
///
/// 判定結果は [`can_view`] と一致する。
pub fn visibility_scope(viewer_role: Role, viewer_id: &EmployeeId) -> VisibilityScope {
    let (requester_roles, include_own) = match viewer_role {
        Role::DirectorRrhh | Role::GerenteRrhh => (Role::iter().collect(), false),
        Role::Rrhh => (vec![Role::Colaborador, Role::Gerente, Role::Rrhh], false),
        Role::Director => (vec![Role::Colaborador, Role::Gerente], true),
        Role::Gerente => (vec![Role::Colaborador], true),
        Role::Colaborador | Role::Admin => (vec![], true),
    };

    VisibilityScope {
        requester_roles,
        own: include_own.then(|| viewer_id.clone()),
    }
}

/// 閲覧可能な申請を、申請日時の降順（同時刻は ID の降順）で返す
pub fn visible_requests(
    viewer_role: Role,
    viewer_id: &EmployeeId,
    requests: impl IntoIterator<Item = LeaveRequest>,
) -> Vec<LeaveRequest> {
    requests
        .into_iter()
        .filter(|r| can_view(viewer_role, viewer_id, r))
        .sorted_by_key(|r| Reverse((r.submitted_at(), *r.id().as_uuid())))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::{
        employee::{DepartmentName, Employee, EmployeeName, NewEmployee},
        leave::{ApprovalEngine, LeaveApplication, LeaveKind},
    };

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn employee(role: Role) -> Employee {
        Employee::new(NewEmployee {
            id: EmployeeId::new(),
            name: EmployeeName::new("Luis Gómez").unwrap(),
            role,
            department: DepartmentName::new("Operaciones").unwrap(),
            hire_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
        })
    }

    fn request_by(requester: &Employee, submitted_at: DateTime<Utc>) -> LeaveRequest {
        ApprovalEngine::default()
            .create_request(
                requester,
                LeaveApplication {
                    kind:          LeaveKind::PersonalLeave,
                    start_date:    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                    end_date:      NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                    justification: "私用".to_string(),
                },
                submitted_at,
            )
            .unwrap()
    }

    /// 全ロールの従業員が 1 件ずつ申請した状態
    #[fixture]
    fn all() -> (Vec<Employee>, Vec<LeaveRequest>) {
        let employees: Vec<Employee> = Role::iter().map(employee).collect();
        let requests = employees
            .iter()
            .enumerate()
            .map(|(i, e)| request_by(e, base() + Duration::minutes(i as i64)))
            .collect();
        (employees, requests)
    }

    fn requester_roles(requests: &[LeaveRequest]) -> Vec<Role> {
        requests.iter().map(LeaveRequest::requester_role).sorted().collect()
    }

    #[rstest]
    #[case(Role::DirectorRrhh, Role::iter().collect())]
    #[case(Role::GerenteRrhh, Role::iter().collect())]
    #[case(Role::Rrhh, vec![Role::Colaborador, Role::Gerente, Role::Rrhh])]
    #[case(Role::Director, vec![Role::Colaborador, Role::Gerente, Role::Director])]
    #[case(Role::Gerente, vec![Role::Colaborador, Role::Gerente])]
    #[case(Role::Colaborador, vec![Role::Colaborador])]
    #[case(Role::Admin, vec![Role::Admin])]
    fn test_ロールごとの閲覧範囲(
        all: (Vec<Employee>, Vec<LeaveRequest>),
        #[case] viewer_role: Role,
        #[case] expected: Vec<Role>,
    ) {
        let (employees, requests) = all;
        let viewer = employees.iter().find(|e| e.role() == viewer_role).unwrap();

        let visible = visible_requests(viewer_role, viewer.id(), requests);

        assert_eq!(requester_roles(&visible), expected.into_iter().sorted().collect::<Vec<_>>());
    }

    #[rstest]
    fn test_director_rrhhの閲覧範囲は他のすべてのロールを包含する(
        all: (Vec<Employee>, Vec<LeaveRequest>),
    ) {
        let (employees, requests) = all;
        let viewer_id = employees[0].id().clone();
        let superset = visible_requests(Role::DirectorRrhh, &viewer_id, requests.clone());

        for role in Role::iter() {
            for visible in visible_requests(role, &viewer_id, requests.clone()) {
                assert!(superset.contains(&visible), "{role} の閲覧範囲が包含されていない");
            }
        }
    }

    #[rstest]
    fn test_申請日時の降順で並ぶ(all: (Vec<Employee>, Vec<LeaveRequest>)) {
        let (employees, requests) = all;

        let visible = visible_requests(Role::DirectorRrhh, employees[0].id(), requests);

        let times: Vec<_> = visible.iter().map(LeaveRequest::submitted_at).collect();
        assert!(times.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(visible.first().map(LeaveRequest::requester_role), Some(Role::Admin));
    }

    #[test]
    fn test_同時刻の申請はidの降順() {
        let requester = employee(Role::Colaborador);
        let first = request_by(&requester, base());
        let second = request_by(&requester, base());

        let visible = visible_requests(
            Role::Colaborador,
            requester.id(),
            vec![first.clone(), second.clone()],
        );

        let expected: Vec<_> = [first, second]
            .into_iter()
            .sorted_by_key(|r| Reverse(*r.id().as_uuid()))
            .collect();
        assert_eq!(visible, expected);
    }

    #[rstest]
    fn test_閲覧範囲の検索条件はcan_viewと一致する(all: (Vec<Employee>, Vec<LeaveRequest>)) {
        let (employees, requests) = all;
        let outsider = EmployeeId::new();

        for viewer in &employees {
            for viewer_id in [viewer.id(), &outsider] {
                let scope = visibility_scope(viewer.role(), viewer_id);
                for request in &requests {
                    assert_eq!(
                        scope.contains(request),
                        can_view(viewer.role(), viewer_id, request),
                        "viewer={} requester={}",
                        viewer.role(),
                        request.requester_role()
                    );
                }
            }
        }
    }

    #[test]
    fn test_他人の申請は本人扱いにならない() {
        let gerente = employee(Role::Gerente);
        let other_gerente = employee(Role::Gerente);
        let request = request_by(&other_gerente, base());

        assert!(!can_view(Role::Gerente, gerente.id(), &request));
        assert!(can_view(Role::Gerente, other_gerente.id(), &request));
    }
}
