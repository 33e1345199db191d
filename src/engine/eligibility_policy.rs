// ==========================================
// 货运装车调度核心 - 准入策略纯函数库
// ==========================================
// 职责: 基于角色与所属网点的权限判定
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================

use crate::domain::actor::{Actor, Employee};
use crate::domain::types::Role;

// ==========================================
// EligibilityPolicy - 纯函数工具类
// ==========================================
pub struct EligibilityPolicy;

impl EligibilityPolicy {
    /// 是否可创建用户
    ///
    /// # 规则
    /// - 总监、行政经理、人事经理、网点负责人 → true
    pub fn can_create_user(actor: &Actor) -> bool {
        actor.role.is_manager() || actor.role == Role::BranchHead
    }

    /// 是否可将指定角色分配给他人
    ///
    /// # 规则
    /// 1. 总监 → 任意角色
    /// 2. 其他管理层 → 除总监外任意角色
    /// 3. 网点负责人 → 仅员工级角色（staff_admin/staff_penjualan/kasir/checker/supir）
    /// 4. 其他 → false
    ///
    /// 未知角色代码一律拒绝
    pub fn can_assign_role(actor: &Actor, candidate_role_code: &str) -> bool {
        let candidate = match Role::from_code(candidate_role_code) {
            Some(role) => role,
            None => return false,
        };

        match actor.role {
            Role::Director => true,
            Role::AdminManager | Role::HrManager => candidate != Role::Director,
            Role::BranchHead => candidate.is_staff_tier(),
            _ => false,
        }
    }

    /// 是否可编辑员工资料
    ///
    /// # 规则
    /// 1. 管理层 → true
    /// 2. 网点负责人且员工属于本网点 → true
    /// 3. 本人 → true
    pub fn can_edit_employee(actor: &Actor, target: &Employee) -> bool {
        if actor.role.is_manager() {
            return true;
        }
        if actor.role == Role::BranchHead
            && actor.branch_id.as_deref() == Some(target.branch_id.as_str())
        {
            return true;
        }
        actor.id == target.id
    }

    /// 网点字段是否锁定为操作人所属网点
    ///
    /// # 规则
    /// - 有所属网点 且 非总监 → true
    pub fn restrict_branch_field(actor: &Actor) -> bool {
        actor.branch_id.is_some() && actor.role != Role::Director
    }

    /// 是否可在指定网点执行排队/装车操作
    ///
    /// # 规则
    /// 1. 角色 ∈ {总监, 行政经理, 网点负责人, 行政专员, 理货员}
    /// 2. 网点字段受限时，网点必须等于所属网点
    pub fn can_operate_dispatch(actor: &Actor, branch_id: &str) -> bool {
        let role_allowed = matches!(
            actor.role,
            Role::Director
                | Role::AdminManager
                | Role::BranchHead
                | Role::StaffAdmin
                | Role::Checker
        );
        if !role_allowed {
            return false;
        }
        if Self::restrict_branch_field(actor) {
            return actor.branch_id.as_deref() == Some(branch_id);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::JobFunction;

    fn employee(id: &str, branch: &str) -> Employee {
        Employee {
            id: id.to_string(),
            name: format!("员工{}", id),
            branch_id: branch.to_string(),
            job_function: JobFunction::Admin,
            role: Some(Role::StaffAdmin),
        }
    }

    fn at_a(id: &str, role: Role) -> Actor {
        Actor::new(id, role, Some("A"))
    }

    #[test]
    fn test_can_create_user() {
        assert!(EligibilityPolicy::can_create_user(&Actor::new("u1", Role::Director, None)));
        assert!(EligibilityPolicy::can_create_user(&Actor::new("u2", Role::AdminManager, None)));
        assert!(EligibilityPolicy::can_create_user(&Actor::new("u3", Role::HrManager, None)));
        assert!(EligibilityPolicy::can_create_user(&at_a("u4", Role::BranchHead)));
        assert!(!EligibilityPolicy::can_create_user(&at_a("u5", Role::StaffAdmin)));
        assert!(!EligibilityPolicy::can_create_user(&at_a("u6", Role::Checker)));
    }

    #[test]
    fn test_can_assign_role_director() {
        let director = Actor::new("d", Role::Director, None);
        for role in Role::ALL {
            assert!(EligibilityPolicy::can_assign_role(&director, role.code()));
        }
    }

    #[test]
    fn test_can_assign_role_managers_cannot_assign_director() {
        for manager_role in [Role::AdminManager, Role::HrManager] {
            let manager = Actor::new("m", manager_role, None);
            assert!(!EligibilityPolicy::can_assign_role(&manager, "director"));
            assert!(EligibilityPolicy::can_assign_role(&manager, "hr_manager"));
            assert!(EligibilityPolicy::can_assign_role(&manager, "branch_head"));
            assert!(EligibilityPolicy::can_assign_role(&manager, "supir"));
        }
    }

    #[test]
    fn test_can_assign_role_branch_head_staff_only() {
        let head = Actor::new("h", Role::BranchHead, Some("A"));
        for code in ["staff_admin", "staff_penjualan", "kasir", "checker", "supir"] {
            assert!(EligibilityPolicy::can_assign_role(&head, code), "{}", code);
        }
        for code in ["director", "admin_manager", "hr_manager", "branch_head"] {
            assert!(!EligibilityPolicy::can_assign_role(&head, code), "{}", code);
        }
    }

    #[test]
    fn test_can_assign_role_other_actors_and_unknown_code() {
        let staff = Actor::new("s", Role::StaffAdmin, Some("A"));
        assert!(!EligibilityPolicy::can_assign_role(&staff, "kasir"));

        let director = Actor::new("d", Role::Director, None);
        assert!(!EligibilityPolicy::can_assign_role(&director, "root"));
    }

    #[test]
    fn test_can_edit_employee() {
        let target = employee("e1", "A");
        let can_edit = |actor: Actor| EligibilityPolicy::can_edit_employee(&actor, &target);

        assert!(can_edit(Actor::new("x", Role::HrManager, None)));
        assert!(can_edit(at_a("x", Role::BranchHead)));
        assert!(!can_edit(Actor::new("x", Role::BranchHead, Some("B"))));
        // 本人可编辑
        assert!(can_edit(at_a("e1", Role::Supir)));
        assert!(!can_edit(at_a("e2", Role::Kasir)));
    }

    #[test]
    fn test_restrict_branch_field() {
        let restricted = |actor: Actor| EligibilityPolicy::restrict_branch_field(&actor);

        assert!(!restricted(at_a("d", Role::Director)));
        assert!(!restricted(Actor::new("m", Role::AdminManager, None)));
        assert!(restricted(at_a("m", Role::AdminManager)));
        assert!(restricted(at_a("c", Role::Checker)));
    }

    #[test]
    fn test_can_operate_dispatch() {
        let checker = Actor::new("c", Role::Checker, Some("A"));
        assert!(EligibilityPolicy::can_operate_dispatch(&checker, "A"));
        assert!(!EligibilityPolicy::can_operate_dispatch(&checker, "B"));

        let director = Actor::new("d", Role::Director, Some("A"));
        assert!(EligibilityPolicy::can_operate_dispatch(&director, "B"));

        let driver = Actor::new("s", Role::Supir, Some("A"));
        assert!(!EligibilityPolicy::can_operate_dispatch(&driver, "A"));

        let hr = Actor::new("h", Role::HrManager, None);
        assert!(!EligibilityPolicy::can_operate_dispatch(&hr, "A"));
    }
}
