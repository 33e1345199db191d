// ==========================================
// 货运装车调度核心 - 网点/员工目录 API
// ==========================================
// 职责:
// 1. 理货员、司机候选名单（按显式岗位职能筛选）
// 2. 员工资料维护的准入判定
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::actor::{Actor, Branch, Employee};
use crate::domain::types::{JobFunction, Role};
use crate::engine::eligibility_policy::EligibilityPolicy;
use crate::repository::directory_repo::DirectoryRepository;

pub struct DirectoryApi {
    directory_repo: Arc<DirectoryRepository>,
}

impl DirectoryApi {
    pub fn new(directory_repo: Arc<DirectoryRepository>) -> Self {
        Self { directory_repo }
    }

    pub fn list_branches(&self) -> ApiResult<Vec<Branch>> {
        Ok(self.directory_repo.list_branches()?)
    }

    pub fn list_employees_by_branch(&self, branch_id: &str) -> ApiResult<Vec<Employee>> {
        Ok(self.directory_repo.list_employees_by_branch(branch_id)?)
    }

    pub fn checker_candidates(&self, branch_id: &str) -> ApiResult<Vec<Employee>> {
        self.candidates(branch_id, JobFunction::Checker)
    }

    pub fn driver_candidates(&self, branch_id: &str) -> ApiResult<Vec<Employee>> {
        self.candidates(branch_id, JobFunction::Driver)
    }

    fn candidates(&self, branch_id: &str, function: JobFunction) -> ApiResult<Vec<Employee>> {
        Ok(self
            .directory_repo
            .list_employees_by_branch(branch_id)?
            .into_iter()
            .filter(|e| e.job_function == function)
            .collect())
    }

    /// 网点字段锁定值（受限时返回操作人所属网点）
    pub fn locked_branch(&self, actor: &Actor) -> Option<String> {
        if EligibilityPolicy::restrict_branch_field(actor) {
            actor.branch_id.clone()
        } else {
            None
        }
    }

    /// 保存员工资料
    ///
    /// # 准入
    /// - 新员工 → can_create_user
    /// - 已有员工 → can_edit_employee（按原记录的网点判定）
    /// - 角色变化 → can_assign_role
    /// - 网点字段受限 → 只能保存到本网点
    pub fn save_employee(&self, actor: &Actor, employee: Employee) -> ApiResult<Employee> {
        if employee.id.trim().is_empty() {
            return Err(ApiError::validation("employee_id", "员工ID不能为空"));
        }
        if employee.name.trim().is_empty() {
            return Err(ApiError::validation("name", "姓名不能为空"));
        }

        let existing = self.directory_repo.find_employee(&employee.id)?;
        let allowed = match &existing {
            Some(current) => EligibilityPolicy::can_edit_employee(actor, current),
            None => EligibilityPolicy::can_create_user(actor),
        };
        if !allowed {
            return Err(self.deny(actor, "save_employee"));
        }

        let role_changed = existing.as_ref().map(|e| e.role) != Some(employee.role);
        if let (true, Some(role)) = (role_changed, employee.role) {
            if !EligibilityPolicy::can_assign_role(actor, role.code()) {
                return Err(self.deny(actor, "assign_role"));
            }
        }

        if let Some(home) = self.locked_branch(actor) {
            if employee.branch_id != home {
                return Err(self.deny(actor, "save_employee_other_branch"));
            }
        }

        self.directory_repo.upsert_employee(&employee)?;
        tracing::info!(employee_id = %employee.id, actor_id = %actor.id, "员工资料已保存");
        Ok(employee)
    }

    /// 导入历史员工（自由文本职位 → 显式岗位职能）
    pub fn import_legacy_employee(
        &self,
        actor: &Actor,
        id: &str,
        name: &str,
        branch_id: &str,
        legacy_title: &str,
        role_code: Option<&str>,
    ) -> ApiResult<Employee> {
        let role = match role_code {
            Some(code) => Some(
                Role::from_code(code).ok_or_else(|| {
                    ApiError::validation("role_code", format!("未知角色: {}", code))
                })?,
            ),
            None => None,
        };
        let job_function = JobFunction::from_legacy_title(legacy_title);
        if job_function == JobFunction::Other {
            tracing::debug!(employee_id = id, legacy_title, "职位未匹配岗位职能，归为 OTHER");
        }

        self.save_employee(
            actor,
            Employee {
                id: id.trim().to_string(),
                name: name.trim().to_string(),
                branch_id: branch_id.trim().to_string(),
                job_function,
                role,
            },
        )
    }

    fn deny(&self, actor: &Actor, action: &str) -> ApiError {
        tracing::warn!(actor_id = %actor.id, role = %actor.role, action, "操作被拒绝");
        ApiError::denied(&actor.id, action)
    }
}
