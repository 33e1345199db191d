// ==========================================
// 货运装车调度核心 - 操作人与组织目录
// ==========================================
// 仅供准入判定读取，本核心不修改
// ==========================================

use crate::domain::types::{JobFunction, Role};
use serde::{Deserialize, Serialize};

/// 当前操作人
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
    pub branch_id: Option<String>, // 所属网点（总部人员可为空）
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role, branch_id: Option<&str>) -> Self {
        Self {
            id: id.into(),
            role,
            branch_id: branch_id.map(str::to_string),
        }
    }
}

/// 员工
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub branch_id: String,
    pub job_function: JobFunction,
    pub role: Option<Role>,
}

/// 网点 (cabang)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: String,
    pub code: String,
    pub name: String,
}
