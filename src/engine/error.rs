// ==========================================
// 货运装车调度核心 - 引擎层规则错误
// ==========================================
// 职责: 纯规则判定失败的原因，由 API 层转换为 ApiError
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 规则违反类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    /// 必填字段缺失或格式错误
    #[error("字段校验失败 (field={field}): {message}")]
    Validation { field: String, message: String },

    /// 所选运单不在当前可装集合内
    #[error("所选运单不可装车: {ids:?}")]
    InvalidSelection { ids: Vec<String> },

    /// 状态转换不在允许表内
    #[error("无效的状态转换: {entity} from={from} to={to}")]
    InvalidTransition {
        entity: String,
        from: String,
        to: String,
    },

    /// 修改已锁定字段
    #[error("字段创建后不可修改: {field}")]
    ImmutableField { field: String },

    /// 前置条件不满足
    #[error("前置条件不满足: {0}")]
    Precondition(String),
}

impl RuleViolation {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        RuleViolation::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn transition(entity: &str, from: impl ToString, to: impl ToString) -> Self {
        RuleViolation::InvalidTransition {
            entity: entity.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Result 类型别名
pub type RuleResult<T> = Result<T, RuleViolation>;
