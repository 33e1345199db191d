// ==========================================
// 货运装车调度核心 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换规则错误与存储错误为用户可见的错误消息
// 红线: 所有错误信息必须包含显式原因
// ==========================================

use crate::engine::error::RuleViolation;
use crate::i18n::t_with_args;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误（提交前同步判定，无任何写入）
    // ==========================================
    #[error("字段校验失败 (field={field}): {message}")]
    Validation { field: String, message: String },

    #[error("所选项不可用 (field={field}): {ids:?}")]
    InvalidSelection { field: String, ids: Vec<String> },

    #[error("无效的状态转换: {entity} from={from} to={to}")]
    InvalidTransition {
        entity: String,
        from: String,
        to: String,
    },

    #[error("字段创建后不可修改: {field}")]
    ImmutableField { field: String },

    #[error("前置条件不满足: {0}")]
    Precondition(String),

    // ==========================================
    // 权限错误
    // ==========================================
    #[error("无权操作: actor={actor_id}, action={action}")]
    Authorization { actor_id: String, action: String },

    // ==========================================
    // 外部服务错误
    // ==========================================
    #[error("资源未找到: {entity}(id={id})")]
    NotFound { entity: String, id: String },

    #[error("服务请求失败: {0}")]
    RemoteFailure(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn denied(actor_id: &str, action: &str) -> Self {
        ApiError::Authorization {
            actor_id: actor_id.to_string(),
            action: action.to_string(),
        }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_selection(field: &str, ids: Vec<String>) -> Self {
        ApiError::InvalidSelection {
            field: field.to_string(),
            ids,
        }
    }

    /// 出错字段（用于逐字段提示）
    pub fn field(&self) -> Option<&str> {
        match self {
            ApiError::Validation { field, .. }
            | ApiError::ImmutableField { field }
            | ApiError::InvalidSelection { field, .. } => Some(field.as_str()),
            _ => None,
        }
    }

    /// 本地化的用户提示
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation { field, message } => {
                let label = field_label(field);
                t_with_args("error.validation", &[("field", &label), ("message", message)])
            }
            ApiError::InvalidSelection { field, ids } => {
                let label = field_label(field);
                t_with_args(
                    "error.invalid_selection",
                    &[("field", &label), ("ids", &ids.join(", "))],
                )
            }
            ApiError::InvalidTransition { entity, from, to } => t_with_args(
                "error.invalid_transition",
                &[("entity", entity), ("from", from), ("to", to)],
            ),
            ApiError::ImmutableField { field } => {
                let label = field_label(field);
                t_with_args("error.immutable_field", &[("field", &label)])
            }
            ApiError::Precondition(reason) => {
                t_with_args("error.precondition", &[("reason", reason)])
            }
            ApiError::Authorization { .. } => crate::i18n::t("error.access_denied"),
            ApiError::NotFound { entity, id } => {
                t_with_args("error.not_found", &[("entity", entity), ("id", id)])
            }
            ApiError::RemoteFailure(message) if message.trim().is_empty() => {
                crate::i18n::t("error.remote_failure_generic")
            }
            ApiError::RemoteFailure(message) => {
                t_with_args("error.remote_failure", &[("message", message)])
            }
            ApiError::Other(_) => crate::i18n::t("error.internal"),
        }
    }
}

/// 字段名 → 本地化标签（无翻译时原样返回）
fn field_label(field: &str) -> String {
    let key = format!("field.{}", field);
    let label = crate::i18n::t(&key);
    // rust-i18n 缺失时返回 "<locale>.<key>"
    if label.ends_with(&key) {
        field.to_string()
    } else {
        label
    }
}

// ==========================================
// 从 RuleViolation 转换
// ==========================================
impl From<RuleViolation> for ApiError {
    fn from(err: RuleViolation) -> Self {
        match err {
            RuleViolation::Validation { field, message } => ApiError::Validation { field, message },
            RuleViolation::InvalidSelection { ids } => ApiError::InvalidSelection {
                field: "shipment_ids".to_string(),
                ids,
            },
            RuleViolation::InvalidTransition { entity, from, to } => {
                ApiError::InvalidTransition { entity, from, to }
            }
            RuleViolation::ImmutableField { field } => ApiError::ImmutableField { field },
            RuleViolation::Precondition(msg) => ApiError::Precondition(msg),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 存储层代表外部服务，除 NotFound 外统一视为 RemoteFailure
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::RemoteFailure(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::StaleState { entity, id, expected } => ApiError::RemoteFailure(
                format!("{}(id={}) 状态已变化，期望 {}", entity, id, expected),
            ),
            other => ApiError::RemoteFailure(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
