// ==========================================
// 货运装车调度核心 - 操作日志领域模型
// ==========================================
// 红线: 所有成功写入必须记录
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub action_type: String,      // ActionType::as_str()
    pub action_ts: NaiveDateTime,
    pub actor: String,            // 操作人 ID
    pub entity_id: String,        // 排队条目 ID 或装车单号
    pub payload_json: Option<JsonValue>,
    pub detail: Option<String>,
}

impl ActionLog {
    pub fn new(
        action_type: ActionType,
        actor: &str,
        entity_id: &str,
        payload_json: Option<JsonValue>,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Local::now().naive_local(),
            actor: actor.to_string(),
            entity_id: entity_id.to_string(),
            payload_json,
            detail,
        }
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateQueueEntry,
    UpdateQueueEntry,
    DeleteQueueEntry,
    QueueStatusChange,
    CreateLoading,
    UpdateLoading,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateQueueEntry => "CREATE_QUEUE_ENTRY",
            ActionType::UpdateQueueEntry => "UPDATE_QUEUE_ENTRY",
            ActionType::DeleteQueueEntry => "DELETE_QUEUE_ENTRY",
            ActionType::QueueStatusChange => "QUEUE_STATUS_CHANGE",
            ActionType::CreateLoading => "CREATE_LOADING",
            ActionType::UpdateLoading => "UPDATE_LOADING",
        }
    }
}
