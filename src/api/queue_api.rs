// ==========================================
// 货运装车调度核心 - 排队登记 API
// ==========================================
// 职责: 排队条目的登记、编辑、状态流转、删除
// 红线: 所有写操作先过准入策略，成功后记录 ActionLog
// ==========================================

use std::sync::Arc;

use chrono::Local;
use serde_json::json;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::actor::Actor;
use crate::domain::queue::{NewQueueEntry, QueueEntry, QueueEntryPatch};
use crate::domain::types::QueueStatus;
use crate::engine::eligibility_policy::EligibilityPolicy;
use crate::engine::error::RuleViolation;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::queue_entry_repo::QueueEntryRepository;

// ==========================================
// QueueApi - 排队登记 API
// ==========================================
pub struct QueueApi {
    queue_repo: Arc<QueueEntryRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl QueueApi {
    pub fn new(
        queue_repo: Arc<QueueEntryRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            queue_repo,
            action_log_repo,
        }
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 网点等待中的车辆，按排队序号升序
    ///
    /// 每次调用均从存储重新读取
    pub fn list_waiting(&self, branch_id: &str) -> ApiResult<Vec<QueueEntry>> {
        if branch_id.trim().is_empty() {
            return Err(ApiError::validation("branch_id", "网点不能为空"));
        }
        Ok(self
            .queue_repo
            .find_by_branch_and_status(branch_id, QueueStatus::Waiting)?)
    }

    pub fn find(&self, id: &str) -> ApiResult<QueueEntry> {
        self.queue_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "QueueEntry".to_string(),
                id: id.to_string(),
            })
    }

    /// 建议的下一个排队序号（等待中最大序号 + 1，仅供参考）
    pub fn suggest_next_sequence(&self, branch_id: &str) -> ApiResult<i32> {
        let max = self
            .queue_repo
            .max_sequence_number(branch_id, QueueStatus::Waiting)?;
        Ok(max.map(|n| n.max(0) + 1).unwrap_or(1))
    }

    // ==========================================
    // 写操作
    // ==========================================

    /// 登记排队车辆
    ///
    /// # 校验顺序
    /// branch_id → vehicle_id → driver_id → sequence_number ≥ 1 → 准入
    pub fn create(&self, actor: &Actor, input: NewQueueEntry) -> ApiResult<QueueEntry> {
        let branch_id = required("branch_id", &input.branch_id, "网点不能为空")?;
        let vehicle_id = required("vehicle_id", &input.vehicle_id, "车辆不能为空")?;
        let driver_id = required("driver_id", &input.driver_id, "司机不能为空")?;
        validate_sequence(input.sequence_number)?;
        self.authorize(actor, &branch_id, "create_queue_entry")?;

        let now = Local::now().naive_local();
        let entry = QueueEntry {
            id: uuid::Uuid::new_v4().to_string(),
            branch_id,
            vehicle_id,
            driver_id,
            assistant_id: normalize_optional(input.assistant_id),
            sequence_number: input.sequence_number,
            status: QueueStatus::Waiting,
            created_at: now,
            updated_at: now,
        };
        self.queue_repo.insert(&entry)?;

        tracing::info!(
            queue_entry_id = %entry.id,
            branch_id = %entry.branch_id,
            sequence_number = entry.sequence_number,
            "排队车辆已登记"
        );
        self.record(ActionLog::new(
            ActionType::CreateQueueEntry,
            &actor.id,
            &entry.id,
            Some(json!({
                "vehicle_id": entry.vehicle_id,
                "driver_id": entry.driver_id,
                "sequence_number": entry.sequence_number,
            })),
            None,
        ));
        Ok(entry)
    }

    /// 编辑排队条目（仅 WAITING）
    pub fn update(&self, actor: &Actor, id: &str, patch: QueueEntryPatch) -> ApiResult<QueueEntry> {
        let mut entry = self.find(id)?;
        self.authorize(actor, &entry.branch_id, "update_queue_entry")?;

        if !entry.is_waiting() {
            return Err(ApiError::Precondition(format!(
                "排队条目 {} 当前状态为 {}，只有 WAITING 可编辑",
                entry.id, entry.status
            )));
        }
        if patch.is_empty() {
            return Ok(entry);
        }

        if let Some(vehicle_id) = &patch.vehicle_id {
            entry.vehicle_id = required("vehicle_id", vehicle_id, "车辆不能为空")?;
        }
        if let Some(driver_id) = &patch.driver_id {
            entry.driver_id = required("driver_id", driver_id, "司机不能为空")?;
        }
        if let Some(sequence_number) = patch.sequence_number {
            validate_sequence(sequence_number)?;
            entry.sequence_number = sequence_number;
        }
        if let Some(assistant_id) = patch.assistant_id.clone() {
            entry.assistant_id = normalize_optional(assistant_id);
        }
        entry.updated_at = Local::now().naive_local();

        self.queue_repo.update_fields(&entry)?;

        tracing::info!(queue_entry_id = %entry.id, "排队条目已更新");
        self.record(ActionLog::new(
            ActionType::UpdateQueueEntry,
            &actor.id,
            &entry.id,
            serde_json::to_value(&patch).ok(),
            None,
        ));
        Ok(entry)
    }

    /// 状态流转（仅 WAITING→LOADING、LOADING→DEPARTED）
    pub fn transition_status(
        &self,
        actor: &Actor,
        id: &str,
        new_status: QueueStatus,
    ) -> ApiResult<QueueEntry> {
        let entry = self.find(id)?;
        self.authorize(actor, &entry.branch_id, "transition_queue_entry")?;
        self.advance(&entry, new_status, &actor.id)
    }

    /// 删除排队条目（仅 WAITING）
    pub fn delete(&self, actor: &Actor, id: &str) -> ApiResult<()> {
        let entry = self.find(id)?;
        self.authorize(actor, &entry.branch_id, "delete_queue_entry")?;

        if !entry.is_waiting() {
            return Err(ApiError::Precondition(format!(
                "排队条目 {} 当前状态为 {}，只有 WAITING 可删除",
                entry.id, entry.status
            )));
        }
        self.queue_repo.delete_waiting(&entry.id)?;

        tracing::info!(queue_entry_id = %entry.id, "排队条目已删除");
        self.record(ActionLog::new(
            ActionType::DeleteQueueEntry,
            &actor.id,
            &entry.id,
            None,
            Some(format!("vehicle_id={}", entry.vehicle_id)),
        ));
        Ok(())
    }

    // ==========================================
    // 内部（供装车单流程复用，调用方已完成准入）
    // ==========================================

    /// 按流转表推进状态并记录日志
    pub(crate) fn advance(
        &self,
        entry: &QueueEntry,
        new_status: QueueStatus,
        actor_id: &str,
    ) -> ApiResult<QueueEntry> {
        if !entry.status.can_transition_to(new_status) {
            return Err(RuleViolation::transition("queue_entry", entry.status, new_status).into());
        }

        let now = Local::now().naive_local();
        self.queue_repo
            .update_status(&entry.id, entry.status, new_status, &now)?;

        tracing::info!(
            queue_entry_id = %entry.id,
            from = %entry.status,
            to = %new_status,
            "排队状态已流转"
        );
        self.record(ActionLog::new(
            ActionType::QueueStatusChange,
            actor_id,
            &entry.id,
            Some(json!({ "from": entry.status, "to": new_status })),
            None,
        ));

        Ok(QueueEntry {
            status: new_status,
            updated_at: now,
            ..entry.clone()
        })
    }

    /// 补偿回退（装车单创建失败时恢复原状态，不经流转表）
    pub(crate) fn restore_status(
        &self,
        id: &str,
        current: QueueStatus,
        original: QueueStatus,
    ) -> ApiResult<()> {
        let now = Local::now().naive_local();
        self.queue_repo.update_status(id, current, original, &now)?;
        tracing::warn!(queue_entry_id = %id, from = %current, to = %original, "排队状态已回退");
        Ok(())
    }

    fn authorize(&self, actor: &Actor, branch_id: &str, action: &str) -> ApiResult<()> {
        if EligibilityPolicy::can_operate_dispatch(actor, branch_id) {
            return Ok(());
        }
        tracing::warn!(
            actor_id = %actor.id,
            role = %actor.role,
            branch_id = %branch_id,
            action,
            "操作被拒绝"
        );
        Err(ApiError::denied(&actor.id, action))
    }

    fn record(&self, log: ActionLog) {
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!("记录操作日志失败: {}", e);
        }
    }
}

// ==========================================
// 校验辅助
// ==========================================

pub(crate) fn required(field: &str, value: &str, message: &str) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(field, message));
    }
    Ok(trimmed.to_string())
}

fn validate_sequence(sequence_number: i32) -> ApiResult<()> {
    if sequence_number < 1 {
        return Err(ApiError::validation(
            "sequence_number",
            format!("排队序号必须为正整数: {}", sequence_number),
        ));
    }
    Ok(())
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
