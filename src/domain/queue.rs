// ==========================================
// 货运装车调度核心 - 卡车排队领域模型
// ==========================================
// 对应: antrian truck
// ==========================================

use crate::domain::types::QueueStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// QueueEntry - 排队条目
// ==========================================
// 一条记录 = 一辆车 + 司机 (+ 助手) 在某网点等待装车
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    // ===== 主键 =====
    pub id: String,

    // ===== 归属与车辆人员 =====
    pub branch_id: String,            // 排队网点
    pub vehicle_id: String,           // 车辆
    pub driver_id: String,            // 司机
    pub assistant_id: Option<String>, // 随车助手（可选）

    // ===== 排序与状态 =====
    pub sequence_number: i32, // 排队序号 (urutan)，仅作显示顺序参考
    pub status: QueueStatus,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl QueueEntry {
    /// 仅 WAITING 状态可删除/编辑
    pub fn is_waiting(&self) -> bool {
        self.status == QueueStatus::Waiting
    }
}

/// 新建排队条目请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewQueueEntry {
    pub branch_id: String,
    pub vehicle_id: String,
    pub driver_id: String,
    #[serde(default)]
    pub assistant_id: Option<String>,
    pub sequence_number: i32,
}

/// 排队条目编辑请求（只包含需要修改的字段）
///
/// `assistant_id = Some(None)` 表示清空助手
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueEntryPatch {
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub driver_id: Option<String>,
    #[serde(default)]
    pub assistant_id: Option<Option<String>>,
    #[serde(default)]
    pub sequence_number: Option<i32>,
}

impl QueueEntryPatch {
    pub fn is_empty(&self) -> bool {
        self.vehicle_id.is_none()
            && self.driver_id.is_none()
            && self.assistant_id.is_none()
            && self.sequence_number.is_none()
    }
}
