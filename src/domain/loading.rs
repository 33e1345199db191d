// ==========================================
// 货运装车调度核心 - 装车单领域模型
// ==========================================
// 对应: muat
// 红线: 创建后 queue_entry_id / origin / destination 不可修改
// ==========================================

use crate::domain::types::LoadingStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Loading - 装车单聚合
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loading {
    // ===== 主键 =====
    pub id: String, // 展示单号 LOAD-<ddMMyy>-<NNNN>

    // ===== 锁定字段 =====
    pub queue_entry_id: String,
    pub origin_branch_id: String,
    pub destination_branch_id: String,

    // ===== 可编辑字段 =====
    pub checker_id: String,
    pub departure_time: Option<NaiveDateTime>,
    pub notes: Option<String>,
    pub shipment_ids: Vec<String>, // 非空且去重

    pub status: LoadingStatus,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// 创建装车单请求
///
/// `departure_time` 为表单原始值，空串视为未设置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateLoadingInput {
    #[serde(default)]
    pub id: Option<String>,
    pub queue_entry_id: String,
    pub checker_id: String,
    pub origin_branch_id: String,
    pub destination_branch_id: String,
    #[serde(default)]
    pub shipment_ids: Vec<String>,
    #[serde(default)]
    pub departure_time: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// 编辑装车单请求（部分字段）
///
/// - `departure_time = Some("")` 清空发车时间
/// - `notes = Some("")` 清空备注
/// - `status` 仅允许显式设置为 SAMPAI
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadingPatch {
    #[serde(default)]
    pub queue_entry_id: Option<String>,
    #[serde(default)]
    pub origin_branch_id: Option<String>,
    #[serde(default)]
    pub destination_branch_id: Option<String>,
    #[serde(default)]
    pub checker_id: Option<String>,
    #[serde(default)]
    pub shipment_ids: Option<Vec<String>>,
    #[serde(default)]
    pub departure_time: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<LoadingStatus>,
}
