// ==========================================
// 货运装车调度核心 - 运单 (STT) 领域模型
// ==========================================
// 运单由外部收单流程创建，本核心只负责 PENDING ↔ LOADED 转换
// ==========================================

use crate::domain::types::{PaymentType, ShipmentStatus};
use serde::{Deserialize, Serialize};

// ==========================================
// ShipmentReceipt - 运单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentReceipt {
    pub id: String,
    pub origin_branch_id: String,      // 始发网点
    pub destination_branch_id: String, // 目的网点
    pub status: ShipmentStatus,
    pub weight_kg: f64,
    pub price: f64,
    pub payment_type: PaymentType,
    pub goods_description: String,
}

impl ShipmentReceipt {
    /// 是否可装入指定网点对的装车单
    pub fn is_eligible_for(&self, origin_branch_id: &str, destination_branch_id: &str) -> bool {
        self.status == ShipmentStatus::Pending
            && self.origin_branch_id == origin_branch_id
            && self.destination_branch_id == destination_branch_id
    }
}
