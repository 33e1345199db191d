// ==========================================
// 货运装车调度核心 - 可装运单池筛选
// ==========================================
// 职责: 按网点对筛选 PENDING 运单
// 红线: 纯函数，每次调用基于当前运单集合重新计算
// ==========================================

use crate::domain::shipment::ShipmentReceipt;
use std::collections::BTreeSet;

// ==========================================
// ShipmentPool - 纯函数工具类
// ==========================================
pub struct ShipmentPool;

impl ShipmentPool {
    /// 返回可装入 (origin, destination) 装车单的运单
    ///
    /// # 规则
    /// - status = PENDING 且 始发/目的网点完全匹配
    ///
    /// 保持输入顺序
    pub fn eligible_for<'a>(
        receipts: &'a [ShipmentReceipt],
        origin_branch_id: &str,
        destination_branch_id: &str,
    ) -> Vec<&'a ShipmentReceipt> {
        receipts
            .iter()
            .filter(|r| r.is_eligible_for(origin_branch_id, destination_branch_id))
            .collect()
    }

    /// 可装运单 ID 集合
    pub fn eligible_ids(
        receipts: &[ShipmentReceipt],
        origin_branch_id: &str,
        destination_branch_id: &str,
    ) -> BTreeSet<String> {
        Self::eligible_for(receipts, origin_branch_id, destination_branch_id)
            .into_iter()
            .map(|r| r.id.clone())
            .collect()
    }

    /// 找出不在可装集合内的运单 ID（保持提交顺序，去重）
    pub fn ineligible_ids(selected: &[String], eligible: &BTreeSet<String>) -> Vec<String> {
        let mut seen = BTreeSet::new();
        selected
            .iter()
            .filter(|id| !eligible.contains(*id))
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect()
    }
}
