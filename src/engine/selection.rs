// ==========================================
// 货运装车调度核心 - 运单选择值对象
// ==========================================
// 职责: 提交前的运单勾选状态（切换/全选/清空）
// 红线: 仅本地状态，不触发任何持久化
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// ShipmentSelection
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentSelection {
    ids: BTreeSet<String>,
}

impl ShipmentSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// 切换单个运单：存在则移除，不存在则加入
    ///
    /// # 返回
    /// - true: 切换后处于选中状态
    pub fn toggle(&mut self, shipment_id: &str) -> bool {
        if self.ids.remove(shipment_id) {
            false
        } else {
            self.ids.insert(shipment_id.to_string());
            true
        }
    }

    /// 全选/取消全选
    ///
    /// # 规则
    /// - 可装集合已全部选中 → 移除可装集合（取消全选）
    /// - 否则 → 并入可装集合（全选）
    pub fn select_all_eligible(&mut self, eligible: &BTreeSet<String>) {
        self.ids = select_all_eligible(eligible, &self.ids);
    }

    /// 可装集合是否已全部选中
    pub fn contains_all(&self, eligible: &BTreeSet<String>) -> bool {
        eligible.is_subset(&self.ids)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, shipment_id: &str) -> bool {
        self.ids.contains(shipment_id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> &BTreeSet<String> {
        &self.ids
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}

/// 全选切换（纯函数形式）
pub fn select_all_eligible(
    eligible: &BTreeSet<String>,
    current: &BTreeSet<String>,
) -> BTreeSet<String> {
    if eligible.is_subset(current) {
        current.difference(eligible).cloned().collect()
    } else {
        current.union(eligible).cloned().collect()
    }
}
