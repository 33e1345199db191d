// ==========================================
// 货运装车调度核心 - 运单池 API
// ==========================================
// 职责: 基于当前运单存储计算可装运单；装车单流程中的运单状态变更
// ==========================================

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::shipment::ShipmentReceipt;
use crate::domain::types::ShipmentStatus;
use crate::engine::shipment_pool::ShipmentPool;
use crate::repository::error::RepositoryError;
use crate::repository::shipment_repo::ShipmentReceiptRepository;

pub struct ShipmentApi {
    shipment_repo: Arc<ShipmentReceiptRepository>,
}

impl ShipmentApi {
    pub fn new(shipment_repo: Arc<ShipmentReceiptRepository>) -> Self {
        Self { shipment_repo }
    }

    pub fn list_by_status(&self, status: ShipmentStatus) -> ApiResult<Vec<ShipmentReceipt>> {
        Ok(self.shipment_repo.list_by_status(status)?)
    }

    /// 可装入 (origin, destination) 的运单
    ///
    /// 先取全部 PENDING，再按网点对筛选
    pub fn eligible_for(
        &self,
        origin_branch_id: &str,
        destination_branch_id: &str,
    ) -> ApiResult<Vec<ShipmentReceipt>> {
        let pending = self.shipment_repo.list_by_status(ShipmentStatus::Pending)?;
        let eligible: Vec<ShipmentReceipt> =
            ShipmentPool::eligible_for(&pending, origin_branch_id, destination_branch_id)
                .into_iter()
                .cloned()
                .collect();

        tracing::debug!(
            origin_branch_id,
            destination_branch_id,
            pending = pending.len(),
            eligible = eligible.len(),
            "可装运单已筛选"
        );
        Ok(eligible)
    }

    pub fn eligible_ids(
        &self,
        origin_branch_id: &str,
        destination_branch_id: &str,
    ) -> ApiResult<BTreeSet<String>> {
        let pending = self.shipment_repo.list_by_status(ShipmentStatus::Pending)?;
        Ok(ShipmentPool::eligible_ids(
            &pending,
            origin_branch_id,
            destination_branch_id,
        ))
    }

    /// PENDING → LOADED（整批，任一失败全部回滚）
    ///
    /// 校验之后被其他会话装走的运单 → InvalidSelection(shipment_ids)
    pub(crate) fn mark_loaded(&self, ids: &[String]) -> ApiResult<usize> {
        self.shipment_repo
            .update_status_batch(ids, ShipmentStatus::Pending, ShipmentStatus::Loaded)
            .map_err(|e| match e {
                RepositoryError::StaleState { id, .. } => {
                    tracing::warn!(shipment_id = %id, "运单状态已被并发修改");
                    ApiError::invalid_selection("shipment_ids", vec![id])
                }
                other => other.into(),
            })
    }

    /// LOADED → PENDING（从装车单移出的运单退回运单池）
    pub(crate) fn release(&self, ids: &[String]) -> ApiResult<usize> {
        Ok(self
            .shipment_repo
            .update_status_batch(ids, ShipmentStatus::Loaded, ShipmentStatus::Pending)?)
    }
}
