// ==========================================
// 货运装车调度核心 - 装车单草稿（编辑器状态）
// ==========================================
// 职责:
// 1. 始发网点变化 → 清空已选运单
// 2. 发车时间变化 → 立即重新派生状态
// 3. 编辑已有装车单 → 锁定排队条目/始发/目的字段
// 4. 提交中 → 拒绝重复提交
// 红线: 草稿为本地临时状态，放弃草稿不产生任何写入
// ==========================================

use crate::domain::loading::{CreateLoadingInput, Loading, LoadingPatch};
use crate::domain::types::LoadingStatus;
use crate::engine::display_id::DisplayIdGenerator;
use crate::engine::error::{RuleResult, RuleViolation};
use crate::engine::loading_status::LoadingStatusDerivation;
use crate::engine::selection::ShipmentSelection;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;

/// 草稿回写发车时间时使用的格式
const DRAFT_DEPARTURE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ==========================================
// DraftMode
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftMode {
    Create,
    Edit,
}

// ==========================================
// LoadingDraft
// ==========================================
#[derive(Debug, Clone)]
pub struct LoadingDraft {
    mode: DraftMode,
    display_id: String,
    queue_entry_id: String,
    checker_id: String,
    origin_branch_id: String,
    destination_branch_id: String,
    selection: ShipmentSelection,
    departure_time: Option<NaiveDateTime>,
    notes: String,
    status: LoadingStatus,
    stored_status: Option<LoadingStatus>,
    submitting: bool,
}

impl LoadingDraft {
    /// 新建草稿（自动生成单号，状态 MUAT）
    pub fn new(generator: &DisplayIdGenerator, today: NaiveDate) -> Self {
        Self {
            mode: DraftMode::Create,
            display_id: generator.generate(today),
            queue_entry_id: String::new(),
            checker_id: String::new(),
            origin_branch_id: String::new(),
            destination_branch_id: String::new(),
            selection: ShipmentSelection::new(),
            departure_time: None,
            notes: String::new(),
            status: LoadingStatus::Muat,
            stored_status: None,
            submitting: false,
        }
    }

    /// 从已有装车单打开编辑草稿
    pub fn from_loading(loading: &Loading) -> Self {
        Self {
            mode: DraftMode::Edit,
            display_id: loading.id.clone(),
            queue_entry_id: loading.queue_entry_id.clone(),
            checker_id: loading.checker_id.clone(),
            origin_branch_id: loading.origin_branch_id.clone(),
            destination_branch_id: loading.destination_branch_id.clone(),
            selection: ShipmentSelection::from_ids(loading.shipment_ids.iter().cloned()),
            departure_time: loading.departure_time,
            notes: loading.notes.clone().unwrap_or_default(),
            status: loading.status,
            stored_status: Some(loading.status),
            submitting: false,
        }
    }

    // ==========================================
    // 只读访问
    // ==========================================

    pub fn mode(&self) -> DraftMode {
        self.mode
    }

    pub fn display_id(&self) -> &str {
        &self.display_id
    }

    pub fn status(&self) -> LoadingStatus {
        self.status
    }

    pub fn departure_time(&self) -> Option<NaiveDateTime> {
        self.departure_time
    }

    pub fn origin_branch_id(&self) -> &str {
        &self.origin_branch_id
    }

    pub fn destination_branch_id(&self) -> &str {
        &self.destination_branch_id
    }

    pub fn selection(&self) -> &ShipmentSelection {
        &self.selection
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    // ==========================================
    // 字段修改
    // ==========================================

    /// 重新生成单号（仅新建草稿）
    pub fn regenerate_display_id(
        &mut self,
        generator: &DisplayIdGenerator,
        today: NaiveDate,
    ) -> RuleResult<()> {
        self.ensure_create_mode("id")?;
        self.display_id = generator.generate(today);
        Ok(())
    }

    pub fn set_queue_entry(&mut self, queue_entry_id: &str) -> RuleResult<()> {
        self.ensure_unlocked("queue_entry_id", &self.queue_entry_id, queue_entry_id)?;
        self.queue_entry_id = queue_entry_id.to_string();
        Ok(())
    }

    /// 修改始发网点
    ///
    /// 网点实际变化时必须清空已选运单
    pub fn set_origin_branch(&mut self, origin_branch_id: &str) -> RuleResult<()> {
        self.ensure_unlocked("origin_branch_id", &self.origin_branch_id, origin_branch_id)?;
        if self.origin_branch_id != origin_branch_id {
            self.origin_branch_id = origin_branch_id.to_string();
            self.selection.clear();
        }
        Ok(())
    }

    pub fn set_destination_branch(&mut self, destination_branch_id: &str) -> RuleResult<()> {
        self.ensure_unlocked(
            "destination_branch_id",
            &self.destination_branch_id,
            destination_branch_id,
        )?;
        self.destination_branch_id = destination_branch_id.to_string();
        Ok(())
    }

    pub fn set_checker(&mut self, checker_id: &str) {
        self.checker_id = checker_id.to_string();
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.notes = notes.to_string();
    }

    /// 修改发车时间并重新派生状态
    ///
    /// 解析失败时草稿保持不变
    pub fn set_departure_time(&mut self, raw: &str, format: &str) -> RuleResult<()> {
        if self.stored_status.map(|s| s.is_terminal()).unwrap_or(false) {
            return Err(RuleViolation::transition(
                "loading",
                LoadingStatus::Sampai,
                LoadingStatus::Sampai,
            ));
        }
        let parsed = LoadingStatusDerivation::parse_departure_time(Some(raw), format)?;
        self.departure_time = parsed;
        self.status = LoadingStatusDerivation::derive(self.departure_time.as_ref());
        Ok(())
    }

    /// 标记已到达（仅编辑已有装车单）
    pub fn mark_arrived(&mut self) -> RuleResult<()> {
        if self.mode == DraftMode::Create {
            return Err(RuleViolation::Precondition(
                "SAMPAI 只能在已有装车单上设置".to_string(),
            ));
        }
        self.status = LoadingStatus::Sampai;
        Ok(())
    }

    // ==========================================
    // 运单选择
    // ==========================================

    pub fn toggle_shipment(&mut self, shipment_id: &str) -> bool {
        self.selection.toggle(shipment_id)
    }

    pub fn select_all_eligible(&mut self, eligible: &BTreeSet<String>) {
        self.selection.select_all_eligible(eligible);
    }

    pub fn clear_shipments(&mut self) {
        self.selection.clear();
    }

    // ==========================================
    // 提交控制
    // ==========================================

    /// 开始提交；已有请求在途时拒绝
    pub fn begin_submit(&mut self) -> RuleResult<()> {
        if self.submitting {
            return Err(RuleViolation::Precondition("已有提交请求在处理中".to_string()));
        }
        self.submitting = true;
        Ok(())
    }

    pub fn finish_submit(&mut self) {
        self.submitting = false;
    }

    /// 生成创建请求
    pub fn to_create_input(&self) -> RuleResult<CreateLoadingInput> {
        self.ensure_create_mode("id")?;
        Ok(CreateLoadingInput {
            id: Some(self.display_id.clone()),
            queue_entry_id: self.queue_entry_id.clone(),
            checker_id: self.checker_id.clone(),
            origin_branch_id: self.origin_branch_id.clone(),
            destination_branch_id: self.destination_branch_id.clone(),
            shipment_ids: self.selection.to_vec(),
            departure_time: self.departure_string(),
            notes: self.notes_value(),
        })
    }

    /// 生成编辑请求（只包含相对原记录有变化的字段）
    pub fn to_patch(&self, original: &Loading) -> LoadingPatch {
        let mut patch = LoadingPatch::default();

        if self.checker_id != original.checker_id {
            patch.checker_id = Some(self.checker_id.clone());
        }

        let original_ids: BTreeSet<String> = original.shipment_ids.iter().cloned().collect();
        if &original_ids != self.selection.ids() {
            patch.shipment_ids = Some(self.selection.to_vec());
        }

        if self.departure_time != original.departure_time {
            patch.departure_time = Some(self.departure_string().unwrap_or_default());
        }

        if self.notes_value() != original.notes {
            patch.notes = Some(self.notes.clone());
        }

        if self.status == LoadingStatus::Sampai && original.status != LoadingStatus::Sampai {
            patch.status = Some(LoadingStatus::Sampai);
        }

        patch
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn ensure_create_mode(&self, field: &str) -> RuleResult<()> {
        match self.mode {
            DraftMode::Create => Ok(()),
            DraftMode::Edit => Err(RuleViolation::ImmutableField {
                field: field.to_string(),
            }),
        }
    }

    fn ensure_unlocked(&self, field: &str, current: &str, next: &str) -> RuleResult<()> {
        if self.mode == DraftMode::Edit && current != next {
            return Err(RuleViolation::ImmutableField {
                field: field.to_string(),
            });
        }
        Ok(())
    }

    fn departure_string(&self) -> Option<String> {
        self.departure_time
            .map(|t| t.format(DRAFT_DEPARTURE_FORMAT).to_string())
    }

    fn notes_value(&self) -> Option<String> {
        let trimmed = self.notes.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(self.notes.clone())
        }
    }
}
