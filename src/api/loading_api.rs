// ==========================================
// 货运装车调度核心 - 装车单 API
// ==========================================
// 职责: 装车单创建/编辑编排
// 1. 校验（字段 → 准入 → 排队条目/理货员/运单可用性）
// 2. 持久化装车单
// 3. 排队条目 WAITING → LOADING（发车时继续 → DEPARTED）
// 4. 运单 PENDING ↔ LOADED
// 5. ActionLog 记录
// 红线: 校验全部通过前不产生任何写入；后续步骤失败时回退已完成的写入
// ==========================================

use std::collections::BTreeSet;
use std::error::Error;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde_json::json;

use crate::api::error::{ApiError, ApiResult};
use crate::api::queue_api::{required, QueueApi};
use crate::api::shipment_api::ShipmentApi;
use crate::config::DispatchConfigReader;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::actor::Actor;
use crate::domain::loading::{CreateLoadingInput, Loading, LoadingPatch};
use crate::domain::queue::QueueEntry;
use crate::domain::types::{JobFunction, LoadingStatus, QueueStatus};
use crate::engine::display_id::DisplayIdGenerator;
use crate::engine::draft::{DraftMode, LoadingDraft};
use crate::engine::eligibility_policy::EligibilityPolicy;
use crate::engine::error::RuleViolation;
use crate::engine::loading_status::LoadingStatusDerivation;
use crate::engine::selection::select_all_eligible;
use crate::engine::shipment_pool::ShipmentPool;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::directory_repo::DirectoryRepository;
use crate::repository::loading_repo::LoadingRepository;

// ==========================================
// LoadingApi - 装车单 API
// ==========================================
pub struct LoadingApi<C>
where
    C: DispatchConfigReader,
{
    config: Arc<C>,
    loading_repo: Arc<LoadingRepository>,
    directory_repo: Arc<DirectoryRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    queue_api: Arc<QueueApi>,
    shipment_api: Arc<ShipmentApi>,
}

impl<C> LoadingApi<C>
where
    C: DispatchConfigReader,
{
    pub fn new(
        config: Arc<C>,
        loading_repo: Arc<LoadingRepository>,
        directory_repo: Arc<DirectoryRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        queue_api: Arc<QueueApi>,
        shipment_api: Arc<ShipmentApi>,
    ) -> Self {
        Self {
            config,
            loading_repo,
            directory_repo,
            action_log_repo,
            queue_api,
            shipment_api,
        }
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn find(&self, id: &str) -> ApiResult<Loading> {
        self.loading_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound {
                entity: "Loading".to_string(),
                id: id.to_string(),
            })
    }

    pub fn list_by_status(&self, status: LoadingStatus) -> ApiResult<Vec<Loading>> {
        Ok(self.loading_repo.list_by_status(status)?)
    }

    // ==========================================
    // 创建
    // ==========================================

    /// 创建装车单
    ///
    /// # 校验顺序
    /// queue_entry_id → checker_id → origin → destination → shipment_ids 非空
    /// → 发车时间格式 → 准入 → 排队条目 WAITING → 理货员 → 运单可装
    ///
    /// # 副作用（按顺序）
    /// 装车单入库 → 排队条目 LOADING → 运单 LOADED → （有发车时间）排队条目 DEPARTED
    pub async fn create(&self, actor: &Actor, input: CreateLoadingInput) -> ApiResult<Loading> {
        let queue_entry_id = required("queue_entry_id", &input.queue_entry_id, "请选择排队车辆")?;
        let checker_id = required("checker_id", &input.checker_id, "请选择理货员")?;
        let origin_branch_id =
            required("origin_branch_id", &input.origin_branch_id, "请选择出发网点")?;
        let destination_branch_id = required(
            "destination_branch_id",
            &input.destination_branch_id,
            "请选择目的网点",
        )?;
        if origin_branch_id == destination_branch_id {
            return Err(ApiError::validation(
                "destination_branch_id",
                "目的网点不能与出发网点相同",
            ));
        }
        let shipment_ids = normalize_ids(&input.shipment_ids);
        if shipment_ids.is_empty() {
            return Err(ApiError::validation("shipment_ids", "至少选择一个运单"));
        }
        let departure_format = self.departure_format().await?;
        let departure_time = LoadingStatusDerivation::parse_departure_time(
            input.departure_time.as_deref(),
            &departure_format,
        )?;

        self.authorize(actor, &origin_branch_id, "create_loading")?;

        let queue_entry = self.queue_api.find(&queue_entry_id)?;
        if !queue_entry.is_waiting() {
            return Err(RuleViolation::transition(
                "queue_entry",
                queue_entry.status,
                QueueStatus::Loading,
            )
            .into());
        }
        let require_origin = self
            .config
            .get_queue_require_origin_branch()
            .await
            .map_err(config_error)?;
        if require_origin && queue_entry.branch_id != origin_branch_id {
            return Err(ApiError::invalid_selection(
                "queue_entry_id",
                vec![queue_entry_id],
            ));
        }
        self.ensure_checker(&checker_id)?;

        let eligible = self
            .shipment_api
            .eligible_ids(&origin_branch_id, &destination_branch_id)?;
        let ineligible = ShipmentPool::ineligible_ids(&shipment_ids, &eligible);
        if !ineligible.is_empty() {
            return Err(RuleViolation::InvalidSelection { ids: ineligible }.into());
        }

        let id = match input.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => id.to_string(),
            None => self.display_id_generator().await?.generate(today()),
        };
        let status = LoadingStatusDerivation::derive(departure_time.as_ref());
        let now = Local::now().naive_local();
        let loading = Loading {
            id,
            queue_entry_id,
            origin_branch_id,
            destination_branch_id,
            checker_id,
            departure_time,
            notes: normalize_notes(input.notes.as_deref()),
            shipment_ids,
            status,
            created_at: now,
            updated_at: now,
        };

        ensure_consistent(&loading)?;

        // ===== 写入阶段 =====
        self.loading_repo.insert(&loading)?;

        let loading_entry = match self
            .queue_api
            .advance(&queue_entry, QueueStatus::Loading, &actor.id)
        {
            Ok(entry) => entry,
            Err(e) => {
                self.discard_loading(&loading.id);
                return Err(e);
            }
        };

        if let Err(e) = self.shipment_api.mark_loaded(&loading.shipment_ids) {
            if let Err(restore_err) = self.queue_api.restore_status(
                &queue_entry.id,
                QueueStatus::Loading,
                QueueStatus::Waiting,
            ) {
                tracing::error!(
                    queue_entry_id = %queue_entry.id,
                    error = %restore_err,
                    "排队状态回退失败"
                );
            }
            self.discard_loading(&loading.id);
            return Err(e);
        }

        if loading.status == LoadingStatus::Berangkat {
            self.sync_departure(&loading_entry, &actor.id);
        }

        tracing::info!(
            loading_id = %loading.id,
            queue_entry_id = %loading.queue_entry_id,
            status = %loading.status,
            shipments = loading.shipment_ids.len(),
            "装车单已创建"
        );
        self.record(ActionLog::new(
            ActionType::CreateLoading,
            &actor.id,
            &loading.id,
            Some(json!({
                "queue_entry_id": loading.queue_entry_id,
                "origin_branch_id": loading.origin_branch_id,
                "destination_branch_id": loading.destination_branch_id,
                "shipment_ids": loading.shipment_ids,
                "status": loading.status,
            })),
            None,
        ));
        Ok(loading)
    }

    // ==========================================
    // 编辑
    // ==========================================

    /// 编辑装车单
    ///
    /// # 规则
    /// - SAMPAI 为终态，拒绝任何修改
    /// - queue_entry_id / origin / destination 与原值不同 → ImmutableField
    /// - 提供的字段按创建时的规则校验，原有运单视为可装
    /// - 状态由发车时间派生，SAMPAI 需显式请求
    ///
    /// # 校验顺序
    /// 字段 → 准入（按原出发网点）→ 理货员 → 新增运单可装
    pub async fn update(&self, actor: &Actor, id: &str, patch: LoadingPatch) -> ApiResult<Loading> {
        let stored = self.find(id)?;

        if stored.status.is_terminal() {
            return Err(RuleViolation::transition(
                "loading",
                stored.status,
                patch.status.unwrap_or(stored.status),
            )
            .into());
        }
        ensure_unchanged(
            "queue_entry_id",
            patch.queue_entry_id.as_deref(),
            &stored.queue_entry_id,
        )?;
        ensure_unchanged(
            "origin_branch_id",
            patch.origin_branch_id.as_deref(),
            &stored.origin_branch_id,
        )?;
        ensure_unchanged(
            "destination_branch_id",
            patch.destination_branch_id.as_deref(),
            &stored.destination_branch_id,
        )?;

        let mut updated = stored.clone();

        if let Some(checker_id) = &patch.checker_id {
            updated.checker_id = required("checker_id", checker_id, "请选择理货员")?;
        }
        if let Some(ids) = &patch.shipment_ids {
            let ids = normalize_ids(ids);
            if ids.is_empty() {
                return Err(ApiError::validation("shipment_ids", "至少选择一个运单"));
            }
            updated.shipment_ids = ids;
        }
        if let Some(raw) = &patch.departure_time {
            let format = self.departure_format().await?;
            updated.departure_time =
                LoadingStatusDerivation::parse_departure_time(Some(raw), &format)?;
        }
        if let Some(notes) = &patch.notes {
            updated.notes = normalize_notes(Some(notes));
        }
        updated.status = LoadingStatusDerivation::resolve_update(
            stored.status,
            patch.status,
            updated.departure_time.as_ref(),
        )?;

        self.authorize(actor, &stored.origin_branch_id, "update_loading")?;

        if updated.checker_id != stored.checker_id {
            self.ensure_checker(&updated.checker_id)?;
        }

        let stored_ids: BTreeSet<String> = stored.shipment_ids.iter().cloned().collect();
        let updated_ids: BTreeSet<String> = updated.shipment_ids.iter().cloned().collect();
        let added: Vec<String> = updated_ids.difference(&stored_ids).cloned().collect();
        let removed: Vec<String> = stored_ids.difference(&updated_ids).cloned().collect();

        if !added.is_empty() {
            let mut eligible = self
                .shipment_api
                .eligible_ids(&stored.origin_branch_id, &stored.destination_branch_id)?;
            eligible.extend(stored_ids.iter().cloned());
            let ineligible = ShipmentPool::ineligible_ids(&updated.shipment_ids, &eligible);
            if !ineligible.is_empty() {
                return Err(RuleViolation::InvalidSelection { ids: ineligible }.into());
            }
        }

        updated.updated_at = Local::now().naive_local();
        ensure_consistent(&updated)?;

        // ===== 写入阶段 =====
        self.shipment_api.mark_loaded(&added)?;

        if let Err(e) = self.loading_repo.update(&updated) {
            self.release_quietly(&added);
            return Err(e.into());
        }

        if let Err(e) = self.shipment_api.release(&removed) {
            if let Err(revert_err) = self.loading_repo.update(&stored) {
                tracing::error!(loading_id = %stored.id, error = %revert_err, "装车单回退失败");
            }
            self.release_quietly(&added);
            return Err(e);
        }

        if stored.status == LoadingStatus::Muat && updated.status != LoadingStatus::Muat {
            match self.queue_api.find(&updated.queue_entry_id) {
                Ok(entry) if entry.status == QueueStatus::Loading => {
                    self.sync_departure(&entry, &actor.id)
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(
                    queue_entry_id = %updated.queue_entry_id,
                    error = %e,
                    "发车同步时读取排队条目失败"
                ),
            }
        }

        tracing::info!(
            loading_id = %updated.id,
            from = %stored.status,
            to = %updated.status,
            added = added.len(),
            removed = removed.len(),
            "装车单已更新"
        );
        self.record(ActionLog::new(
            ActionType::UpdateLoading,
            &actor.id,
            &updated.id,
            serde_json::to_value(&patch).ok(),
            Some(format!("{} -> {}", stored.status, updated.status)),
        ));
        Ok(updated)
    }

    // ==========================================
    // 草稿（编辑器本地状态，不产生写入）
    // ==========================================

    pub async fn new_draft(&self) -> ApiResult<LoadingDraft> {
        let generator = self.display_id_generator().await?;
        Ok(LoadingDraft::new(&generator, today()))
    }

    pub fn open_draft(&self, id: &str) -> ApiResult<LoadingDraft> {
        Ok(LoadingDraft::from_loading(&self.find(id)?))
    }

    pub async fn regenerate_display_id(&self, draft: &mut LoadingDraft) -> ApiResult<()> {
        let generator = self.display_id_generator().await?;
        Ok(draft.regenerate_display_id(&generator, today())?)
    }

    /// 修改草稿发车时间（按配置格式解析，状态立即重新派生）
    pub async fn set_departure_time(&self, draft: &mut LoadingDraft, raw: &str) -> ApiResult<()> {
        let format = self.departure_format().await?;
        Ok(draft.set_departure_time(raw, &format)?)
    }

    pub fn toggle_shipment(&self, draft: &mut LoadingDraft, shipment_id: &str) -> bool {
        draft.toggle_shipment(shipment_id)
    }

    /// 全选/全不选（以当前可装集合为准）
    pub fn select_all_eligible(
        &self,
        origin_branch_id: &str,
        destination_branch_id: &str,
        current: &BTreeSet<String>,
    ) -> ApiResult<BTreeSet<String>> {
        let eligible = self
            .shipment_api
            .eligible_ids(origin_branch_id, destination_branch_id)?;
        Ok(select_all_eligible(&eligible, current))
    }

    pub fn select_all_in_draft(&self, draft: &mut LoadingDraft) -> ApiResult<()> {
        let eligible = self
            .shipment_api
            .eligible_ids(draft.origin_branch_id(), draft.destination_branch_id())?;
        draft.select_all_eligible(&eligible);
        Ok(())
    }

    /// 提交草稿（提交期间拒绝重复提交）
    pub async fn submit_draft(
        &self,
        actor: &Actor,
        draft: &mut LoadingDraft,
    ) -> ApiResult<Loading> {
        draft.begin_submit()?;

        let result = match draft.mode() {
            DraftMode::Create => match draft.to_create_input() {
                Ok(input) => self.create(actor, input).await,
                Err(e) => Err(e.into()),
            },
            DraftMode::Edit => match self.find(draft.display_id()) {
                Ok(original) => {
                    let patch = draft.to_patch(&original);
                    self.update(actor, &original.id, patch).await
                }
                Err(e) => Err(e),
            },
        };

        draft.finish_submit();
        result
    }

    // ==========================================
    // 内部辅助
    // ==========================================

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

    /// 理货员必须是岗位职能为 Checker 的员工
    fn ensure_checker(&self, checker_id: &str) -> ApiResult<()> {
        match self.directory_repo.find_employee(checker_id)? {
            Some(employee) if employee.job_function == JobFunction::Checker => Ok(()),
            _ => Err(ApiError::invalid_selection(
                "checker_id",
                vec![checker_id.to_string()],
            )),
        }
    }

    /// LOADING → DEPARTED（失败只记录告警，不影响装车单结果）
    fn sync_departure(&self, entry: &QueueEntry, actor_id: &str) {
        if let Err(e) = self.queue_api.advance(entry, QueueStatus::Departed, actor_id) {
            tracing::warn!(queue_entry_id = %entry.id, error = %e, "排队条目发车同步失败");
        }
    }

    fn discard_loading(&self, id: &str) {
        if let Err(e) = self.loading_repo.delete(id) {
            tracing::error!(loading_id = %id, error = %e, "装车单回退删除失败");
        }
    }

    fn release_quietly(&self, ids: &[String]) {
        if let Err(e) = self.shipment_api.release(ids) {
            tracing::error!(error = %e, "运单状态回退失败");
        }
    }

    async fn departure_format(&self) -> ApiResult<String> {
        self.config
            .get_departure_time_format()
            .await
            .map_err(config_error)
    }

    async fn display_id_generator(&self) -> ApiResult<DisplayIdGenerator> {
        let format = self
            .config
            .get_display_id_format()
            .await
            .map_err(config_error)?;
        Ok(DisplayIdGenerator::new(format))
    }

    fn record(&self, log: ActionLog) {
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!("记录操作日志失败: {}", e);
        }
    }
}

// ==========================================
// 纯辅助
// ==========================================

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn config_error(e: Box<dyn Error>) -> ApiError {
    ApiError::Other(anyhow::anyhow!("读取配置失败: {}", e))
}

/// 去空白、去空串、按首次出现去重
fn normalize_ids(ids: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    ids.iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

/// 写入前确认状态与发车时间组合合法
fn ensure_consistent(loading: &Loading) -> ApiResult<()> {
    if LoadingStatusDerivation::is_consistent(loading.status, loading.departure_time.as_ref()) {
        return Ok(());
    }
    Err(ApiError::validation(
        "status",
        format!("状态 {} 与发车时间不匹配", loading.status),
    ))
}

/// 锁定字段：提供且与原值不同 → ImmutableField
fn ensure_unchanged(field: &str, requested: Option<&str>, stored: &str) -> ApiResult<()> {
    match requested {
        Some(value) if value.trim() != stored => Err(RuleViolation::ImmutableField {
            field: field.to_string(),
        }
        .into()),
        _ => Ok(()),
    }
}
