// ==========================================
// 货运装车调度核心 - 装车状态派生
// ==========================================
// 职责: 发车时间 → MUAT/BERANGKAT 派生，SAMPAI 显式设置
// 红线: 每次修改发车时间后必须重新派生，禁止持久化非法组合
// ==========================================

use crate::engine::error::{RuleResult, RuleViolation};
use crate::domain::types::LoadingStatus;
use chrono::NaiveDateTime;

/// 额外接受的发车时间格式（带秒 / 空格分隔）
const FALLBACK_DEPARTURE_FORMATS: &[&str] =
    &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

// ==========================================
// LoadingStatusDerivation - 纯函数工具类
// ==========================================
pub struct LoadingStatusDerivation;

impl LoadingStatusDerivation {
    /// 解析表单中的发车时间
    ///
    /// # 规则
    /// - None / 空串 / 纯空白 → Ok(None)
    /// - 按 primary_format 解析，失败后尝试备用格式
    /// - 全部失败 → Validation(departure_time)
    pub fn parse_departure_time(
        raw: Option<&str>,
        primary_format: &str,
    ) -> RuleResult<Option<NaiveDateTime>> {
        let value = match raw.map(str::trim) {
            None | Some("") => return Ok(None),
            Some(v) => v,
        };

        std::iter::once(primary_format)
            .chain(FALLBACK_DEPARTURE_FORMATS.iter().copied())
            .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
            .map(Some)
            .ok_or_else(|| {
                RuleViolation::validation(
                    "departure_time",
                    format!("无法解析发车时间: {}", value),
                )
            })
    }

    /// 由发车时间派生状态
    ///
    /// # 规则
    /// - 有发车时间 → BERANGKAT
    /// - 无发车时间 → MUAT
    pub fn derive(departure_time: Option<&NaiveDateTime>) -> LoadingStatus {
        match departure_time {
            Some(_) => LoadingStatus::Berangkat,
            None => LoadingStatus::Muat,
        }
    }

    /// 编辑时确定最终状态
    ///
    /// # 规则
    /// 1. 当前为 SAMPAI（终态）→ 拒绝
    /// 2. 显式请求 SAMPAI → SAMPAI
    /// 3. 显式请求 MUAT/BERANGKAT → 必须与派生结果一致
    /// 4. 未请求 → 派生结果
    pub fn resolve_update(
        current: LoadingStatus,
        requested: Option<LoadingStatus>,
        departure_time: Option<&NaiveDateTime>,
    ) -> RuleResult<LoadingStatus> {
        if current.is_terminal() {
            let to = requested.unwrap_or(current);
            return Err(RuleViolation::transition("loading", current, to));
        }

        let derived = Self::derive(departure_time);
        match requested {
            Some(LoadingStatus::Sampai) => Ok(LoadingStatus::Sampai),
            Some(explicit) if explicit != derived => {
                Err(RuleViolation::transition("loading", current, explicit))
            }
            _ => Ok(derived),
        }
    }

    /// 校验状态与发车时间组合是否合法
    pub fn is_consistent(status: LoadingStatus, departure_time: Option<&NaiveDateTime>) -> bool {
        match status {
            LoadingStatus::Muat => departure_time.is_none(),
            LoadingStatus::Berangkat => departure_time.is_some(),
            LoadingStatus::Sampai => true,
        }
    }
}
