// ==========================================
// 货运装车调度核心 - 调度配置读取 Trait
// ==========================================
// 职责: 定义 API 层所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::engine::display_id::DisplayIdFormat;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// DispatchConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait DispatchConfigReader: Send + Sync {
    /// 装车单号格式
    ///
    /// # 默认值
    /// - LOAD / %d%m%y / 1000..=9999
    async fn get_display_id_format(&self) -> Result<DisplayIdFormat, Box<dyn Error>>;

    /// 出发时间输入格式
    ///
    /// # 默认值
    /// - %Y-%m-%dT%H:%M
    async fn get_departure_time_format(&self) -> Result<String, Box<dyn Error>>;

    /// 排队条目是否必须属于装车单的出发网点
    ///
    /// # 默认值
    /// - true
    async fn get_queue_require_origin_branch(&self) -> Result<bool, Box<dyn Error>>;

    /// 默认语言
    async fn get_default_locale(&self) -> Result<String, Box<dyn Error>>;

    /// 日志过滤表达式
    async fn get_log_filter(&self) -> Result<String, Box<dyn Error>>;
}
