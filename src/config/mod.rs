// ==========================================
// 货运装车调度核心 - 配置层
// ==========================================
// 职责: 系统配置管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod dispatch_config_trait;

pub use config_manager::{config_keys, ConfigManager};
pub use dispatch_config_trait::DispatchConfigReader;
