// ==========================================
// 货运装车调度核心 - 核心库
// ==========================================
// 范围: 卡车排队、可装运单筛选、装车单分配、准入策略
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 共享状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{JobFunction, LoadingStatus, PaymentType, QueueStatus, Role, ShipmentStatus};

// 领域实体
pub use domain::{
    ActionLog, ActionType, Actor, Branch, CreateLoadingInput, Employee, Loading, LoadingPatch,
    NewQueueEntry, QueueEntry, QueueEntryPatch, ShipmentReceipt,
};

// 引擎
pub use engine::{
    DisplayIdGenerator, EligibilityPolicy, LoadingDraft, LoadingStatusDerivation, ShipmentPool,
    ShipmentSelection,
};

// API
pub use api::{ApiError, ApiResult, DirectoryApi, LoadingApi, QueueApi, ShipmentApi};
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "货运装车调度核心";
