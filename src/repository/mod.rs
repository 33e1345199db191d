// ==========================================
// 货运装车调度核心 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化
// ==========================================

pub mod action_log_repo;
pub mod directory_repo;
pub mod error;
pub mod loading_repo;
pub mod queue_entry_repo;
pub mod shipment_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use directory_repo::DirectoryRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use loading_repo::LoadingRepository;
pub use queue_entry_repo::QueueEntryRepository;
pub use shipment_repo::ShipmentReceiptRepository;
