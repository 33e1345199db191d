// ==========================================
// 货运装车调度核心 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod actor;
pub mod loading;
pub mod queue;
pub mod shipment;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use actor::{Actor, Branch, Employee};
pub use loading::{CreateLoadingInput, Loading, LoadingPatch};
pub use queue::{NewQueueEntry, QueueEntry, QueueEntryPatch};
pub use shipment::ShipmentReceipt;
pub use types::{JobFunction, LoadingStatus, PaymentType, QueueStatus, Role, ShipmentStatus};
