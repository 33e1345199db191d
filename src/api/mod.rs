// ==========================================
// 货运装车调度核心 - API 层
// ==========================================
// 职责: 提供业务 API 接口（排队登记、运单池、装车单、目录）
// ==========================================

pub mod directory_api;
pub mod error;
pub mod loading_api;
pub mod queue_api;
pub mod shipment_api;

// 重导出核心类型
pub use directory_api::DirectoryApi;
pub use error::{ApiError, ApiResult};
pub use loading_api::LoadingApi;
pub use queue_api::QueueApi;
pub use shipment_api::ShipmentApi;
