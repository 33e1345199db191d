// ==========================================
// 货运装车调度核心 - 引擎层
// ==========================================
// 职责: 实现业务规则,不拼 SQL
// 红线: Engine 不访问存储, 所有规则失败必须给出原因
// ==========================================

pub mod display_id;
pub mod draft;
pub mod eligibility_policy;
pub mod error;
pub mod loading_status;
pub mod selection;
pub mod shipment_pool;

// 重导出核心引擎
pub use display_id::{DisplayIdFormat, DisplayIdGenerator};
pub use draft::{DraftMode, LoadingDraft};
pub use eligibility_policy::EligibilityPolicy;
pub use error::{RuleResult, RuleViolation};
pub use loading_status::LoadingStatusDerivation;
pub use selection::{select_all_eligible, ShipmentSelection};
pub use shipment_pool::ShipmentPool;
