// ==========================================
// 货运装车调度核心 - 应用层
// ==========================================
// 职责: 装配仓储与 API，供外部调用方持有
// ==========================================

pub mod state;

pub use state::AppState;
