// ==========================================
// 货运装车调度核心 - 操作日志数据仓储
// ==========================================
// 红线: 所有成功写入必须记录
// ==========================================

mod core;
mod queries;


pub use core::ActionLogRepository;
