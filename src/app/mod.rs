// ==========================================
// 可持续设计方案引擎 - 应用层
// ==========================================
// 职责: 装配连接、配置、仓储与 API
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppOptions, AppState};
