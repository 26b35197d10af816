// ==========================================
// 可持续设计方案引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有值均参数化传入
// ==========================================

pub mod error;
pub mod project_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use project_repo::{OwnerFilter, ProjectRepository};
