// ==========================================
// 可持续设计方案引擎 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供界面外壳 / 命令行调用
// ==========================================

pub mod design_api;
pub mod error;
pub mod export_api;
pub mod project_api;

// 重导出核心类型
pub use design_api::{ConstraintCheck, DesignApi, GenerationReport, RankingReport, SystemMetadata};
pub use error::{ApiError, ApiResult};
pub use export_api::{ExportApi, ExportRow};
pub use project_api::ProjectApi;
