// ==========================================
// 可持续设计方案引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod constraint;
pub mod design;
pub mod project;
pub mod types;

// 重导出核心类型
pub use constraint::{
    ClampNotice, ConstraintLimits, ConstraintSet, RawConstraintInput, ValidationError,
};
pub use design::{Design, DesignId, MetricsBundle, RankingEntry, RankingSource};
pub use project::{NewProject, ProjectRecord, ProjectSummary, Recommendation};
pub use types::{Climate, DesignStrategy, Priority};
