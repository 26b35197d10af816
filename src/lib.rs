// ==========================================
// 可持续设计方案引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + tokio
// 系统定位: 决策支持系统（生成候选方案并给出推荐,最终由人选择）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Climate, DesignStrategy, Priority};

// 领域实体
pub use domain::{
    ConstraintSet, Design, MetricsBundle, ProjectRecord, RankingEntry, RankingSource,
    RawConstraintInput, Recommendation, ValidationError,
};

// 引擎
pub use engine::{
    BestDesignResolver, ConstraintEngine, CostPredictor, DesignGenerator, DesignPipeline,
    DesignRanker, HistoricalRecommender, SustainabilityEvaluator,
};

// API
pub use api::{ApiError, ApiResult, DesignApi, ExportApi, ProjectApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "可持续设计方案引擎";
