// ==========================================
// 可持续设计方案引擎 - 配置层
// ==========================================
// 职责: 系统配置管理（约束边界、校验模式、服务超时、评分权重）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod engine_config_trait;
pub mod scoring_profile;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use engine_config_trait::{ConstraintMode, EngineConfigReader};
pub use scoring_profile::{default_ranker_weights, IndexWeights, RankerWeightTable, RankerWeights};
