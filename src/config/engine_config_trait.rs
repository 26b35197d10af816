// ==========================================
// 可持续设计方案引擎 - 引擎配置读取 Trait
// ==========================================
// 职责: 定义 API 层所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::scoring_profile::{IndexWeights, RankerWeightTable};
use crate::domain::constraint::ConstraintLimits;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::str::FromStr;

// ==========================================
// ConstraintMode - 约束校验模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintMode {
    /// 越界即报错
    #[default]
    Strict,
    /// 越界钳制到最近边界,并记录 ClampNotice
    Clamp,
}

impl ConstraintMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintMode::Strict => "STRICT",
            ConstraintMode::Clamp => "CLAMP",
        }
    }
}

impl fmt::Display for ConstraintMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConstraintMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "STRICT" => Ok(ConstraintMode::Strict),
            "CLAMP" => Ok(ConstraintMode::Clamp),
            other => Err(format!("未知约束模式: {}", other)),
        }
    }
}

// ==========================================
// EngineConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait EngineConfigReader: Send + Sync {
    // ===== 约束配置 =====

    /// 面积上下限
    ///
    /// # 默认值
    /// - 300 ~ 2000 平方英尺
    async fn get_constraint_limits(&self) -> Result<ConstraintLimits, Box<dyn Error>>;

    /// 约束校验模式
    ///
    /// # 默认值
    /// - STRICT
    async fn get_constraint_mode(&self) -> Result<ConstraintMode, Box<dyn Error>>;

    // ===== 生成服务 =====

    /// 生成服务超时（毫秒）
    ///
    /// # 默认值
    /// - 8000
    async fn get_service_timeout_ms(&self) -> Result<u64, Box<dyn Error>>;

    // ===== 评分权重 =====

    /// 综合指数权重
    async fn get_index_weights(&self) -> Result<IndexWeights, Box<dyn Error>>;

    /// 排名器权重表
    async fn get_ranker_weights(&self) -> Result<RankerWeightTable, Box<dyn Error>>;

    // ===== 历史 =====

    /// 历史推荐/列表读取条数
    ///
    /// # 默认值
    /// - 50
    async fn get_history_limit(&self) -> Result<usize, Box<dyn Error>>;

    // ===== 快照 =====

    /// 当前 global 配置快照（JSON）
    async fn snapshot_config(&self) -> Result<String, Box<dyn Error>>;
}
