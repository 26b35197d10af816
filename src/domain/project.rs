// ==========================================
// 可持续设计方案引擎 - 项目历史领域模型
// ==========================================
// 用途: 每次生成的结果作为一条项目历史持久化
// ==========================================

use crate::domain::constraint::ConstraintSet;
use crate::domain::design::{Design, DesignId, RankingEntry};
use crate::domain::types::DesignStrategy;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Recommendation - 历史相似推荐
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// 推荐策略（无历史时为 None）
    pub strategy: Option<DesignStrategy>,
    /// 对应批次内设计 id
    pub design_id: Option<DesignId>,
    /// 置信度 0~1
    pub confidence: f64,
    /// 参与投票的历史项目数
    pub neighbours: usize,
    /// 推荐原因（可解释性）
    pub reason: String,
}

impl Recommendation {
    pub fn none(reason: impl Into<String>) -> Self {
        Self {
            strategy: None,
            design_id: None,
            confidence: 0.0,
            neighbours: 0,
            reason: reason.into(),
        }
    }
}

// ==========================================
// ProjectRecord - 项目完整记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub project_id: i64,
    pub user_id: Option<i64>,
    pub constraints: ConstraintSet,
    pub designs: Vec<Design>,
    pub ml_rankings: Option<Vec<RankingEntry>>,
    pub best_design_id: Option<DesignId>,
    pub recommendation: Option<Recommendation>,
    /// 生成时的配置快照（JSON）
    pub config_snapshot: Option<String>,
    pub created_at: NaiveDateTime,
}

impl ProjectRecord {
    /// 该项目最终推荐方案的策略
    pub fn best_strategy(&self) -> Option<DesignStrategy> {
        let best_id = self.best_design_id?;
        self.designs
            .iter()
            .find(|d| d.id == best_id)
            .and_then(|d| d.strategy.or_else(|| DesignStrategy::from_batch_index(d.id)))
    }
}

// ==========================================
// ProjectSummary - 项目列表摘要
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project_id: i64,
    pub user_id: Option<i64>,
    pub area: f64,
    pub budget: f64,
    pub climate: String,
    pub priority: String,
    pub design_count: usize,
    pub best_design_id: Option<DesignId>,
    pub created_at: NaiveDateTime,
}

/// 新建项目（尚未分配 project_id）
#[derive(Debug, Clone)]
pub struct NewProject {
    pub user_id: Option<i64>,
    pub constraints: ConstraintSet,
    pub designs: Vec<Design>,
    pub ml_rankings: Option<Vec<RankingEntry>>,
    pub best_design_id: Option<DesignId>,
    pub recommendation: Option<Recommendation>,
    pub config_snapshot: Option<String>,
}
