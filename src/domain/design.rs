// ==========================================
// 可持续设计方案引擎 - 设计方案领域模型
// ==========================================
// 职责: 设计方案、指标包、外部排名条目
// 红线: 指标越界即视为数据错误,不允许静默展示
// ==========================================

use crate::domain::types::DesignStrategy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 设计方案 ID（批次内唯一）
pub type DesignId = u32;

// ==========================================
// MetricsBundle - 指标包
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsBundle {
    pub energy_efficiency: f64,    // 能效 0~100 (%)
    pub water_efficiency: f64,     // 水效 0~100 (%)
    pub carbon_footprint: f64,     // 碳足迹 (吨 CO2e), 越低越好
    pub sustainability_index: f64, // 综合可持续指数 0~100
    pub estimated_cost: f64,       // 估算造价（货币单位）
}

impl MetricsBundle {
    /// 校验指标边界
    ///
    /// # 返回
    /// - Ok(()): 全部在界内
    /// - Err(String): 第一个越界字段的原因
    pub fn check_bounds(&self) -> Result<(), String> {
        let percent_fields = [
            ("energyEfficiency", self.energy_efficiency),
            ("waterEfficiency", self.water_efficiency),
            ("sustainabilityIndex", self.sustainability_index),
        ];
        for (name, value) in percent_fields {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(format!("{}={} 不在 [0,100]", name, value));
            }
        }

        let non_negative_fields = [
            ("carbonFootprint", self.carbon_footprint),
            ("estimatedCost", self.estimated_cost),
        ];
        for (name, value) in non_negative_fields {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{}={} 必须为非负有限数", name, value));
            }
        }

        Ok(())
    }
}

// ==========================================
// Design - 设计方案
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    pub id: DesignId,
    pub name: String,
    /// 生成策略（外部服务返回的方案可能没有）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<DesignStrategy>,
    /// 方案要点
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    pub metrics: MetricsBundle,
    /// 造价模型给出的预测造价
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_predicted_cost: Option<f64>,
}

impl Design {
    pub fn new(id: DesignId, name: impl Into<String>, metrics: MetricsBundle) -> Self {
        Self {
            id,
            name: name.into(),
            strategy: None,
            features: Vec::new(),
            metrics,
            ml_predicted_cost: None,
        }
    }
}

// ==========================================
// RankingEntry - 外部排名条目
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub id: DesignId,
    pub ml_score: f64,
}

// ==========================================
// RankingSource - 排名来源
// ==========================================
/// 最优方案判定依据
///
/// - ServerSupplied: 服务端给出的非空排名（可只覆盖部分方案）
/// - LocalHeuristic: 无排名,按 sustainabilityIndex 判定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "entries", rename_all = "snake_case")]
pub enum RankingSource {
    ServerSupplied(Vec<RankingEntry>),
    LocalHeuristic,
}

impl RankingSource {
    /// 由条目列表构造（空列表退化为 LocalHeuristic）
    pub fn from_entries(entries: Vec<RankingEntry>) -> Self {
        let entries: Vec<RankingEntry> = entries
            .into_iter()
            .filter(|e| e.ml_score.is_finite())
            .collect();

        if entries.is_empty() {
            RankingSource::LocalHeuristic
        } else {
            RankingSource::ServerSupplied(entries)
        }
    }

    /// 由可选列表构造
    pub fn from_optional(entries: Option<Vec<RankingEntry>>) -> Self {
        match entries {
            Some(list) => Self::from_entries(list),
            None => RankingSource::LocalHeuristic,
        }
    }

    /// 由原始 JSON 构造
    ///
    /// 规则:
    /// - 非数组 / null → LocalHeuristic
    /// - 条目缺少整数 id 或数值 ml_score → 丢弃该条目
    /// - 丢弃后为空 → LocalHeuristic
    pub fn from_json(value: &Value) -> Self {
        let Some(items) = value.as_array() else {
            return RankingSource::LocalHeuristic;
        };

        let entries = items
            .iter()
            .filter_map(|item| {
                let id = item.get("id")?.as_u64()?;
                let id = DesignId::try_from(id).ok()?;
                let ml_score = item.get("ml_score")?.as_f64()?;
                Some(RankingEntry { id, ml_score })
            })
            .collect();

        Self::from_entries(entries)
    }

    /// 查询某方案的排名分（重复 id 以首次出现为准）
    pub fn score_for(&self, id: DesignId) -> Option<f64> {
        match self {
            RankingSource::ServerSupplied(entries) => {
                entries.iter().find(|e| e.id == id).map(|e| e.ml_score)
            }
            RankingSource::LocalHeuristic => None,
        }
    }

    pub fn is_server_supplied(&self) -> bool {
        matches!(self, RankingSource::ServerSupplied(_))
    }

    /// 原始条目（LocalHeuristic 为空）
    pub fn entries(&self) -> &[RankingEntry] {
        match self {
            RankingSource::ServerSupplied(entries) => entries,
            RankingSource::LocalHeuristic => &[],
        }
    }
}

impl Default for RankingSource {
    fn default() -> Self {
        RankingSource::LocalHeuristic
    }
}
