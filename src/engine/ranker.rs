// ==========================================
// 可持续设计方案引擎 - 优先级加权排名器
// ==========================================
// 职责: 生成服务附带的 ml_rankings（按优先级加权打分）
// 输入: 一批方案 + 约束集
// 输出: 按得分降序的 RankingEntry 列表
// ==========================================
// 注: 能效/水效取绝对值;碳足迹/造价以批次最优值为 100 做相对评分
// ==========================================

use crate::config::scoring_profile::RankerWeightTable;
use crate::domain::constraint::ConstraintSet;
use crate::domain::design::{Design, RankingEntry};
use crate::engine::evaluator::{round_to, sanitize_percent};
use std::cmp::Ordering;

// ==========================================
// DesignRanker - 排名器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct DesignRanker {
    table: RankerWeightTable,
}

impl DesignRanker {
    pub fn new(table: RankerWeightTable) -> Self {
        Self { table }
    }

    /// 对一批方案打分并排序
    ///
    /// # 返回
    /// 按 ml_score 降序（同分保持批次顺序）的排名列表,得分 0~100 保留 2 位小数
    pub fn rank(&self, designs: &[Design], constraints: &ConstraintSet) -> Vec<RankingEntry> {
        if designs.is_empty() {
            return Vec::new();
        }

        let w = self.table.for_priority(constraints.priority());
        let total = w.energy + w.water + w.carbon + w.cost;

        let best_carbon = designs
            .iter()
            .map(|d| d.metrics.carbon_footprint.max(0.0))
            .fold(f64::INFINITY, f64::min);
        let best_cost = designs
            .iter()
            .map(|d| d.metrics.estimated_cost.max(0.0))
            .fold(f64::INFINITY, f64::min);

        let mut entries: Vec<RankingEntry> = designs
            .iter()
            .map(|d| {
                let m = &d.metrics;
                let energy = sanitize_percent(m.energy_efficiency);
                let water = sanitize_percent(m.water_efficiency);
                let carbon = relative_score(best_carbon, m.carbon_footprint);
                let cost = relative_score(best_cost, m.estimated_cost);

                let score =
                    (w.energy * energy + w.water * water + w.carbon * carbon + w.cost * cost) / total;

                RankingEntry {
                    id: d.id,
                    ml_score: round_to(score.clamp(0.0, 100.0), 2),
                }
            })
            .collect();

        entries.sort_by(|a, b| b.ml_score.partial_cmp(&a.ml_score).unwrap_or(Ordering::Equal));

        tracing::debug!(
            priority = %constraints.priority(),
            ranked = entries.len(),
            top_id = entries.first().map(|e| e.id),
            "优先级加权排名完成"
        );

        entries
    }
}

/// 越低越好的指标:批次最优值记 100,其余按比例
fn relative_score(best: f64, value: f64) -> f64 {
    let value = if value.is_finite() { value.max(0.0) } else { return 0.0 };
    if value <= 0.0 {
        return 100.0;
    }
    if !best.is_finite() {
        return 0.0;
    }
    100.0 * best / value
}
