// ==========================================
// 可持续设计方案引擎 - 历史相似推荐
// ==========================================
// 职责: 按历史项目相似度投票,推荐设计策略
// 输入: 已保存的项目历史 + 新约束集
// 输出: Recommendation（策略/置信度/参与投票数）
// 红线: 无历史时明确返回空推荐,置信度为 0
// ==========================================

use crate::domain::constraint::{ConstraintSet, BUDGET_MAX};
use crate::domain::project::{ProjectRecord, Recommendation};
use crate::domain::types::{Climate, DesignStrategy, Priority};
use crate::engine::evaluator::round_to;
use std::cmp::Ordering;

/// 默认近邻数量
pub const DEFAULT_NEIGHBOURS: usize = 3;

/// 面积差异归一化跨度（平方英尺）
const AREA_SPAN: f64 = 2000.0;

/// 气候/优先级不一致时的距离惩罚
const CLIMATE_MISMATCH: f64 = 0.5;
const PRIORITY_MISMATCH: f64 = 0.5;

/// 单条历史样本
#[derive(Debug, Clone, Copy, PartialEq)]
struct HistoryPoint {
    area: f64,
    budget: f64,
    climate: Climate,
    priority: Priority,
    strategy: DesignStrategy,
}

// ==========================================
// HistoricalRecommender - 历史相似推荐器
// ==========================================
#[derive(Debug, Clone)]
pub struct HistoricalRecommender {
    k: usize,
    history: Vec<HistoryPoint>,
}

impl HistoricalRecommender {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            history: Vec::new(),
        }
    }

    /// 已学习的样本数
    pub fn sample_count(&self) -> usize {
        self.history.len()
    }

    /// 从项目历史学习（覆盖已有样本）
    ///
    /// 没有可判定最优策略的项目被忽略
    pub fn learn(&mut self, records: &[ProjectRecord]) {
        self.history = records
            .iter()
            .filter_map(|record| {
                let strategy = record.best_strategy()?;
                let c = &record.constraints;
                Some(HistoryPoint {
                    area: c.area(),
                    budget: c.budget(),
                    climate: c.climate(),
                    priority: c.priority(),
                    strategy,
                })
            })
            .collect();

        tracing::debug!(
            records = records.len(),
            samples = self.history.len(),
            "历史推荐样本已加载"
        );
    }

    /// 为新约束推荐策略
    ///
    /// 取最相似的 k 个历史项目,按相似度加权投票;
    /// 票数相同按批次顺序取靠前策略
    pub fn recommend(&self, constraints: &ConstraintSet) -> Recommendation {
        if self.history.is_empty() {
            return Recommendation::none("暂无历史项目,无法给出推荐");
        }

        let mut scored: Vec<(f64, &HistoryPoint)> = self
            .history
            .iter()
            .map(|p| (similarity(p, constraints), p))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.truncate(self.k);

        let mut votes = [0.0f64; 3];
        for (sim, point) in &scored {
            votes[point.strategy.batch_index() as usize] += sim;
        }
        let total: f64 = votes.iter().sum();

        let mut winner = DesignStrategy::BATCH_ORDER[0];
        for strategy in DesignStrategy::BATCH_ORDER {
            if votes[strategy.batch_index() as usize] > votes[winner.batch_index() as usize] {
                winner = strategy;
            }
        }

        let confidence = if total > 0.0 {
            round_to(votes[winner.batch_index() as usize] / total, 3)
        } else {
            0.0
        };

        Recommendation {
            strategy: Some(winner),
            design_id: Some(winner.batch_index()),
            confidence,
            neighbours: scored.len(),
            reason: format!(
                "{} 个相似历史项目中,{} 得票最高",
                scored.len(),
                winner.title()
            ),
        }
    }
}

impl Default for HistoricalRecommender {
    fn default() -> Self {
        Self::new(DEFAULT_NEIGHBOURS)
    }
}

/// 相似度 (0, 1]
fn similarity(point: &HistoryPoint, constraints: &ConstraintSet) -> f64 {
    let mut distance = (point.area - constraints.area()).abs() / AREA_SPAN
        + (point.budget - constraints.budget()).abs() / BUDGET_MAX;
    if point.climate != constraints.climate() {
        distance += CLIMATE_MISMATCH;
    }
    if point.priority != constraints.priority() {
        distance += PRIORITY_MISMATCH;
    }
    1.0 / (1.0 + distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::design::{Design, MetricsBundle};
    use chrono::NaiveDate;

    fn record(area: f64, climate: Climate, priority: Priority, best: DesignStrategy) -> ProjectRecord {
        let metrics = MetricsBundle {
            energy_efficiency: 60.0,
            water_efficiency: 60.0,
            carbon_footprint: 10.0,
            sustainability_index: 60.0,
            estimated_cost: 1.0,
        };
        ProjectRecord {
            project_id: 1,
            user_id: None,
            constraints: ConstraintSet::new(area, 50.0, climate, priority).unwrap(),
            designs: DesignStrategy::BATCH_ORDER
                .iter()
                .map(|s| Design::new(s.batch_index(), s.title(), metrics))
                .collect(),
            ml_rankings: None,
            best_design_id: Some(best.batch_index()),
            recommendation: None,
            config_snapshot: None,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_no_history_returns_empty_recommendation() {
        let rec = HistoricalRecommender::default().recommend(
            &ConstraintSet::new(1000.0, 50.0, Climate::Cold, Priority::Energy).unwrap(),
        );
        assert_eq!(rec.strategy, None);
        assert_eq!(rec.design_id, None);
        assert_eq!(rec.confidence, 0.0);
        assert_eq!(rec.neighbours, 0);
    }

    #[test]
    fn test_similar_projects_dominate_vote() {
        let mut recommender = HistoricalRecommender::default();
        recommender.learn(&[
            record(1000.0, Climate::HotArid, Priority::Water, DesignStrategy::Regenerative),
            record(1100.0, Climate::HotArid, Priority::Water, DesignStrategy::Regenerative),
            record(900.0, Climate::HotArid, Priority::Water, DesignStrategy::EcoEfficient),
            record(1000.0, Climate::Cold, Priority::Energy, DesignStrategy::EcoEfficient),
            record(1000.0, Climate::Cold, Priority::Energy, DesignStrategy::EcoEfficient),
        ]);
        assert_eq!(recommender.sample_count(), 5);

        let rec = recommender.recommend(
            &ConstraintSet::new(1000.0, 50.0, Climate::HotArid, Priority::Water).unwrap(),
        );
        assert_eq!(rec.strategy, Some(DesignStrategy::Regenerative));
        assert_eq!(rec.design_id, Some(2));
        assert_eq!(rec.neighbours, 3);
        assert!(rec.confidence > 0.5 && rec.confidence < 1.0);

        let rec = recommender.recommend(
            &ConstraintSet::new(1000.0, 50.0, Climate::Cold, Priority::Energy).unwrap(),
        );
        assert_eq!(rec.strategy, Some(DesignStrategy::EcoEfficient));
    }

    #[test]
    fn test_records_without_best_design_are_skipped() {
        let mut r = record(1000.0, Climate::Humid, Priority::Cost, DesignStrategy::CarbonOptimized);
        r.best_design_id = None;

        let mut recommender = HistoricalRecommender::default();
        recommender.learn(&[r]);
        assert_eq!(recommender.sample_count(), 0);
    }
}
