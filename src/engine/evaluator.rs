// ==========================================
// 可持续设计方案引擎 - 可持续性评估器
// ==========================================
// 职责: 综合指数计算、指标包构造、造价模型、规则排名
// 红线: 指数对能效/水效单调不减,对碳足迹单调不增
// 红线: 所有输出指标必须落在边界内
// ==========================================

use crate::config::scoring_profile::IndexWeights;
use crate::domain::constraint::ConstraintSet;
use crate::domain::design::{Design, DesignId, MetricsBundle};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 基准单价（货币单位 / 平方英尺）
pub const BASE_COST_PER_SQFT: f64 = 180.0;

/// 隐含最高预算单价（budget=100% 时的可用额度）
pub const MAX_COST_PER_SQFT: f64 = 320.0;

// ==========================================
// RawMetrics - 未经边界处理的指标
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawMetrics {
    pub energy_efficiency: f64,
    pub water_efficiency: f64,
    pub carbon_footprint: f64,
    pub estimated_cost: f64,
}

// ==========================================
// 评估结果
// ==========================================

/// 单方案评估结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignEvaluation {
    pub design_id: DesignId,
    pub metrics: MetricsBundle,
    /// 预算额度 = 面积 × 最高单价 × 预算比例
    pub budget_allowance: f64,
    /// 造价 / 额度（额度为 0 时为 None）
    pub budget_utilization: Option<f64>,
    pub within_budget: bool,
    /// 重新计算的指数与原值是否一致
    pub index_consistent: bool,
}

/// 规则排名条目（按可持续指数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBasedRank {
    pub rank: usize,
    pub id: DesignId,
    pub name: String,
    pub sustainability_index: f64,
}

// ==========================================
// SustainabilityEvaluator - 可持续性评估器
// ==========================================
#[derive(Debug, Clone)]
pub struct SustainabilityEvaluator {
    weights: IndexWeights,
}

impl SustainabilityEvaluator {
    pub fn new(weights: IndexWeights) -> Self {
        Self {
            weights: weights.sanitized(),
        }
    }

    pub fn weights(&self) -> &IndexWeights {
        &self.weights
    }

    // ==========================================
    // 指数计算
    // ==========================================

    /// 碳评分 0~100（碳足迹越低分越高）
    pub fn carbon_score(&self, carbon_footprint: f64) -> f64 {
        let carbon = sanitize_non_negative(carbon_footprint);
        let reference = self.weights.carbon_reference_t;
        100.0 * reference / (reference + carbon)
    }

    /// 综合可持续指数 0~100（保留 1 位小数）
    ///
    /// 加权平均: (wE·E + wW·W + wC·C) / (wE + wW + wC)
    pub fn sustainability_index(
        &self,
        energy_efficiency: f64,
        water_efficiency: f64,
        carbon_footprint: f64,
    ) -> f64 {
        let w = &self.weights;
        let energy = sanitize_percent(energy_efficiency);
        let water = sanitize_percent(water_efficiency);
        let carbon = self.carbon_score(carbon_footprint);

        let total_weight = w.energy + w.water + w.carbon;
        let index = (w.energy * energy + w.water * water + w.carbon * carbon) / total_weight;

        round_to(index.clamp(0.0, 100.0), 1)
    }

    /// 由原始指标构造指标包
    ///
    /// 边界处理: 百分比钳制到 [0,100]；碳足迹/造价钳制为非负；NaN 视为 0
    pub fn build_metrics(&self, raw: RawMetrics) -> MetricsBundle {
        let energy = round_to(sanitize_percent(raw.energy_efficiency), 1);
        let water = round_to(sanitize_percent(raw.water_efficiency), 1);
        let carbon = round_to(sanitize_non_negative(raw.carbon_footprint), 1);
        let cost = sanitize_non_negative(raw.estimated_cost).round();

        MetricsBundle {
            energy_efficiency: energy,
            water_efficiency: water,
            carbon_footprint: carbon,
            sustainability_index: self.sustainability_index(energy, water, carbon),
            estimated_cost: cost,
        }
    }

    // ==========================================
    // 造价模型
    // ==========================================

    /// 预算投入系数（budget=0 → 0.6, budget=100 → 1.4）
    pub fn spend_factor(constraints: &ConstraintSet) -> f64 {
        0.6 + 0.8 * constraints.budget_ratio()
    }

    /// 预算额度
    pub fn budget_allowance(constraints: &ConstraintSet) -> f64 {
        constraints.area() * MAX_COST_PER_SQFT * constraints.budget_ratio()
    }

    // ==========================================
    // 单方案评估
    // ==========================================

    /// 评估一个（可能来自外部的）设计方案
    ///
    /// 重新计算可持续指数,并给出预算占用情况
    pub fn evaluate_design(&self, design: &Design, constraints: &ConstraintSet) -> DesignEvaluation {
        let m = design.metrics;
        let metrics = self.build_metrics(RawMetrics {
            energy_efficiency: m.energy_efficiency,
            water_efficiency: m.water_efficiency,
            carbon_footprint: m.carbon_footprint,
            estimated_cost: m.estimated_cost,
        });

        let allowance = Self::budget_allowance(constraints).round();
        let utilization = if allowance > 0.0 {
            Some(round_to(metrics.estimated_cost / allowance, 3))
        } else {
            None
        };

        DesignEvaluation {
            design_id: design.id,
            index_consistent: (metrics.sustainability_index - m.sustainability_index).abs() < 0.05,
            within_budget: metrics.estimated_cost <= allowance,
            budget_allowance: allowance,
            budget_utilization: utilization,
            metrics,
        }
    }

    // ==========================================
    // 规则排名
    // ==========================================

    /// 按可持续指数降序排名（同分保持批次顺序）
    pub fn rank_designs(&self, designs: &[Design]) -> Vec<RuleBasedRank> {
        let mut ordered: Vec<&Design> = designs.iter().collect();
        // sort_by 为稳定排序
        ordered.sort_by(|a, b| {
            b.metrics
                .sustainability_index
                .partial_cmp(&a.metrics.sustainability_index)
                .unwrap_or(Ordering::Equal)
        });

        ordered
            .into_iter()
            .enumerate()
            .map(|(i, d)| RuleBasedRank {
                rank: i + 1,
                id: d.id,
                name: d.name.clone(),
                sustainability_index: d.metrics.sustainability_index,
            })
            .collect()
    }
}

impl Default for SustainabilityEvaluator {
    fn default() -> Self {
        Self::new(IndexWeights::default())
    }
}

// ==========================================
// 数值工具
// ==========================================

pub(crate) fn sanitize_percent(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 100.0)
    }
}

pub(crate) fn sanitize_non_negative(v: f64) -> f64 {
    if v.is_nan() || v < 0.0 {
        0.0
    } else if v.is_infinite() {
        f64::MAX
    } else {
        v
    }
}

pub(crate) fn round_to(v: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (v * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Climate, Priority};

    fn evaluator() -> SustainabilityEvaluator {
        SustainabilityEvaluator::default()
    }

    #[test]
    fn test_index_monotonic_in_each_metric() {
        let e = evaluator();
        let base = e.sustainability_index(60.0, 60.0, 30.0);

        assert!(e.sustainability_index(70.0, 60.0, 30.0) >= base);
        assert!(e.sustainability_index(60.0, 70.0, 30.0) >= base);
        assert!(e.sustainability_index(60.0, 60.0, 45.0) <= base);

        // 细粒度扫描
        let mut prev = e.sustainability_index(0.0, 50.0, 20.0);
        for step in 1..=100 {
            let next = e.sustainability_index(step as f64, 50.0, 20.0);
            assert!(next >= prev);
            prev = next;
        }
        let mut prev = e.sustainability_index(50.0, 50.0, 0.0);
        for step in 1..=200 {
            let next = e.sustainability_index(50.0, 50.0, step as f64);
            assert!(next <= prev);
            prev = next;
        }
    }

    #[test]
    fn test_index_bounds() {
        let e = evaluator();
        assert_eq!(e.sustainability_index(100.0, 100.0, 0.0), 100.0);
        let low = e.sustainability_index(0.0, 0.0, 1.0e12);
        assert!((0.0..1.0).contains(&low));
        assert!(e.sustainability_index(f64::NAN, 50.0, f64::NAN) >= 0.0);
    }

    #[test]
    fn test_build_metrics_clamps_and_rounds() {
        let m = evaluator().build_metrics(RawMetrics {
            energy_efficiency: 104.26,
            water_efficiency: -3.0,
            carbon_footprint: f64::NAN,
            estimated_cost: 1234.56,
        });
        assert_eq!(m.energy_efficiency, 100.0);
        assert_eq!(m.water_efficiency, 0.0);
        assert_eq!(m.carbon_footprint, 0.0);
        assert_eq!(m.estimated_cost, 1235.0);
        assert!(m.check_bounds().is_ok());
    }

    #[test]
    fn test_evaluate_design_budget_fit() {
        let e = evaluator();
        let constraints = ConstraintSet::new(1000.0, 50.0, Climate::Temperate, Priority::Energy).unwrap();
        let metrics = e.build_metrics(RawMetrics {
            energy_efficiency: 70.0,
            water_efficiency: 60.0,
            carbon_footprint: 20.0,
            estimated_cost: 150_000.0,
        });
        let design = Design::new(0, "A", metrics);

        let eval = e.evaluate_design(&design, &constraints);
        assert_eq!(eval.budget_allowance, 160_000.0);
        assert!(eval.within_budget);
        assert!(eval.index_consistent);
        assert_eq!(eval.budget_utilization, Some(0.938));

        let zero_budget = ConstraintSet::new(1000.0, 0.0, Climate::Temperate, Priority::Energy).unwrap();
        let eval = e.evaluate_design(&design, &zero_budget);
        assert_eq!(eval.budget_utilization, None);
        assert!(!eval.within_budget);
    }

    #[test]
    fn test_rank_designs_stable_on_ties() {
        let e = evaluator();
        let mk = |id: u32, index: f64| {
            Design::new(
                id,
                format!("D{}", id),
                MetricsBundle {
                    energy_efficiency: 50.0,
                    water_efficiency: 50.0,
                    carbon_footprint: 10.0,
                    sustainability_index: index,
                    estimated_cost: 1.0,
                },
            )
        };
        let ranks = e.rank_designs(&[mk(0, 70.0), mk(1, 90.0), mk(2, 70.0)]);
        let ids: Vec<u32> = ranks.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 0, 2]);
        assert_eq!(ranks[0].rank, 1);
        assert_eq!(ranks[2].rank, 3);
    }
}
