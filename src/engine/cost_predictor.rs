// ==========================================
// 可持续设计方案引擎 - 造价预测
// ==========================================
// 职责: 从项目历史拟合线性造价模型,为每个方案给出预测造价
// 输入: 项目历史（约束 + 方案造价） / 新约束集 + 方案序号
// 输出: 预测造价、置信度、特征重要度
// 红线: 样本不足或拟合失败时回落确定性造价公式
// 红线: 预测值非负且取整
// ==========================================
// 特征: 截距, 面积(千平方英尺), 预算比例, 气候哑变量×3,
//       优先级哑变量×4, 方案序号哑变量×2
// 基准类别: Temperate / Energy / 序号 0
// ==========================================

use crate::domain::constraint::{ConstraintSet, BUDGET_MAX};
use crate::domain::project::ProjectRecord;
use crate::domain::types::{Climate, DesignStrategy, Priority};
use crate::engine::evaluator::{
    round_to, sanitize_non_negative, SustainabilityEvaluator, BASE_COST_PER_SQFT,
};
use crate::engine::generator::profile::{climate_effect, priority_bias, strategy_baseline};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// 拟合所需最少样本数（约 10 个项目）
pub const MIN_FIT_SAMPLES: usize = 30;

/// 岭回归系数（不作用于截距）
const RIDGE_LAMBDA: f64 = 1e-3;

/// 主元绝对值下限
const PIVOT_EPSILON: f64 = 1e-12;

/// 回落公式的置信度
const HEURISTIC_CONFIDENCE: f64 = 0.6;

const AREA_SCALE: f64 = 1000.0;
const FEATURE_COUNT: usize = 12;

// 重要度扫描: 基准点 + 面积/预算网格
const REFERENCE_AREA: f64 = 1000.0;
const REFERENCE_BUDGET: f64 = 50.0;
const AREA_GRID: [f64; 5] = [300.0, 725.0, 1150.0, 1575.0, 2000.0];
const BUDGET_GRID: [f64; 5] = [0.0, 25.0, 50.0, 75.0, 100.0];

// ==========================================
// PredictorModel - 预测模型类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorModel {
    /// 最小二乘线性回归（已拟合）
    LinearRegression,
    /// 确定性造价公式
    Heuristic,
}

impl PredictorModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictorModel::LinearRegression => "linear_regression",
            PredictorModel::Heuristic => "heuristic",
        }
    }
}

/// 单条训练样本
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostSample {
    pub constraints: ConstraintSet,
    pub design_index: u32,
    pub cost: f64,
}

/// 预测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostPrediction {
    pub predicted_cost: f64,
    /// 0~1
    pub confidence: f64,
    pub model: PredictorModel,
    /// 参与拟合的样本数
    pub samples: usize,
    /// area / budget / climate / priority / design → 占比（合计约为 1）
    pub feature_importance: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq)]
struct LinearModel {
    coefficients: [f64; FEATURE_COUNT],
    r_squared: f64,
}

// ==========================================
// CostPredictor - 造价预测器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CostPredictor {
    model: Option<LinearModel>,
    samples: usize,
}

impl CostPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> PredictorModel {
        match self.model {
            Some(_) => PredictorModel::LinearRegression,
            None => PredictorModel::Heuristic,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples
    }

    /// 拟合优度 R²（回落公式时为固定值）
    pub fn confidence(&self) -> f64 {
        match &self.model {
            Some(m) => round_to(m.r_squared.clamp(0.0, 1.0), 2),
            None => HEURISTIC_CONFIDENCE,
        }
    }

    /// 从项目历史拟合（覆盖已有模型）
    pub fn fit(&mut self, records: &[ProjectRecord]) {
        let samples = samples_from_records(records);
        self.fit_samples(&samples);
    }

    /// 从样本拟合
    ///
    /// 样本数 < MIN_FIT_SAMPLES 或法方程奇异时保持回落公式
    pub fn fit_samples(&mut self, samples: &[CostSample]) {
        self.samples = samples.len();
        self.model = None;

        if samples.len() < MIN_FIT_SAMPLES {
            debug!(
                samples = samples.len(),
                min = MIN_FIT_SAMPLES,
                "造价样本不足，使用公式估算"
            );
            return;
        }

        let mut xtx = [[0.0f64; FEATURE_COUNT]; FEATURE_COUNT];
        let mut xty = [0.0f64; FEATURE_COUNT];
        for sample in samples {
            let x = features(&sample.constraints, sample.design_index);
            for i in 0..FEATURE_COUNT {
                for j in 0..FEATURE_COUNT {
                    xtx[i][j] += x[i] * x[j];
                }
                xty[i] += x[i] * sample.cost;
            }
        }
        for (i, row) in xtx.iter_mut().enumerate().skip(1) {
            row[i] += RIDGE_LAMBDA;
        }

        let coefficients = match solve(xtx, xty) {
            Some(c) => c,
            None => {
                warn!(samples = samples.len(), "造价模型法方程奇异，使用公式估算");
                return;
            }
        };

        let r_squared = r_squared(&coefficients, samples);
        debug!(samples = samples.len(), r_squared, "造价模型拟合完成");
        self.model = Some(LinearModel {
            coefficients,
            r_squared,
        });
    }

    /// 预测造价（非负,取整）
    pub fn predict(&self, constraints: &ConstraintSet, design_index: u32) -> f64 {
        sanitize_non_negative(self.estimate(constraints, design_index)).round()
    }

    /// 预测造价并附带模型信息与特征重要度
    pub fn predict_with_details(
        &self,
        constraints: &ConstraintSet,
        design_index: u32,
    ) -> CostPrediction {
        CostPrediction {
            predicted_cost: self.predict(constraints, design_index),
            confidence: self.confidence(),
            model: self.model(),
            samples: self.samples,
            feature_importance: self.feature_importance(),
        }
    }

    /// 特征重要度
    ///
    /// 每组特征在取值网格上扫描（其余特征固定为基准点）,
    /// 以预测值的极差归一化,保留 3 位小数
    pub fn feature_importance(&self) -> BTreeMap<String, f64> {
        let reference = match ConstraintSet::new(
            REFERENCE_AREA,
            REFERENCE_BUDGET,
            Climate::Temperate,
            Priority::Balanced,
        ) {
            Ok(c) => c,
            Err(_) => return BTreeMap::new(),
        };

        let area = spread(AREA_GRID.iter().filter_map(|&a| {
            ConstraintSet::new(a, reference.budget(), reference.climate(), reference.priority())
                .ok()
                .map(|c| self.estimate(&c, 0))
        }));
        let budget = spread(BUDGET_GRID.iter().filter_map(|&b| {
            ConstraintSet::new(reference.area(), b, reference.climate(), reference.priority())
                .ok()
                .map(|c| self.estimate(&c, 0))
        }));
        let climate = spread(Climate::ALL.iter().filter_map(|&cl| {
            ConstraintSet::new(reference.area(), reference.budget(), cl, reference.priority())
                .ok()
                .map(|c| self.estimate(&c, 0))
        }));
        let priority = spread(
            Priority::ALL
                .iter()
                .map(|&p| self.estimate(&reference.with_priority(p), 0)),
        );
        let design = spread(
            DesignStrategy::BATCH_ORDER
                .iter()
                .map(|s| self.estimate(&reference, s.batch_index())),
        );

        let groups = [
            ("area", area),
            ("budget", budget),
            ("climate", climate),
            ("priority", priority),
            ("design", design),
        ];
        let total: f64 = groups.iter().map(|(_, v)| v).sum();

        groups
            .iter()
            .map(|&(name, value)| {
                let share = if total.is_finite() && total > 0.0 {
                    value / total
                } else {
                    1.0 / groups.len() as f64
                };
                (name.to_string(), round_to(share, 3))
            })
            .collect()
    }

    fn estimate(&self, constraints: &ConstraintSet, design_index: u32) -> f64 {
        match &self.model {
            Some(m) => features(constraints, design_index)
                .iter()
                .zip(m.coefficients.iter())
                .map(|(x, b)| x * b)
                .sum(),
            None => heuristic_cost(constraints, design_index),
        }
    }
}

/// 确定性造价公式（与方案生成器一致）
///
/// 序号超出批次时按第一个策略计算
pub fn heuristic_cost(constraints: &ConstraintSet, design_index: u32) -> f64 {
    let strategy =
        DesignStrategy::from_batch_index(design_index).unwrap_or(DesignStrategy::BATCH_ORDER[0]);
    let base = strategy_baseline(strategy);
    let climate = climate_effect(constraints.climate());
    let bias = priority_bias(constraints.priority());

    constraints.area()
        * BASE_COST_PER_SQFT
        * SustainabilityEvaluator::spend_factor(constraints)
        * base.cost_multiplier
        * climate.cost_multiplier
        * bias.cost_multiplier
}

/// 项目历史 → 训练样本
///
/// 序号取方案策略（缺失时取 id）;序号超出批次或造价无效的方案被忽略
pub fn samples_from_records(records: &[ProjectRecord]) -> Vec<CostSample> {
    let batch_len = DesignStrategy::BATCH_ORDER.len() as u32;
    records
        .iter()
        .flat_map(|record| {
            record.designs.iter().filter_map(move |design| {
                let design_index = design
                    .strategy
                    .map(|s| s.batch_index())
                    .unwrap_or(design.id);
                let cost = design.metrics.estimated_cost;
                if design_index >= batch_len || !cost.is_finite() || cost < 0.0 {
                    return None;
                }
                Some(CostSample {
                    constraints: record.constraints,
                    design_index,
                    cost,
                })
            })
        })
        .collect()
}

fn features(constraints: &ConstraintSet, design_index: u32) -> [f64; FEATURE_COUNT] {
    let mut x = [0.0; FEATURE_COUNT];
    x[0] = 1.0;
    x[1] = constraints.area() / AREA_SCALE;
    x[2] = constraints.budget() / BUDGET_MAX;

    match constraints.climate() {
        Climate::Temperate => {}
        Climate::HotArid => x[3] = 1.0,
        Climate::Cold => x[4] = 1.0,
        Climate::Humid => x[5] = 1.0,
    }
    match constraints.priority() {
        Priority::Energy => {}
        Priority::Water => x[6] = 1.0,
        Priority::Carbon => x[7] = 1.0,
        Priority::Cost => x[8] = 1.0,
        Priority::Balanced => x[9] = 1.0,
    }
    match design_index {
        1 => x[10] = 1.0,
        2 => x[11] = 1.0,
        _ => {}
    }
    x
}

/// 高斯消元（部分主元）
fn solve(
    mut a: [[f64; FEATURE_COUNT]; FEATURE_COUNT],
    mut b: [f64; FEATURE_COUNT],
) -> Option<[f64; FEATURE_COUNT]> {
    for col in 0..FEATURE_COUNT {
        let pivot = (col..FEATURE_COUNT).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(Ordering::Equal)
        })?;
        // NaN 也视为奇异
        if !(a[pivot][col].abs() > PIVOT_EPSILON) {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        let pivot_row = a[col];
        let pivot_rhs = b[col];
        for row in (col + 1)..FEATURE_COUNT {
            let factor = a[row][col] / pivot_row[col];
            if factor == 0.0 {
                continue;
            }
            for k in col..FEATURE_COUNT {
                a[row][k] -= factor * pivot_row[k];
            }
            b[row] -= factor * pivot_rhs;
        }
    }

    let mut x = [0.0; FEATURE_COUNT];
    for row in (0..FEATURE_COUNT).rev() {
        let mut sum = b[row];
        for k in (row + 1)..FEATURE_COUNT {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }

    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

fn r_squared(coefficients: &[f64; FEATURE_COUNT], samples: &[CostSample]) -> f64 {
    let n = samples.len() as f64;
    let mean = samples.iter().map(|s| s.cost).sum::<f64>() / n;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for sample in samples {
        let fitted: f64 = features(&sample.constraints, sample.design_index)
            .iter()
            .zip(coefficients.iter())
            .map(|(x, b)| x * b)
            .sum();
        ss_res += (sample.cost - fitted).powi(2);
        ss_tot += (sample.cost - mean).powi(2);
    }

    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        1.0
    }
}

fn spread(values: impl Iterator<Item = f64>) -> f64 {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if max >= min {
        max - min
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::design::Design;
    use crate::engine::generator::DesignGenerator;
    use chrono::NaiveDate;

    fn constraints(area: f64, budget: f64, climate: Climate, priority: Priority) -> ConstraintSet {
        ConstraintSet::new(area, budget, climate, priority).unwrap()
    }

    /// 已知线性关系
    fn linear_cost(c: &ConstraintSet, design_index: u32) -> f64 {
        let climate = match c.climate() {
            Climate::Temperate => 0.0,
            Climate::HotArid => 9_000.0,
            Climate::Cold => 15_000.0,
            Climate::Humid => 4_000.0,
        };
        let priority = match c.priority() {
            Priority::Energy => 0.0,
            Priority::Water => 2_500.0,
            Priority::Carbon => -3_000.0,
            Priority::Cost => -20_000.0,
            Priority::Balanced => 1_000.0,
        };
        let design = [0.0, -12_000.0, 18_000.0][design_index as usize];
        20_000.0 + 190.0 * c.area() + 600.0 * c.budget() + climate + priority + design
    }

    fn linear_samples() -> Vec<CostSample> {
        let mut samples = Vec::new();
        for area in [400.0, 800.0, 1200.0, 1600.0, 2000.0] {
            for budget in [10.0, 40.0, 70.0, 100.0] {
                for climate in Climate::ALL {
                    for priority in Priority::ALL {
                        for design_index in 0..3 {
                            let c = constraints(area, budget, climate, priority);
                            samples.push(CostSample {
                                constraints: c,
                                design_index,
                                cost: linear_cost(&c, design_index),
                            });
                        }
                    }
                }
            }
        }
        samples
    }

    fn generated_record(project_id: i64, c: ConstraintSet) -> ProjectRecord {
        let mut designs = DesignGenerator::default().generate_seeded(&c, 1);
        // 外部服务返回的越界序号方案
        designs.push(Design::new(7, "External", designs[0].metrics));
        ProjectRecord {
            project_id,
            user_id: None,
            constraints: c,
            designs,
            ml_rankings: None,
            best_design_id: Some(0),
            recommendation: None,
            config_snapshot: None,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_fit_recovers_linear_relation() {
        let mut predictor = CostPredictor::new();
        predictor.fit_samples(&linear_samples());

        assert!(predictor.is_fitted());
        assert_eq!(predictor.model(), PredictorModel::LinearRegression);
        assert_eq!(predictor.sample_count(), 1200);
        assert!(predictor.confidence() >= 0.99);

        for (c, idx) in [
            (constraints(1000.0, 55.0, Climate::Cold, Priority::Cost), 1),
            (constraints(650.0, 5.0, Climate::HotArid, Priority::Water), 2),
            (constraints(1800.0, 90.0, Climate::Temperate, Priority::Energy), 0),
        ] {
            let expected = linear_cost(&c, idx);
            let predicted = predictor.predict(&c, idx);
            assert!(
                (predicted - expected).abs() / expected < 1e-3,
                "predicted={} expected={}",
                predicted,
                expected
            );
            assert_eq!(predicted, predicted.round());
        }
    }

    #[test]
    fn test_too_few_samples_keeps_formula() {
        let samples: Vec<CostSample> = linear_samples().into_iter().take(MIN_FIT_SAMPLES - 1).collect();
        let mut predictor = CostPredictor::new();
        predictor.fit_samples(&samples);

        assert!(!predictor.is_fitted());
        assert_eq!(predictor.model(), PredictorModel::Heuristic);
        assert_eq!(predictor.sample_count(), MIN_FIT_SAMPLES - 1);
        assert_eq!(predictor.confidence(), HEURISTIC_CONFIDENCE);

        let c = constraints(1200.0, 60.0, Climate::Humid, Priority::Balanced);
        assert_eq!(predictor.predict(&c, 2), heuristic_cost(&c, 2).round());
    }

    #[test]
    fn test_formula_matches_generated_cost() {
        let predictor = CostPredictor::new();
        let generator = DesignGenerator::default().with_jitter(0.0);

        for climate in Climate::ALL {
            for priority in Priority::ALL {
                let c = constraints(1350.0, 35.0, climate, priority);
                for design in generator.generate_seeded(&c, 1) {
                    assert_eq!(predictor.predict(&c, design.id), design.metrics.estimated_cost);
                }
            }
        }
    }

    #[test]
    fn test_fit_from_project_history() {
        let mut records = Vec::new();
        let mut id = 0;
        for area in [500.0, 1000.0, 1500.0, 2000.0] {
            for (climate, priority) in [
                (Climate::Temperate, Priority::Energy),
                (Climate::Cold, Priority::Cost),
                (Climate::HotArid, Priority::Water),
            ] {
                id += 1;
                records.push(generated_record(id, constraints(area, 50.0, climate, priority)));
            }
        }
        assert_eq!(samples_from_records(&records).len(), 36);

        let mut predictor = CostPredictor::new();
        predictor.fit(&records);
        assert!(predictor.is_fitted());
        assert_eq!(predictor.sample_count(), 36);

        let c = constraints(1200.0, 50.0, Climate::Humid, Priority::Carbon);
        let prediction = predictor.predict_with_details(&c, 1);
        assert!(prediction.predicted_cost >= 0.0);
        assert!((0.0..=1.0).contains(&prediction.confidence));
        assert_eq!(prediction.model, PredictorModel::LinearRegression);
    }

    #[test]
    fn test_feature_importance_is_normalized() {
        let importance = CostPredictor::new().feature_importance();

        assert_eq!(importance.len(), 5);
        let total: f64 = importance.values().sum();
        assert!((total - 1.0).abs() < 0.01, "total={}", total);

        let top = importance
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(k, _)| k.as_str());
        assert_eq!(top, Some("area"));
    }
}
