use super::profile::{
    climate_effect, priority_bias, strategy_baseline, strategy_features, BUDGET_QUALITY_SPAN,
    DEFAULT_JITTER, ENERGY_CARBON_RELIEF,
};
use crate::config::scoring_profile::IndexWeights;
use crate::domain::constraint::ConstraintSet;
use crate::domain::design::Design;
use crate::domain::types::DesignStrategy;
use crate::engine::evaluator::{
    sanitize_percent, RawMetrics, SustainabilityEvaluator, BASE_COST_PER_SQFT,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

// ==========================================
// DesignGenerator - 方案生成器
// ==========================================
#[derive(Debug, Clone)]
pub struct DesignGenerator {
    evaluator: SustainabilityEvaluator,
    /// 能效/水效随机扰动幅度（0 表示完全确定）
    jitter: f64,
}

impl DesignGenerator {
    /// 构造函数
    ///
    /// # 参数
    /// - `weights`: 综合指数权重
    pub fn new(weights: IndexWeights) -> Self {
        Self {
            evaluator: SustainabilityEvaluator::new(weights),
            jitter: DEFAULT_JITTER,
        }
    }

    /// 设置扰动幅度（负数/NaN 视为 0）
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = if jitter.is_finite() && jitter > 0.0 {
            jitter
        } else {
            0.0
        };
        self
    }

    pub fn evaluator(&self) -> &SustainabilityEvaluator {
        &self.evaluator
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 生成一批候选方案
    ///
    /// 批次固定为 DesignStrategy::BATCH_ORDER 的顺序,id 为批次位置。
    ///
    /// 指标构成:
    /// 1) 能效/水效 = 策略基线 + 气候扰动 + 优先级偏置 + 预算品质 + 随机扰动
    /// 2) 碳足迹 = 面积 × 碳强度 × 气候系数 × 优先级系数 × (1 - 能效/200)
    /// 3) 造价 = 面积 × 基准单价 × 预算投入系数 × 策略/气候/优先级系数
    ///
    /// # 参数
    /// - `constraints`: 已校验约束集
    /// - `rng`: 随机源（由调用方注入）
    ///
    /// # 返回
    /// 非空方案列表
    pub fn generate<R: Rng + ?Sized>(&self, constraints: &ConstraintSet, rng: &mut R) -> Vec<Design> {
        let area = constraints.area();
        let climate = climate_effect(constraints.climate());
        let bias = priority_bias(constraints.priority());
        let budget_quality = (constraints.budget_ratio() - 0.5) * 2.0 * BUDGET_QUALITY_SPAN;
        let spend = SustainabilityEvaluator::spend_factor(constraints);

        let designs: Vec<Design> = DesignStrategy::BATCH_ORDER
            .iter()
            .map(|&strategy| {
                let base = strategy_baseline(strategy);

                let energy = base.energy_efficiency
                    + climate.energy_delta
                    + bias.energy_delta
                    + budget_quality
                    + self.draw(rng);
                let water = base.water_efficiency
                    + climate.water_delta
                    + bias.water_delta
                    + budget_quality
                    + self.draw(rng);

                let energy_relief = 1.0 - sanitize_percent(energy) / ENERGY_CARBON_RELIEF;
                let carbon = area
                    * base.carbon_intensity
                    * climate.carbon_multiplier
                    * bias.carbon_multiplier
                    * energy_relief;

                let cost = area
                    * BASE_COST_PER_SQFT
                    * spend
                    * base.cost_multiplier
                    * climate.cost_multiplier
                    * bias.cost_multiplier;

                let metrics = self.evaluator.build_metrics(RawMetrics {
                    energy_efficiency: energy,
                    water_efficiency: water,
                    carbon_footprint: carbon,
                    estimated_cost: cost,
                });

                let mut features: Vec<String> = strategy_features(strategy)
                    .iter()
                    .map(|s| s.to_string())
                    .collect();
                features.push(climate.feature.to_string());

                Design {
                    id: strategy.batch_index(),
                    name: strategy.title().to_string(),
                    strategy: Some(strategy),
                    features,
                    metrics,
                    ml_predicted_cost: None,
                }
            })
            .collect();

        debug!(
            area,
            budget = constraints.budget(),
            climate = %constraints.climate(),
            priority = %constraints.priority(),
            design_count = designs.len(),
            "候选方案生成完成"
        );

        designs
    }

    /// 以固定种子生成（可复现）
    pub fn generate_seeded(&self, constraints: &ConstraintSet, seed: u64) -> Vec<Design> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.generate(constraints, &mut rng)
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.jitter > 0.0 {
            rng.gen_range(-self.jitter..=self.jitter)
        } else {
            0.0
        }
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for DesignGenerator {
    fn default() -> Self {
        Self::new(IndexWeights::default())
    }
}
