use crate::domain::types::Priority;
use serde::{Deserialize, Serialize};

/// 综合可持续指数权重（持久化于 config_kv: index_weights）
///
/// index = (energy·E + water·W + carbon·C) / (energy + water + carbon)
/// 其中 C = 100 · ref / (ref + carbonFootprint)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexWeights {
    #[serde(default = "default_energy_weight")]
    pub energy: f64,

    #[serde(default = "default_water_weight")]
    pub water: f64,

    #[serde(default = "default_carbon_weight")]
    pub carbon: f64,

    /// 碳评分参考值（吨 CO2e）：碳足迹等于该值时碳评分为 50
    #[serde(default = "default_carbon_reference_t")]
    pub carbon_reference_t: f64,
}

fn default_energy_weight() -> f64 {
    0.40
}

fn default_water_weight() -> f64 {
    0.35
}

fn default_carbon_weight() -> f64 {
    0.25
}

fn default_carbon_reference_t() -> f64 {
    40.0
}

impl Default for IndexWeights {
    fn default() -> Self {
        Self {
            energy: default_energy_weight(),
            water: default_water_weight(),
            carbon: default_carbon_weight(),
            carbon_reference_t: default_carbon_reference_t(),
        }
    }
}

impl IndexWeights {
    /// 返回可用的权重（负数/非有限值/全零时回落默认值）
    ///
    /// 负权重会破坏指数对三项指标的单调性
    pub fn sanitized(self) -> Self {
        let weights = [self.energy, self.water, self.carbon];
        let valid = weights.iter().all(|w| w.is_finite() && *w >= 0.0)
            && weights.iter().sum::<f64>() > 0.0
            && self.carbon_reference_t.is_finite()
            && self.carbon_reference_t > 0.0;

        if valid {
            self
        } else {
            tracing::warn!(?self, "index_weights 配置无效，使用默认权重");
            Self::default()
        }
    }
}

/// 排名器权重（单一优先级）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankerWeights {
    pub energy: f64,
    pub water: f64,
    pub carbon: f64,
    pub cost: f64,
}

impl RankerWeights {
    pub const fn new(energy: f64, water: f64, carbon: f64, cost: f64) -> Self {
        Self {
            energy,
            water,
            carbon,
            cost,
        }
    }

    fn is_usable(&self) -> bool {
        let ws = [self.energy, self.water, self.carbon, self.cost];
        ws.iter().all(|w| w.is_finite() && *w >= 0.0) && ws.iter().sum::<f64>() > 0.0
    }
}

/// 排名器权重表（持久化于 config_kv: ranker_weights）
///
/// 未配置的优先级使用内置默认值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankerWeightTable {
    #[serde(default)]
    pub energy: Option<RankerWeights>,
    #[serde(default)]
    pub water: Option<RankerWeights>,
    #[serde(default)]
    pub carbon: Option<RankerWeights>,
    #[serde(default)]
    pub cost: Option<RankerWeights>,
    #[serde(default)]
    pub balanced: Option<RankerWeights>,
}

impl RankerWeightTable {
    pub fn for_priority(&self, priority: Priority) -> RankerWeights {
        let configured = match priority {
            Priority::Energy => self.energy,
            Priority::Water => self.water,
            Priority::Carbon => self.carbon,
            Priority::Cost => self.cost,
            Priority::Balanced => self.balanced,
        };

        configured
            .filter(RankerWeights::is_usable)
            .unwrap_or_else(|| default_ranker_weights(priority))
    }
}

/// 内置排名权重：优先级对应维度权重最高
pub fn default_ranker_weights(priority: Priority) -> RankerWeights {
    match priority {
        Priority::Energy => RankerWeights::new(0.50, 0.15, 0.20, 0.15),
        Priority::Water => RankerWeights::new(0.15, 0.50, 0.20, 0.15),
        Priority::Carbon => RankerWeights::new(0.20, 0.15, 0.50, 0.15),
        Priority::Cost => RankerWeights::new(0.15, 0.15, 0.15, 0.55),
        Priority::Balanced => RankerWeights::new(0.25, 0.25, 0.25, 0.25),
    }
}
