use crate::domain::types::{Climate, DesignStrategy, Priority};

/// 优先级对重点指标的抬升幅度（百分点）
pub const PRIORITY_BOOST: f64 = 12.0;

/// 预算对能效/水效的最大影响（百分点, budget=0 → -8, budget=100 → +8）
pub const BUDGET_QUALITY_SPAN: f64 = 8.0;

/// 随机扰动幅度默认值（百分点）
pub const DEFAULT_JITTER: f64 = 3.0;

/// 单方碳强度换算（能效 100% 时碳排放减半）
pub const ENERGY_CARBON_RELIEF: f64 = 200.0;

/// 设计策略基线
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyBaseline {
    pub energy_efficiency: f64,
    pub water_efficiency: f64,
    /// 吨 CO2e / 平方英尺
    pub carbon_intensity: f64,
    pub cost_multiplier: f64,
}

pub fn strategy_baseline(strategy: DesignStrategy) -> StrategyBaseline {
    match strategy {
        DesignStrategy::EcoEfficient => StrategyBaseline {
            energy_efficiency: 74.0,
            water_efficiency: 62.0,
            carbon_intensity: 0.030,
            cost_multiplier: 1.10,
        },
        DesignStrategy::CarbonOptimized => StrategyBaseline {
            energy_efficiency: 66.0,
            water_efficiency: 60.0,
            carbon_intensity: 0.020,
            cost_multiplier: 1.00,
        },
        DesignStrategy::Regenerative => StrategyBaseline {
            energy_efficiency: 68.0,
            water_efficiency: 72.0,
            carbon_intensity: 0.025,
            cost_multiplier: 1.18,
        },
    }
}

pub fn strategy_features(strategy: DesignStrategy) -> [&'static str; 3] {
    match strategy {
        DesignStrategy::EcoEfficient => [
            "High-performance insulated envelope",
            "Heat-pump HVAC with energy recovery ventilation",
            "Rooftop solar PV array",
        ],
        DesignStrategy::CarbonOptimized => [
            "Mass-timber structural frame",
            "Low-clinker concrete foundations",
            "Reclaimed and locally sourced finishes",
        ],
        DesignStrategy::Regenerative => [
            "Rainwater harvesting and greywater reuse",
            "Green roof with native planting",
            "On-site composting and bio-swales",
        ],
    }
}

/// 气候影响
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateEffect {
    pub energy_delta: f64,
    pub water_delta: f64,
    pub carbon_multiplier: f64,
    pub cost_multiplier: f64,
    pub feature: &'static str,
}

/// 气候对基线的扰动
///
/// 干热气候压低水效基线,寒冷气候压低能效基线
pub fn climate_effect(climate: Climate) -> ClimateEffect {
    match climate {
        Climate::Temperate => ClimateEffect {
            energy_delta: 0.0,
            water_delta: 0.0,
            carbon_multiplier: 1.00,
            cost_multiplier: 1.00,
            feature: "Cross-ventilation and daylight-optimised orientation",
        },
        Climate::HotArid => ClimateEffect {
            energy_delta: -4.0,
            water_delta: -14.0,
            carbon_multiplier: 1.08,
            cost_multiplier: 1.05,
            feature: "Xeriscaping with shaded thermal-mass walls",
        },
        Climate::Cold => ClimateEffect {
            energy_delta: -14.0,
            water_delta: 0.0,
            carbon_multiplier: 1.18,
            cost_multiplier: 1.08,
            feature: "Triple glazing with airtight detailing",
        },
        Climate::Humid => ClimateEffect {
            energy_delta: -6.0,
            water_delta: 4.0,
            carbon_multiplier: 1.04,
            cost_multiplier: 1.03,
            feature: "Dehumidifying ventilation and raised floors",
        },
    }
}

/// 优先级偏置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityBias {
    pub energy_delta: f64,
    pub water_delta: f64,
    pub carbon_multiplier: f64,
    pub cost_multiplier: f64,
}

pub fn priority_bias(priority: Priority) -> PriorityBias {
    match priority {
        Priority::Energy => PriorityBias {
            energy_delta: PRIORITY_BOOST,
            water_delta: 0.0,
            carbon_multiplier: 1.0,
            cost_multiplier: 1.0,
        },
        Priority::Water => PriorityBias {
            energy_delta: 0.0,
            water_delta: PRIORITY_BOOST,
            carbon_multiplier: 1.0,
            cost_multiplier: 1.0,
        },
        Priority::Carbon => PriorityBias {
            energy_delta: 0.0,
            water_delta: 0.0,
            carbon_multiplier: 0.75,
            cost_multiplier: 1.0,
        },
        Priority::Cost => PriorityBias {
            energy_delta: 0.0,
            water_delta: 0.0,
            carbon_multiplier: 1.0,
            cost_multiplier: 0.82,
        },
        Priority::Balanced => PriorityBias {
            energy_delta: PRIORITY_BOOST / 3.0,
            water_delta: PRIORITY_BOOST / 3.0,
            carbon_multiplier: 0.92,
            cost_multiplier: 1.0,
        },
    }
}
