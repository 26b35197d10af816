// ==========================================
// 可持续设计方案引擎 - 约束引擎
// ==========================================
// 职责: 约束校验、CLAMP 模式钳制、派生因子、可行性评分
// 输入: RawConstraintInput（来自调用方）
// 输出: ConstraintSet / ProcessedConstraints
// 红线: 缺失字段与未知枚举永远报错,不做猜测
// ==========================================

use crate::domain::constraint::{
    ClampNotice, ConstraintLimits, ConstraintSet, RawConstraintInput, ValidationError,
    BUDGET_MAX, BUDGET_MIN,
};
use crate::domain::types::{Climate, Priority};
use crate::engine::evaluator::{round_to, SustainabilityEvaluator, BASE_COST_PER_SQFT};
use crate::engine::generator::climate_effect;
use serde::{Deserialize, Serialize};
use tracing::warn;

// ==========================================
// 派生因子
// ==========================================

/// 面积等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaClass {
    Compact,  // < 600 sq ft
    Standard, // 600 ~ 1400 sq ft
    Large,    // >= 1400 sq ft
}

impl AreaClass {
    pub fn of(area: f64) -> Self {
        if area < 600.0 {
            AreaClass::Compact
        } else if area < 1400.0 {
            AreaClass::Standard
        } else {
            AreaClass::Large
        }
    }
}

/// 负荷等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadLevel {
    Low,
    Medium,
    High,
}

/// 气候负荷画像
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClimateLoad {
    pub heating: LoadLevel,
    pub cooling: LoadLevel,
    pub water_stress: LoadLevel,
}

impl ClimateLoad {
    pub fn of(climate: Climate) -> Self {
        use LoadLevel::*;
        match climate {
            Climate::Temperate => Self {
                heating: Medium,
                cooling: Low,
                water_stress: Low,
            },
            Climate::HotArid => Self {
                heating: Low,
                cooling: High,
                water_stress: High,
            },
            Climate::Cold => Self {
                heating: High,
                cooling: Low,
                water_stress: Low,
            },
            Climate::Humid => Self {
                heating: Low,
                cooling: High,
                water_stress: Low,
            },
        }
    }

    fn high_count(&self) -> usize {
        [self.heating, self.cooling, self.water_stress]
            .iter()
            .filter(|l| **l == LoadLevel::High)
            .count()
    }
}

/// 处理后的约束（派生因子）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedConstraints {
    pub constraints: ConstraintSet,
    pub budget_allowance: f64,
    pub budget_per_sqft: f64,
    pub area_class: AreaClass,
    pub climate_load: ClimateLoad,
    /// 优先级对应的重点指标
    pub focus_metric: String,
}

// ==========================================
// ConstraintEngine - 约束引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConstraintEngine {
    limits: ConstraintLimits,
}

impl ConstraintEngine {
    /// 构造约束引擎（面积上下限无效时回落默认值）
    pub fn new(limits: ConstraintLimits) -> Self {
        if limits.is_valid() {
            return Self { limits };
        }

        warn!(
            area_min = limits.area_min,
            area_max = limits.area_max,
            "面积上下限无效，使用默认值"
        );
        Self {
            limits: ConstraintLimits::default(),
        }
    }

    pub fn limits(&self) -> &ConstraintLimits {
        &self.limits
    }

    // ==========================================
    // 严格校验
    // ==========================================

    /// 严格校验（收集全部字段错误）
    ///
    /// # 返回
    /// - Ok(ConstraintSet): 全部字段合法
    /// - Err(Vec<ValidationError>): 每个出错字段一条
    pub fn validate(&self, raw: &RawConstraintInput) -> Result<ConstraintSet, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let area = self.check_number(
            "area",
            raw.area,
            self.limits.area_min,
            self.limits.area_max,
            &mut errors,
        );
        let budget = self.check_number("budget", raw.budget, BUDGET_MIN, BUDGET_MAX, &mut errors);
        let climate = parse_climate(raw.climate.as_deref(), &mut errors);
        let priority = parse_priority(raw.priority.as_deref(), &mut errors);

        match (area, budget, climate, priority) {
            (Some(area), Some(budget), Some(climate), Some(priority)) if errors.is_empty() => {
                ConstraintSet::new(area, budget, climate, priority).map_err(|e| vec![e])
            }
            _ => Err(errors),
        }
    }

    fn check_number(
        &self,
        field: &str,
        value: Option<f64>,
        min: f64,
        max: f64,
        errors: &mut Vec<ValidationError>,
    ) -> Option<f64> {
        let Some(v) = value else {
            errors.push(ValidationError::MissingField {
                field: field.to_string(),
            });
            return None;
        };

        if !v.is_finite() {
            errors.push(ValidationError::NotFinite {
                field: field.to_string(),
                value: v,
            });
            return None;
        }

        if v < min || v > max {
            errors.push(ValidationError::OutOfRange {
                field: field.to_string(),
                value: v,
                min,
                max,
            });
            return None;
        }

        Some(v)
    }

    // ==========================================
    // CLAMP 模式
    // ==========================================

    /// 钳制模式: 数值越界/NaN 钳制到最近边界并记录
    ///
    /// NaN 没有"最近"边界,统一取下界
    pub fn normalize(
        &self,
        raw: &RawConstraintInput,
    ) -> Result<(ConstraintSet, Vec<ClampNotice>), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut notices = Vec::new();

        let area = clamp_field(
            "area",
            raw.area,
            self.limits.area_min,
            self.limits.area_max,
            &mut errors,
            &mut notices,
        );
        let budget = clamp_field(
            "budget",
            raw.budget,
            BUDGET_MIN,
            BUDGET_MAX,
            &mut errors,
            &mut notices,
        );
        let climate = parse_climate(raw.climate.as_deref(), &mut errors);
        let priority = parse_priority(raw.priority.as_deref(), &mut errors);

        for notice in &notices {
            warn!(
                field = %notice.field,
                original = ?notice.original,
                applied = notice.applied,
                "约束值越界，已钳制"
            );
        }

        match (area, budget, climate, priority) {
            (Some(area), Some(budget), Some(climate), Some(priority)) if errors.is_empty() => {
                let set = ConstraintSet::new(area, budget, climate, priority).map_err(|e| vec![e])?;
                Ok((set, notices))
            }
            _ => Err(errors),
        }
    }

    // ==========================================
    // 派生因子 & 可行性
    // ==========================================

    /// 计算派生因子
    pub fn process(&self, constraints: &ConstraintSet) -> ProcessedConstraints {
        let allowance = SustainabilityEvaluator::budget_allowance(constraints);
        let focus_metric = match constraints.priority() {
            Priority::Energy => "energyEfficiency",
            Priority::Water => "waterEfficiency",
            Priority::Carbon => "carbonFootprint",
            Priority::Cost => "estimatedCost",
            Priority::Balanced => "sustainabilityIndex",
        };

        ProcessedConstraints {
            constraints: *constraints,
            budget_allowance: allowance.round(),
            budget_per_sqft: round_to(allowance / constraints.area(), 2),
            area_class: AreaClass::of(constraints.area()),
            climate_load: ClimateLoad::of(constraints.climate()),
            focus_metric: focus_metric.to_string(),
        }
    }

    /// 可行性评分 0~100
    ///
    /// 基础分 = 单方额度 / (基准单价 × 气候造价系数)，封顶 100；
    /// 大面积扣 5 分,每项高负荷扣 5 分
    pub fn feasibility_score(&self, processed: &ProcessedConstraints) -> f64 {
        let climate = processed.constraints.climate();
        let required = BASE_COST_PER_SQFT * climate_effect(climate).cost_multiplier;
        let coverage = (processed.budget_per_sqft / required).min(1.0);

        let mut score = 100.0 * coverage;
        if processed.area_class == AreaClass::Large {
            score -= 5.0;
        }
        score -= 5.0 * processed.climate_load.high_count() as f64;

        round_to(score.clamp(0.0, 100.0), 1)
    }
}

// ==========================================
// 内部工具
// ==========================================

fn clamp_field(
    field: &str,
    value: Option<f64>,
    min: f64,
    max: f64,
    errors: &mut Vec<ValidationError>,
    notices: &mut Vec<ClampNotice>,
) -> Option<f64> {
    let Some(v) = value else {
        errors.push(ValidationError::MissingField {
            field: field.to_string(),
        });
        return None;
    };

    let applied = if v.is_nan() {
        min
    } else {
        v.clamp(min, max)
    };

    if v.is_nan() || applied != v {
        notices.push(ClampNotice {
            field: field.to_string(),
            original: if v.is_nan() { None } else { Some(v) },
            applied,
        });
    }

    Some(applied)
}

fn parse_climate(value: Option<&str>, errors: &mut Vec<ValidationError>) -> Option<Climate> {
    match value {
        None => {
            errors.push(ValidationError::MissingField {
                field: "climate".to_string(),
            });
            None
        }
        Some(s) => match s.parse::<Climate>() {
            Ok(c) => Some(c),
            Err(_) => {
                errors.push(ValidationError::UnknownClimate(s.to_string()));
                None
            }
        },
    }
}

fn parse_priority(value: Option<&str>, errors: &mut Vec<ValidationError>) -> Option<Priority> {
    match value {
        None => {
            errors.push(ValidationError::MissingField {
                field: "priority".to_string(),
            });
            None
        }
        Some(s) => match s.parse::<Priority>() {
            Ok(p) => Some(p),
            Err(_) => {
                errors.push(ValidationError::UnknownPriority(s.to_string()));
                None
            }
        },
    }
}
