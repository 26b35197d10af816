// ==========================================
// 可持续设计方案引擎 - 约束集领域模型
// ==========================================
// 职责: 用户设计任务书（面积/预算/气候/优先级）
// 红线: ConstraintSet 只能经校验构造,引擎永远拿不到残缺约束
// ==========================================

use crate::domain::types::{Climate, Priority};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 预算百分比下限
pub const BUDGET_MIN: f64 = 0.0;
/// 预算百分比上限
pub const BUDGET_MAX: f64 = 100.0;

// ==========================================
// ValidationError - 约束校验错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("缺少必填字段: {field}")]
    MissingField { field: String },

    #[error("字段{field}不是有效数值: {value}")]
    NotFinite { field: String, value: f64 },

    #[error("字段{field}超出范围: value={value}, 允许区间=[{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("未知气候类型: {0}")]
    UnknownClimate(String),

    #[error("未知优化优先级: {0}")]
    UnknownPriority(String),
}

impl ValidationError {
    /// 出错字段名
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::NotFinite { field, .. }
            | ValidationError::OutOfRange { field, .. } => field,
            ValidationError::UnknownClimate(_) => "climate",
            ValidationError::UnknownPriority(_) => "priority",
        }
    }
}

// ==========================================
// RawConstraintInput - 原始输入（来自前端/HTTP）
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConstraintInput {
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub climate: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

impl RawConstraintInput {
    pub fn new(area: f64, budget: f64, climate: &str, priority: &str) -> Self {
        Self {
            area: Some(area),
            budget: Some(budget),
            climate: Some(climate.to_string()),
            priority: Some(priority.to_string()),
        }
    }
}

// ==========================================
// ConstraintLimits - 可配置的面积边界
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintLimits {
    pub area_min: f64,
    pub area_max: f64,
}

impl Default for ConstraintLimits {
    fn default() -> Self {
        Self {
            area_min: 300.0,
            area_max: 2000.0,
        }
    }
}

impl ConstraintLimits {
    /// 上下限均为正有限数且 min < max
    pub fn is_valid(&self) -> bool {
        self.area_min.is_finite()
            && self.area_max.is_finite()
            && self.area_min > 0.0
            && self.area_min < self.area_max
    }
}

// ==========================================
// ClampNotice - 钳制记录
// ==========================================
/// CLAMP 模式下被修正的字段（写入结果元数据）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClampNotice {
    pub field: String,
    /// 原始值（NaN 序列化为 null）
    pub original: Option<f64>,
    pub applied: f64,
}

// ==========================================
// ConstraintSet - 已校验约束集
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawConstraintInput")]
pub struct ConstraintSet {
    area: f64,
    budget: f64,
    climate: Climate,
    priority: Priority,
}

impl ConstraintSet {
    /// 构造约束集（仅校验内在不变量: 面积为正、预算在 [0,100]）
    ///
    /// 配置的面积上下限由 ConstraintEngine 另行校验
    pub fn new(
        area: f64,
        budget: f64,
        climate: Climate,
        priority: Priority,
    ) -> Result<Self, ValidationError> {
        if !area.is_finite() {
            return Err(ValidationError::NotFinite {
                field: "area".to_string(),
                value: area,
            });
        }
        if area <= 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "area".to_string(),
                value: area,
                min: 0.0,
                max: f64::MAX,
            });
        }
        if !budget.is_finite() {
            return Err(ValidationError::NotFinite {
                field: "budget".to_string(),
                value: budget,
            });
        }
        if !(BUDGET_MIN..=BUDGET_MAX).contains(&budget) {
            return Err(ValidationError::OutOfRange {
                field: "budget".to_string(),
                value: budget,
                min: BUDGET_MIN,
                max: BUDGET_MAX,
            });
        }

        Ok(Self {
            area,
            budget,
            climate,
            priority,
        })
    }

    /// 面积（平方英尺）
    pub fn area(&self) -> f64 {
        self.area
    }

    /// 预算百分比 [0,100]
    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn climate(&self) -> Climate {
        self.climate
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// 替换优先级（用于同条件下的对比生成）
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// 预算比例 [0,1]
    pub fn budget_ratio(&self) -> f64 {
        self.budget / BUDGET_MAX
    }
}

impl TryFrom<RawConstraintInput> for ConstraintSet {
    type Error = ValidationError;

    fn try_from(raw: RawConstraintInput) -> Result<Self, Self::Error> {
        let area = raw.area.ok_or_else(|| missing("area"))?;
        let budget = raw.budget.ok_or_else(|| missing("budget"))?;
        let climate_raw = raw.climate.ok_or_else(|| missing("climate"))?;
        let priority_raw = raw.priority.ok_or_else(|| missing("priority"))?;

        let climate = climate_raw
            .parse::<Climate>()
            .map_err(|_| ValidationError::UnknownClimate(climate_raw.clone()))?;
        let priority = priority_raw
            .parse::<Priority>()
            .map_err(|_| ValidationError::UnknownPriority(priority_raw.clone()))?;

        ConstraintSet::new(area, budget, climate, priority)
    }
}

impl From<ConstraintSet> for RawConstraintInput {
    fn from(c: ConstraintSet) -> Self {
        Self {
            area: Some(c.area),
            budget: Some(c.budget),
            climate: Some(c.climate.as_str().to_string()),
            priority: Some(c.priority.as_str().to_string()),
        }
    }
}

fn missing(field: &str) -> ValidationError {
    ValidationError::MissingField {
        field: field.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_set_rejects_invalid_numbers() {
        assert!(ConstraintSet::new(0.0, 50.0, Climate::Cold, Priority::Energy).is_err());
        assert!(ConstraintSet::new(-10.0, 50.0, Climate::Cold, Priority::Energy).is_err());
        assert!(ConstraintSet::new(f64::NAN, 50.0, Climate::Cold, Priority::Energy).is_err());
        assert!(ConstraintSet::new(800.0, 100.5, Climate::Cold, Priority::Energy).is_err());
        assert!(ConstraintSet::new(800.0, -1.0, Climate::Cold, Priority::Energy).is_err());

        let ok = ConstraintSet::new(800.0, 0.0, Climate::Cold, Priority::Energy).unwrap();
        assert_eq!(ok.budget_ratio(), 0.0);
    }

    #[test]
    fn test_deserialize_goes_through_validation() {
        let json = r#"{"area": 1200, "budget": 60, "climate": "moderate", "priority": "materials"}"#;
        let c: ConstraintSet = serde_json::from_str(json).unwrap();
        assert_eq!(c.climate(), Climate::Temperate);
        assert_eq!(c.priority(), Priority::Carbon);

        let missing_budget = r#"{"area": 1200, "climate": "cold", "priority": "energy"}"#;
        assert!(serde_json::from_str::<ConstraintSet>(missing_budget).is_err());

        let bad_climate = r#"{"area": 1200, "budget": 10, "climate": "lunar", "priority": "energy"}"#;
        assert!(serde_json::from_str::<ConstraintSet>(bad_climate).is_err());
    }

    #[test]
    fn test_serialize_roundtrip_uses_canonical_names() {
        let c = ConstraintSet::new(900.0, 40.0, Climate::HotArid, Priority::Water).unwrap();
        let value = serde_json::to_value(c).unwrap();
        assert_eq!(value["climate"], "hot_arid");
        assert_eq!(value["priority"], "water");
        let back: ConstraintSet = serde_json::from_value(value).unwrap();
        assert_eq!(back, c);
    }
}
