// ==========================================
// 可持续设计方案引擎 - 领域类型定义
// ==========================================
// 职责: 气候、优化优先级、设计策略等封闭枚举
// 红线: 封闭集合,未知取值由调用方拒绝,引擎不做猜测
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 气候类型 (Climate)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Climate {
    Temperate, // 温和（moderate）
    HotArid,   // 干热
    Cold,      // 寒冷
    Humid,     // 湿热
}

impl Climate {
    pub const ALL: [Climate; 4] = [
        Climate::Temperate,
        Climate::HotArid,
        Climate::Cold,
        Climate::Humid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Climate::Temperate => "temperate",
            Climate::HotArid => "hot_arid",
            Climate::Cold => "cold",
            Climate::Humid => "humid",
        }
    }
}

impl fmt::Display for Climate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Climate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "temperate" | "moderate" => Ok(Climate::Temperate),
            "hot_arid" | "hot-arid" | "hot" | "arid" => Ok(Climate::HotArid),
            "cold" => Ok(Climate::Cold),
            "humid" | "tropical" => Ok(Climate::Humid),
            other => Err(format!("未知气候类型: {}", other)),
        }
    }
}

// ==========================================
// 优化优先级 (Priority)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Energy,   // 能效优先
    Water,    // 节水优先
    Carbon,   // 低碳优先（materials）
    Cost,     // 成本优先
    Balanced, // 均衡
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Energy,
        Priority::Water,
        Priority::Carbon,
        Priority::Cost,
        Priority::Balanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Energy => "energy",
            Priority::Water => "water",
            Priority::Carbon => "carbon",
            Priority::Cost => "cost",
            Priority::Balanced => "balanced",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Balanced
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "energy" => Ok(Priority::Energy),
            "water" => Ok(Priority::Water),
            "carbon" | "materials" => Ok(Priority::Carbon),
            "cost" | "budget" => Ok(Priority::Cost),
            "balanced" => Ok(Priority::Balanced),
            other => Err(format!("未知优化优先级: {}", other)),
        }
    }
}

// ==========================================
// 设计策略 (Design Strategy)
// ==========================================
// 每个批次按固定顺序生成,顺序即批次顺序(决定平局胜出者)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignStrategy {
    EcoEfficient,    // 高能效围护 + 高效设备
    CarbonOptimized, // 低碳材料 + 轻量结构
    Regenerative,    // 雨水回收 + 再生系统
}

impl DesignStrategy {
    /// 批次生成顺序
    pub const BATCH_ORDER: [DesignStrategy; 3] = [
        DesignStrategy::EcoEfficient,
        DesignStrategy::CarbonOptimized,
        DesignStrategy::Regenerative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DesignStrategy::EcoEfficient => "eco_efficient",
            DesignStrategy::CarbonOptimized => "carbon_optimized",
            DesignStrategy::Regenerative => "regenerative",
        }
    }

    /// 展示名称
    pub fn title(&self) -> &'static str {
        match self {
            DesignStrategy::EcoEfficient => "Eco-Efficient",
            DesignStrategy::CarbonOptimized => "Carbon-Optimized",
            DesignStrategy::Regenerative => "Regenerative",
        }
    }

    /// 批次内位置（同时作为设计 id）
    pub fn batch_index(&self) -> u32 {
        match self {
            DesignStrategy::EcoEfficient => 0,
            DesignStrategy::CarbonOptimized => 1,
            DesignStrategy::Regenerative => 2,
        }
    }

    pub fn from_batch_index(index: u32) -> Option<Self> {
        Self::BATCH_ORDER.get(index as usize).copied()
    }
}

impl fmt::Display for DesignStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

impl FromStr for DesignStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "eco_efficient" => Ok(DesignStrategy::EcoEfficient),
            "carbon_optimized" => Ok(DesignStrategy::CarbonOptimized),
            "regenerative" => Ok(DesignStrategy::Regenerative),
            other => Err(format!("未知设计策略: {}", other)),
        }
    }
}
