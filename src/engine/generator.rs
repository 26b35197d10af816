// ==========================================
// 可持续设计方案引擎 - 方案生成器
// ==========================================
// 职责: 约束集 → 固定规模的候选方案批次（含指标）
// 输入: 已校验 ConstraintSet + 注入的随机源
// 输出: 非空、id/名称唯一的 Design 列表
// 红线: 纯函数,无 I/O、无共享可变状态
// 红线: 面积驱动造价、优先级抬升对应指标、气候扰动能效/水效
// ==========================================

mod core;
pub mod profile;

#[cfg(test)]
mod tests;

pub use self::core::DesignGenerator;
pub use profile::{climate_effect, priority_bias, ClimateEffect, PriorityBias};
