// ==========================================
// 可持续设计方案引擎 - 最优方案判定
// ==========================================
// 职责: 从当前批次中选出唯一的推荐方案
// 判定顺序:
//   1) 存在非空服务端排名: 有排名分取 ml_score,否则回落该方案的 sustainabilityIndex
//   2) 无排名: 直接比较 sustainabilityIndex
//   3) 同分: 批次中最靠前者胜出（仅严格大于时替换）
//   4) 空批次: 返回 None,不是错误
// 红线: 纯函数,不修改输入,无副作用
// ==========================================

use crate::domain::design::{Design, DesignId, RankingSource};
use serde::{Deserialize, Serialize};

/// 得分来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBasis {
    /// 服务端排名 ml_score
    Ranking,
    /// 方案自身的 sustainabilityIndex
    SustainabilityIndex,
}

impl ScoreBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBasis::Ranking => "ranking",
            ScoreBasis::SustainabilityIndex => "sustainability_index",
        }
    }
}

/// 判定结果（带可解释信息）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution<'a> {
    pub design: &'a Design,
    pub score: f64,
    pub basis: ScoreBasis,
}

impl Resolution<'_> {
    pub fn design_id(&self) -> DesignId {
        self.design.id
    }
}

// ==========================================
// BestDesignResolver - 最优方案判定器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct BestDesignResolver;

impl BestDesignResolver {
    pub fn new() -> Self {
        Self
    }

    /// 选出推荐方案
    ///
    /// # 参数
    /// - `designs`: 当前批次（按批次顺序）
    /// - `source`: 排名来源
    ///
    /// # 返回
    /// - Some(&Design): 推荐方案
    /// - None: 批次为空
    pub fn resolve<'a>(&self, designs: &'a [Design], source: &RankingSource) -> Option<&'a Design> {
        self.resolve_with_reason(designs, source).map(|r| r.design)
    }

    /// 选出推荐方案并返回得分与得分来源
    pub fn resolve_with_reason<'a>(
        &self,
        designs: &'a [Design],
        source: &RankingSource,
    ) -> Option<Resolution<'a>> {
        let mut best: Option<Resolution<'a>> = None;

        for design in designs {
            let (score, basis) = Self::effective_score(design, source);

            let replace = match &best {
                None => true,
                Some(current) => is_strictly_greater(score, current.score),
            };
            if replace {
                best = Some(Resolution {
                    design,
                    score,
                    basis,
                });
            }
        }

        best
    }

    /// 单方案有效得分
    ///
    /// LocalHeuristic 时 score_for 恒为 None,统一走 sustainabilityIndex
    pub fn effective_score(design: &Design, source: &RankingSource) -> (f64, ScoreBasis) {
        match source.score_for(design.id) {
            Some(score) => (score, ScoreBasis::Ranking),
            None => (
                design.metrics.sustainability_index,
                ScoreBasis::SustainabilityIndex,
            ),
        }
    }
}

/// NaN 永远不会胜出;已选中 NaN 时任何有限分都可替换
fn is_strictly_greater(candidate: f64, current: f64) -> bool {
    if candidate.is_nan() {
        return false;
    }
    current.is_nan() || candidate > current
}
