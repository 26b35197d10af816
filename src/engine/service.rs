// ==========================================
// 可持续设计方案引擎 - 方案生成服务契约
// ==========================================
// 职责: 定义远程生成服务的请求/响应契约与 Trait,并提供进程内实现
// 红线: 响应在交给调用方之前必须通过 validate()
// 红线: 服务端排名保留原始 JSON,由 RankingSource::from_json 降级解析
// ==========================================

use crate::domain::constraint::ConstraintSet;
use crate::domain::design::{Design, RankingSource};
use crate::domain::project::Recommendation;
use crate::engine::cost_predictor::CostPredictor;
use crate::engine::generator::DesignGenerator;
use crate::engine::ranker::DesignRanker;
use crate::engine::recommender::HistoricalRecommender;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

// ==========================================
// ServiceError - 服务调用错误
// ==========================================
/// 生成服务错误（只在管线内部出现,不会传给最终调用方）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("服务连接失败: {0}")]
    Transport(String),

    #[error("服务返回非成功状态: status={status}, message={message}")]
    Status { status: u16, message: String },

    #[error("服务返回数据格式错误: {0}")]
    MalformedPayload(String),

    #[error("服务调用超时: {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

// ==========================================
// 请求 / 响应
// ==========================================

/// 生成请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub request_id: Uuid,
    pub constraints: ConstraintSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

impl GenerationRequest {
    pub fn new(constraints: ConstraintSet, user_id: Option<i64>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            constraints,
            user_id,
        }
    }
}

/// 生成响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub designs: Vec<Design>,
    /// 服务端排名（原始 JSON, 期望形如 [{id, ml_score}]）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_rankings: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
    #[serde(default = "now")]
    pub generated_at: NaiveDateTime,
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

impl GenerationResponse {
    /// 从响应报文解析
    pub fn from_json_str(body: &str) -> Result<Self, ServiceError> {
        serde_json::from_str(body).map_err(|e| ServiceError::MalformedPayload(e.to_string()))
    }

    /// 校验响应
    ///
    /// # 返回
    /// - Ok(()): 批次非空、id/名称唯一、指标全部在界内
    /// - Err(ServiceError::MalformedPayload): 第一个问题
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.designs.is_empty() {
            return Err(ServiceError::MalformedPayload("方案列表为空".to_string()));
        }

        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for design in &self.designs {
            if !ids.insert(design.id) {
                return Err(ServiceError::MalformedPayload(format!(
                    "方案 id 重复: {}",
                    design.id
                )));
            }
            if !names.insert(design.name.as_str()) {
                return Err(ServiceError::MalformedPayload(format!(
                    "方案名称重复: {}",
                    design.name
                )));
            }
            design.metrics.check_bounds().map_err(|reason| {
                ServiceError::MalformedPayload(format!("方案 {} 指标越界: {}", design.id, reason))
            })?;
            if let Some(cost) = design.ml_predicted_cost {
                if !cost.is_finite() || cost < 0.0 {
                    return Err(ServiceError::MalformedPayload(format!(
                        "方案 {} 预测造价无效: {}",
                        design.id, cost
                    )));
                }
            }
        }

        Ok(())
    }

    /// 排名来源（缺失/格式错误时为 LocalHeuristic）
    pub fn ranking_source(&self) -> RankingSource {
        match &self.ml_rankings {
            Some(raw) => RankingSource::from_json(raw),
            None => RankingSource::LocalHeuristic,
        }
    }
}

// ==========================================
// DesignService Trait
// ==========================================
// 实现者: LocalDesignService（进程内）;远程 HTTP 客户端由外壳提供
#[async_trait]
pub trait DesignService: Send + Sync {
    /// 服务名称（用于日志）
    fn name(&self) -> &str;

    /// 生成一批方案
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ServiceError>;
}

// ==========================================
// LocalDesignService - 进程内生成服务
// ==========================================
/// 生成器 + 优先级加权排名 + （可选）历史推荐与造价预测
pub struct LocalDesignService {
    generator: DesignGenerator,
    ranker: DesignRanker,
    recommender: Option<HistoricalRecommender>,
    cost_predictor: Option<CostPredictor>,
    rng: Mutex<ChaCha8Rng>,
}

impl LocalDesignService {
    pub fn new(generator: DesignGenerator, ranker: DesignRanker) -> Self {
        Self {
            generator,
            ranker,
            recommender: None,
            cost_predictor: None,
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }

    /// 固定随机种子（测试/复现用）
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(ChaCha8Rng::seed_from_u64(seed));
        self
    }

    pub fn with_recommender(mut self, recommender: HistoricalRecommender) -> Self {
        self.recommender = Some(recommender);
        self
    }

    pub fn with_cost_predictor(mut self, predictor: CostPredictor) -> Self {
        self.cost_predictor = Some(predictor);
        self
    }

    /// 生成 + 预测造价 + 排名 + 推荐（同步核心）
    pub fn build_response(&self, constraints: &ConstraintSet) -> GenerationResponse {
        let mut designs = {
            // 锁中毒时沿用内部状态
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            self.generator.generate(constraints, &mut *rng)
        };

        if let Some(predictor) = &self.cost_predictor {
            for design in designs.iter_mut() {
                design.ml_predicted_cost = Some(predictor.predict(constraints, design.id));
            }
        }

        let rankings = self.ranker.rank(&designs, constraints);
        let recommendation = self
            .recommender
            .as_ref()
            .map(|r| r.recommend(constraints));

        GenerationResponse {
            ml_rankings: serde_json::to_value(&rankings).ok(),
            designs,
            recommendation,
            generated_at: now(),
        }
    }
}

impl Default for LocalDesignService {
    fn default() -> Self {
        Self::new(DesignGenerator::default(), DesignRanker::default())
    }
}

#[async_trait]
impl DesignService for LocalDesignService {
    fn name(&self) -> &str {
        "local"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ServiceError> {
        tracing::debug!(request_id = %request.request_id, "进程内生成服务处理请求");
        Ok(self.build_response(&request.constraints))
    }
}
