// ==========================================
// 可持续设计方案引擎 - 方案生成管线
// ==========================================
// 职责: 调用生成服务 → 校验 → 失败回落本地生成器 → 判定最优方案
// 输入: GenerationRequest
// 输出: PipelineOutcome（永远成功,失败原因体现在 origin 中）
// 红线: 服务失败/超时/报文错误一律回落本地生成,排名视为缺失
// 红线: 回落路径不得再产生错误
// ==========================================

use crate::domain::design::{Design, DesignId, RankingSource};
use crate::domain::project::Recommendation;
use crate::engine::generator::DesignGenerator;
use crate::engine::resolver::{BestDesignResolver, ScoreBasis};
use crate::engine::service::{DesignService, GenerationRequest, ServiceError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// 默认服务超时（毫秒）
pub const DEFAULT_SERVICE_TIMEOUT_MS: u64 = 8000;

// ==========================================
// DesignOrigin - 方案来源
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DesignOrigin {
    /// 生成服务正常返回
    Service,
    /// 服务失败,本地生成器回落
    LocalFallback { reason: String },
}

impl DesignOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            DesignOrigin::Service => "service",
            DesignOrigin::LocalFallback { .. } => "local_fallback",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, DesignOrigin::LocalFallback { .. })
    }
}

// ==========================================
// PipelineOutcome - 管线结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub request_id: Uuid,
    pub designs: Vec<Design>,
    pub ranking_source: RankingSource,
    /// 推荐方案 id（批次为空时为 None）
    pub best_design_id: Option<DesignId>,
    pub best_score: Option<f64>,
    pub score_basis: Option<ScoreBasis>,
    pub recommendation: Option<Recommendation>,
    pub origin: DesignOrigin,
    pub elapsed_ms: u64,
}

impl PipelineOutcome {
    /// 推荐方案
    pub fn best_design(&self) -> Option<&Design> {
        let id = self.best_design_id?;
        self.designs.iter().find(|d| d.id == id)
    }
}

// ==========================================
// DesignPipeline - 生成管线
// ==========================================
pub struct DesignPipeline {
    service: Arc<dyn DesignService>,
    fallback: DesignGenerator,
    resolver: BestDesignResolver,
    timeout: Duration,
    rng: Mutex<ChaCha8Rng>,
}

impl DesignPipeline {
    /// 构造函数
    ///
    /// # 参数
    /// - `service`: 生成服务
    /// - `fallback`: 服务失败时使用的本地生成器
    pub fn new(service: Arc<dyn DesignService>, fallback: DesignGenerator) -> Self {
        Self {
            service,
            fallback,
            resolver: BestDesignResolver::new(),
            timeout: Duration::from_millis(DEFAULT_SERVICE_TIMEOUT_MS),
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 固定回落生成器的随机种子
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(ChaCha8Rng::seed_from_u64(seed));
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 执行一次生成
    pub async fn run(&self, request: &GenerationRequest) -> PipelineOutcome {
        let started = Instant::now();

        let attempt = match tokio::time::timeout(self.timeout, self.service.generate(request)).await
        {
            Ok(Ok(response)) => response.validate().map(|_| response),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ServiceError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        };

        let (designs, ranking_source, recommendation, origin) = match attempt {
            Ok(response) => {
                let source = response.ranking_source();
                (
                    response.designs,
                    source,
                    response.recommendation,
                    DesignOrigin::Service,
                )
            }
            Err(e) => {
                warn!(
                    request_id = %request.request_id,
                    service = self.service.name(),
                    error = %e,
                    "生成服务不可用，回落本地生成器"
                );
                let designs = {
                    let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
                    self.fallback.generate(&request.constraints, &mut *rng)
                };
                (
                    designs,
                    RankingSource::LocalHeuristic,
                    None,
                    DesignOrigin::LocalFallback {
                        reason: e.to_string(),
                    },
                )
            }
        };

        let resolution = self.resolver.resolve_with_reason(&designs, &ranking_source);
        let best_design_id = resolution.map(|r| r.design_id());
        let best_score = resolution.map(|r| r.score);
        let score_basis = resolution.map(|r| r.basis);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            request_id = %request.request_id,
            origin = origin.as_str(),
            design_count = designs.len(),
            best_design_id,
            basis = score_basis.map(|b| b.as_str()),
            ranked = ranking_source.is_server_supplied(),
            elapsed_ms,
            "方案生成完成"
        );

        PipelineOutcome {
            request_id: request.request_id,
            designs,
            ranking_source,
            best_design_id,
            best_score,
            score_basis,
            recommendation,
            origin,
            elapsed_ms,
        }
    }
}
