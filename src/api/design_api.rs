// ==========================================
// 可持续设计方案引擎 - 设计方案 API
// ==========================================
// 职责: 约束校验、方案生成、单方案评估、排名、历史推荐、造价预测、系统元数据
// 红线: 生成永远返回结果（服务失败回落本地）,最优方案判定可解释
// 红线: 项目历史保存为尽力而为,失败只告警不影响响应
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::engine_config_trait::{ConstraintMode, EngineConfigReader};
use crate::config::scoring_profile::IndexWeights;
use crate::domain::constraint::{ClampNotice, ConstraintSet, RawConstraintInput};
use crate::domain::design::{Design, DesignId, RankingEntry, RankingSource};
use crate::domain::project::{NewProject, ProjectRecord, Recommendation};
use crate::domain::types::{Climate, DesignStrategy, Priority};
use crate::engine::constraints::{ConstraintEngine, ProcessedConstraints};
use crate::engine::cost_predictor::{CostPrediction, CostPredictor};
use crate::engine::evaluator::{DesignEvaluation, RuleBasedRank, SustainabilityEvaluator};
use crate::engine::generator::DesignGenerator;
use crate::engine::pipeline::{DesignPipeline, PipelineOutcome};
use crate::engine::ranker::DesignRanker;
use crate::engine::recommender::HistoricalRecommender;
use crate::engine::resolver::BestDesignResolver;
use crate::engine::service::{DesignService, GenerationRequest, LocalDesignService};
use crate::repository::project_repo::ProjectRepository;

// ==========================================
// 响应结构
// ==========================================

/// 约束校验结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintCheck {
    pub valid: bool,
    pub mode: ConstraintMode,
    pub processed: ProcessedConstraints,
    /// 0~100
    pub feasibility_score: f64,
    /// CLAMP 模式下被修正的字段
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clamped: Vec<ClampNotice>,
}

impl ConstraintCheck {
    pub fn constraints(&self) -> &ConstraintSet {
        &self.processed.constraints
    }
}

/// 方案生成结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    /// 历史保存失败时为 None
    pub project_id: Option<i64>,
    pub constraints: ConstraintSet,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clamped: Vec<ClampNotice>,
    pub count: usize,
    pub outcome: PipelineOutcome,
    pub generated_at: NaiveDateTime,
}

impl GenerationReport {
    pub fn best_design(&self) -> Option<&Design> {
        self.outcome.best_design()
    }
}

/// 排名结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingReport {
    pub rule_based_rankings: Vec<RuleBasedRank>,
    pub ml_rankings: Vec<RankingEntry>,
    pub total_designs: usize,
    pub best_design_id: Option<DesignId>,
}

/// 系统元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMetadata {
    pub name: String,
    pub version: String,
    pub constraints: Vec<String>,
    pub metrics: Vec<String>,
    pub climates: Vec<String>,
    pub priorities: Vec<String>,
    pub strategies: Vec<String>,
    pub designs_per_generation: usize,
    pub capabilities: Vec<String>,
}

// ==========================================
// DesignApi - 设计方案 API
// ==========================================
pub struct DesignApi {
    config: Arc<dyn EngineConfigReader>,
    project_repo: Arc<ProjectRepository>,
    /// 外部生成服务（None 时使用进程内服务）
    service: Option<Arc<dyn DesignService>>,
    /// 固定随机种子（复现用）
    seed: Option<u64>,
}

impl DesignApi {
    /// 创建新的 DesignApi 实例
    ///
    /// # 参数
    /// - config: 配置读取器
    /// - project_repo: 项目历史仓储
    pub fn new(config: Arc<dyn EngineConfigReader>, project_repo: Arc<ProjectRepository>) -> Self {
        Self {
            config,
            project_repo,
            service: None,
            seed: None,
        }
    }

    /// 使用外部生成服务
    pub fn with_service(mut self, service: Arc<dyn DesignService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    // ==========================================
    // 约束
    // ==========================================

    /// 校验约束并给出派生因子与可行性评分
    ///
    /// # 返回
    /// - Ok(ConstraintCheck): 通过（CLAMP 模式可能带钳制记录）
    /// - Err(ApiError::ConstraintViolation): 全部字段错误
    pub async fn validate_constraints(&self, raw: &RawConstraintInput) -> ApiResult<ConstraintCheck> {
        let limits = self
            .config
            .get_constraint_limits()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let mode = self
            .config
            .get_constraint_mode()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let engine = ConstraintEngine::new(limits);
        let (constraints, clamped) = match mode {
            ConstraintMode::Strict => (engine.validate(raw)?, Vec::new()),
            ConstraintMode::Clamp => engine.normalize(raw)?,
        };

        let processed = engine.process(&constraints);
        let feasibility_score = engine.feasibility_score(&processed);

        Ok(ConstraintCheck {
            valid: true,
            mode,
            processed,
            feasibility_score,
            clamped,
        })
    }

    // ==========================================
    // 生成
    // ==========================================

    /// 生成一批方案并判定最优方案
    ///
    /// 流程:
    /// 1) 约束校验
    /// 2) 读取评分权重,加载历史样本
    /// 3) 管线执行（服务 → 校验 → 回落）
    /// 4) 尽力保存项目历史
    pub async fn generate_designs(
        &self,
        raw: &RawConstraintInput,
        user_id: Option<i64>,
    ) -> ApiResult<GenerationReport> {
        let check = self.validate_constraints(raw).await?;
        let constraints = *check.constraints();

        let weights = self
            .config
            .get_index_weights()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let timeout_ms = self
            .config
            .get_service_timeout_ms()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let service = match &self.service {
            Some(service) => service.clone(),
            None => self.local_service(weights).await?,
        };

        let mut pipeline = DesignPipeline::new(service, DesignGenerator::new(weights))
            .with_timeout(Duration::from_millis(timeout_ms));
        if let Some(seed) = self.seed {
            pipeline = pipeline.with_seed(seed);
        }

        let request = GenerationRequest::new(constraints, user_id);
        let outcome = pipeline.run(&request).await;

        let project_id = self.save_history(&constraints, user_id, &outcome).await;

        info!(
            project_id,
            area = constraints.area(),
            priority = %constraints.priority(),
            origin = outcome.origin.as_str(),
            best_design_id = outcome.best_design_id,
            "生成请求处理完成"
        );

        Ok(GenerationReport {
            project_id,
            constraints,
            clamped: check.clamped,
            count: outcome.designs.len(),
            outcome,
            generated_at: Utc::now().naive_utc(),
        })
    }

    /// 组装进程内生成服务（带历史推荐与造价预测）
    async fn local_service(&self, weights: IndexWeights) -> ApiResult<Arc<dyn DesignService>> {
        let ranker_weights = self
            .config
            .get_ranker_weights()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let history = self.load_history().await;

        let mut recommender = HistoricalRecommender::default();
        recommender.learn(&history);
        let mut cost_predictor = CostPredictor::new();
        cost_predictor.fit(&history);

        let mut service =
            LocalDesignService::new(DesignGenerator::new(weights), DesignRanker::new(ranker_weights))
                .with_recommender(recommender)
                .with_cost_predictor(cost_predictor);
        if let Some(seed) = self.seed {
            service = service.with_seed(seed);
        }
        Ok(Arc::new(service))
    }

    /// 读取最近项目历史（读取失败时返回空列表）
    async fn load_history(&self) -> Vec<ProjectRecord> {
        let limit = match self.config.get_history_limit().await {
            Ok(limit) => limit,
            Err(e) => {
                warn!(error = %e, "history_limit 读取失败，使用默认值");
                50
            }
        };

        match self.project_repo.list_records(limit) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "项目历史读取失败，按无历史处理");
                Vec::new()
            }
        }
    }

    /// 尽力保存项目历史
    async fn save_history(
        &self,
        constraints: &ConstraintSet,
        user_id: Option<i64>,
        outcome: &PipelineOutcome,
    ) -> Option<i64> {
        let config_snapshot = match self.config.snapshot_config().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "配置快照读取失败");
                None
            }
        };

        let ml_rankings = match &outcome.ranking_source {
            RankingSource::ServerSupplied(entries) => Some(entries.clone()),
            RankingSource::LocalHeuristic => None,
        };

        let project = NewProject {
            user_id,
            constraints: *constraints,
            designs: outcome.designs.clone(),
            ml_rankings,
            best_design_id: outcome.best_design_id,
            recommendation: outcome.recommendation.clone(),
            config_snapshot,
        };

        match self.project_repo.save_project(&project) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "项目历史保存失败");
                None
            }
        }
    }

    // ==========================================
    // 评估 / 排名 / 推荐
    // ==========================================

    /// 评估单个方案（重新计算指数并给出预算占用）
    pub async fn evaluate_design(
        &self,
        design: &Design,
        raw: &RawConstraintInput,
    ) -> ApiResult<DesignEvaluation> {
        let check = self.validate_constraints(raw).await?;
        let evaluator = self.evaluator().await?;
        Ok(evaluator.evaluate_design(design, check.constraints()))
    }

    /// 规则排名 + 优先级加权排名
    pub async fn rank_designs(
        &self,
        designs: &[Design],
        raw: &RawConstraintInput,
    ) -> ApiResult<RankingReport> {
        if designs.is_empty() {
            return Err(ApiError::InvalidInput("未提供任何方案".to_string()));
        }

        let check = self.validate_constraints(raw).await?;
        let evaluator = self.evaluator().await?;
        let ranker_weights = self
            .config
            .get_ranker_weights()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let ml_rankings = DesignRanker::new(ranker_weights).rank(designs, check.constraints());
        let source = RankingSource::from_entries(ml_rankings.clone());
        let best_design_id = BestDesignResolver::new()
            .resolve(designs, &source)
            .map(|d| d.id);

        Ok(RankingReport {
            rule_based_rankings: evaluator.rank_designs(designs),
            ml_rankings,
            total_designs: designs.len(),
            best_design_id,
        })
    }

    /// 基于历史相似项目的策略推荐
    pub async fn recommend(&self, raw: &RawConstraintInput) -> ApiResult<Recommendation> {
        let check = self.validate_constraints(raw).await?;
        let mut recommender = HistoricalRecommender::default();
        recommender.learn(&self.load_history().await);
        Ok(recommender.recommend(check.constraints()))
    }

    /// 预测单个方案的造价
    ///
    /// # 参数
    /// - raw: 约束输入
    /// - design_index: 批次内方案序号
    ///
    /// # 返回
    /// - Ok(CostPrediction): 历史样本足够时为线性回归,否则为公式估算
    /// - Err(ApiError::InvalidInput): 序号超出批次
    pub async fn predict_cost(
        &self,
        raw: &RawConstraintInput,
        design_index: u32,
    ) -> ApiResult<CostPrediction> {
        let batch_len = DesignStrategy::BATCH_ORDER.len();
        if design_index as usize >= batch_len {
            return Err(ApiError::InvalidInput(format!(
                "方案序号 {} 超出范围 [0,{})",
                design_index, batch_len
            )));
        }

        let check = self.validate_constraints(raw).await?;
        let mut predictor = CostPredictor::new();
        predictor.fit(&self.load_history().await);

        let prediction = predictor.predict_with_details(check.constraints(), design_index);
        info!(
            design_index,
            model = prediction.model.as_str(),
            samples = prediction.samples,
            predicted_cost = prediction.predicted_cost,
            "造价预测完成"
        );
        Ok(prediction)
    }

    async fn evaluator(&self) -> ApiResult<SustainabilityEvaluator> {
        let weights = self
            .config
            .get_index_weights()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        Ok(SustainabilityEvaluator::new(weights))
    }

    // ==========================================
    // 元数据
    // ==========================================

    pub fn metadata(&self) -> SystemMetadata {
        SystemMetadata {
            name: crate::APP_NAME.to_string(),
            version: crate::VERSION.to_string(),
            constraints: ["area", "budget", "climate", "priority"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            metrics: [
                "energyEfficiency",
                "waterEfficiency",
                "carbonFootprint",
                "sustainabilityIndex",
                "estimatedCost",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            climates: Climate::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            priorities: Priority::ALL.iter().map(|p| p.as_str().to_string()).collect(),
            strategies: DesignStrategy::BATCH_ORDER
                .iter()
                .map(|s| s.title().to_string())
                .collect(),
            designs_per_generation: DesignStrategy::BATCH_ORDER.len(),
            capabilities: [
                "Constraint-aware design generation",
                "Sustainability impact evaluation",
                "Priority-weighted design ranking",
                "Historical similarity recommendations",
                "ML cost prediction (LinearRegression)",
                "CSV/JSON export",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}
