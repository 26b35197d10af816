// ==========================================
// 可持续设计方案引擎 - 引擎层
// ==========================================
// 职责: 约束处理、方案生成、评估、排名、最优判定、历史推荐、造价预测
// 红线: Engine 不拼 SQL, 不做 I/O（pipeline 仅经 DesignService Trait 访问外部）
// ==========================================

pub mod constraints;
pub mod cost_predictor;
pub mod evaluator;
pub mod generator;
pub mod pipeline;
pub mod ranker;
pub mod recommender;
pub mod resolver;
pub mod service;

// 重导出核心引擎
pub use constraints::{AreaClass, ClimateLoad, ConstraintEngine, LoadLevel, ProcessedConstraints};
pub use cost_predictor::{CostPrediction, CostPredictor, PredictorModel};
pub use evaluator::{DesignEvaluation, RawMetrics, RuleBasedRank, SustainabilityEvaluator};
pub use generator::DesignGenerator;
pub use pipeline::{DesignOrigin, DesignPipeline, PipelineOutcome};
pub use ranker::DesignRanker;
pub use recommender::HistoricalRecommender;
pub use resolver::{BestDesignResolver, Resolution, ScoreBasis};
pub use service::{
    DesignService, GenerationRequest, GenerationResponse, LocalDesignService, ServiceError,
};
