// ==========================================
// 方案生成管线集成测试
// ==========================================
// 测试目标: 服务成功/失败/超时/报文错误时的来源与最优方案判定
// ==========================================

mod test_helpers;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use sustainable_design::engine::{
    DesignOrigin, DesignPipeline, GenerationRequest, ScoreBasis, ServiceError,
};
use sustainable_design::{Climate, ConstraintSet, DesignGenerator, Priority, RankingSource};
use test_helpers::{payload_with_rankings, StubBehavior, StubService};

fn request() -> GenerationRequest {
    let constraints = ConstraintSet::new(1200.0, 60.0, Climate::Temperate, Priority::Balanced)
        .expect("valid constraints");
    GenerationRequest::new(constraints, Some(7))
}

fn pipeline(behavior: StubBehavior) -> (Arc<StubService>, DesignPipeline) {
    let stub = Arc::new(StubService::new(behavior));
    let pipeline = DesignPipeline::new(stub.clone(), DesignGenerator::default()).with_seed(42);
    (stub, pipeline)
}

#[tokio::test]
async fn test_service_ranking_takes_precedence() {
    let (stub, pipeline) = pipeline(StubBehavior::Payload(payload_with_rankings(json!([
        {"id": 1, "ml_score": 95.0}
    ]))));

    let outcome = pipeline.run(&request()).await;

    assert_eq!(stub.calls(), 1);
    assert_eq!(outcome.origin, DesignOrigin::Service);
    assert_eq!(outcome.designs.len(), 3);
    // 方案 1 指数最低,但排名分 95 最高
    assert_eq!(outcome.best_design_id, Some(1));
    assert_eq!(outcome.best_score, Some(95.0));
    assert_eq!(outcome.score_basis, Some(ScoreBasis::Ranking));
    assert!(outcome.ranking_source.is_server_supplied());
}

#[tokio::test]
async fn test_partial_ranking_mixes_with_index() {
    // 方案 1 排名分 80 低于方案 0 的指数 90
    let (_stub, pipeline) = pipeline(StubBehavior::Payload(payload_with_rankings(json!([
        {"id": 1, "ml_score": 80.0}
    ]))));

    let outcome = pipeline.run(&request()).await;

    assert_eq!(outcome.origin, DesignOrigin::Service);
    assert_eq!(outcome.best_design_id, Some(0));
    assert_eq!(outcome.score_basis, Some(ScoreBasis::SustainabilityIndex));
}

#[tokio::test]
async fn test_non_array_ranking_degrades_to_index() {
    let (_stub, pipeline) = pipeline(StubBehavior::Payload(payload_with_rankings(json!({
        "1": 99.0
    }))));

    let outcome = pipeline.run(&request()).await;

    assert_eq!(outcome.origin, DesignOrigin::Service);
    assert_eq!(outcome.ranking_source, RankingSource::LocalHeuristic);
    assert_eq!(outcome.best_design_id, Some(0));
}

#[tokio::test]
async fn test_service_error_falls_back_to_local_generator() {
    let (stub, pipeline) = pipeline(StubBehavior::Fail(ServiceError::Status {
        status: 503,
        message: "unavailable".to_string(),
    }));

    let outcome = pipeline.run(&request()).await;

    assert_eq!(stub.calls(), 1);
    assert!(outcome.origin.is_fallback());
    assert_eq!(outcome.designs.len(), 3);
    assert_eq!(outcome.ranking_source, RankingSource::LocalHeuristic);
    assert!(outcome.recommendation.is_none());

    // 回落时按指数判定: 最优方案指数不低于任何其他方案
    let best = outcome.best_design().expect("best design");
    assert_eq!(outcome.score_basis, Some(ScoreBasis::SustainabilityIndex));
    for design in &outcome.designs {
        assert!(best.metrics.sustainability_index >= design.metrics.sustainability_index);
    }
}

#[tokio::test]
async fn test_malformed_payload_falls_back() {
    let (_stub, pipeline) = pipeline(StubBehavior::Payload("{\"designs\": 3}".to_string()));

    let outcome = pipeline.run(&request()).await;

    match &outcome.origin {
        DesignOrigin::LocalFallback { reason } => assert!(!reason.is_empty()),
        other => panic!("expected fallback, got {:?}", other),
    }
    assert!(outcome.best_design_id.is_some());
}

#[tokio::test]
async fn test_out_of_bound_metrics_fall_back() {
    let body = json!({
        "designs": [{
            "id": 0,
            "name": "Broken",
            "metrics": {
                "energyEfficiency": 140.0,
                "waterEfficiency": 60.0,
                "carbonFootprint": 10.0,
                "sustainabilityIndex": 70.0,
                "estimatedCost": 1000.0
            }
        }]
    })
    .to_string();
    let (_stub, pipeline) = pipeline(StubBehavior::Payload(body));

    let outcome = pipeline.run(&request()).await;

    assert!(outcome.origin.is_fallback());
    assert!(outcome.designs.iter().all(|d| d.name != "Broken"));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let (_stub, pipeline) = pipeline(StubBehavior::Slow(
        Duration::from_millis(500),
        payload_with_rankings(json!([{"id": 1, "ml_score": 95.0}])),
    ));
    let pipeline = pipeline.with_timeout(Duration::from_millis(20));

    let outcome = pipeline.run(&request()).await;

    match &outcome.origin {
        DesignOrigin::LocalFallback { reason } => assert!(reason.contains("20")),
        other => panic!("expected timeout fallback, got {:?}", other),
    }
    assert_eq!(outcome.ranking_source, RankingSource::LocalHeuristic);
}

#[tokio::test]
async fn test_seeded_fallback_is_reproducible() {
    let behavior = || StubBehavior::Fail(ServiceError::Transport("refused".to_string()));
    let (_a, first) = pipeline(behavior());
    let (_b, second) = pipeline(behavior());

    let req = request();
    let a = first.run(&req).await;
    let b = second.run(&req).await;

    assert_eq!(a.designs, b.designs);
    assert_eq!(a.best_design_id, b.best_design_id);
}
