// ==========================================
// 最优方案判定集成测试
// ==========================================
// 测试目标: 服务端排名优先、部分排名、平局与降级规则
// ==========================================

mod test_helpers;

use serde_json::json;
use sustainable_design::engine::ScoreBasis;
use sustainable_design::{BestDesignResolver, RankingEntry, RankingSource};
use test_helpers::{design_with_index, sample_batch};

#[test]
fn test_ranking_overrides_index() {
    let designs = sample_batch();
    let source = RankingSource::from_json(&json!([{"id": 1, "ml_score": 95}]));

    let resolution = BestDesignResolver::new()
        .resolve_with_reason(&designs, &source)
        .expect("resolution");

    assert_eq!(resolution.design_id(), 1);
    assert_eq!(resolution.basis, ScoreBasis::Ranking);
    assert_eq!(resolution.basis.as_str(), "ranking");
}

#[test]
fn test_missing_or_malformed_ranking_uses_index() {
    let designs = sample_batch();
    let resolver = BestDesignResolver::new();

    let sources = [
        RankingSource::LocalHeuristic,
        RankingSource::from_json(&json!(null)),
        RankingSource::from_json(&json!([])),
        RankingSource::from_json(&json!("ranked")),
        RankingSource::from_json(&json!([{"id": "one", "ml_score": 99}])),
        RankingSource::from_optional(None),
    ];

    for source in &sources {
        assert_eq!(resolver.resolve(&designs, source).map(|d| d.id), Some(0));
    }
}

#[test]
fn test_tie_keeps_first_in_batch_order() {
    let designs = vec![
        design_with_index(0, "A", 75.0),
        design_with_index(1, "B", 75.0),
    ];
    let best = BestDesignResolver::new().resolve(&designs, &RankingSource::LocalHeuristic);
    assert_eq!(best.map(|d| d.id), Some(0));

    let source = RankingSource::from_entries(vec![
        RankingEntry { id: 1, ml_score: 88.0 },
        RankingEntry { id: 0, ml_score: 88.0 },
    ]);
    let best = BestDesignResolver::new().resolve(&designs, &source);
    assert_eq!(best.map(|d| d.id), Some(0));
}

#[test]
fn test_empty_batch_has_no_best_design() {
    let source = RankingSource::from_json(&json!([{"id": 0, "ml_score": 50}]));
    assert!(BestDesignResolver::new().resolve(&[], &source).is_none());
}
