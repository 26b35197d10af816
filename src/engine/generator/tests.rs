use super::DesignGenerator;
use crate::domain::constraint::ConstraintSet;
use crate::domain::design::Design;
use crate::domain::types::{Climate, DesignStrategy, Priority};
use std::collections::HashSet;

// ==========================================
// 测试辅助函数
// ==========================================

fn constraints(area: f64, budget: f64, climate: Climate, priority: Priority) -> ConstraintSet {
    ConstraintSet::new(area, budget, climate, priority).unwrap()
}

fn mean(designs: &[Design], f: impl Fn(&Design) -> f64) -> f64 {
    designs.iter().map(f).sum::<f64>() / designs.len() as f64
}

// ==========================================
// 批次结构
// ==========================================

#[test]
fn test_batch_shape_and_uniqueness() {
    let generator = DesignGenerator::default();
    let designs = generator.generate_seeded(
        &constraints(1000.0, 50.0, Climate::Temperate, Priority::Balanced),
        7,
    );

    assert_eq!(designs.len(), DesignStrategy::BATCH_ORDER.len());

    let ids: HashSet<u32> = designs.iter().map(|d| d.id).collect();
    let names: HashSet<&str> = designs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(ids.len(), designs.len());
    assert_eq!(names.len(), designs.len());

    for (i, d) in designs.iter().enumerate() {
        assert_eq!(d.id, i as u32);
        assert_eq!(d.strategy, Some(DesignStrategy::BATCH_ORDER[i]));
        assert_eq!(d.features.len(), 4);
    }
}

#[test]
fn test_same_seed_reproduces_batch() {
    let generator = DesignGenerator::default();
    let c = constraints(850.0, 35.0, Climate::Humid, Priority::Water);
    assert_eq!(generator.generate_seeded(&c, 99), generator.generate_seeded(&c, 99));
}

#[test]
fn test_zero_jitter_ignores_rng() {
    let generator = DesignGenerator::default().with_jitter(0.0);
    let c = constraints(850.0, 35.0, Climate::Humid, Priority::Water);
    assert_eq!(generator.generate_seeded(&c, 1), generator.generate_seeded(&c, 2));
}

// ==========================================
// 指标边界
// ==========================================

#[test]
fn test_metric_bounds_over_grid() {
    let generator = DesignGenerator::default();
    let mut seed = 0u64;

    for climate in Climate::ALL {
        for priority in Priority::ALL {
            for &area in &[1.0, 300.0, 1200.0, 2000.0, 50_000.0] {
                for &budget in &[0.0, 25.0, 50.0, 100.0] {
                    seed += 1;
                    let designs =
                        generator.generate_seeded(&constraints(area, budget, climate, priority), seed);
                    assert!(!designs.is_empty());
                    for d in &designs {
                        let m = d.metrics;
                        assert!(m.check_bounds().is_ok(), "{:?} -> {:?}", d.name, m);
                        assert!(m.estimated_cost > 0.0);
                    }
                }
            }
        }
    }
}

// ==========================================
// 约束敏感性
// ==========================================

#[test]
fn test_priority_biases_focus_metric() {
    let generator = DesignGenerator::default();

    for climate in Climate::ALL {
        for seed in 0..20u64 {
            let base = constraints(1000.0, 50.0, climate, Priority::Energy);
            let energy = generator.generate_seeded(&base, seed);
            let water = generator.generate_seeded(&base.with_priority(Priority::Water), seed);
            let carbon = generator.generate_seeded(&base.with_priority(Priority::Carbon), seed);
            let cost = generator.generate_seeded(&base.with_priority(Priority::Cost), seed);

            let ee = |d: &Design| d.metrics.energy_efficiency;
            let we = |d: &Design| d.metrics.water_efficiency;
            let cf = |d: &Design| d.metrics.carbon_footprint;
            let ec = |d: &Design| d.metrics.estimated_cost;

            assert!(mean(&energy, ee) > mean(&water, ee));
            assert!(mean(&water, we) > mean(&energy, we));
            assert!(mean(&carbon, cf) < mean(&energy, cf));
            assert!(mean(&carbon, cf) < mean(&water, cf));
            assert!(mean(&cost, ec) < mean(&energy, ec));
        }
    }
}

#[test]
fn test_priority_bias_holds_across_different_seeds() {
    let generator = DesignGenerator::default();
    let c = constraints(1400.0, 70.0, Climate::Temperate, Priority::Energy);

    for seed in 0..50u64 {
        let energy = generator.generate_seeded(&c, seed);
        let water = generator.generate_seeded(&c.with_priority(Priority::Water), seed + 1000);
        assert!(
            mean(&energy, |d| d.metrics.energy_efficiency)
                > mean(&water, |d| d.metrics.energy_efficiency)
        );
    }
}

#[test]
fn test_climate_perturbs_baselines() {
    let generator = DesignGenerator::default().with_jitter(0.0);
    let temperate = generator.generate_seeded(
        &constraints(1000.0, 50.0, Climate::Temperate, Priority::Balanced),
        0,
    );
    let hot_arid = generator.generate_seeded(
        &constraints(1000.0, 50.0, Climate::HotArid, Priority::Balanced),
        0,
    );
    let cold = generator.generate_seeded(
        &constraints(1000.0, 50.0, Climate::Cold, Priority::Balanced),
        0,
    );

    assert!(
        mean(&hot_arid, |d| d.metrics.water_efficiency)
            < mean(&temperate, |d| d.metrics.water_efficiency)
    );
    assert!(
        mean(&cold, |d| d.metrics.energy_efficiency)
            < mean(&temperate, |d| d.metrics.energy_efficiency)
    );
}

#[test]
fn test_cost_scales_with_area_and_budget() {
    let generator = DesignGenerator::default();
    let max_cost = |area: f64, budget: f64, seed: u64| {
        generator
            .generate_seeded(&constraints(area, budget, Climate::Cold, Priority::Carbon), seed)
            .iter()
            .map(|d| d.metrics.estimated_cost)
            .fold(0.0, f64::max)
    };

    let mut prev = max_cost(900.0, 0.0, 3);
    for step in 1..=20 {
        let next = max_cost(900.0, step as f64 * 5.0, step);
        assert!(next >= prev, "budget {} lowered max cost", step * 5);
        prev = next;
    }

    assert!(max_cost(1800.0, 40.0, 1) > max_cost(900.0, 40.0, 1));
}

#[test]
fn test_zero_budget_is_completable_with_lower_index() {
    let generator = DesignGenerator::default().with_jitter(0.0);
    let zero = generator.generate_seeded(
        &constraints(1000.0, 0.0, Climate::Temperate, Priority::Energy),
        0,
    );
    let mid = generator.generate_seeded(
        &constraints(1000.0, 50.0, Climate::Temperate, Priority::Energy),
        0,
    );

    assert_eq!(zero.len(), mid.len());
    for (z, m) in zero.iter().zip(mid.iter()) {
        assert!(z.metrics.check_bounds().is_ok());
        assert!(z.metrics.sustainability_index < m.metrics.sustainability_index);
    }
}
