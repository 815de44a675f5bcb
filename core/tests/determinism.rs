//! Same config, same seed: every table must come out identical.
//! A divergence means something is drawing outside the PoolRng stream.

use revshare_core::{
    config::PoolConfig,
    engine::{PoolEngine, PoolOutput},
    generator::PoolGenerator,
    payout::WatermarkPayoutEngine,
    rng::PoolRng,
};

fn run(seed: u64) -> PoolOutput {
    let config = PoolConfig::default_with_seed(seed).expect("default config");
    PoolEngine::new(config).run().expect("engine run")
}

#[test]
fn same_seed_produces_identical_output() {
    const SEED: u64 = 0xDEAD_BEEF_CAFE_1234;

    let a = run(SEED);
    let b = run(SEED);

    assert_eq!(a.run.daily.len(), b.run.daily.len());
    for (x, y) in a.run.daily.iter().zip(&b.run.daily) {
        assert_eq!(x, y, "day {} diverged", x.day);
    }
    assert_eq!(a, b);

    let json_a = serde_json::to_string(&a).expect("serialize");
    let json_b = serde_json::to_string(&b).expect("serialize");
    assert_eq!(json_a, json_b, "serialized output differs");
}

#[test]
fn injected_stream_matches_config_seed() {
    let config = PoolConfig::default_with_seed(42).unwrap();
    let seeded = PoolEngine::new(config.clone()).run().unwrap();
    let injected = PoolEngine::with_rng(config.clone(), PoolRng::new(42)).run().unwrap();
    assert_eq!(seeded, injected);

    let other = PoolEngine::with_rng(config, PoolRng::new(43)).run().unwrap();
    assert_eq!(other.seed, 43);
    assert_ne!(seeded.run.daily, other.run.daily);
}

#[test]
fn different_seeds_diverge() {
    let a = run(1);
    let b = run(2);
    assert_ne!(
        a.run.final_cumulative_revenue(),
        b.run.final_cumulative_revenue(),
        "distinct seeds should not replay the same series"
    );
}

#[test]
fn summarize_is_idempotent_on_a_finished_run() {
    let config = PoolConfig::default_with_seed(42).unwrap();
    let mut generator = PoolGenerator::new(config.clone());
    let run = generator.generate().unwrap();

    let engine = WatermarkPayoutEngine::new(&config);
    let first = engine.summarize(&run.daily).unwrap();
    let second = engine.summarize(&run.daily).unwrap();

    assert_eq!(first.months, second.months);
    assert_eq!(first.months, run.monthly);
    assert_eq!(first.watermark, run.watermark);
}
