//! End-to-end runs of the documented reference pool.

use revshare_core::{
    calibration::{Calibrator, MAX_ITERATIONS},
    config::{PoolConfig, PoolConfigFile},
    engine::PoolEngine,
    generator::PoolGenerator,
    types::{Tier, Tranche},
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn reference_config() -> PoolConfig {
    PoolConfig::new(PoolConfigFile {
        pool_size: 50_000.0,
        stable_ratio: 0.6,
        growth_ratio: 0.4,
        cost_range: (50.0, 60.0),
        target_multiplier: 3.0,
        volatility: 0.15,
        seed: 42,
        ..PoolConfigFile::default()
    })
    .expect("reference config")
}

#[test]
fn reference_pool_lands_near_target_and_validates() {
    init_logging();
    let mut engine = PoolEngine::new(reference_config());
    let output = engine.run().expect("engine run");

    assert!(output.validation.passed, "errors: {:?}", output.validation.errors);
    assert_eq!(output.run.daily.len(), 365);
    assert_eq!(output.run.monthly.len(), 12);

    assert!(
        output.calibration.converged,
        "reference pool did not converge: {:?}",
        output.calibration
    );
    assert!(output.calibration.iterations <= MAX_ITERATIONS);

    let multiplier = output.run.final_multiplier();
    assert!(
        (2.7..=3.3).contains(&multiplier),
        "reference pool ended at {multiplier:.3}x"
    );
    assert_eq!(multiplier, output.calibration.last_multiplier);
}

#[test]
fn calibration_either_converges_or_exhausts_iterations() {
    init_logging();
    for seed in [3, 42, 2_024] {
        let config = PoolConfig::new(PoolConfigFile { seed, ..PoolConfigFile::default() }).unwrap();
        let mut generator = PoolGenerator::new(config);
        let calibrator = Calibrator::new(0.1).expect("tolerance");
        let report = calibrator.calibrate(&mut generator).unwrap();
        let run = generator.generate().unwrap();

        let error = (run.final_multiplier() - 3.0) / 3.0;
        assert!(
            error.abs() <= 0.1 || report.iterations == MAX_ITERATIONS,
            "seed {seed}: error {error:.3} after {} iterations",
            report.iterations
        );
    }
}

#[test]
fn per_token_table_has_six_rows_per_month() {
    let output = PoolEngine::new(reference_config()).run().unwrap();
    assert_eq!(output.per_token.len(), output.run.monthly.len() * 6);

    let stable_basic_total: f64 = output
        .per_token
        .iter()
        .filter(|r| r.tier == Tier::Basic && r.tranche == Tranche::Stable)
        .map(|r| r.cash_per_token)
        .sum();
    assert!(stable_basic_total >= 0.0);
}

#[test]
fn stable_premium_out_earns_basic() {
    let output = PoolEngine::new(reference_config()).run().unwrap();
    let stable = &output.tier_returns.stable;
    assert_eq!(stable.len(), 3);
    assert_eq!(stable[0].tier, Tier::Basic);
    assert!(stable[2].per_dollar > stable[0].per_dollar);

    let growth = &output.tier_returns.growth;
    for t in growth {
        assert_eq!(t.tokens_returned, t.invested);
        assert!((t.per_dollar_total - t.per_dollar_cash - 1.0).abs() < 1e-12);
    }
}
