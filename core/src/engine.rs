//! Pool engine: the top-level entry point.
//!
//! Execution order for one independent run (fixed):
//!   1. Seed the stream once from the config
//!   2. Calibrate the cohort scales (stream continues across iterations)
//!   3. Generate the final series and monthly payouts
//!   4. Derive tier returns, per-token table and breakeven figures
//!   5. Validate

use crate::{
    calibration::{CalibrationReport, Calibrator},
    config::PoolConfig,
    error::PoolResult,
    generator::{PoolGenerator, PoolRun},
    records::PerTokenRow,
    rng::PoolRng,
    tiers::{BreakevenReport, PerTokenReporter, TierReturnCalculator, TierReturns},
    types::Tranche,
    validator::{ValidationReport, Validator},
};
use serde::{Deserialize, Serialize};

/// Every table and report produced by one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolOutput {
    pub seed:         u64,
    pub calibration:  CalibrationReport,
    pub run:          PoolRun,
    pub per_token:    Vec<PerTokenRow>,
    pub tier_returns: TierReturns,
    pub breakeven:    BreakevenReport,
    pub validation:   ValidationReport,
}

pub struct PoolEngine {
    generator:  PoolGenerator,
    calibrator: Calibrator,
}

impl PoolEngine {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            generator: PoolGenerator::new(config),
            calibrator: Calibrator::default(),
        }
    }

    /// Build an engine around an explicitly supplied stream.
    pub fn with_rng(config: PoolConfig, rng: PoolRng) -> Self {
        Self {
            generator: PoolGenerator::with_rng(config, rng),
            calibrator: Calibrator::default(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> PoolResult<Self> {
        self.calibrator = Calibrator::new(tolerance)?;
        Ok(self)
    }

    pub fn config(&self) -> &PoolConfig {
        self.generator.config()
    }

    /// Calibrate, generate and report.
    pub fn run(&mut self) -> PoolResult<PoolOutput> {
        let seed = self.generator.seed();
        log::info!(
            "pool run: seed={seed} pool_size={:.0} target={:.2}x",
            self.config().pool_size(),
            self.config().target_multiplier()
        );

        let calibration = self.calibrator.calibrate(&mut self.generator)?;
        let run = self.generator.generate()?;
        let output = self.report(seed, calibration, run);

        log::info!(
            "pool run complete: multiplier={:.3} passed={} warnings={}",
            output.validation.final_multiplier,
            output.validation.passed,
            output.validation.warnings.len()
        );
        Ok(output)
    }

    /// Derive every downstream table from a generated run.
    pub fn report(&self, seed: u64, calibration: CalibrationReport, run: PoolRun) -> PoolOutput {
        let config = self.config();
        let tier_returns = TierReturnCalculator::new(config).calculate(run.final_cumulative_revenue());
        let per_token = PerTokenReporter::new(config).report(&run.monthly);
        let final_spent = run.daily.last().map_or(0.0, |d| d.cumulative_traffic);
        let breakeven = BreakevenReport::compute(
            config,
            run.final_cumulative_revenue(),
            final_spent,
            run.total_payout(Tranche::Stable),
        );
        let validation = Validator::validate(&run, &tier_returns);

        PoolOutput {
            seed,
            calibration,
            run,
            per_token,
            tier_returns,
            breakeven,
            validation,
        }
    }
}
