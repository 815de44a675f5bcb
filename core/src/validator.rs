//! Post-hoc invariant checks over a finished run.
//!
//! Errors mean the run must not be exported. Warnings are informational
//! and travel alongside a passing report.

use crate::{
    generator::PoolRun,
    tiers::TierReturns,
};
use serde::{Deserialize, Serialize};

pub const MULTIPLIER_BOUNDS: (f64, f64) = (1.0, 6.0);

/// Payouts may exceed peak revenue by this factor before it is an error;
/// the slack absorbs floating-point accumulation.
pub const PAYOUT_TOLERANCE: f64 = 1.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed:           bool,
    pub errors:           Vec<String>,
    pub warnings:         Vec<String>,
    pub final_multiplier: f64,
}

pub struct Validator;

impl Validator {
    pub fn validate(run: &PoolRun, tiers: &TierReturns) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let final_multiplier = run.final_multiplier();

        let (lo, hi) = MULTIPLIER_BOUNDS;
        if !(lo..=hi).contains(&final_multiplier) {
            errors.push(format!("Revenue multiplier out of range: {final_multiplier:.2}"));
        }

        if let Some(d) = run.daily.iter().find(|d| d.active_population < 0) {
            errors.push(format!(
                "Negative active population on day {}: {}",
                d.day, d.active_population
            ));
        }

        let final_revenue = run.final_cumulative_revenue();
        let max_revenue = run.max_cumulative_revenue();
        let total_payouts = run.total_payouts();
        if total_payouts > max_revenue * PAYOUT_TOLERANCE {
            errors.push(format!(
                "Payouts significantly exceed maximum revenue: payouts=${total_payouts:.2}, max_revenue=${max_revenue:.2}"
            ));
        } else if final_revenue > 0.0 && total_payouts >= final_revenue {
            warnings.push(format!(
                "Payouts exceed final revenue: payouts=${total_payouts:.2}, final_revenue=${final_revenue:.2}"
            ));
        }

        for t in &tiers.stable {
            if t.per_dollar < 1.0 {
                warnings.push(format!(
                    "Stable {} returns {:.1}% (LOSS)",
                    t.tier,
                    t.per_dollar * 100.0
                ));
            }
        }
        for t in &tiers.growth {
            if t.per_dollar_cash < 0.0 {
                warnings.push(format!(
                    "Growth {} cash returns {:.1}% (LOSS)",
                    t.tier,
                    t.per_dollar_cash * 100.0
                ));
            }
        }

        for e in &errors {
            log::error!("validation: {e}");
        }
        for w in &warnings {
            log::warn!("validation: {w}");
        }

        ValidationReport {
            passed: errors.is_empty(),
            errors,
            warnings,
            final_multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{PoolConfig, PoolConfigFile},
        payout::{HighWatermark, WatermarkPayoutEngine},
        records::fixtures::table,
        tiers::TierReturnCalculator,
    };
    use chrono::NaiveDate;

    fn cfg() -> PoolConfig {
        PoolConfig::new(PoolConfigFile { pool_size: 1_000.0, ..Default::default() }).unwrap()
    }

    fn run_from(revenue: &[f64], cfg: &PoolConfig) -> PoolRun {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let mut daily = table(start, revenue);
        for d in &mut daily {
            d.multiplier = d.cumulative_revenue / cfg.pool_size();
        }
        let engine = WatermarkPayoutEngine::new(cfg);
        let fold = engine.summarize(&daily).unwrap();
        engine.distribute(&mut daily, &fold.months);
        PoolRun { daily, monthly: fold.months, watermark: fold.watermark }
    }

    fn validate(run: &PoolRun, cfg: &PoolConfig) -> ValidationReport {
        let tiers = TierReturnCalculator::new(cfg).calculate(run.final_cumulative_revenue());
        Validator::validate(run, &tiers)
    }

    #[test]
    fn healthy_run_passes() {
        let cfg = cfg();
        // 3.1x over January.
        let run = run_from(&[100.0; 31], &cfg);
        let report = validate(&run, &cfg);
        assert!(report.passed, "{:?}", report.errors);
        assert!((report.final_multiplier - 3.1).abs() < 1e-9);
        // Stable tiers at 3.1x all clear 1.0.
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn multiplier_out_of_bounds_fails() {
        let cfg = cfg();
        let report = validate(&run_from(&[10.0; 31], &cfg), &cfg);
        assert!(!report.passed);
        assert!(report.errors[0].contains("out of range"));
        // 0.31x leaves every stable tier below 100%.
        assert_eq!(report.warnings.len(), 3);
    }

    #[test]
    fn negative_population_fails() {
        let cfg = cfg();
        let mut run = run_from(&[100.0; 31], &cfg);
        run.daily[4].active_population = -1;
        let report = validate(&run, &cfg);
        assert!(!report.passed);
        assert!(report.errors.iter().any(|e| e.contains("Negative active population")));
    }

    #[test]
    fn payouts_beyond_peak_revenue_fail() {
        let cfg = cfg();
        let mut run = run_from(&[100.0; 31], &cfg);
        let peak = run.max_cumulative_revenue();
        run.daily.last_mut().unwrap().cumulative_stable = peak * 1.2;
        let report = validate(&run, &cfg);
        assert!(!report.passed);
        assert!(report.errors.iter().any(|e| e.contains("exceed maximum revenue")));
    }

    #[test]
    fn payouts_above_final_but_within_peak_only_warn() {
        let cfg = cfg();
        // Peak 3100 in January, then a February drawdown to 1500.
        let mut revenue = vec![100.0; 31];
        revenue.extend(std::iter::repeat(-1_600.0 / 28.0).take(28));
        let mut run = run_from(&revenue, &cfg);
        let last = run.daily.last_mut().unwrap();
        last.cumulative_stable = 1_400.0;
        last.cumulative_growth = 200.0;

        let report = validate(&run, &cfg);
        assert!(report.passed, "{:?}", report.errors);
        assert!(report.warnings.iter().any(|w| w.contains("exceed final revenue")));
        assert_eq!(run.watermark, HighWatermark::zero().advance(run.daily[30].cumulative_revenue).0);
    }
}
