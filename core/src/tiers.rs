//! Tier-level reporting.
//!
//! Two views that must not be merged:
//!   - `TierReturnCalculator`: lifetime returns per invested dollar. For the
//!     growth tranche `lifetime_total_value` adds back the full principal,
//!     which is returned in tokens.
//!   - `PerTokenReporter`: cash paid per token in each month.
//!     `period_cash_total` is cash only for both tranches.

use crate::{
    config::PoolConfig,
    records::{MonthlySummary, PerTokenRow},
    types::{Tier, Tranche},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StableTierReturn {
    pub tier:       Tier,
    pub invested:   f64,
    pub received:   f64,
    pub per_dollar: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthTierReturn {
    pub tier:                 Tier,
    pub invested:             f64,
    pub cash_received:        f64,
    pub tokens_returned:      f64,
    pub lifetime_total_value: f64,
    pub per_dollar_cash:      f64,
    pub per_dollar_total:     f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierReturns {
    pub multiplier: f64,
    pub stable:     Vec<StableTierReturn>,
    pub growth:     Vec<GrowthTierReturn>,
}

pub struct TierReturnCalculator<'a> {
    config: &'a PoolConfig,
}

impl<'a> TierReturnCalculator<'a> {
    pub fn new(config: &'a PoolConfig) -> Self {
        Self { config }
    }

    pub fn calculate(&self, final_cumulative_revenue: f64) -> TierReturns {
        let multiplier = final_cumulative_revenue / self.config.pool_size();
        let stable_tiers = self.config.tiers(Tranche::Stable);
        let growth_tiers = self.config.tiers(Tranche::Growth);

        let stable = Tier::ALL
            .iter()
            .map(|&tier| {
                let invested = self.config.tier_capital(Tranche::Stable, tier);
                let per_dollar = multiplier * stable_tiers.rate(tier);
                StableTierReturn {
                    tier,
                    invested,
                    received: invested * per_dollar,
                    per_dollar,
                }
            })
            .collect();

        let growth = Tier::ALL
            .iter()
            .map(|&tier| {
                let invested = self.config.tier_capital(Tranche::Growth, tier);
                let per_dollar_cash = multiplier * growth_tiers.rate(tier);
                let cash_received = invested * per_dollar_cash;
                GrowthTierReturn {
                    tier,
                    invested,
                    cash_received,
                    tokens_returned: invested,
                    lifetime_total_value: cash_received + invested,
                    per_dollar_cash,
                    per_dollar_total: per_dollar_cash + 1.0,
                }
            })
            .collect();

        TierReturns { multiplier, stable, growth }
    }
}

pub struct PerTokenReporter<'a> {
    config: &'a PoolConfig,
}

impl<'a> PerTokenReporter<'a> {
    pub fn new(config: &'a PoolConfig) -> Self {
        Self { config }
    }

    /// Cash per token for one tier in one month.
    fn cash_per_token(&self, month: &MonthlySummary, tranche: Tranche, tier: Tier) -> f64 {
        let invested = self.config.tier_capital(tranche, tier);
        if invested <= 0.0 {
            return 0.0;
        }
        let weights = self.config.tiers(tranche).payout_weights();
        let tier_cash = month.payout(tranche) * weights[tier.index()];
        tier_cash / invested * self.config.token_price()
    }

    /// One row per (month, tranche, tier); stable tiers before growth tiers.
    pub fn report(&self, months: &[MonthlySummary]) -> Vec<PerTokenRow> {
        let mut rows = Vec::with_capacity(months.len() * 6);
        for m in months {
            for tranche in Tranche::ALL {
                for tier in Tier::ALL {
                    let cash = self.cash_per_token(m, tranche, tier);
                    rows.push(PerTokenRow {
                        year: m.year,
                        month: m.month,
                        tranche,
                        tier,
                        cash_per_token: cash,
                        period_cash_total: cash,
                    });
                }
            }
        }
        rows
    }
}

/// Whether the stable tranche earns back its capital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakevenReport {
    pub final_revenue:              f64,
    pub final_spent:                f64,
    pub multiplier:                 f64,
    /// Multiplier at which stable-basic returns exactly its principal.
    pub min_multiplier_for_basic:   f64,
    pub is_breakeven:               bool,
    pub stable_capital:             f64,
    pub stable_total_payout:        f64,
    pub stable_return_pct:          f64,
    pub min_stable_return_pct:      f64,
    pub stable_meets_minimum:       bool,
}

impl BreakevenReport {
    pub fn compute(
        config: &PoolConfig,
        final_revenue: f64,
        final_spent: f64,
        stable_total_payout: f64,
    ) -> Self {
        let multiplier = final_revenue / config.pool_size();
        let basic_rate = config.tiers(Tranche::Stable).rate(Tier::Basic);
        let min_multiplier_for_basic = if basic_rate > 0.0 { 1.0 / basic_rate } else { f64::INFINITY };
        let stable_capital = config.tranche_capital(Tranche::Stable);
        let stable_return_pct = stable_total_payout / stable_capital * 100.0;
        let min_stable_return_pct = basic_rate * 100.0;

        Self {
            final_revenue,
            final_spent,
            multiplier,
            min_multiplier_for_basic,
            is_breakeven: multiplier >= min_multiplier_for_basic,
            stable_capital,
            stable_total_payout,
            stable_return_pct,
            min_stable_return_pct,
            stable_meets_minimum: stable_return_pct >= min_stable_return_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfigFile;
    use crate::records::fixtures::table;
    use crate::payout::WatermarkPayoutEngine;
    use chrono::NaiveDate;

    fn config_50k() -> PoolConfig {
        PoolConfig::new(PoolConfigFile {
            pool_size: 50_000.0,
            cost_range: (50.0, 60.0),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn stable_basic_at_three_x_returns_1_02() {
        let cfg = config_50k();
        let returns = TierReturnCalculator::new(&cfg).calculate(150_000.0);
        assert!((returns.multiplier - 3.0).abs() < 1e-12);

        let basic = &returns.stable[0];
        assert_eq!(basic.tier, Tier::Basic);
        assert!((basic.per_dollar - 1.02).abs() < 1e-12);
        // 50k × 0.6 × 0.3 = 9000 invested
        assert!((basic.invested - 9_000.0).abs() < 1e-9);
        assert!((basic.received - 9_180.0).abs() < 1e-9);
    }

    #[test]
    fn growth_total_adds_principal() {
        let cfg = config_50k();
        let returns = TierReturnCalculator::new(&cfg).calculate(150_000.0);
        for g in &returns.growth {
            assert_eq!(g.tokens_returned, g.invested);
            assert!((g.lifetime_total_value - (g.cash_received + g.invested)).abs() < 1e-9);
            assert!((g.per_dollar_total - g.per_dollar_cash - 1.0).abs() < 1e-12);
        }
        let premium = &returns.growth[2];
        assert!((premium.per_dollar_cash - 3.0 * 0.1275).abs() < 1e-12);
    }

    #[test]
    fn per_token_splits_monthly_payout_by_weight() {
        let cfg = config_50k();
        let engine = WatermarkPayoutEngine::new(&cfg);
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let daily = table(start, &[10_000.0; 31]);
        let months = engine.summarize(&daily).unwrap().months;

        let rows = PerTokenReporter::new(&cfg).report(&months);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].tranche, Tranche::Stable);
        assert_eq!(rows[3].tranche, Tranche::Growth);
        assert_eq!(rows[5].tier, Tier::Premium);

        // Re-aggregate the tier cash back into the tranche payout.
        for tranche in Tranche::ALL {
            let total: f64 = rows
                .iter()
                .filter(|r| r.tranche == tranche)
                .map(|r| r.cash_per_token / cfg.token_price() * cfg.tier_capital(tranche, r.tier))
                .sum();
            assert!((total - months[0].payout(tranche)).abs() < 1e-6);
        }
    }

    #[test]
    fn period_total_never_includes_token_principal() {
        let cfg = config_50k();
        let engine = WatermarkPayoutEngine::new(&cfg);
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        // Second month is a drawdown: no payout, so totals must be zero
        // even for growth tiers.
        let mut revenue = vec![1_000.0; 31];
        revenue.extend([-100.0; 28]);
        let months = engine.summarize(&table(start, &revenue)).unwrap().months;

        let rows = PerTokenReporter::new(&cfg).report(&months);
        for r in &rows {
            assert_eq!(r.period_cash_total, r.cash_per_token);
        }
        assert!(rows[6..].iter().all(|r| r.period_cash_total == 0.0));
    }

    #[test]
    fn breakeven_threshold_is_inverse_basic_rate() {
        let cfg = config_50k();
        let stable_capital = cfg.tranche_capital(Tranche::Stable);
        let report = BreakevenReport::compute(&cfg, 150_000.0, 50_000.0, stable_capital * 0.5);
        assert!((report.min_multiplier_for_basic - 1.0 / 0.34).abs() < 1e-12);
        assert!(report.is_breakeven);
        assert!((report.stable_return_pct - 50.0).abs() < 1e-9);
        assert!(report.stable_meets_minimum);

        let low = BreakevenReport::compute(&cfg, 100_000.0, 50_000.0, 0.0);
        assert!(!low.is_breakeven);
        assert!(!low.stable_meets_minimum);
    }
}
