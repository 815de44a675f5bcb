//! Watermark payout engine — monthly aggregation and carry gating.
//!
//! RULE: investors are only ever paid on cumulative revenue above the
//! highest level already paid on. The watermark is a value threaded
//! through the monthly fold and handed back with the result; every call
//! to `summarize` starts from `HighWatermark::zero()`, so summarizing the
//! same daily table twice always yields the same months.

use crate::{
    config::PoolConfig,
    error::{PoolError, PoolResult},
    records::{DailyRecord, MonthlySummary},
    types::Tranche,
};
use serde::{Deserialize, Serialize};

/// Highest cumulative revenue a payout has been made on.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HighWatermark {
    level: f64,
}

impl HighWatermark {
    pub fn zero() -> Self {
        Self { level: 0.0 }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Returns the raised watermark and the increment eligible for payout,
    /// or the unchanged watermark and None when no new high was set.
    pub fn advance(self, month_end_cumulative: f64) -> (Self, Option<f64>) {
        if month_end_cumulative > self.level {
            let increment = month_end_cumulative - self.level;
            (Self { level: month_end_cumulative }, Some(increment))
        } else {
            (self, None)
        }
    }
}

/// Result of one monthly fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFold {
    pub months:    Vec<MonthlySummary>,
    pub watermark: HighWatermark,
}

pub struct WatermarkPayoutEngine<'a> {
    config: &'a PoolConfig,
}

impl<'a> WatermarkPayoutEngine<'a> {
    pub fn new(config: &'a PoolConfig) -> Self {
        Self { config }
    }

    /// Payout per unit of revenue increment for a tranche.
    pub fn payout_rate(&self, tranche: Tranche) -> f64 {
        self.config.tiers(tranche).weighted_rate() * self.config.ratio(tranche)
    }

    /// Group the daily table into calendar months and gate payouts on
    /// new cumulative-revenue highs.
    pub fn summarize(&self, daily: &[DailyRecord]) -> PoolResult<MonthlyFold> {
        if daily.is_empty() {
            return Err(PoolError::EmptySeries);
        }

        let mut watermark = HighWatermark::zero();
        let mut months = Vec::new();

        for rows in month_slices(daily) {
            let mut m = aggregate(rows);
            m.prior_watermark = watermark.level();

            let (next, increment) = watermark.advance(m.cumulative_revenue);
            watermark = next;
            if let Some(inc) = increment {
                m.stable_payout = inc * self.payout_rate(Tranche::Stable);
                m.growth_payout = inc * self.payout_rate(Tranche::Growth);
                m.new_high = true;
            }

            log::debug!(
                "{} cum={:.2} watermark {:.2} -> {:.2} stable={:.2} growth={:.2}",
                m.period(),
                m.cumulative_revenue,
                m.prior_watermark,
                watermark.level(),
                m.stable_payout,
                m.growth_payout
            );
            months.push(m);
        }

        Ok(MonthlyFold { months, watermark })
    }

    /// Spread each month's payouts evenly over its positive-revenue days
    /// and fill in the cumulative, return and referral columns.
    ///
    /// A paying month without a single positive day pays nothing at daily
    /// granularity.
    pub fn distribute(&self, daily: &mut [DailyRecord], months: &[MonthlySummary]) {
        let stable_capital = self.config.tranche_capital(Tranche::Stable);
        let growth_capital = self.config.tranche_capital(Tranche::Growth);
        let referral = self.config.referral();

        let mut cumulative_stable = 0.0;
        let mut cumulative_growth = 0.0;
        let mut cumulative_referral = 0.0;

        for rows in month_slices_mut(daily) {
            let Some(summary) = months
                .iter()
                .find(|m| m.year == rows[0].year && m.month == rows[0].month)
            else {
                continue;
            };

            let positive_days = rows.iter().filter(|r| r.daily_revenue > 0.0).count();
            if positive_days == 0 && (summary.stable_payout > 0.0 || summary.growth_payout > 0.0) {
                log::warn!(
                    "{}: payout with no positive-revenue day is dropped at daily level",
                    summary.period()
                );
            }

            for row in rows.iter_mut() {
                let (stable, growth) = if row.daily_revenue > 0.0 {
                    let n = positive_days as f64;
                    (summary.stable_payout / n, summary.growth_payout / n)
                } else {
                    (0.0, 0.0)
                };

                cumulative_stable += stable;
                cumulative_growth += growth;

                let referral_cost = stable * referral.ratio * referral.ongoing_share(Tranche::Stable)
                    + growth * referral.ratio * referral.ongoing_share(Tranche::Growth);
                cumulative_referral += referral_cost;

                row.stable_payout = stable;
                row.growth_payout = growth;
                row.cumulative_stable = cumulative_stable;
                row.cumulative_growth = cumulative_growth;
                row.stable_return_pct = cumulative_stable / stable_capital * 100.0;
                row.growth_return_pct = cumulative_growth / growth_capital * 100.0;
                row.daily_referral_cost = referral_cost;
                row.cumulative_referral_cost = cumulative_referral;
            }
        }
    }
}

fn same_month(a: &DailyRecord, b: &DailyRecord) -> bool {
    a.year == b.year && a.month == b.month
}

fn month_slices(daily: &[DailyRecord]) -> impl Iterator<Item = &[DailyRecord]> {
    daily.chunk_by(same_month)
}

fn month_slices_mut(daily: &mut [DailyRecord]) -> impl Iterator<Item = &mut [DailyRecord]> {
    daily.chunk_by_mut(same_month)
}

/// Sum a month of daily rows. Payout fields are left at zero.
fn aggregate(rows: &[DailyRecord]) -> MonthlySummary {
    let first = &rows[0];
    let last = &rows[rows.len() - 1];
    let traffic_spend: f64 = rows.iter().map(|r| r.traffic_spend).sum();
    let referral_cost: f64 = rows.iter().map(|r| r.daily_referral_cost).sum();

    MonthlySummary {
        year:               first.year,
        month:              first.month,
        days:               rows.len() as u32,
        new_customers:      rows.iter().map(|r| r.new_customers).sum(),
        active_population:  rows.iter().map(|r| r.active_population).sum(),
        total_deposits:     rows.iter().map(|r| r.total_deposits).sum(),
        revenue:            rows.iter().map(|r| r.daily_revenue).sum(),
        traffic_spend,
        cumulative_revenue: last.cumulative_revenue,
        negative_days:      rows.iter().filter(|r| r.daily_revenue < 0.0).count() as u32,
        prior_watermark:    0.0,
        stable_payout:      0.0,
        growth_payout:      0.0,
        new_high:           false,
        referral_cost,
        capital_cost:       traffic_spend + referral_cost,
    }
}
