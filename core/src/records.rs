//! Output table rows. Everything downstream of the generator (the
//! runner, the export store, any dashboard) reads these and nothing else.

use crate::types::{Day, Tier, Tranche};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One simulated day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date:                     NaiveDate,
    pub day:                      Day,
    pub year:                     i32,
    pub month:                    u32,
    pub weekday:                  String,
    pub new_customers:            u64,
    pub active_population:        i64,
    pub avg_deposit:              f64,
    pub total_deposits:           f64,
    pub daily_revenue:            f64,
    pub cumulative_revenue:       f64,
    pub traffic_spend:            f64,
    pub cumulative_traffic:       f64,
    pub effective_traffic_budget: f64,
    pub multiplier:               f64,
    // Filled in by payout back-distribution.
    pub stable_payout:            f64,
    pub growth_payout:            f64,
    pub cumulative_stable:        f64,
    pub cumulative_growth:        f64,
    pub stable_return_pct:        f64,
    pub growth_return_pct:        f64,
    pub daily_referral_cost:      f64,
    pub cumulative_referral_cost: f64,
}

impl DailyRecord {
    pub fn payout(&self, tranche: Tranche) -> f64 {
        match tranche {
            Tranche::Stable => self.stable_payout,
            Tranche::Growth => self.growth_payout,
        }
    }
}

/// One calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub year:               i32,
    pub month:              u32,
    pub days:               u32,
    pub new_customers:      u64,
    pub active_population:  i64,
    pub total_deposits:     f64,
    pub revenue:            f64,
    pub traffic_spend:      f64,
    pub cumulative_revenue: f64,
    pub negative_days:      u32,
    /// Watermark level held going into this month.
    pub prior_watermark:    f64,
    pub stable_payout:      f64,
    pub growth_payout:      f64,
    pub new_high:           bool,
    pub referral_cost:      f64,
    pub capital_cost:       f64,
}

impl MonthlySummary {
    pub fn payout(&self, tranche: Tranche) -> f64 {
        match tranche {
            Tranche::Stable => self.stable_payout,
            Tranche::Growth => self.growth_payout,
        }
    }

    pub fn period(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// One (month, tranche, tier) row of the per-token report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerTokenRow {
    pub year:              i32,
    pub month:             u32,
    pub tranche:           Tranche,
    pub tier:              Tier,
    pub cash_per_token:    f64,
    /// Cash only. Token principal is never included here; see
    /// `GrowthTierReturn::lifetime_total_value` for the lifetime view.
    pub period_cash_total: f64,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::DailyRecord;
    use chrono::{Datelike, Duration, NaiveDate};

    /// Daily table with only dates and revenue populated.
    pub(crate) fn table(start: NaiveDate, revenue: &[f64]) -> Vec<DailyRecord> {
        let mut cum = 0.0;
        revenue
            .iter()
            .enumerate()
            .map(|(i, r)| {
                cum += r;
                let date = start + Duration::days(i as i64);
                DailyRecord {
                    date,
                    day: i as u32 + 1,
                    year: date.year(),
                    month: date.month(),
                    weekday: date.weekday().to_string(),
                    new_customers: 0,
                    active_population: 0,
                    avg_deposit: 0.0,
                    total_deposits: 0.0,
                    daily_revenue: *r,
                    cumulative_revenue: cum,
                    traffic_spend: 0.0,
                    cumulative_traffic: 0.0,
                    effective_traffic_budget: 0.0,
                    multiplier: 0.0,
                    stable_payout: 0.0,
                    growth_payout: 0.0,
                    cumulative_stable: 0.0,
                    cumulative_growth: 0.0,
                    stable_return_pct: 0.0,
                    growth_return_pct: 0.0,
                    daily_referral_cost: 0.0,
                    cumulative_referral_cost: 0.0,
                }
            })
            .collect()
    }
}
