//! Forward pipeline: traffic → cohorts → revenue → daily table, then
//! monthly watermark payouts back-distributed onto the days.

use crate::{
    cohort::{CohortModel, CohortScales},
    config::PoolConfig,
    error::PoolResult,
    payout::{HighWatermark, WatermarkPayoutEngine},
    records::{DailyRecord, MonthlySummary},
    revenue::RevenueSimulator,
    rng::PoolRng,
    traffic::TrafficScheduler,
    types::{Tranche, SERIES_DAYS},
};
use chrono::{Datelike, Duration};
use serde::{Deserialize, Serialize};

/// A complete generated series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolRun {
    pub daily:     Vec<DailyRecord>,
    pub monthly:   Vec<MonthlySummary>,
    pub watermark: HighWatermark,
}

impl PoolRun {
    pub fn final_cumulative_revenue(&self) -> f64 {
        self.daily.last().map_or(0.0, |d| d.cumulative_revenue)
    }

    pub fn final_multiplier(&self) -> f64 {
        self.daily.last().map_or(0.0, |d| d.multiplier)
    }

    pub fn max_cumulative_revenue(&self) -> f64 {
        self.daily
            .iter()
            .map(|d| d.cumulative_revenue)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Lifetime payout to a tranche, as distributed onto days.
    pub fn total_payout(&self, tranche: Tranche) -> f64 {
        self.daily.last().map_or(0.0, |d| match tranche {
            Tranche::Stable => d.cumulative_stable,
            Tranche::Growth => d.cumulative_growth,
        })
    }

    pub fn total_payouts(&self) -> f64 {
        Tranche::ALL.iter().map(|t| self.total_payout(*t)).sum()
    }
}

/// Owns the seeded stream and the calibration knobs for one pool.
pub struct PoolGenerator {
    config:  PoolConfig,
    rng:     PoolRng,
    scales:  CohortScales,
    revenue: RevenueSimulator,
}

impl PoolGenerator {
    /// Build a generator whose stream is seeded from the config.
    pub fn new(config: PoolConfig) -> Self {
        let rng = PoolRng::new(config.seed());
        Self::with_rng(config, rng)
    }

    /// Build a generator around an explicitly supplied stream.
    pub fn with_rng(config: PoolConfig, rng: PoolRng) -> Self {
        let revenue = RevenueSimulator::new(config.volatility());
        Self {
            config,
            rng,
            scales: CohortScales::default(),
            revenue,
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn scales(&self) -> CohortScales {
        self.scales
    }

    pub fn set_scales(&mut self, scales: CohortScales) {
        self.scales = scales;
    }

    /// Seed of the stream this generator draws from.
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Snapshot of the stream position.
    pub fn checkpoint(&self) -> PoolRng {
        self.rng.clone()
    }

    /// Move the stream back to a checkpoint taken on this generator.
    pub fn rewind(&mut self, checkpoint: PoolRng) {
        debug_assert_eq!(checkpoint.seed(), self.rng.seed());
        self.rng = checkpoint;
    }

    /// Generate the 365-day table without payout columns. Consumes the
    /// stream; calling it twice gives two different series.
    pub fn generate_series(&mut self) -> PoolResult<Vec<DailyRecord>> {
        let traffic =
            TrafficScheduler::new(&self.config).schedule(self.scales.cost, &mut self.rng)?;
        let cohorts = CohortModel::new(self.scales);
        self.revenue.reset();

        let start = self.config.start_date();
        let pool_size = self.config.pool_size();
        let effective_budget = self.config.effective_traffic_budget();

        let mut rows = Vec::with_capacity(SERIES_DAYS as usize);
        let mut cumulative_revenue = 0.0;
        let mut cumulative_traffic = 0.0;

        for day in 1..=SERIES_DAYS {
            let date = start + Duration::days(i64::from(day - 1));
            let activity = cohorts.activity(day, date, &traffic, &mut self.rng);
            let daily_revenue = self.revenue.daily_revenue(activity.deposits, &mut self.rng)?;
            cumulative_revenue += daily_revenue;

            let traffic_spend = traffic.spend(day);
            cumulative_traffic += traffic_spend;

            rows.push(DailyRecord {
                date,
                day,
                year: date.year(),
                month: date.month(),
                weekday: date.weekday().to_string(),
                new_customers: traffic.new_customers(day),
                active_population: activity.active as i64,
                avg_deposit: activity.avg_deposit(),
                total_deposits: activity.deposits,
                daily_revenue,
                cumulative_revenue,
                traffic_spend,
                cumulative_traffic,
                effective_traffic_budget: effective_budget,
                multiplier: cumulative_revenue / pool_size,
                stable_payout: 0.0,
                growth_payout: 0.0,
                cumulative_stable: 0.0,
                cumulative_growth: 0.0,
                stable_return_pct: 0.0,
                growth_return_pct: 0.0,
                daily_referral_cost: 0.0,
                cumulative_referral_cost: 0.0,
            });
        }

        log::debug!(
            "series generated: scales={:?} final_multiplier={:.3}",
            self.scales,
            cumulative_revenue / pool_size
        );
        Ok(rows)
    }

    /// Generate a full run: daily table with payouts plus monthly summary.
    pub fn generate(&mut self) -> PoolResult<PoolRun> {
        let mut daily = self.generate_series()?;
        let engine = WatermarkPayoutEngine::new(&self.config);

        let gated = engine.summarize(&daily)?;
        engine.distribute(&mut daily, &gated.months);

        // Second pass picks up the referral columns written by distribute.
        // Payouts are unchanged because each fold starts from a zero watermark.
        let fold = engine.summarize(&daily)?;
        debug_assert_eq!(fold.watermark, gated.watermark);

        Ok(PoolRun {
            daily,
            monthly: fold.months,
            watermark: fold.watermark,
        })
    }
}
