//! Traffic scheduler: spreads the acquisition budget over the first
//! 30 days and converts each day's spend into new customers.

use crate::{
    config::PoolConfig,
    error::PoolResult,
    rng::PoolRng,
    types::{Day, ACQUISITION_DAYS},
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Concentration of the Dirichlet draw. 2.0 gives uneven but not
/// degenerate day-to-day spend.
const SPEND_CONCENTRATION: f64 = 2.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficDay {
    pub day: Day,
    pub date: NaiveDate,
    pub spend: f64,
    pub cost: f64,
    pub new_customers: u64,
    pub cumulative_spend: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrafficSchedule {
    days: Vec<TrafficDay>,
}

impl TrafficSchedule {
    pub fn days(&self) -> &[TrafficDay] {
        &self.days
    }

    /// Row for `day`, or None past the acquisition window.
    pub fn get(&self, day: Day) -> Option<&TrafficDay> {
        day.checked_sub(1).and_then(|i| self.days.get(i as usize))
    }

    pub fn new_customers(&self, day: Day) -> u64 {
        self.get(day).map_or(0, |d| d.new_customers)
    }

    pub fn spend(&self, day: Day) -> f64 {
        self.get(day).map_or(0.0, |d| d.spend)
    }

    pub fn total_spend(&self) -> f64 {
        self.days.last().map_or(0.0, |d| d.cumulative_spend)
    }
}

pub struct TrafficScheduler<'a> {
    config: &'a PoolConfig,
}

impl<'a> TrafficScheduler<'a> {
    pub fn new(config: &'a PoolConfig) -> Self {
        Self { config }
    }

    /// Draw a fresh 30-day schedule. `cost_scale` stretches the
    /// configured acquisition-cost range.
    pub fn schedule(&self, cost_scale: f64, rng: &mut PoolRng) -> PoolResult<TrafficSchedule> {
        let budget = self.config.pool_size();
        let weights = rng.dirichlet(SPEND_CONCENTRATION, ACQUISITION_DAYS as usize)?;
        let (lo, hi) = self.config.cost_range();
        let (lo, hi) = (lo * cost_scale, hi * cost_scale);
        let costs: Vec<f64> = (0..ACQUISITION_DAYS).map(|_| rng.uniform(lo, hi)).collect();

        let start = self.config.start_date();
        let mut cumulative_spend = 0.0;
        let days = weights
            .iter()
            .zip(costs)
            .enumerate()
            .map(|(i, (w, cost))| {
                let spend = w * budget;
                cumulative_spend += spend;
                TrafficDay {
                    day: i as Day + 1,
                    date: start + Duration::days(i as i64),
                    spend,
                    cost,
                    new_customers: (spend / cost).round().max(0.0) as u64,
                    cumulative_spend,
                }
            })
            .collect();

        Ok(TrafficSchedule { days })
    }
}
