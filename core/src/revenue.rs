//! Revenue simulator: turns a day's deposits into signed house revenue.
//!
//! Order of operations per day (must not be reordered):
//!   1. base = deposits × U[3%, 6%] × Normal(1, volatility)
//!   2. negative-cluster state machine may force the sign negative
//!   3. an extreme event may then override whatever sign step 2 chose

use crate::{error::PoolResult, rng::PoolRng};

const TAKE_RATE: (f64, f64) = (0.03, 0.06);

const CLUSTER_START_P: f64 = 0.02;
const CLUSTER_LEN: (u32, u32) = (2, 4);
const CLUSTER_AMP: (f64, f64) = (1.2, 2.5);

const NEGATIVE_DAY_P: f64 = 0.15;
const NEGATIVE_DAY_AMP: (f64, f64) = (1.1, 2.0);

const EXTREME_P: f64 = 0.03;
const EXTREME_LOSS_P: f64 = 0.20;
const EXTREME_LOSS_AMP: (f64, f64) = (2.0, 5.0);
const EXTREME_WIN_AMP: (f64, f64) = (2.0, 4.0);

pub struct RevenueSimulator {
    volatility: f64,
    /// Days left in the current negative cluster.
    cluster_remaining: u32,
}

impl RevenueSimulator {
    pub fn new(volatility: f64) -> Self {
        Self {
            volatility,
            cluster_remaining: 0,
        }
    }

    /// Clear cluster state before a new series.
    pub fn reset(&mut self) {
        self.cluster_remaining = 0;
    }

    pub fn cluster_remaining(&self) -> u32 {
        self.cluster_remaining
    }

    pub fn daily_revenue(&mut self, deposits: f64, rng: &mut PoolRng) -> PoolResult<f64> {
        if deposits <= 0.0 {
            return Ok(0.0);
        }

        let take_rate = rng.uniform(TAKE_RATE.0, TAKE_RATE.1);
        let swing = rng.normal(1.0, self.volatility)?;
        let mut revenue = deposits * take_rate * swing;

        if self.cluster_remaining > 0 {
            revenue = -(revenue * rng.uniform(CLUSTER_AMP.0, CLUSTER_AMP.1)).abs();
            self.cluster_remaining -= 1;
        } else if rng.chance(CLUSTER_START_P) {
            self.cluster_remaining = rng.int_inclusive(CLUSTER_LEN.0, CLUSTER_LEN.1);
            revenue = -(revenue * rng.uniform(CLUSTER_AMP.0, CLUSTER_AMP.1)).abs();
        } else if rng.chance(NEGATIVE_DAY_P) {
            revenue = -(revenue * rng.uniform(NEGATIVE_DAY_AMP.0, NEGATIVE_DAY_AMP.1)).abs();
        }

        if rng.chance(EXTREME_P) {
            revenue = if rng.chance(EXTREME_LOSS_P) {
                -(revenue * rng.uniform(EXTREME_LOSS_AMP.0, EXTREME_LOSS_AMP.1)).abs()
            } else {
                (revenue * rng.uniform(EXTREME_WIN_AMP.0, EXTREME_WIN_AMP.1)).abs()
            };
        }

        Ok(revenue)
    }
}
