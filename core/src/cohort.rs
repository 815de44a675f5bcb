//! Cohort model: expands daily acquisition cohorts into active
//! population and deposit volume for a given simulation day.

use crate::{
    rng::PoolRng,
    schedule::{seasonality, AVG_DEPOSIT, RETENTION},
    traffic::TrafficSchedule,
    types::{Day, ACQUISITION_DAYS},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Multiplicative jitter on average deposit.
const DEPOSIT_JITTER: f64 = 0.15;

/// Scale knobs the calibrator tunes. 1.0 means the untouched curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CohortScales {
    pub deposit: f64,
    pub retention: f64,
    pub cost: f64,
}

impl Default for CohortScales {
    fn default() -> Self {
        Self {
            deposit: 1.0,
            retention: 1.0,
            cost: 1.0,
        }
    }
}

/// Activity of all live cohorts on one day.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CohortActivity {
    pub active: u64,
    pub deposits: f64,
}

impl CohortActivity {
    pub fn avg_deposit(&self) -> f64 {
        if self.active > 0 {
            self.deposits / self.active as f64
        } else {
            0.0
        }
    }
}

pub struct CohortModel {
    scales: CohortScales,
}

impl CohortModel {
    pub fn new(scales: CohortScales) -> Self {
        Self { scales }
    }

    fn retention(&self, age: u32, rng: &mut PoolRng) -> f64 {
        let band = RETENTION.lookup(age);
        let delta = rng.uniform(-band.jitter, band.jitter);
        (band.base * self.scales.retention + delta).clamp(0.0, 1.0)
    }

    fn avg_deposit(&self, age: u32, date: NaiveDate, rng: &mut PoolRng) -> f64 {
        let base = AVG_DEPOSIT.lookup(age) * self.scales.deposit;
        let jittered = base * rng.uniform(1.0 - DEPOSIT_JITTER, 1.0 + DEPOSIT_JITTER);
        jittered * seasonality(date)
    }

    /// Sum every cohort born on days 1..=min(day, 30).
    pub fn activity(
        &self,
        day: Day,
        date: NaiveDate,
        traffic: &TrafficSchedule,
        rng: &mut PoolRng,
    ) -> CohortActivity {
        let mut out = CohortActivity::default();
        for birth in 1..=day.min(ACQUISITION_DAYS) {
            let age = day - birth + 1;
            let size = traffic.new_customers(birth);
            let active = (size as f64 * self.retention(age, rng)).round() as u64;
            if active == 0 {
                continue;
            }
            out.active += active;
            out.deposits += active as f64 * self.avg_deposit(age, date, rng);
        }
        out
    }
}
