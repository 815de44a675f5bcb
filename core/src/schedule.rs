//! Piecewise lookup tables for cohort behaviour and calendar seasonality.
//!
//! These are pure data. Tuning a curve means editing a row here, never
//! touching the cohort model itself.

use chrono::{Datelike, NaiveDate};

/// Ordered, inclusive age ranges mapped to a value. Ages past the last
/// range resolve to the last row.
#[derive(Debug, Clone, Copy)]
pub struct AgeTable<T: Copy + 'static> {
    rows: &'static [(u32, u32, T)],
}

impl<T: Copy + 'static> AgeTable<T> {
    pub const fn new(rows: &'static [(u32, u32, T)]) -> Self {
        Self { rows }
    }

    pub fn lookup(&self, age: u32) -> T {
        // Rows are sorted and contiguous, so a binary search on the upper
        // bound lands on the first range that can still contain `age`.
        let idx = self.rows.partition_point(|(_, hi, _)| *hi < age);
        match self.rows.get(idx) {
            Some((lo, hi, v)) if *lo <= age && age <= *hi => *v,
            _ => self.rows[self.rows.len() - 1].2,
        }
    }
}

/// Base retention rate and the half-width of its uniform jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionBand {
    pub base: f64,
    pub jitter: f64,
}

const fn band(base: f64, jitter: f64) -> RetentionBand {
    RetentionBand { base, jitter }
}

pub static RETENTION: AgeTable<RetentionBand> = AgeTable::new(&[
    (1, 30, band(1.00, 0.00)),
    (31, 60, band(0.42, 0.03)),
    (61, 90, band(0.33, 0.03)),
    (91, 120, band(0.26, 0.02)),
    (121, 150, band(0.22, 0.02)),
    (151, 180, band(0.19, 0.02)),
    (181, 210, band(0.16, 0.02)),
    (211, 240, band(0.14, 0.02)),
    (241, 270, band(0.12, 0.02)),
    (271, 300, band(0.10, 0.015)),
    (301, 330, band(0.09, 0.015)),
    (331, 365, band(0.08, 0.01)),
]);

/// Average deposit per active customer, by cohort age in days.
pub static AVG_DEPOSIT: AgeTable<f64> = AgeTable::new(&[
    (1, 30, 23.0),
    (31, 60, 49.0),
    (61, 90, 66.0),
    (91, 120, 81.0),
    (121, 150, 91.0),
    (151, 180, 101.0),
    (181, 210, 108.0),
    (211, 240, 115.0),
    (241, 270, 121.0),
    (271, 300, 125.0),
    (301, 330, 129.0),
    (331, 365, 132.0),
]);

/// A calendar condition that, when met, scales that day's deposits.
#[derive(Debug, Clone, Copy)]
pub enum DateRule {
    /// Month (1-12) with an inclusive day-of-month window.
    MonthDays { month: u32, from: u32, to: u32 },
    /// Any day in one of the listed months.
    Months(&'static [u32]),
    /// Weekday numbered from Monday = 0.
    Weekdays(&'static [u32]),
    /// Inclusive day-of-month window in any month.
    DaysOfMonth { from: u32, to: u32 },
}

impl DateRule {
    pub fn matches(&self, date: NaiveDate) -> bool {
        let (m, d) = (date.month(), date.day());
        match *self {
            Self::MonthDays { month, from, to } => m == month && (from..=to).contains(&d),
            Self::Months(months) => months.contains(&m),
            Self::Weekdays(days) => days.contains(&date.weekday().num_days_from_monday()),
            Self::DaysOfMonth { from, to } => (from..=to).contains(&d),
        }
    }
}

pub static SEASONALITY: &[(DateRule, f64)] = &[
    // Holiday peaks
    (DateRule::MonthDays { month: 12, from: 20, to: 31 }, 1.18),
    (DateRule::MonthDays { month: 1, from: 1, to: 10 }, 1.15),
    (DateRule::MonthDays { month: 2, from: 14, to: 14 }, 1.08),
    // Mid-year tournaments, then summer
    (DateRule::Months(&[6, 7]), 1.12),
    (DateRule::Months(&[7, 8]), 1.06),
    // Autumn and late-winter dips
    (DateRule::Months(&[9]), 0.92),
    (DateRule::Months(&[2]), 0.94),
    (DateRule::Weekdays(&[5, 6]), 1.08),
    // Payday lift
    (DateRule::DaysOfMonth { from: 25, to: 28 }, 1.12),
];

/// Product of every seasonality rule matching `date`.
pub fn seasonality(date: NaiveDate) -> f64 {
    SEASONALITY
        .iter()
        .filter(|(rule, _)| rule.matches(date))
        .map(|(_, mult)| mult)
        .product()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn retention_lookup_hits_range_edges() {
        assert_eq!(RETENTION.lookup(1).base, 1.00);
        assert_eq!(RETENTION.lookup(30).base, 1.00);
        assert_eq!(RETENTION.lookup(31).base, 0.42);
        assert_eq!(RETENTION.lookup(365).base, 0.08);
    }

    #[test]
    fn ages_past_the_table_use_last_row() {
        assert_eq!(AVG_DEPOSIT.lookup(400), 132.0);
        assert_eq!(RETENTION.lookup(1_000).jitter, 0.01);
    }

    #[test]
    fn deposit_lookup_mid_range() {
        assert_eq!(AVG_DEPOSIT.lookup(100), 81.0);
        assert_eq!(AVG_DEPOSIT.lookup(151), 101.0);
    }

    #[test]
    fn plain_weekday_has_no_lift() {
        // Wednesday 2025-11-05
        assert_eq!(seasonality(ymd(2025, 11, 5)), 1.0);
    }

    #[test]
    fn rules_combine_multiplicatively() {
        // Saturday 2025-12-27: holiday, weekend and payday window
        let expected = 1.18 * 1.08 * 1.12;
        assert!((seasonality(ymd(2025, 12, 27)) - expected).abs() < 1e-12);

        // Valentine's day 2026 is a Saturday in February
        let expected = 1.08 * 0.94 * 1.08;
        assert!((seasonality(ymd(2026, 2, 14)) - expected).abs() < 1e-12);

        // July hits both summer rules
        let wednesday_july = ymd(2026, 7, 1);
        assert!((seasonality(wednesday_july) - 1.12 * 1.06).abs() < 1e-12);
    }
}
