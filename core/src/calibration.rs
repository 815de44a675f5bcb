//! Calibrator — damped proportional controller over the cohort scales.
//!
//! Each iteration regenerates the whole series from the generator's
//! continuing stream, measures how far the final multiplier is from the
//! target, and nudges deposit, retention and cost scales. Hitting the
//! iteration cap is not an error; the caller inspects the report.
//!
//! On convergence the stream is rewound to where the converging iteration
//! started, so the next `generate()` replays exactly the accepted series.

use crate::{
    cohort::CohortScales,
    error::{PoolError, PoolResult},
    generator::PoolGenerator,
};
use serde::{Deserialize, Serialize};

pub const MAX_ITERATIONS: u32 = 40;
pub const DEFAULT_TOLERANCE: f64 = 0.1;

const STEP_BOUNDS: (f64, f64) = (0.02, 0.20);
const RETENTION_STEP: f64 = 0.6;
const COST_STEP: f64 = 0.5;

const DEPOSIT_SCALE_BOUNDS: (f64, f64) = (0.05, 2.0);
const RETENTION_SCALE_BOUNDS: (f64, f64) = (0.30, 1.0);
const COST_SCALE_BOUNDS: (f64, f64) = (0.60, 1.50);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub iterations:      u32,
    pub converged:       bool,
    /// Multiplier observed on the last generated series.
    pub last_multiplier: f64,
    pub last_error:      f64,
    pub scales:          CohortScales,
}

#[derive(Debug, Clone, Copy)]
pub struct Calibrator {
    tolerance:      f64,
    max_iterations: u32,
}

impl Default for Calibrator {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: MAX_ITERATIONS,
        }
    }
}

impl Calibrator {
    /// Tolerance is relative to the target and must be finite and positive.
    pub fn new(tolerance: f64) -> PoolResult<Self> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(PoolError::config(format!(
                "calibration tolerance must be positive, got {tolerance}"
            )));
        }
        Ok(Self {
            tolerance,
            ..Self::default()
        })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Tune `generator`'s scales in place toward its target multiplier.
    pub fn calibrate(&self, generator: &mut PoolGenerator) -> PoolResult<CalibrationReport> {
        let target = generator.config().target_multiplier();
        let pool_size = generator.config().pool_size();

        let mut prev_error: Option<f64> = None;
        let mut report = CalibrationReport {
            iterations: 0,
            converged: false,
            last_multiplier: 0.0,
            last_error: f64::NAN,
            scales: generator.scales(),
        };

        for iteration in 1..=self.max_iterations {
            let checkpoint = generator.checkpoint();
            let series = generator.generate_series()?;
            let observed = series.last().map_or(0.0, |d| d.cumulative_revenue) / pool_size;
            let error = (observed - target) / target;

            report.iterations = iteration;
            report.last_multiplier = observed;
            report.last_error = error;

            log::debug!(
                "calibration iter={iteration} observed={observed:.3} target={target:.3} error={error:+.4} scales={:?}",
                generator.scales()
            );

            if error.abs() < self.tolerance {
                report.converged = true;
                generator.rewind(checkpoint);
                break;
            }

            let mut scales = step(generator.scales(), error);
            if prev_error.is_some_and(|p| p * error < 0.0) {
                scales = damp(scales);
            }
            generator.set_scales(scales);
            prev_error = Some(error);
        }

        report.scales = generator.scales();
        if report.converged {
            log::info!(
                "calibrated in {} iterations: multiplier {:.3}",
                report.iterations,
                report.last_multiplier
            );
        } else {
            log::warn!(
                "calibration stopped after {} iterations at multiplier {:.3} (target {target:.3})",
                report.iterations,
                report.last_multiplier
            );
        }
        Ok(report)
    }
}

/// One bounded proportional step. Overshoot shrinks deposits and
/// retention and makes acquisition dearer; undershoot mirrors it.
fn step(scales: CohortScales, error: f64) -> CohortScales {
    let s = error.abs().clamp(STEP_BOUNDS.0, STEP_BOUNDS.1);
    let dir = if error > 0.0 { -1.0 } else { 1.0 };

    CohortScales {
        deposit: (scales.deposit * (1.0 + dir * s))
            .clamp(DEPOSIT_SCALE_BOUNDS.0, DEPOSIT_SCALE_BOUNDS.1),
        retention: (scales.retention * (1.0 + dir * s * RETENTION_STEP))
            .clamp(RETENTION_SCALE_BOUNDS.0, RETENTION_SCALE_BOUNDS.1),
        cost: (scales.cost * (1.0 - dir * s * COST_STEP))
            .clamp(COST_SCALE_BOUNDS.0, COST_SCALE_BOUNDS.1),
    }
}

/// Pull every scale halfway back to 1.0 after the error changes sign.
fn damp(scales: CohortScales) -> CohortScales {
    CohortScales {
        deposit: (scales.deposit + 1.0) / 2.0,
        retention: (scales.retention + 1.0) / 2.0,
        cost: (scales.cost + 1.0) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;

    #[test]
    fn overshoot_step_moves_each_knob_the_right_way() {
        let s = step(CohortScales::default(), 0.10);
        assert!((s.deposit - 0.90).abs() < 1e-12);
        assert!((s.retention - 0.94).abs() < 1e-12);
        assert!((s.cost - 1.05).abs() < 1e-12);
    }

    #[test]
    fn undershoot_step_is_mirrored_and_bounded() {
        // |error| = 0.5 is capped at 0.2
        let s = step(CohortScales::default(), -0.5);
        assert!((s.deposit - 1.20).abs() < 1e-12);
        // Retention is capped at 1.0
        assert_eq!(s.retention, 1.0);
        assert!((s.cost - 0.90).abs() < 1e-12);
    }

    #[test]
    fn tiny_error_still_takes_minimum_step() {
        let s = step(CohortScales::default(), 0.001);
        assert!((s.deposit - 0.98).abs() < 1e-12);
    }

    #[test]
    fn scales_clamp_to_bounds() {
        let mut s = CohortScales::default();
        for _ in 0..100 {
            s = step(s, 5.0);
        }
        assert_eq!(s.deposit, 0.05);
        assert_eq!(s.retention, 0.30);
        assert_eq!(s.cost, 1.50);
    }

    #[test]
    fn damping_averages_with_one() {
        let d = damp(CohortScales { deposit: 0.5, retention: 0.75, cost: 1.5 });
        assert_eq!(d, CohortScales { deposit: 0.75, retention: 0.875, cost: 1.25 });
    }

    #[test]
    fn tolerance_must_be_positive_and_finite() {
        assert!(Calibrator::new(0.0).is_err());
        assert!(Calibrator::new(-0.1).is_err());
        assert!(Calibrator::new(f64::NAN).is_err());
        assert!(Calibrator::new(f64::INFINITY).is_err());
        assert_eq!(Calibrator::new(0.05).unwrap().tolerance(), 0.05);
        assert_eq!(Calibrator::default().tolerance(), DEFAULT_TOLERANCE);
    }

    #[test]
    fn unreachable_target_stops_at_cap() {
        let file = crate::config::PoolConfigFile {
            target_multiplier: 500.0,
            ..Default::default()
        };
        let mut gen = PoolGenerator::new(PoolConfig::new(file).unwrap());
        let report = Calibrator::default().calibrate(&mut gen).unwrap();
        assert!(!report.converged);
        assert_eq!(report.iterations, MAX_ITERATIONS);
        assert_eq!(report.scales, gen.scales());
    }

    #[test]
    fn converges_or_exhausts_iterations() {
        let mut gen = PoolGenerator::new(PoolConfig::default_with_seed(42).unwrap());
        let cal = Calibrator::new(0.1).unwrap();
        let report = cal.calibrate(&mut gen).unwrap();
        assert!(
            report.last_error.abs() <= cal.tolerance() || report.iterations == MAX_ITERATIONS,
            "{report:?}"
        );
        assert_eq!(report.converged, report.last_error.abs() < cal.tolerance());
    }

    #[test]
    fn generation_after_convergence_replays_accepted_series() {
        let mut gen = PoolGenerator::new(PoolConfig::default_with_seed(42).unwrap());
        let report = Calibrator::new(0.1).unwrap().calibrate(&mut gen).unwrap();
        if report.converged {
            let run = gen.generate().unwrap();
            assert_eq!(run.final_multiplier(), report.last_multiplier);
        } else {
            assert_eq!(report.iterations, MAX_ITERATIONS);
        }
    }
}
