//! RevShare pool engine: synthesizes a year of acquisition, deposit and
//! revenue telemetry for a two-tranche revenue-share pool and computes
//! watermark-gated investor payouts.

pub mod calibration;
pub mod cohort;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod payout;
pub mod records;
pub mod revenue;
pub mod rng;
pub mod schedule;
pub mod store;
pub mod tiers;
pub mod traffic;
pub mod types;
pub mod validator;
