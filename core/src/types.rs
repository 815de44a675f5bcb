//! Shared primitive types used across the entire pool engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A simulation day index. Day 1 is the pool start date.
pub type Day = u32;

/// Number of days in one generated series.
pub const SERIES_DAYS: Day = 365;

/// Number of days that receive acquisition spend.
pub const ACQUISITION_DAYS: Day = 30;

/// One of the two investment pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tranche {
    Stable,
    Growth,
}

impl Tranche {
    pub const ALL: [Tranche; 2] = [Tranche::Stable, Tranche::Growth];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Growth => "growth",
        }
    }
}

impl fmt::Display for Tranche {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A sub-allocation within a tranche.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Basic,
    Advanced,
    Premium,
}

impl Tier {
    /// Fixed reporting order. Index positions match `TierConfig` arrays.
    pub const ALL: [Tier; 3] = [Tier::Basic, Tier::Advanced, Tier::Premium];

    pub fn index(&self) -> usize {
        match self {
            Self::Basic => 0,
            Self::Advanced => 1,
            Self::Premium => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
            Self::Premium => "premium",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
