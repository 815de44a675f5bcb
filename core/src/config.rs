//! Pool configuration.
//!
//! `PoolConfigFile` is the loose, serde-facing shape (every field has a
//! default). `PoolConfig` is the validated, immutable form the engine runs
//! on; the only way to obtain one is through `PoolConfig::new`, so an
//! invalid ratio or range never reaches the simulation.

use crate::{
    error::{PoolError, PoolResult},
    types::{Tier, Tranche},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

const RATIO_EPSILON: f64 = 1e-6;

/// Rate and capital-share schedule for the three tiers of one tranche.
/// Arrays are indexed by `Tier::index()`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    pub rates: [f64; 3],
    pub capital_shares: [f64; 3],
}

impl TierConfig {
    pub fn new(rates: [f64; 3], capital_shares: [f64; 3]) -> PoolResult<Self> {
        let cfg = Self { rates, capital_shares };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn default_stable() -> Self {
        Self {
            rates: [0.34, 0.3825, 0.425],
            capital_shares: [0.30, 0.40, 0.30],
        }
    }

    pub fn default_growth() -> Self {
        Self {
            rates: [0.085, 0.10625, 0.1275],
            capital_shares: [0.30, 0.40, 0.30],
        }
    }

    fn validate(&self) -> PoolResult<()> {
        if self.rates.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(PoolError::config("tier rates must be finite and non-negative"));
        }
        if self.capital_shares.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(PoolError::config("tier capital shares must be finite and non-negative"));
        }
        let total: f64 = self.capital_shares.iter().sum();
        if (total - 1.0).abs() > RATIO_EPSILON {
            return Err(PoolError::config(format!(
                "tier capital shares must sum to 1.0, got {total}"
            )));
        }
        Ok(())
    }

    pub fn rate(&self, tier: Tier) -> f64 {
        self.rates[tier.index()]
    }

    pub fn share(&self, tier: Tier) -> f64 {
        self.capital_shares[tier.index()]
    }

    /// Capital-share-weighted average of the three tier rates.
    pub fn weighted_rate(&self) -> f64 {
        Tier::ALL.iter().map(|t| self.share(*t) * self.rate(*t)).sum()
    }

    /// Each tier's share of the tranche payout: share × rate, normalized.
    /// Falls back to equal thirds when every product is zero.
    pub fn payout_weights(&self) -> [f64; 3] {
        let raw = Tier::ALL.map(|t| self.share(t) * self.rate(t));
        let total: f64 = raw.iter().sum();
        if total > 0.0 {
            raw.map(|w| w / total)
        } else {
            [1.0 / 3.0; 3]
        }
    }
}

/// Referral program terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferralTerms {
    /// Fraction of pool capital that arrived through referrals.
    pub ratio: f64,
    pub upfront_bonus_stable: f64,
    pub upfront_bonus_growth: f64,
    /// Share of each investor payout owed to the referrer.
    pub ongoing_share_stable: f64,
    pub ongoing_share_growth: f64,
}

impl ReferralTerms {
    pub fn ongoing_share(&self, tranche: Tranche) -> f64 {
        match tranche {
            Tranche::Stable => self.ongoing_share_stable,
            Tranche::Growth => self.ongoing_share_growth,
        }
    }

    pub fn upfront_bonus(&self, tranche: Tranche) -> f64 {
        match tranche {
            Tranche::Stable => self.upfront_bonus_stable,
            Tranche::Growth => self.upfront_bonus_growth,
        }
    }
}

/// Token accounting after validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenTerms {
    pub price: f64,
    pub total: Option<f64>,
    pub stable: Option<f64>,
    pub growth: Option<f64>,
}

/// Serde-facing configuration. Missing fields fall back to the defaults
/// the pool was originally sized with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfigFile {
    pub pool_size: f64,
    pub stable_ratio: f64,
    pub growth_ratio: f64,
    pub traffic_budget: Option<f64>,
    pub start_date: String,
    pub cost_range: (f64, f64),
    pub target_multiplier: f64,
    pub volatility: f64,
    pub referral_ratio: f64,
    pub upfront_bonus_stable: f64,
    pub upfront_bonus_growth: f64,
    pub ongoing_share_stable: f64,
    pub ongoing_share_growth: f64,
    pub token_price: f64,
    pub total_tokens: Option<f64>,
    pub stable_tokens: Option<f64>,
    pub growth_tokens: Option<f64>,
    pub seed: u64,
    pub stable_tiers: TierConfig,
    pub growth_tiers: TierConfig,
}

impl Default for PoolConfigFile {
    fn default() -> Self {
        Self {
            pool_size: 35_000.0,
            stable_ratio: 0.6,
            growth_ratio: 0.4,
            traffic_budget: None,
            start_date: "2025-11-01".into(),
            cost_range: (55.0, 75.0),
            target_multiplier: 3.0,
            volatility: 0.15,
            referral_ratio: 0.0,
            upfront_bonus_stable: 0.03,
            upfront_bonus_growth: 0.03,
            ongoing_share_stable: 0.04,
            ongoing_share_growth: 0.15,
            token_price: 0.60,
            total_tokens: None,
            stable_tokens: None,
            growth_tokens: None,
            seed: 42,
            stable_tiers: TierConfig::default_stable(),
            growth_tiers: TierConfig::default_growth(),
        }
    }
}

impl PoolConfigFile {
    /// Read a JSON config file without validating it, so callers can
    /// apply overrides first.
    pub fn load(path: impl AsRef<Path>) -> PoolResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Validated, immutable pool configuration.
#[derive(Debug, Clone, Serialize)]
pub struct PoolConfig {
    pool_size: f64,
    stable_ratio: f64,
    growth_ratio: f64,
    traffic_budget: f64,
    start_date: NaiveDate,
    cost_min: f64,
    cost_max: f64,
    target_multiplier: f64,
    volatility: f64,
    referral: ReferralTerms,
    tokens: TokenTerms,
    seed: u64,
    stable_tiers: TierConfig,
    growth_tiers: TierConfig,
}

impl PoolConfig {
    pub fn new(file: PoolConfigFile) -> PoolResult<Self> {
        if !file.pool_size.is_finite() || file.pool_size <= 0.0 {
            return Err(PoolError::config("pool_size must be positive"));
        }
        let traffic_budget = file.traffic_budget.unwrap_or(file.pool_size);
        if !traffic_budget.is_finite() || traffic_budget <= 0.0 {
            return Err(PoolError::config("traffic_budget must be positive"));
        }

        let (cost_min, cost_max) = file.cost_range;
        if !cost_min.is_finite()
            || !cost_max.is_finite()
            || cost_min <= 0.0
            || cost_min >= cost_max
        {
            return Err(PoolError::config(format!(
                "invalid cost_range ({cost_min}, {cost_max}): need 0 < min < max"
            )));
        }
        if !file.target_multiplier.is_finite() || file.target_multiplier <= 0.0 {
            return Err(PoolError::config("target_multiplier must be positive"));
        }
        if !file.volatility.is_finite() || file.volatility < 0.0 {
            return Err(PoolError::config("volatility must be finite and non-negative"));
        }
        if !(0.0..=1.0).contains(&file.referral_ratio) {
            return Err(PoolError::config("referral_ratio must be within [0, 1]"));
        }
        let referral_terms = [
            file.upfront_bonus_stable,
            file.upfront_bonus_growth,
            file.ongoing_share_stable,
            file.ongoing_share_growth,
        ];
        if referral_terms.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(PoolError::config("referral bonuses and shares must be non-negative"));
        }
        if !file.token_price.is_finite() || file.token_price <= 0.0 {
            return Err(PoolError::config("token_price must be positive"));
        }

        let (stable_ratio, growth_ratio, tokens) = resolve_tranche_split(&file)?;

        file.stable_tiers.validate()?;
        file.growth_tiers.validate()?;

        let start_date = NaiveDate::parse_from_str(&file.start_date, "%Y-%m-%d").map_err(
            |source| PoolError::InvalidDate {
                value: file.start_date.clone(),
                source,
            },
        )?;

        Ok(Self {
            pool_size: file.pool_size,
            stable_ratio,
            growth_ratio,
            traffic_budget,
            start_date,
            cost_min,
            cost_max,
            target_multiplier: file.target_multiplier,
            volatility: file.volatility,
            referral: ReferralTerms {
                ratio: file.referral_ratio,
                upfront_bonus_stable: file.upfront_bonus_stable,
                upfront_bonus_growth: file.upfront_bonus_growth,
                ongoing_share_stable: file.ongoing_share_stable,
                ongoing_share_growth: file.ongoing_share_growth,
            },
            tokens,
            seed: file.seed,
            stable_tiers: file.stable_tiers,
            growth_tiers: file.growth_tiers,
        })
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> PoolResult<Self> {
        Self::new(PoolConfigFile::load(path)?)
    }

    /// Defaults with the given seed. Used by tests and the runner.
    pub fn default_with_seed(seed: u64) -> PoolResult<Self> {
        Self::new(PoolConfigFile {
            seed,
            ..PoolConfigFile::default()
        })
    }

    pub fn pool_size(&self) -> f64 {
        self.pool_size
    }

    pub fn traffic_budget(&self) -> f64 {
        self.traffic_budget
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn cost_range(&self) -> (f64, f64) {
        (self.cost_min, self.cost_max)
    }

    pub fn target_multiplier(&self) -> f64 {
        self.target_multiplier
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn referral(&self) -> &ReferralTerms {
        &self.referral
    }

    pub fn tokens(&self) -> &TokenTerms {
        &self.tokens
    }

    pub fn token_price(&self) -> f64 {
        self.tokens.price
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn ratio(&self, tranche: Tranche) -> f64 {
        match tranche {
            Tranche::Stable => self.stable_ratio,
            Tranche::Growth => self.growth_ratio,
        }
    }

    pub fn tiers(&self, tranche: Tranche) -> &TierConfig {
        match tranche {
            Tranche::Stable => &self.stable_tiers,
            Tranche::Growth => &self.growth_tiers,
        }
    }

    /// Capital committed to a tranche.
    pub fn tranche_capital(&self, tranche: Tranche) -> f64 {
        self.pool_size * self.ratio(tranche)
    }

    /// Capital committed to one tier of one tranche.
    pub fn tier_capital(&self, tranche: Tranche, tier: Tier) -> f64 {
        self.tranche_capital(tranche) * self.tiers(tranche).share(tier)
    }

    /// One-off referral bonuses paid out of the traffic budget.
    pub fn upfront_referral_cost(&self) -> f64 {
        let referred = self.pool_size * self.referral.ratio;
        Tranche::ALL
            .iter()
            .map(|t| referred * self.ratio(*t) * self.referral.upfront_bonus(*t))
            .sum()
    }

    pub fn effective_traffic_budget(&self) -> f64 {
        self.traffic_budget - self.upfront_referral_cost()
    }
}

/// Derive the tranche ratios, either directly from the file or from
/// absolute per-tranche token counts.
fn resolve_tranche_split(file: &PoolConfigFile) -> PoolResult<(f64, f64, TokenTerms)> {
    match (file.stable_tokens, file.growth_tokens) {
        (Some(stable), Some(growth)) => {
            let total = file.total_tokens.ok_or_else(|| {
                PoolError::config("total_tokens is required when tranche token counts are given")
            })?;
            if stable < 0.0 || growth < 0.0 {
                return Err(PoolError::config("tranche token counts must be non-negative"));
            }
            let allocated = stable + growth;
            if allocated > total {
                return Err(PoolError::config(format!(
                    "allocated tokens ({allocated}) exceed total tokens ({total})"
                )));
            }
            if allocated <= 0.0 {
                return Err(PoolError::config("tranche token counts must not both be zero"));
            }
            let stable_ratio = stable / allocated;
            let growth_ratio = growth / allocated;
            check_ratios(stable_ratio, growth_ratio)?;
            let tokens = TokenTerms {
                price: file.token_price,
                total: Some(total),
                stable: Some(stable),
                growth: Some(growth),
            };
            Ok((stable_ratio, growth_ratio, tokens))
        }
        (None, None) => {
            check_ratios(file.stable_ratio, file.growth_ratio)?;
            let tokens = TokenTerms {
                price: file.token_price,
                total: file.total_tokens,
                stable: file.total_tokens.map(|t| t * file.stable_ratio),
                growth: file.total_tokens.map(|t| t * file.growth_ratio),
            };
            Ok((file.stable_ratio, file.growth_ratio, tokens))
        }
        _ => Err(PoolError::config(
            "stable_tokens and growth_tokens must be given together",
        )),
    }
}

fn check_ratios(stable: f64, growth: f64) -> PoolResult<()> {
    let open_unit = |r: f64| r > 0.0 && r < 1.0;
    if !open_unit(stable) || !open_unit(growth) {
        return Err(PoolError::config(format!(
            "stable_ratio ({stable}) and growth_ratio ({growth}) must be in (0, 1)"
        )));
    }
    if ((stable + growth) - 1.0).abs() > RATIO_EPSILON {
        return Err(PoolError::config(format!(
            "stable_ratio + growth_ratio must equal 1.0, got {}",
            stable + growth
        )));
    }
    Ok(())
}
