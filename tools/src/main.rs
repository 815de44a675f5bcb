//! pool-runner: headless generator for RevShare pool telemetry.
//!
//! Usage:
//!   pool-runner --seed 42 --db pool.db
//!   pool-runner --config pool.json --tolerance 0.05 --json > run.json

use anyhow::{bail, Context, Result};
use revshare_core::{
    config::{PoolConfig, PoolConfigFile},
    engine::{PoolEngine, PoolOutput},
    store::PoolStore,
    types::Tranche,
};
use std::env;
use uuid::Uuid;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config_path = flag_value(&args, "--config");
    let seed: Option<u64> = flag_value(&args, "--seed").and_then(|s| s.parse().ok());
    let tolerance = parse_arg(&args, "--tolerance", 0.1f64);
    let db = flag_value(&args, "--db");
    let json = args.iter().any(|a| a == "--json");

    let mut file = match config_path {
        Some(path) => PoolConfigFile::load(path)
            .with_context(|| format!("Cannot load config {path}"))?,
        None => PoolConfigFile::default(),
    };
    if let Some(seed) = seed {
        file.seed = seed;
    }
    let config = PoolConfig::new(file)?;

    if !json {
        println!("RevShare Pool — pool-runner");
        println!("  seed:       {}", config.seed());
        println!("  pool size:  {:.0}", config.pool_size());
        println!("  target:     {:.2}x", config.target_multiplier());
        println!("  tolerance:  {tolerance}");
        println!("  db:         {}", db.unwrap_or("(none)"));
        println!();
    }

    let mut engine = PoolEngine::new(config).with_tolerance(tolerance)?;
    let output = engine.run()?;

    if !output.validation.passed {
        for e in &output.validation.errors {
            log::error!("{e}");
        }
        bail!("Validation failed: {}", output.validation.errors.join("; "));
    }

    if let Some(path) = db {
        export(path, engine.config(), &output)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(&output);
    }
    Ok(())
}

fn export(path: &str, config: &PoolConfig, output: &PoolOutput) -> Result<()> {
    let store = PoolStore::open(path)?;
    store.migrate()?;

    let run_id = format!("pool-{}-{}", output.seed, Uuid::new_v4());
    let started_at = chrono::Utc::now().timestamp();
    store.insert_run(&run_id, output.seed, env!("CARGO_PKG_VERSION"), started_at)?;
    store.set_run_parameters(&run_id, config.pool_size(), config.target_multiplier())?;
    store.save_output(&run_id, output)?;
    println!("exported run {run_id} to {path}");
    Ok(())
}

fn print_summary(output: &PoolOutput) {
    let run = &output.run;
    let cal = &output.calibration;

    println!("=== CALIBRATION ===");
    println!("  iterations:  {}", cal.iterations);
    println!("  converged:   {}", cal.converged);
    println!(
        "  scales:      deposit={:.3} retention={:.3} cost={:.3}",
        cal.scales.deposit, cal.scales.retention, cal.scales.cost
    );

    println!();
    println!("=== RUN SUMMARY ===");
    println!("  final revenue:  ${:.0}", run.final_cumulative_revenue());
    println!("  multiplier:     {:.2}x", run.final_multiplier());
    println!("  stable paid:    ${:.0}", run.total_payout(Tranche::Stable));
    println!("  growth paid:    ${:.0}", run.total_payout(Tranche::Growth));
    println!("  breakeven:      {}", output.breakeven.is_breakeven);

    println!();
    println!("=== MONTHS ===");
    for m in &run.monthly {
        println!(
            "  {} | Revenue: ${:>9.0} | Cum: ${:>9.0} | Stable: ${:>8.0} | Growth: ${:>8.0} | {}",
            m.period(),
            m.revenue,
            m.cumulative_revenue,
            m.stable_payout,
            m.growth_payout,
            if m.new_high { "new high" } else { "-" }
        );
    }

    println!();
    println!("Stable Pool Returns ($ per $1 invested):");
    for t in &output.tier_returns.stable {
        println!(
            "  {}: {:.1}% (${:.2} per $1)",
            t.tier,
            (t.per_dollar - 1.0) * 100.0,
            t.per_dollar
        );
    }
    println!("Growth Pool Returns: 100% tokens + cash ($ per $1 invested)");
    for t in &output.tier_returns.growth {
        println!(
            "  {}: {:.1}% cash + tokens (${:.2} per $1)",
            t.tier,
            t.per_dollar_cash * 100.0,
            t.per_dollar_total
        );
    }

    if !output.validation.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for w in &output.validation.warnings {
            println!("  {w}");
        }
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    flag_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
