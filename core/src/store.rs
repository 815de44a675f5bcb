//! SQLite export sink for finished runs.
//!
//! RULE: Only store.rs talks to the database.
//! The generation pipeline never touches it; the runner hands a finished
//! `PoolOutput` to `save_output` after validation has passed.

use crate::{
    engine::PoolOutput,
    error::PoolResult,
    records::{DailyRecord, MonthlySummary, PerTokenRow},
    validator::ValidationReport,
};
use rusqlite::{params, Connection};

pub struct PoolStore {
    conn: Connection,
}

impl PoolStore {
    /// Open (or create) the export database at `path`.
    pub fn open(path: &str) -> PoolResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PoolResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> PoolResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_pool_export.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, seed: u64, version: &str, started_at: i64) -> PoolResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, seed as i64, version, started_at],
        )?;
        Ok(())
    }

    /// Persist every table of a finished run in one transaction.
    pub fn save_output(&self, run_id: &str, output: &PoolOutput) -> PoolResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE run SET calibration_iterations = ?2, converged = ?3,
                            final_multiplier = ?4, passed = ?5
             WHERE run_id = ?1",
            params![
                run_id,
                output.calibration.iterations,
                output.calibration.converged,
                output.validation.final_multiplier,
                output.validation.passed,
            ],
        )?;
        self.save_daily(run_id, &output.run.daily)?;
        self.save_monthly(run_id, &output.run.monthly)?;
        self.save_per_token(run_id, &output.per_token)?;
        self.save_validation(run_id, &output.validation)?;
        tx.commit()?;
        log::info!(
            "run {run_id} exported: {} days, {} months",
            output.run.daily.len(),
            output.run.monthly.len()
        );
        Ok(())
    }

    pub fn set_run_parameters(&self, run_id: &str, pool_size: f64, target_multiplier: f64) -> PoolResult<()> {
        self.conn.execute(
            "UPDATE run SET pool_size = ?2, target_multiplier = ?3 WHERE run_id = ?1",
            params![run_id, pool_size, target_multiplier],
        )?;
        Ok(())
    }

    // ── Tables ─────────────────────────────────────────────────

    pub fn save_daily(&self, run_id: &str, rows: &[DailyRecord]) -> PoolResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO daily_record (
                run_id, day, date, weekday, new_customers, active_population,
                avg_deposit, total_deposits, daily_revenue, cumulative_revenue,
                traffic_spend, cumulative_traffic, effective_traffic_budget, multiplier,
                stable_payout, growth_payout, cumulative_stable, cumulative_growth,
                stable_return_pct, growth_return_pct, daily_referral_cost, cumulative_referral_cost)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                     ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
        )?;
        for r in rows {
            stmt.execute(params![
                run_id,
                r.day,
                r.date.to_string(),
                r.weekday,
                r.new_customers as i64,
                r.active_population,
                r.avg_deposit,
                r.total_deposits,
                r.daily_revenue,
                r.cumulative_revenue,
                r.traffic_spend,
                r.cumulative_traffic,
                r.effective_traffic_budget,
                r.multiplier,
                r.stable_payout,
                r.growth_payout,
                r.cumulative_stable,
                r.cumulative_growth,
                r.stable_return_pct,
                r.growth_return_pct,
                r.daily_referral_cost,
                r.cumulative_referral_cost,
            ])?;
        }
        Ok(())
    }

    pub fn save_monthly(&self, run_id: &str, rows: &[MonthlySummary]) -> PoolResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO monthly_summary (
                run_id, year, month, days, new_customers, active_population,
                total_deposits, revenue, traffic_spend, cumulative_revenue, negative_days,
                prior_watermark, stable_payout, growth_payout, new_high,
                referral_cost, capital_cost)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        )?;
        for m in rows {
            stmt.execute(params![
                run_id,
                m.year,
                m.month,
                m.days,
                m.new_customers as i64,
                m.active_population,
                m.total_deposits,
                m.revenue,
                m.traffic_spend,
                m.cumulative_revenue,
                m.negative_days,
                m.prior_watermark,
                m.stable_payout,
                m.growth_payout,
                m.new_high,
                m.referral_cost,
                m.capital_cost,
            ])?;
        }
        Ok(())
    }

    pub fn save_per_token(&self, run_id: &str, rows: &[PerTokenRow]) -> PoolResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO per_token (run_id, year, month, tranche, tier, cash_per_token, period_cash_total)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for r in rows {
            stmt.execute(params![
                run_id,
                r.year,
                r.month,
                r.tranche.name(),
                r.tier.name(),
                r.cash_per_token,
                r.period_cash_total,
            ])?;
        }
        Ok(())
    }

    fn save_validation(&self, run_id: &str, report: &ValidationReport) -> PoolResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO validation_message (run_id, level, message) VALUES (?1, ?2, ?3)",
        )?;
        for e in &report.errors {
            stmt.execute(params![run_id, "error", e])?;
        }
        for w in &report.warnings {
            stmt.execute(params![run_id, "warning", w])?;
        }
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn daily_count(&self, run_id: &str) -> PoolResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM daily_record WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    pub fn per_token_count(&self, run_id: &str) -> PoolResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM per_token WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// Sum of monthly (stable, growth) payouts.
    pub fn monthly_payout_totals(&self, run_id: &str) -> PoolResult<(f64, f64)> {
        let totals = self.conn.query_row(
            "SELECT COALESCE(SUM(stable_payout), 0.0), COALESCE(SUM(growth_payout), 0.0)
             FROM monthly_summary WHERE run_id = ?1",
            params![run_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(totals)
    }

    pub fn validation_messages(&self, run_id: &str, level: &str) -> PoolResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT message FROM validation_message
             WHERE run_id = ?1 AND level = ?2 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![run_id, level], |row| row.get(0))?;
        rows.collect::<Result<Vec<String>, _>>().map_err(Into::into)
    }

    pub fn run_passed(&self, run_id: &str) -> PoolResult<Option<bool>> {
        let passed = self.conn.query_row(
            "SELECT passed FROM run WHERE run_id = ?1",
            params![run_id],
            |row| row.get::<_, Option<bool>>(0),
        )?;
        Ok(passed)
    }
}
