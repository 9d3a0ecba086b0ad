//! Converts a campaign's total budget into the ads platform's per-day
//! billing amount.
//!
//! The platform bills in micros (1 settlement-currency unit = 1,000,000
//! micros) and rejects amounts that are not whole cents, so the order of
//! operations matters: convert currency, divide by duration, round to
//! micros, floor to the cent, then clamp to the configured minimum.

use chrono::NaiveDate;

/// One settlement-currency unit in micros.
pub const MICROS_PER_UNIT: i64 = 1_000_000;

/// One cent of the settlement currency in micros. Daily amounts must be a
/// multiple of this or the platform rejects the budget.
pub const CENT_MICROS: i64 = MICROS_PER_UNIT / 100;

/// Default floor for the daily spend when none is configured (one
/// settlement-currency unit per day).
pub const DEFAULT_MIN_DAILY_MICROS: i64 = 1_000_000;

/// Inclusive campaign duration in days.
///
/// A missing or degenerate range is treated as a single-day campaign.
pub fn campaign_duration_days(start: Option<NaiveDate>, end: Option<NaiveDate>) -> i64 {
    match (start, end) {
        (Some(start), Some(end)) => (end - start).num_days() + 1,
        _ => 1,
    }
}

/// Computes the per-day spend in micros for a campaign.
///
/// # Arguments
///
/// * `total_budget` - Total campaign budget in the origin currency.
/// * `currency_rate` - Units of origin currency per settlement-currency unit.
/// * `duration_days` - Campaign length in days; values <= 0 count as 1.
/// * `min_daily_micros` - Configured floor for the daily amount.
pub fn daily_budget_micros(
    total_budget: f64,
    currency_rate: f64,
    duration_days: i64,
    min_daily_micros: i64,
) -> i64 {
    let total_settlement = total_budget / currency_rate;
    let days = duration_days.max(1) as f64;
    let daily_raw = total_settlement / days;

    let micros = (daily_raw * MICROS_PER_UNIT as f64).round() as i64;
    // Floor to the cent before clamping; the reverse order produces
    // off-by-one-cent amounts the platform rejects.
    let floored = (micros / CENT_MICROS) * CENT_MICROS;

    floored.max(min_daily_micros)
}
