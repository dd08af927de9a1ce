// Core version lag: calendar-month distance between installed and latest release.
// Versions are "YEAR.MONTH[.PATCH...]"; anything else contributes no lag.

const LAG_THRESHOLD_MONTHS: i64 = 2;
pub const CORE_LAG_PENALTY: u32 = 20;

/// `year * 12 + month` from the first two dot-separated components, or `None` when
/// the string has no dot or either component is not an integer.
pub fn release_month(version: &str) -> Option<i64> {
    if !version.contains('.') {
        return None;
    }
    let mut parts = version.split('.');
    let year: i64 = parts.next()?.trim().parse().ok()?;
    let month: i64 = parts.next()?.trim().parse().ok()?;
    year.checked_mul(12)?.checked_add(month)
}

/// Months the latest release is ahead of the installed one; `None` if either side is
/// missing or unparsable.
pub fn lag_months(current: Option<&str>, latest: Option<&str>) -> Option<i64> {
    let current = release_month(current?)?;
    let latest = release_month(latest?)?;
    latest.checked_sub(current)
}

pub fn core_lag_penalty(current: Option<&str>, latest: Option<&str>) -> u32 {
    match lag_months(current, latest) {
        Some(months) if months >= LAG_THRESHOLD_MONTHS => CORE_LAG_PENALTY,
        _ => 0,
    }
}
