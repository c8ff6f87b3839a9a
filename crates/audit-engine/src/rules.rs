//! The audit rule battery.
//!
//! Each rule looks at one user and the read-only auxiliary collections in an
//! [`AuditData`]. Collections may hold other users' records; every rule
//! filters by user id itself.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use integrity_core::{
    check_queue_abuse, AuditThresholds, CoinTransaction, MissionSubmission, QueueEntry,
    QueueLimits, RedeemedItem, Rule, RuleResult, Severity, User,
};

pub const RAPID_LEVEL_GROWTH: &str = "rapid_level_growth";
pub const UNUSUAL_COIN_GAIN: &str = "unusual_coin_gain";
pub const SUSPICIOUS_SUBMISSION_PATTERN: &str = "suspicious_submission_pattern";
pub const IMPOSSIBLE_CHECKIN_STREAK: &str = "impossible_checkin_streak";
pub use integrity_core::QUEUE_ABUSE;
pub const STORE_ANOMALY: &str = "store_anomaly";

/// Auxiliary collections an audit reads. Supplied by the caller, never
/// mutated.
#[derive(Debug, Clone, Copy)]
pub struct AuditData<'a> {
    /// Reference instant for every age and window computation.
    pub as_of: DateTime<Utc>,
    pub transactions: &'a [CoinTransaction],
    pub submissions: &'a [MissionSubmission],
    pub redeemed_items: &'a [RedeemedItem],
    pub queue: &'a [QueueEntry],
}

/// Thresholds plus data; the context every audit rule receives.
pub struct AuditScope<'a> {
    pub thresholds: &'a AuditThresholds,
    pub queue: &'a QueueLimits,
    pub data: &'a AuditData<'a>,
}

pub(crate) fn audit_rules<'a>() -> [(&'static str, Rule<User, AuditScope<'a>>); 6] {
    [
        (RAPID_LEVEL_GROWTH, rule_rapid_level_growth),
        (UNUSUAL_COIN_GAIN, rule_unusual_coin_gain),
        (SUSPICIOUS_SUBMISSION_PATTERN, rule_suspicious_submission_pattern),
        (IMPOSSIBLE_CHECKIN_STREAK, rule_impossible_checkin_streak),
        (QUEUE_ABUSE, rule_queue_abuse),
        (STORE_ANOMALY, rule_store_anomaly),
    ]
}

/// Whole days since account creation, at least 1.
fn account_age_days(user: &User, as_of: DateTime<Utc>) -> i64 {
    (as_of - user.created_at).num_days().max(1)
}

/// Level gained faster than the configured levels-per-day.
pub fn rule_rapid_level_growth(user: &User, scope: &AuditScope<'_>) -> RuleResult {
    let t = scope.thresholds;
    if user.level <= t.min_level_for_growth_check {
        return RuleResult::pass(RAPID_LEVEL_GROWTH);
    }

    let days = account_age_days(user, scope.data.as_of);
    let rate = f64::from(user.level) / days as f64;
    if rate > t.max_levels_per_day {
        RuleResult::fail(
            RAPID_LEVEL_GROWTH,
            Severity::High,
            format!(
                "level {} reached in {days} day(s) ({rate:.1} levels/day, max {})",
                user.level, t.max_levels_per_day
            ),
        )
    } else {
        RuleResult::pass(RAPID_LEVEL_GROWTH)
    }
}

/// Balance not explained by the user's transaction history.
///
/// Sums run in `i128` so no balance or history, however large, can wrap the
/// difference back under the tolerance.
pub fn rule_unusual_coin_gain(user: &User, scope: &AuditScope<'_>) -> RuleResult {
    let net: i128 = scope
        .data
        .transactions
        .iter()
        .filter(|tx| tx.user_id == user.id)
        .map(|tx| i128::from(tx.amount))
        .sum();

    let unexplained = i128::from(user.coins) - net;
    let tolerance = scope.thresholds.coin_gain_tolerance;
    if unexplained > i128::from(tolerance) {
        RuleResult::fail(
            UNUSUAL_COIN_GAIN,
            Severity::High,
            format!(
                "balance {} exceeds transaction history ({net}) by {unexplained} coins (tolerance {tolerance})",
                user.coins
            ),
        )
    } else {
        RuleResult::pass(UNUSUAL_COIN_GAIN)
    }
}

/// Too many submissions inside one sliding time window.
pub fn rule_suspicious_submission_pattern(user: &User, scope: &AuditScope<'_>) -> RuleResult {
    let t = scope.thresholds;
    let mut times: Vec<DateTime<Utc>> = scope
        .data
        .submissions
        .iter()
        .filter(|s| s.user_id == user.id)
        .map(|s| s.submitted_at)
        .collect();
    times.sort();

    let burst = max_in_window(&times, t.submission_window_secs);
    if burst > t.max_submissions_per_window {
        RuleResult::fail(
            SUSPICIOUS_SUBMISSION_PATTERN,
            Severity::Medium,
            format!(
                "{burst} submissions within {}s (max {})",
                t.submission_window_secs, t.max_submissions_per_window
            ),
        )
    } else {
        RuleResult::pass(SUSPICIOUS_SUBMISSION_PATTERN)
    }
}

/// Largest number of sorted instants that fit in a `window_secs` span.
fn max_in_window(sorted: &[DateTime<Utc>], window_secs: i64) -> usize {
    let mut best = 0;
    let mut start = 0;
    for end in 0..sorted.len() {
        while (sorted[end] - sorted[start]).num_seconds() > window_secs {
            start += 1;
        }
        best = best.max(end - start + 1);
    }
    best
}

/// A streak longer than the account has existed.
pub fn rule_impossible_checkin_streak(user: &User, scope: &AuditScope<'_>) -> RuleResult {
    // Creation day counts as a check-in day.
    let possible = (scope.data.as_of.date_naive() - user.created_at.date_naive())
        .num_days()
        .max(0)
        + 1;

    if i64::from(user.check_in_streak) > possible {
        RuleResult::fail(
            IMPOSSIBLE_CHECKIN_STREAK,
            Severity::High,
            format!(
                "check-in streak of {} days on an account that is {possible} day(s) old",
                user.check_in_streak
            ),
        )
    } else {
        RuleResult::pass(IMPOSSIBLE_CHECKIN_STREAK)
    }
}

/// Medium when the user holds too many positions in one queue.
pub fn rule_queue_abuse(user: &User, scope: &AuditScope<'_>) -> RuleResult {
    check_queue_abuse(&user.id, scope.data.queue, scope.queue)
}

/// Overdrawn purchases (high) or too many redemptions in one day (medium).
pub fn rule_store_anomaly(user: &User, scope: &AuditScope<'_>) -> RuleResult {
    let items: Vec<&RedeemedItem> = scope
        .data
        .redeemed_items
        .iter()
        .filter(|i| i.user_id == user.id)
        .collect();

    let overdrawn: Vec<&str> = items
        .iter()
        .filter(|i| i.paid_price > i.balance_before)
        .map(|i| i.id.as_str())
        .collect();
    if !overdrawn.is_empty() {
        return RuleResult::fail(
            STORE_ANOMALY,
            Severity::High,
            format!("purchases exceeded the available balance: {}", overdrawn.join(", ")),
        );
    }

    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for item in &items {
        *per_day.entry(item.redeemed_at.date_naive()).or_default() += 1;
    }
    let max = scope.thresholds.max_redemptions_per_day;
    let busy: Vec<String> = per_day
        .into_iter()
        .filter(|(_, count)| *count > max)
        .map(|(day, count)| format!("{count} redemptions on {day}"))
        .collect();

    if busy.is_empty() {
        RuleResult::pass(STORE_ANOMALY)
    } else {
        RuleResult::fail(
            STORE_ANOMALY,
            Severity::Medium,
            format!("{} (max {max} per day)", busy.join("; ")),
        )
    }
}
