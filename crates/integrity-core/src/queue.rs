//! Queue fairness, checked the same way by every domain that looks at
//! queue positions.

use std::collections::BTreeMap;

use crate::entities::QueueEntry;
use crate::rule::{RuleResult, Severity};
use crate::schema::QueueLimits;

pub const QUEUE_ABUSE: &str = "queue_abuse";

/// Positions `user_id` holds per queue, keyed by queue name. Entries of
/// other users are ignored.
pub fn positions_per_queue<'a>(user_id: &str, entries: &'a [QueueEntry]) -> BTreeMap<&'a str, usize> {
    let mut per_queue = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.user_id == user_id) {
        *per_queue.entry(entry.queue.as_str()).or_default() += 1;
    }
    per_queue
}

/// `queue_abuse` result for one user: medium when any single queue holds
/// more than `max_entries_per_queue` of their positions.
pub fn check_queue_abuse(user_id: &str, entries: &[QueueEntry], limits: &QueueLimits) -> RuleResult {
    let max = limits.max_entries_per_queue;
    let problems: Vec<String> = positions_per_queue(user_id, entries)
        .into_iter()
        .filter(|(_, count)| *count > max)
        .map(|(queue, count)| format!("{count} entries in queue '{queue}' (max {max})"))
        .collect();

    if problems.is_empty() {
        RuleResult::pass(QUEUE_ABUSE)
    } else {
        RuleResult::fail(QUEUE_ABUSE, Severity::Medium, problems.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(user_id: &str, queue: &str) -> QueueEntry {
        QueueEntry {
            user_id: user_id.into(),
            queue: queue.into(),
            enqueued_at: Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn counts_only_the_given_user() {
        let entries = vec![entry("u-1", "raffle"), entry("u-2", "raffle"), entry("u-1", "drop")];
        let counts = positions_per_queue("u-1", &entries);
        assert_eq!(counts.get("raffle"), Some(&1));
        assert_eq!(counts.get("drop"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn limit_is_per_queue() {
        let limits = QueueLimits::default();
        // Three in each of two queues is within the limit.
        let mut entries: Vec<QueueEntry> = (0..3).map(|_| entry("u-1", "raffle")).collect();
        entries.extend((0..3).map(|_| entry("u-1", "drop")));
        assert!(check_queue_abuse("u-1", &entries, &limits).passed);

        entries.push(entry("u-1", "drop"));
        let result = check_queue_abuse("u-1", &entries, &limits);
        assert!(!result.passed);
        assert_eq!(result.severity, Severity::Medium);
        assert_eq!(result.details, "4 entries in queue 'drop' (max 3)");
    }
}
