//! Machine rule catalogue.
//!
//! Independent boolean heuristics over an [`ActivitySnapshot`] (and
//! occasionally the [`User`]). Each triggered rule yields a fixed,
//! code-tagged label. This is a flagging layer separate from the numeric
//! [`BehaviorScorer`](crate::BehaviorScorer); both feed the shield.

use integrity_core::User;
use tracing::trace;

use crate::snapshot::ActivitySnapshot;

/// A single coded heuristic.
pub struct MachineRule {
    /// Stable code, e.g. `"MR-01"`.
    pub code: &'static str,
    /// Human-readable label appended when the rule triggers.
    pub label: &'static str,
    pub predicate: fn(&User, &ActivitySnapshot) -> bool,
}

impl MachineRule {
    /// The label as reported in a [`ShieldDecision`](crate::ShieldDecision).
    pub fn tagged_label(&self) -> String {
        format!("[{}] {}", self.code, self.label)
    }
}

/// The built-in rule catalogue, in evaluation order.
pub static MACHINE_RULES: &[MachineRule] = &[
    MachineRule {
        code: "MR-01",
        label: "abnormal coin gain",
        predicate: |_, a| a.delta_coins > 5000,
    },
    MachineRule {
        code: "MR-02",
        label: "inhuman action rate",
        predicate: |_, a| a.actions_per_second() > 3.0,
    },
    MachineRule {
        code: "MR-03",
        label: "mission submitted more than once",
        predicate: |_, a| a.mission_repeat_count > 1,
    },
    MachineRule {
        code: "MR-04",
        label: "jackpot purchase spam",
        predicate: |_, a| a.jackpot_attempts > 7,
    },
    MachineRule {
        code: "MR-05",
        label: "store abuse",
        predicate: |_, a| a.store_bursts > 10,
    },
    MachineRule {
        code: "MR-06",
        label: "device fingerprint mismatch",
        predicate: |_, a| a.device_mismatch_count > 3,
    },
];

/// Evaluates the [`MACHINE_RULES`] catalogue.
#[derive(Debug, Clone, Copy, Default)]
pub struct MachineRuleSet;

impl MachineRuleSet {
    /// Run every rule (no short-circuit) and return the labels of those that
    /// triggered, in catalogue order.
    pub fn evaluate(&self, user: &User, activity: &ActivitySnapshot) -> Vec<String> {
        MACHINE_RULES
            .iter()
            .filter(|rule| (rule.predicate)(user, activity))
            .map(|rule| {
                trace!(code = rule.code, user_id = %user.id, "machine rule triggered");
                rule.tagged_label()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn user() -> User {
        User {
            id: "u-1".into(),
            name: "Ana".into(),
            role: Default::default(),
            level: 1,
            xp: 0,
            coins: 0,
            plan: Default::default(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            check_in_streak: 0,
        }
    }

    #[test]
    fn quiet_activity_triggers_nothing() {
        assert!(MachineRuleSet.evaluate(&user(), &ActivitySnapshot::default()).is_empty());
    }

    #[test]
    fn single_rule_label() {
        let activity = ActivitySnapshot {
            delta_coins: 5001,
            ..Default::default()
        };
        assert_eq!(
            MachineRuleSet.evaluate(&user(), &activity),
            vec!["[MR-01] abnormal coin gain"]
        );
    }

    #[test]
    fn all_rules_evaluate_independently() {
        let activity = ActivitySnapshot {
            delta_coins: 6000,
            actions_per_second: 4.0,
            mission_repeat_count: 2,
            jackpot_attempts: 8,
            store_bursts: 11,
            device_mismatch_count: 4,
            ..Default::default()
        };
        let labels = MachineRuleSet.evaluate(&user(), &activity);
        assert_eq!(labels.len(), MACHINE_RULES.len());
        for (label, rule) in labels.iter().zip(MACHINE_RULES) {
            assert!(label.starts_with(&format!("[{}]", rule.code)));
        }
    }

    #[test]
    fn boundaries_are_strict() {
        let activity = ActivitySnapshot {
            delta_coins: 5000,
            actions_per_second: 3.0,
            mission_repeat_count: 1,
            jackpot_attempts: 7,
            store_bursts: 10,
            device_mismatch_count: 3,
            ..Default::default()
        };
        assert!(MachineRuleSet.evaluate(&user(), &activity).is_empty());
    }

    #[test]
    fn codes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for rule in MACHINE_RULES {
            assert!(seen.insert(rule.code), "duplicate rule code: {}", rule.code);
        }
    }
}
