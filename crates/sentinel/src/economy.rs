//! Economy sentinel: balances, plan limits, store math and queue fairness.

use chrono::NaiveDate;
use integrity_core::{
    check_queue_abuse, run_rules, CoinTransaction, EconomyLimits, GlobalRiskLevel, Mission,
    MissionSubmission, PlanTables, QueueEntry, QueueLimits, RedeemedItem, Rule, RuleResult,
    Severity, SubjectReport, User, ValidationReport,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const NON_NEGATIVE_BALANCE: &str = "non_negative_balance";
pub const DAILY_MISSION_LIMIT: &str = "daily_mission_limit";
pub const MISSION_REWARD_MATH: &str = "mission_reward_math";
pub const STORE_DISCOUNT_MATH: &str = "store_discount_math";
pub use integrity_core::QUEUE_ABUSE;

/// Everything the per-user economy rules read.
pub struct UserEconomyCheck<'a> {
    pub user: &'a User,
    pub missions: &'a [Mission],
    pub submissions: &'a [MissionSubmission],
    pub transactions: &'a [CoinTransaction],
    /// Day the daily mission limit is counted on.
    pub as_of: NaiveDate,
}

/// One user's positions across all queues.
pub struct QueueCheck<'a> {
    pub user_id: &'a str,
    pub entries: &'a [QueueEntry],
}

/// Input for a full economy scan.
#[derive(Debug, Clone, Copy)]
pub struct EconomyData<'a> {
    pub users: &'a [User],
    pub missions: &'a [Mission],
    pub submissions: &'a [MissionSubmission],
    pub transactions: &'a [CoinTransaction],
    pub redeemed_items: &'a [RedeemedItem],
    pub queue: &'a [QueueEntry],
    pub as_of: NaiveDate,
}

/// Result of a full economy scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomyScan {
    pub global_risk_level: GlobalRiskLevel,
    pub user_reports: Vec<SubjectReport>,
    pub purchase_reports: Vec<SubjectReport>,
    pub queue_reports: Vec<SubjectReport>,
}

/// Validates economy invariants using the plan tables.
#[derive(Debug, Clone, Default)]
pub struct EconomySentinel {
    plans: PlanTables,
    limits: EconomyLimits,
    queue: QueueLimits,
}

fn user_rules<'a>() -> [(&'static str, Rule<UserEconomyCheck<'a>, EconomySentinel>); 3] {
    [
        (NON_NEGATIVE_BALANCE, rule_non_negative_balance),
        (DAILY_MISSION_LIMIT, rule_daily_mission_limit),
        (MISSION_REWARD_MATH, rule_mission_reward_math),
    ]
}

const PURCHASE_RULES: &[(&str, Rule<RedeemedItem, EconomySentinel>)] =
    &[(STORE_DISCOUNT_MATH, rule_store_discount_math)];

fn queue_rules<'a>() -> [(&'static str, Rule<QueueCheck<'a>, EconomySentinel>); 1] {
    [(QUEUE_ABUSE, rule_queue_abuse)]
}

impl EconomySentinel {
    /// `queue` is the engine-wide queue section; the audit reads the same
    /// one, so a position count that trips this sentinel also trips the
    /// audit.
    pub fn new(plans: PlanTables, limits: EconomyLimits, queue: QueueLimits) -> Self {
        Self {
            plans,
            limits,
            queue,
        }
    }

    /// Plan multipliers, discounts and daily limits in use.
    pub fn plans(&self) -> &PlanTables {
        &self.plans
    }

    pub fn queue_limits(&self) -> &QueueLimits {
        &self.queue
    }

    /// Balance, daily limit and reward checks for one user.
    pub fn validate_user(&self, check: &UserEconomyCheck<'_>) -> ValidationReport {
        debug!(user_id = %check.user.id, "validating user economy");
        run_rules(&user_rules(), check, self)
    }

    /// Price and balance checks for one store purchase.
    pub fn validate_purchase(&self, item: &RedeemedItem) -> ValidationReport {
        debug!(item_id = %item.id, user_id = %item.user_id, "validating purchase");
        run_rules(PURCHASE_RULES, item, self)
    }

    /// Queue fairness for one user. `entries` may hold every user's
    /// positions; only `user_id`'s are counted.
    pub fn validate_queue(&self, user_id: &str, entries: &[QueueEntry]) -> ValidationReport {
        let check = QueueCheck { user_id, entries };
        run_rules(&queue_rules(), &check, self)
    }

    /// Validate every user, purchase and queued user, keeping only failing
    /// reports.
    pub fn scan(&self, data: &EconomyData<'_>) -> EconomyScan {
        let user_reports: Vec<SubjectReport> = data
            .users
            .iter()
            .filter_map(|user| {
                let check = UserEconomyCheck {
                    user,
                    missions: data.missions,
                    submissions: data.submissions,
                    transactions: data.transactions,
                    as_of: data.as_of,
                };
                failing(&user.id, self.validate_user(&check))
            })
            .collect();

        let purchase_reports: Vec<SubjectReport> = data
            .redeemed_items
            .iter()
            .filter_map(|item| failing(&item.id, self.validate_purchase(item)))
            .collect();

        let mut queued_users: Vec<&str> = Vec::new();
        for entry in data.queue {
            if !queued_users.contains(&entry.user_id.as_str()) {
                queued_users.push(&entry.user_id);
            }
        }
        let queue_reports: Vec<SubjectReport> = queued_users
            .into_iter()
            .filter_map(|user_id| failing(user_id, self.validate_queue(user_id, data.queue)))
            .collect();

        let global_risk_level = GlobalRiskLevel::classify(
            user_reports
                .iter()
                .chain(&purchase_reports)
                .chain(&queue_reports)
                .map(|r| &r.report),
        );

        debug!(
            users = data.users.len(),
            purchases = data.redeemed_items.len(),
            ?global_risk_level,
            "economy scan complete"
        );

        EconomyScan {
            global_risk_level,
            user_reports,
            purchase_reports,
            queue_reports,
        }
    }

    /// Price a purchase should have cost under `item.plan_at_purchase`.
    pub fn expected_price(&self, item: &RedeemedItem) -> i64 {
        let discount = self.plans.discount(item.plan_at_purchase);
        (item.base_price as f64 * (1.0 - discount)).round() as i64
    }
}

fn failing(subject_id: &str, report: ValidationReport) -> Option<SubjectReport> {
    (!report.ok).then(|| SubjectReport {
        subject_id: subject_id.to_string(),
        report,
    })
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Negative xp or coins is high; both problems are reported together.
pub fn rule_non_negative_balance(check: &UserEconomyCheck<'_>, _: &EconomySentinel) -> RuleResult {
    let user = check.user;
    let mut problems = Vec::new();
    if user.xp < 0 {
        problems.push(format!("xp is negative ({})", user.xp));
    }
    if user.coins < 0 {
        problems.push(format!("coin balance is negative ({})", user.coins));
    }

    if problems.is_empty() {
        RuleResult::pass(NON_NEGATIVE_BALANCE)
    } else {
        RuleResult::fail(NON_NEGATIVE_BALANCE, Severity::High, problems.join("; "))
    }
}

/// More submissions on the `as_of` day than the user's plan allows is
/// medium. Plans without an entry in the limit table are unlimited.
pub fn rule_daily_mission_limit(check: &UserEconomyCheck<'_>, s: &EconomySentinel) -> RuleResult {
    let plan = check.user.plan;
    let Some(limit) = s.plans.daily_mission_limit(plan) else {
        return RuleResult::pass(DAILY_MISSION_LIMIT);
    };

    let today = check
        .submissions
        .iter()
        .filter(|sub| sub.user_id == check.user.id && sub.submitted_at.date_naive() == check.as_of)
        .count();

    if today > limit as usize {
        RuleResult::fail(
            DAILY_MISSION_LIMIT,
            Severity::Medium,
            format!(
                "{today} missions submitted on {} exceeds the {plan} plan limit of {limit}",
                check.as_of
            ),
        )
    } else {
        RuleResult::pass(DAILY_MISSION_LIMIT)
    }
}

/// Mission reward credits may not exceed the reward times the plan
/// multiplier.
pub fn rule_mission_reward_math(check: &UserEconomyCheck<'_>, s: &EconomySentinel) -> RuleResult {
    let user = check.user;
    let multiplier = s.plans.multiplier(user.plan);

    let problems: Vec<String> = check
        .transactions
        .iter()
        .filter(|tx| tx.user_id == user.id && tx.kind == s.limits.mission_reward_kind)
        .filter_map(|tx| {
            let mission_id = tx.reference.as_deref()?;
            let mission = check.missions.iter().find(|m| m.id == mission_id)?;
            let allowed = (mission.reward_coins as f64 * multiplier).round() as i64;
            (tx.amount > allowed).then(|| {
                format!(
                    "transaction {} credited {} coins for mission {mission_id}, plan allows {allowed}",
                    tx.id, tx.amount
                )
            })
        })
        .collect();

    if problems.is_empty() {
        RuleResult::pass(MISSION_REWARD_MATH)
    } else {
        RuleResult::fail(MISSION_REWARD_MATH, Severity::High, problems.join("; "))
    }
}

/// Insufficient balance at purchase time is high; a price that does not
/// match the plan discount is medium.
pub fn rule_store_discount_math(item: &RedeemedItem, s: &EconomySentinel) -> RuleResult {
    if item.balance_before < item.paid_price {
        return RuleResult::fail(
            STORE_DISCOUNT_MATH,
            Severity::High,
            format!(
                "purchase {} paid {} with only {} coins available",
                item.id, item.paid_price, item.balance_before
            ),
        );
    }

    let expected = s.expected_price(item);
    if item.paid_price != expected {
        return RuleResult::fail(
            STORE_DISCOUNT_MATH,
            Severity::Medium,
            format!(
                "purchase {} paid {} but the {} plan price is {expected}",
                item.id, item.paid_price, item.plan_at_purchase
            ),
        );
    }

    RuleResult::pass(STORE_DISCOUNT_MATH)
}

/// Medium when the user holds more than the allowed positions in any one
/// queue.
pub fn rule_queue_abuse(check: &QueueCheck<'_>, s: &EconomySentinel) -> RuleResult {
    check_queue_abuse(check.user_id, check.entries, &s.queue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use integrity_core::SubscriptionPlan;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn user(plan: SubscriptionPlan) -> User {
        User {
            id: "u-1".into(),
            name: "Caio".into(),
            role: Default::default(),
            level: 4,
            xp: 400,
            coins: 900,
            plan,
            created_at: at(1, 0),
            check_in_streak: 3,
        }
    }

    fn sub(id: &str, user_id: &str, day: u32) -> MissionSubmission {
        MissionSubmission {
            id: id.into(),
            mission_id: format!("m-{id}"),
            user_id: user_id.into(),
            proof: "https://instagram.com/p/x".into(),
            status: Default::default(),
            submitted_at: at(day, 9),
        }
    }

    fn item(base: i64, paid: i64, balance: i64, plan: SubscriptionPlan) -> RedeemedItem {
        RedeemedItem {
            id: "r-1".into(),
            user_id: "u-1".into(),
            item_id: "i-1".into(),
            base_price: base,
            paid_price: paid,
            plan_at_purchase: plan,
            balance_before: balance,
            redeemed_at: at(10, 12),
        }
    }

    fn queue_entry(user_id: &str, queue: &str) -> QueueEntry {
        QueueEntry {
            user_id: user_id.into(),
            queue: queue.into(),
            enqueued_at: at(10, 8),
        }
    }

    fn check<'a>(
        user: &'a User,
        missions: &'a [Mission],
        submissions: &'a [MissionSubmission],
        transactions: &'a [CoinTransaction],
    ) -> UserEconomyCheck<'a> {
        UserEconomyCheck {
            user,
            missions,
            submissions,
            transactions,
            as_of: as_of(),
        }
    }

    #[test]
    fn healthy_user_passes() {
        let u = user(SubscriptionPlan::Free);
        let report = EconomySentinel::default().validate_user(&check(&u, &[], &[], &[]));
        assert!(report.ok, "{report:?}");
    }

    #[test]
    fn negative_balance_is_an_error() {
        let mut u = user(SubscriptionPlan::Free);
        u.coins = -5;
        let report = EconomySentinel::default().validate_user(&check(&u, &[], &[], &[]));
        assert_eq!(report.errors, vec!["coin balance is negative (-5)"]);
    }

    #[test]
    fn daily_limit_counts_only_the_as_of_day() {
        let u = user(SubscriptionPlan::Free);
        let subs: Vec<MissionSubmission> = (0..4)
            .map(|i| sub(&format!("s{i}"), "u-1", 10))
            .chain([sub("old", "u-1", 9), sub("other", "u-2", 10)])
            .collect();
        let result = rule_daily_mission_limit(&check(&u, &[], &subs, &[]), &EconomySentinel::default());
        assert!(!result.passed);
        assert_eq!(result.severity, Severity::Medium);
        assert!(result.details.contains("4 missions"), "{}", result.details);

        // Gold allows 8 a day.
        let gold = user(SubscriptionPlan::Gold);
        assert!(rule_daily_mission_limit(&check(&gold, &[], &subs, &[]), &EconomySentinel::default()).passed);
    }

    #[test]
    fn plan_without_limit_passes() {
        let mut plans = PlanTables::default();
        plans.daily_mission_limits.clear();
        let sentinel = EconomySentinel::new(plans, EconomyLimits::default(), QueueLimits::default());
        let u = user(SubscriptionPlan::Free);
        let subs: Vec<MissionSubmission> = (0..20).map(|i| sub(&format!("s{i}"), "u-1", 10)).collect();
        assert!(rule_daily_mission_limit(&check(&u, &[], &subs, &[]), &sentinel).passed);
    }

    #[test]
    fn reward_above_multiplier_is_an_error() {
        let u = user(SubscriptionPlan::Gold);
        let missions = vec![Mission {
            id: "m-1".into(),
            title: "Weekly photo".into(),
            description: "Post a workout photo".into(),
            mission_type: "instagram".into(),
            reward_coins: 100,
            reward_xp: 10,
            created_by: None,
        }];
        let tx = |id: &str, amount: i64| CoinTransaction {
            id: id.into(),
            user_id: "u-1".into(),
            amount,
            kind: "mission_reward".into(),
            reference: Some("m-1".into()),
            created_at: at(5, 10),
        };
        let ok = vec![tx("t-1", 125)];
        let report = EconomySentinel::default().validate_user(&check(&u, &missions, &[], &ok));
        assert!(report.ok, "{report:?}");

        let inflated = vec![tx("t-1", 125), tx("t-2", 400)];
        let report = EconomySentinel::default().validate_user(&check(&u, &missions, &[], &inflated));
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("t-2"));
        assert!(report.errors[0].contains("allows 125"));
    }

    #[test]
    fn discount_math() {
        let s = EconomySentinel::default();
        // Gold: 10% off 1000.
        assert!(s.validate_purchase(&item(1000, 900, 2000, SubscriptionPlan::Gold)).ok);

        let wrong = s.validate_purchase(&item(1000, 800, 2000, SubscriptionPlan::Gold));
        assert!(wrong.errors.is_empty());
        assert_eq!(wrong.warnings.len(), 1);
        assert!(wrong.warnings[0].contains("gold plan price is 900"));

        let broke = s.validate_purchase(&item(1000, 900, 100, SubscriptionPlan::Gold));
        assert_eq!(broke.errors.len(), 1);
        assert!(broke.errors[0].contains("only 100 coins"));
    }

    #[test]
    fn queue_abuse_per_queue() {
        let s = EconomySentinel::default();
        let mut entries: Vec<QueueEntry> = (0..4).map(|_| queue_entry("u-1", "raffle")).collect();
        entries.push(queue_entry("u-1", "payout"));
        entries.push(queue_entry("u-2", "raffle"));

        let report = s.validate_queue("u-1", &entries);
        assert_eq!(report.warnings, vec!["4 entries in queue 'raffle' (max 3)"]);
        assert!(s.validate_queue("u-2", &entries).ok);
    }

    #[test]
    fn queue_limit_comes_from_shared_section() {
        let s = EconomySentinel::new(
            PlanTables::default(),
            EconomyLimits::default(),
            QueueLimits {
                max_entries_per_queue: 5,
            },
        );
        let entries: Vec<QueueEntry> = (0..4).map(|_| queue_entry("u-1", "raffle")).collect();
        assert!(s.validate_queue("u-1", &entries).ok);
    }

    #[test]
    fn scan_collects_failures_and_classifies() {
        let s = EconomySentinel::default();
        let users = vec![user(SubscriptionPlan::Free)];
        let items = vec![item(1000, 1000, 5000, SubscriptionPlan::Free)];
        let queue: Vec<QueueEntry> = (0..4).map(|_| queue_entry("u-9", "raffle")).collect();

        let data = EconomyData {
            users: &users,
            missions: &[],
            submissions: &[],
            transactions: &[],
            redeemed_items: &items,
            queue: &queue,
            as_of: as_of(),
        };
        let scan = s.scan(&data);
        assert_eq!(scan.global_risk_level, GlobalRiskLevel::Attention);
        assert!(scan.user_reports.is_empty());
        assert!(scan.purchase_reports.is_empty());
        assert_eq!(scan.queue_reports.len(), 1);
        assert_eq!(scan.queue_reports[0].subject_id, "u-9");

        let mut broke = users.clone();
        broke[0].xp = -1;
        let scan = s.scan(&EconomyData {
            users: &broke,
            ..data
        });
        assert_eq!(scan.global_risk_level, GlobalRiskLevel::Critical);
    }

    #[test]
    fn empty_scan_is_stable() {
        let scan = EconomySentinel::default().scan(&EconomyData {
            users: &[],
            missions: &[],
            submissions: &[],
            transactions: &[],
            redeemed_items: &[],
            queue: &[],
            as_of: as_of(),
        });
        assert_eq!(scan.global_risk_level, GlobalRiskLevel::Stable);
    }
}
