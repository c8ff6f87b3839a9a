//! # integrity-core
//!
//! Shared vocabulary for the trust engine's rule sets. Every domain (behavior
//! shield, action and economy sentinels, audit) reports through the same
//! [`RuleResult`] / [`ValidationReport`] pair and folds its rules with
//! [`run_rules`].
//!
//! ## Quick start
//!
//! ```rust
//! use integrity_core::{run_rules, Rule, RuleResult, Severity};
//!
//! fn positive(v: &i64, _: &()) -> RuleResult {
//!     if *v < 0 {
//!         RuleResult::fail("positive", Severity::High, "value is negative")
//!     } else {
//!         RuleResult::pass("positive")
//!     }
//! }
//!
//! let rules: &[(&str, Rule<i64, ()>)] = &[("positive", positive)];
//! let report = run_rules(rules, &-1, &());
//! assert!(!report.ok);
//! assert_eq!(report.errors, vec!["value is negative"]);
//! ```

pub mod entities;
mod error;
pub mod loader;
mod queue;
mod report;
mod rule;
mod schema;
mod sink;

// Re-export primary public API at crate root.
pub use entities::{
    CoinTransaction, Mission, MissionSubmission, QueueEntry, RedeemedItem, Role,
    SubmissionStatus, SubscriptionPlan, User,
};
pub use error::EngineError;
pub use queue::{check_queue_abuse, positions_per_queue, QUEUE_ABUSE};
pub use report::{evaluate_rules, run_rules, GlobalRiskLevel, Rule, SubjectReport, ValidationReport};
pub use rule::{RuleResult, Severity};
pub use schema::{
    ActionLimits, AnomalyThreshold, AuditThresholds, Band, EconomyLimits, EngineConfig,
    PlanTables, QueueLimits, ScoreBands,
};
pub use sink::{DiagnosticSink, NullSink};
