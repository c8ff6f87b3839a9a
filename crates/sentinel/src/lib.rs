//! # sentinel
//!
//! Domain validators for the engagement platform. Each sentinel owns an
//! ordered list of named rules, runs all of them on every call and folds the
//! results into a [`ValidationReport`](integrity_core::ValidationReport).
//!
//! * **[`action`]** -- mission format, engagement-term ban, submission proof
//!   checks and proof reuse.
//! * **[`economy`]** -- balances, plan daily limits, reward and store math,
//!   queue fairness.
//! * **[`terms`]** -- the compiled forbidden-term scanner used by the action
//!   rules.
//!
//! Both sentinels also expose a batch `scan` that keeps every failing report
//! and classifies the batch as a [`GlobalRiskLevel`](integrity_core::GlobalRiskLevel).

pub mod action;
pub mod economy;
pub mod terms;

pub use action::{ActionScan, ActionSentinel, SubmissionCheck};
pub use economy::{EconomyData, EconomyScan, EconomySentinel, QueueCheck, UserEconomyCheck};
pub use terms::TermScanner;
