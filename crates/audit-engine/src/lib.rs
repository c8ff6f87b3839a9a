//! # audit-engine
//!
//! Retrospective audits of user history. [`AuditEngine::audit_user`] runs
//! six rules against a user and the transactions, submissions, redemptions
//! and queue entries supplied in an [`AuditData`], then classifies the user
//! as `safe`, `attention` or `danger`. The [`reporter`] functions look across
//! a batch of results for the most violated rules and for failure rates that
//! point at a platform-wide problem rather than one bad actor.

mod engine;
pub mod reporter;
pub mod rules;

pub use engine::{AuditEngine, AuditResult, ResultSummary, RiskLevel};
pub use reporter::{
    detect_system_wide_anomalies, summarize, top_violated_rules, AuditSummary, RuleFrequency,
    SystemAnomaly,
};
pub use rules::AuditData;
