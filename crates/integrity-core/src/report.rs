use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::rule::{RuleResult, Severity};

/// A single named rule over a subject `S` with read-only context `C`.
///
/// Every domain (action, economy, audit) supplies an ordered slice of these
/// and shares [`run_rules`] for evaluation and folding.
pub type Rule<S, C> = fn(&S, &C) -> RuleResult;

/// Aggregation of the rule results produced by one validation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// `true` iff every result passed.
    pub ok: bool,
    /// Details of failed `high` results, in evaluation order.
    pub errors: Vec<String>,
    /// Details of failed `low`/`medium` results, in evaluation order.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Fold rule results into a report, preserving evaluation order.
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a RuleResult>,
    {
        let mut report = Self {
            ok: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        };

        for result in results {
            if result.passed {
                continue;
            }
            report.ok = false;
            match result.severity {
                Severity::High => report.errors.push(result.details.clone()),
                Severity::Medium | Severity::Low => report.warnings.push(result.details.clone()),
            }
        }

        report
    }

    /// `true` when the report contains at least one blocking error.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Run every rule in order (no early exit) and return the raw results.
pub fn evaluate_rules<S, C>(rules: &[(&str, Rule<S, C>)], subject: &S, ctx: &C) -> Vec<RuleResult> {
    rules
        .iter()
        .map(|(name, rule)| {
            let result = rule(subject, ctx);
            if !result.passed {
                trace!(rule = name, severity = %result.severity, "rule failed");
            }
            result
        })
        .collect()
}

/// Run every rule in order and fold the results into a [`ValidationReport`].
pub fn run_rules<S, C>(rules: &[(&str, Rule<S, C>)], subject: &S, ctx: &C) -> ValidationReport {
    ValidationReport::from_results(&evaluate_rules(rules, subject, ctx))
}

/// A non-passing report tagged with the entity it was produced for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectReport {
    pub subject_id: String,
    #[serde(flatten)]
    pub report: ValidationReport,
}

/// Population-level classification of a batch scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalRiskLevel {
    Stable,
    Attention,
    Critical,
}

impl GlobalRiskLevel {
    /// Classify a scan from the reports it collected.
    ///
    /// `critical` if any report carries an error, `attention` if only
    /// warnings exist, `stable` if nothing failed. Counts only; severities
    /// are never averaged.
    pub fn classify<'a, I>(reports: I) -> Self
    where
        I: IntoIterator<Item = &'a ValidationReport>,
    {
        let mut level = Self::Stable;
        for report in reports {
            if report.has_errors() {
                return Self::Critical;
            }
            if !report.ok {
                level = Self::Attention;
            }
        }
        level
    }
}
