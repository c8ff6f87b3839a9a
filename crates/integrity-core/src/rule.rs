use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordinal importance of a failed rule.
///
/// Only [`Severity::High`] failures become blocking errors in a
/// [`ValidationReport`](crate::ValidationReport).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// The outcome of evaluating one rule against one subject.
///
/// A passing result always carries empty `details`; construct values through
/// [`RuleResult::pass`] and [`RuleResult::fail`] so that holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    /// Stable identifier, unique within its rule set.
    pub rule: String,
    pub passed: bool,
    /// Only meaningful when `passed` is false.
    pub severity: Severity,
    /// Human-readable explanation of the failure.
    pub details: String,
}

impl RuleResult {
    /// A passing result. Severity is recorded as `low` and is not meaningful.
    pub fn pass(rule: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            passed: true,
            severity: Severity::Low,
            details: String::new(),
        }
    }

    /// A failing result with the given severity and explanation.
    pub fn fail(rule: impl Into<String>, severity: Severity, details: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            passed: false,
            severity,
            details: details.into(),
        }
    }

    /// `true` when this result failed with [`Severity::High`].
    pub fn is_blocking(&self) -> bool {
        !self.passed && self.severity == Severity::High
    }
}
