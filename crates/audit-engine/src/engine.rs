use integrity_core::{
    evaluate_rules, AuditThresholds, EngineError, QueueLimits, Role, RuleResult, Severity, User,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rules::{audit_rules, AuditData, AuditScope};

/// Retrospective classification of one user's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Safe,
    Attention,
    Danger,
}

impl RiskLevel {
    /// `danger` iff a high-severity rule failed, `attention` for any other
    /// failure.
    pub fn classify(details: &[RuleResult]) -> Self {
        let failed = details.iter().filter(|r| !r.passed);
        let mut level = RiskLevel::Safe;
        for result in failed {
            if result.severity == Severity::High {
                return RiskLevel::Danger;
            }
            level = RiskLevel::Attention;
        }
        level
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub passed_rules: usize,
    pub failed_rules: usize,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    pub user_id: String,
    pub result_summary: ResultSummary,
    /// Every rule's outcome, passing ones included.
    pub details: Vec<RuleResult>,
}

impl AuditResult {
    pub fn risk_level(&self) -> RiskLevel {
        self.result_summary.risk_level
    }

    pub fn failed(&self) -> impl Iterator<Item = &RuleResult> {
        self.details.iter().filter(|r| !r.passed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuditEngine {
    thresholds: AuditThresholds,
    queue: QueueLimits,
}

impl AuditEngine {
    /// `queue` is the same section the economy sentinel uses, so both
    /// domains agree on what counts as queue abuse.
    pub fn new(thresholds: AuditThresholds, queue: QueueLimits) -> Self {
        Self { thresholds, queue }
    }

    pub fn thresholds(&self) -> &AuditThresholds {
        &self.thresholds
    }

    /// Run the full audit battery for one user.
    pub fn audit_user(&self, user: &User, data: &AuditData<'_>) -> Result<AuditResult, EngineError> {
        if user.id.trim().is_empty() {
            return Err(EngineError::invalid("user", "id must not be empty"));
        }

        let scope = AuditScope {
            thresholds: &self.thresholds,
            queue: &self.queue,
            data,
        };
        let details = evaluate_rules(&audit_rules(), user, &scope);

        let failed_rules = details.iter().filter(|r| !r.passed).count();
        let risk_level = RiskLevel::classify(&details);
        debug!(user_id = %user.id, failed_rules, ?risk_level, "user audited");

        Ok(AuditResult {
            user_id: user.id.clone(),
            result_summary: ResultSummary {
                passed_rules: details.len() - failed_rules,
                failed_rules,
                risk_level,
            },
            details,
        })
    }

    /// Audit every regular user; staff accounts are skipped.
    pub fn audit_all_users(
        &self,
        users: &[User],
        data: &AuditData<'_>,
    ) -> Result<Vec<AuditResult>, EngineError> {
        users
            .iter()
            .filter(|u| u.role == Role::User)
            .map(|u| self.audit_user(u, data))
            .collect()
    }
}
