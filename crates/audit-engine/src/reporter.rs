//! Population-level views over a batch of [`AuditResult`]s.

use integrity_core::AnomalyThreshold;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::{AuditResult, RiskLevel};

/// How many rules [`summarize`] lists as most violated.
pub const TOP_RULES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFrequency {
    pub rule: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemAnomaly {
    pub rule: String,
    pub failure_rate: f64,
    pub max_rate: f64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub audited_users: usize,
    pub high_risk_users: Vec<String>,
    pub attention_users: Vec<String>,
    pub top_violated_rules: Vec<RuleFrequency>,
    pub anomalies: Vec<SystemAnomaly>,
}

/// Failure counts per rule, in first-seen order.
fn failure_counts(results: &[AuditResult]) -> Vec<RuleFrequency> {
    let mut counts: Vec<RuleFrequency> = Vec::new();
    for failed in results.iter().flat_map(|r| r.failed()) {
        match counts.iter_mut().find(|f| f.rule == failed.rule) {
            Some(f) => f.count += 1,
            None => counts.push(RuleFrequency {
                rule: failed.rule.clone(),
                count: 1,
            }),
        }
    }
    counts
}

/// The `limit` most-failed rules. Ties keep first-seen order.
pub fn top_violated_rules(results: &[AuditResult], limit: usize) -> Vec<RuleFrequency> {
    let mut counts = failure_counts(results);
    // sort_by is stable
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

/// Rules whose failure rate across `results` strictly exceeds their
/// configured maximum.
pub fn detect_system_wide_anomalies(
    results: &[AuditResult],
    thresholds: &[AnomalyThreshold],
) -> Vec<SystemAnomaly> {
    if results.is_empty() {
        return Vec::new();
    }
    let audited = results.len() as f64;
    let counts = failure_counts(results);

    thresholds
        .iter()
        .filter_map(|t| {
            let failures = counts
                .iter()
                .find(|f| f.rule == t.rule)
                .map_or(0, |f| f.count);
            let failure_rate = failures as f64 / audited;
            (failure_rate > t.max_rate).then(|| {
                warn!(rule = %t.rule, failure_rate, max_rate = t.max_rate, "system-wide anomaly");
                SystemAnomaly {
                    rule: t.rule.clone(),
                    failure_rate,
                    max_rate: t.max_rate,
                    message: t.message.clone(),
                }
            })
        })
        .collect()
}

pub fn summarize(results: &[AuditResult], thresholds: &[AnomalyThreshold]) -> AuditSummary {
    let ids_with = |level: RiskLevel| -> Vec<String> {
        results
            .iter()
            .filter(|r| r.risk_level() == level)
            .map(|r| r.user_id.clone())
            .collect()
    };

    AuditSummary {
        audited_users: results.len(),
        high_risk_users: ids_with(RiskLevel::Danger),
        attention_users: ids_with(RiskLevel::Attention),
        top_violated_rules: top_violated_rules(results, TOP_RULES),
        anomalies: detect_system_wide_anomalies(results, thresholds),
    }
}
