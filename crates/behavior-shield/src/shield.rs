use std::fmt;

use integrity_core::{DiagnosticSink, User};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::machine_rules::MachineRuleSet;
use crate::scorer::BehaviorScorer;
use crate::snapshot::ActivitySnapshot;

/// Diagnostic category used for shield escalations.
pub const SHIELD_CATEGORY: &str = "shield";

/// Enforcement tier, ordered from least to most restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShieldLevel {
    Normal,
    Medium,
    High,
    Critical,
}

impl ShieldLevel {
    /// Map a score and the number of triggered machine rules to a tier.
    ///
    /// Checked in priority order: critical, high, medium, normal.
    pub fn from_signals(score: u8, rule_count: usize) -> Self {
        if score > 80 || rule_count >= 2 {
            Self::Critical
        } else if score > 50 || rule_count == 1 {
            Self::High
        } else if score > 30 {
            Self::Medium
        } else {
            Self::Normal
        }
    }
}

impl fmt::Display for ShieldLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// The outcome of a shield evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldDecision {
    pub score: u8,
    pub rules: Vec<String>,
    pub shield: ShieldLevel,
}

impl ShieldDecision {
    /// The decision every privileged user receives.
    pub fn bypass() -> Self {
        Self {
            score: 0,
            rules: Vec::new(),
            shield: ShieldLevel::Normal,
        }
    }
}

/// Source of the two signals the shield combines.
pub trait BehaviorModel {
    fn score(&self, activity: &ActivitySnapshot) -> u8;
    fn flags(&self, user: &User, activity: &ActivitySnapshot) -> Vec<String>;
}

/// [`BehaviorScorer`] plus [`MachineRuleSet`].
#[derive(Debug, Clone, Default)]
pub struct StandardModel {
    pub scorer: BehaviorScorer,
    pub rules: MachineRuleSet,
}

impl BehaviorModel for StandardModel {
    fn score(&self, activity: &ActivitySnapshot) -> u8 {
        self.scorer.compute(activity)
    }

    fn flags(&self, user: &User, activity: &ActivitySnapshot) -> Vec<String> {
        self.rules.evaluate(user, activity)
    }
}

/// Combines behavior score, machine flags and role into a [`ShieldDecision`].
///
/// Nothing is stored between calls; every evaluation starts fresh.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveShield<M = StandardModel> {
    model: M,
}

impl<M: BehaviorModel> AdaptiveShield<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Evaluate a user's recent activity.
    ///
    /// Admins and superadmins always receive [`ShieldDecision::bypass`]; the
    /// model is not consulted for them. Any non-normal verdict is recorded to
    /// `sink`.
    pub fn evaluate(
        &self,
        user: &User,
        activity: &ActivitySnapshot,
        sink: &dyn DiagnosticSink,
    ) -> ShieldDecision {
        if user.role.is_privileged() {
            debug!(user_id = %user.id, role = ?user.role, "shield bypassed for privileged role");
            return ShieldDecision::bypass();
        }

        let score = self.model.score(activity);
        let rules = self.model.flags(user, activity);
        let shield = ShieldLevel::from_signals(score, rules.len());

        debug!(user_id = %user.id, score, rule_count = rules.len(), %shield, "shield evaluated");

        if shield != ShieldLevel::Normal {
            warn!(user_id = %user.id, score, %shield, ?rules, "shield escalated");
            sink.record(
                SHIELD_CATEGORY,
                serde_json::json!({
                    "userId": user.id,
                    "score": score,
                    "shield": shield,
                    "rules": rules,
                    "activity": activity,
                }),
                &user.id,
            );
        }

        ShieldDecision {
            score,
            rules,
            shield,
        }
    }
}
