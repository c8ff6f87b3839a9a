use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::SubscriptionPlan;

/// Top-level engine configuration, usually loaded from YAML.
///
/// Every section falls back to the built-in tables, so a file containing only
/// `version: "1.0"` is a complete configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Schema version; currently must be "1.0".
    pub version: String,
    #[serde(default)]
    pub plans: PlanTables,
    #[serde(default)]
    pub score_bands: ScoreBands,
    #[serde(default)]
    pub action: ActionLimits,
    #[serde(default)]
    pub economy: EconomyLimits,
    /// Queue fairness, shared by the economy sentinel and the audit.
    #[serde(default)]
    pub queue: QueueLimits,
    #[serde(default)]
    pub audit: AuditThresholds,
    /// Population-level failure rates that raise a system-wide anomaly.
    #[serde(default = "default_anomalies")]
    pub anomalies: Vec<AnomalyThreshold>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            plans: PlanTables::default(),
            score_bands: ScoreBands::default(),
            action: ActionLimits::default(),
            economy: EconomyLimits::default(),
            queue: QueueLimits::default(),
            audit: AuditThresholds::default(),
            anomalies: default_anomalies(),
        }
    }
}

// ---------------------------------------------------------------------------
// Plan tables
// ---------------------------------------------------------------------------

/// Per-plan lookup tables. Plans missing from a table get the neutral value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanTables {
    /// Reward multiplier applied to mission coin rewards.
    #[serde(default = "default_multipliers")]
    pub multipliers: BTreeMap<SubscriptionPlan, f64>,
    /// Store discount as a fraction of the base price.
    #[serde(default = "default_discounts")]
    pub discounts: BTreeMap<SubscriptionPlan, f64>,
    /// Maximum mission submissions per day.
    #[serde(default = "default_daily_limits")]
    pub daily_mission_limits: BTreeMap<SubscriptionPlan, u32>,
}

impl Default for PlanTables {
    fn default() -> Self {
        Self {
            multipliers: default_multipliers(),
            discounts: default_discounts(),
            daily_mission_limits: default_daily_limits(),
        }
    }
}

impl PlanTables {
    pub fn multiplier(&self, plan: SubscriptionPlan) -> f64 {
        self.multipliers.get(&plan).copied().unwrap_or(1.0)
    }

    pub fn discount(&self, plan: SubscriptionPlan) -> f64 {
        self.discounts.get(&plan).copied().unwrap_or(0.0)
    }

    /// `None` means the plan has no daily limit.
    pub fn daily_mission_limit(&self, plan: SubscriptionPlan) -> Option<u32> {
        self.daily_mission_limits.get(&plan).copied()
    }
}

fn default_multipliers() -> BTreeMap<SubscriptionPlan, f64> {
    BTreeMap::from([
        (SubscriptionPlan::Free, 1.0),
        (SubscriptionPlan::Silver, 1.1),
        (SubscriptionPlan::Gold, 1.25),
        (SubscriptionPlan::Diamond, 1.5),
    ])
}

fn default_discounts() -> BTreeMap<SubscriptionPlan, f64> {
    BTreeMap::from([
        (SubscriptionPlan::Free, 0.0),
        (SubscriptionPlan::Silver, 0.05),
        (SubscriptionPlan::Gold, 0.10),
        (SubscriptionPlan::Diamond, 0.15),
    ])
}

fn default_daily_limits() -> BTreeMap<SubscriptionPlan, u32> {
    BTreeMap::from([
        (SubscriptionPlan::Free, 3),
        (SubscriptionPlan::Silver, 5),
        (SubscriptionPlan::Gold, 8),
        (SubscriptionPlan::Diamond, 12),
    ])
}

// ---------------------------------------------------------------------------
// Behavior score bands
// ---------------------------------------------------------------------------

/// One threshold on a metric: values strictly above `above` earn `points`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub above: f64,
    pub points: u8,
}

const fn band(above: f64, points: u8) -> Band {
    Band { above, points }
}

/// Band tables for the behavior scorer. Each list is ordered by descending
/// threshold; only the first band a value exceeds contributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreBands {
    pub delta_coins: Vec<Band>,
    pub delta_xp: Vec<Band>,
    pub actions_per_minute: Vec<Band>,
    pub jackpot_attempts: Vec<Band>,
    pub store_bursts: Vec<Band>,
    pub same_device_users: Vec<Band>,
    /// Flat contribution when the repeated-pattern flag is set.
    pub repeated_pattern: u8,
}

impl Default for ScoreBands {
    fn default() -> Self {
        Self {
            delta_coins: vec![band(2000.0, 40), band(1000.0, 25)],
            delta_xp: vec![band(1500.0, 30)],
            actions_per_minute: vec![band(30.0, 40), band(15.0, 20)],
            jackpot_attempts: vec![band(5.0, 30)],
            store_bursts: vec![band(3.0, 20)],
            same_device_users: vec![band(2.0, 40)],
            repeated_pattern: 25,
        }
    }
}

impl ScoreBands {
    /// All band tables with their names, for validation and logging.
    pub fn tables(&self) -> [(&'static str, &[Band]); 6] {
        [
            ("delta_coins", self.delta_coins.as_slice()),
            ("delta_xp", self.delta_xp.as_slice()),
            ("actions_per_minute", self.actions_per_minute.as_slice()),
            ("jackpot_attempts", self.jackpot_attempts.as_slice()),
            ("store_bursts", self.store_bursts.as_slice()),
            ("same_device_users", self.same_device_users.as_slice()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Action sentinel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionLimits {
    pub min_title_len: usize,
    pub min_description_len: usize,
    /// Stricter description minimum applied when an admin creates a mission.
    pub admin_min_description_len: usize,
    pub allowed_mission_types: Vec<String>,
    /// Social-engagement terms banned from mission text (case-insensitive).
    pub forbidden_terms: Vec<String>,
    /// Proofs at or below this length are never considered reused.
    pub min_reused_proof_len: usize,
}

impl Default for ActionLimits {
    fn default() -> Self {
        Self {
            min_title_len: 5,
            min_description_len: 10,
            admin_min_description_len: 20,
            allowed_mission_types: ["instagram", "tiktok", "youtube", "link", "upload", "checkin", "quiz"]
                .into_iter()
                .map(String::from)
                .collect(),
            forbidden_terms: [
                "like",
                "curtir",
                "follow",
                "seguir",
                "comentar",
                "comment",
                "compartilhar",
                "share",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            min_reused_proof_len: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// Economy sentinel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyLimits {
    /// Transaction kind that records a mission reward credit.
    pub mission_reward_kind: String,
}

impl Default for EconomyLimits {
    fn default() -> Self {
        Self {
            mission_reward_kind: "mission_reward".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Queues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueLimits {
    /// Maximum positions one user may hold in a single queue.
    pub max_entries_per_queue: usize,
}

impl Default for QueueLimits {
    fn default() -> Self {
        Self {
            max_entries_per_queue: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditThresholds {
    /// Levels at or below this are never flagged for rapid growth.
    pub min_level_for_growth_check: u32,
    pub max_levels_per_day: f64,
    /// Coins a balance may exceed its transaction history by.
    pub coin_gain_tolerance: i64,
    pub submission_window_secs: i64,
    pub max_submissions_per_window: usize,
    pub max_redemptions_per_day: usize,
}

impl Default for AuditThresholds {
    fn default() -> Self {
        Self {
            min_level_for_growth_check: 5,
            max_levels_per_day: 5.0,
            coin_gain_tolerance: 500,
            submission_window_secs: 60,
            max_submissions_per_window: 5,
            max_redemptions_per_day: 5,
        }
    }
}

/// A rule whose population failure rate raises a system-wide anomaly when it
/// strictly exceeds `max_rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyThreshold {
    pub rule: String,
    pub max_rate: f64,
    pub message: String,
}

fn default_anomalies() -> Vec<AnomalyThreshold> {
    vec![
        AnomalyThreshold {
            rule: "rapid_level_growth".to_string(),
            max_rate: 0.10,
            message: "more than 10% of audited users show rapid level growth".to_string(),
        },
        AnomalyThreshold {
            rule: "unusual_coin_gain".to_string(),
            max_rate: 0.05,
            message: "more than 5% of audited users show unexplained coin gains".to_string(),
        },
    ]
}
