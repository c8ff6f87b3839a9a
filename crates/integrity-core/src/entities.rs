//! Read-only entity snapshots supplied by callers.
//!
//! These mirror the records the platform keeps in storage. The engine never
//! mutates them and never holds on to them past a single call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
    Superadmin,
}

impl Role {
    /// Roles that bypass behavioral enforcement.
    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Admin | Self::Superadmin)
    }
}

/// Subscription tier. Keys the multiplier, discount and daily-limit tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    #[default]
    Free,
    Silver,
    Gold,
    Diamond,
}

impl fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Silver => write!(f, "silver"),
            Self::Gold => write!(f, "gold"),
            Self::Diamond => write!(f, "diamond"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub xp: i64,
    #[serde(default)]
    pub coins: i64,
    #[serde(default)]
    pub plan: SubscriptionPlan,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub check_in_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Raw type string as stored; validated against the allowed list.
    #[serde(rename = "type")]
    pub mission_type: String,
    #[serde(default)]
    pub reward_coins: i64,
    #[serde(default)]
    pub reward_xp: i64,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionSubmission {
    pub id: String,
    pub mission_id: String,
    pub user_id: String,
    #[serde(default)]
    pub proof: String,
    #[serde(default)]
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
}

/// A store purchase as recorded at redemption time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemedItem {
    pub id: String,
    pub user_id: String,
    pub item_id: String,
    pub base_price: i64,
    pub paid_price: i64,
    #[serde(default)]
    pub plan_at_purchase: SubscriptionPlan,
    /// Coin balance immediately before the purchase.
    pub balance_before: i64,
    pub redeemed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinTransaction {
    pub id: String,
    pub user_id: String,
    /// Signed: credits are positive, debits negative.
    pub amount: i64,
    #[serde(default)]
    pub kind: String,
    /// Entity the transaction pays for, e.g. the mission id of a reward.
    #[serde(default)]
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One position in a processing queue (raffles, payouts, review).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub user_id: String,
    pub queue: String,
    pub enqueued_at: DateTime<Utc>,
}
