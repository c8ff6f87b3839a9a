use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use behavior_shield::ActivitySnapshot;
use chrono::{DateTime, Utc};
use integrity_core::{CoinTransaction, Mission, MissionSubmission, QueueEntry, RedeemedItem, User};
use serde::Deserialize;
use tracing::{debug, warn};

/// Platform snapshot the runner feeds to the engine. Every collection is
/// optional in the file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dataset {
    pub as_of: Option<DateTime<Utc>>,
    pub users: Vec<User>,
    pub missions: Vec<Mission>,
    pub submissions: Vec<MissionSubmission>,
    pub transactions: Vec<CoinTransaction>,
    pub redeemed_items: Vec<RedeemedItem>,
    pub queue: Vec<QueueEntry>,
    pub activity: Vec<ActivitySnapshot>,
}

impl Dataset {
    /// Activity snapshots keyed by user id. Snapshots without a user id are
    /// skipped; a later snapshot for the same user replaces an earlier one.
    pub fn activity_by_user(&self) -> HashMap<&str, &ActivitySnapshot> {
        let mut by_user = HashMap::new();
        for snapshot in &self.activity {
            match snapshot.user_id.as_deref() {
                Some(id) => {
                    by_user.insert(id, snapshot);
                }
                None => warn!("activity snapshot without userId skipped"),
            }
        }
        by_user
    }
}

pub fn load(path: &Path) -> anyhow::Result<Dataset> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    let dataset: Dataset = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse dataset {}", path.display()))?;

    debug!(
        path = %path.display(),
        users = dataset.users.len(),
        missions = dataset.missions.len(),
        submissions = dataset.submissions.len(),
        "dataset loaded"
    );
    Ok(dataset)
}
