use serde::{Deserialize, Deserializer, Serialize};

/// Recent-activity metrics for one user, built by the caller per evaluation.
///
/// Missing or `null` fields read as zero. Float metrics that are not finite
/// are also treated as zero by the accessors, so nothing non-numeric ever
/// reaches a score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySnapshot {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub delta_coins: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub delta_xp: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions_per_minute: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions_per_second: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub jackpot_attempts: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub store_bursts: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub same_device_users: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub device_mismatch_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mission_repeat_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub repeated_pattern: bool,
}

impl ActivitySnapshot {
    /// Actions per minute, or zero when the value is not finite.
    pub fn actions_per_minute(&self) -> f64 {
        finite_or_zero(self.actions_per_minute)
    }

    /// Actions per second, or zero when the value is not finite.
    pub fn actions_per_second(&self) -> f64 {
        finite_or_zero(self.actions_per_second)
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
