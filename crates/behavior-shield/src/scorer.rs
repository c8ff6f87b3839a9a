use integrity_core::{Band, ScoreBands};
use tracing::trace;

use crate::snapshot::ActivitySnapshot;

/// Upper bound of a behavior score.
pub const MAX_SCORE: u8 = 100;

/// Converts an [`ActivitySnapshot`] into a bounded risk score in `[0, 100]`.
///
/// Each metric contributes the points of the highest band it exceeds; the
/// contributions are summed and clamped at [`MAX_SCORE`].
#[derive(Debug, Clone, Default)]
pub struct BehaviorScorer {
    bands: ScoreBands,
}

impl BehaviorScorer {
    pub fn new(bands: ScoreBands) -> Self {
        Self { bands }
    }

    pub fn bands(&self) -> &ScoreBands {
        &self.bands
    }

    /// Score a snapshot. Pure and deterministic.
    pub fn compute(&self, activity: &ActivitySnapshot) -> u8 {
        let b = &self.bands;
        let contributions = [
            ("delta_coins", band_points(&b.delta_coins, activity.delta_coins as f64)),
            ("delta_xp", band_points(&b.delta_xp, activity.delta_xp as f64)),
            (
                "actions_per_minute",
                band_points(&b.actions_per_minute, activity.actions_per_minute()),
            ),
            (
                "jackpot_attempts",
                band_points(&b.jackpot_attempts, f64::from(activity.jackpot_attempts)),
            ),
            ("store_bursts", band_points(&b.store_bursts, f64::from(activity.store_bursts))),
            (
                "same_device_users",
                band_points(&b.same_device_users, f64::from(activity.same_device_users)),
            ),
            (
                "repeated_pattern",
                if activity.repeated_pattern {
                    u32::from(b.repeated_pattern)
                } else {
                    0
                },
            ),
        ];

        let mut total: u32 = 0;
        for (metric, points) in contributions {
            if points > 0 {
                trace!(metric, points, "score band triggered");
            }
            total += points;
        }

        total.min(u32::from(MAX_SCORE)) as u8
    }
}

/// Points for the first band `value` strictly exceeds; bands are ordered by
/// descending threshold.
fn band_points(bands: &[Band], value: f64) -> u32 {
    bands
        .iter()
        .find(|band| value > band.above)
        .map(|band| u32::from(band.points))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> BehaviorScorer {
        BehaviorScorer::default()
    }

    #[test]
    fn empty_snapshot_scores_zero() {
        assert_eq!(scorer().compute(&ActivitySnapshot::default()), 0);
    }

    #[test]
    fn coin_bands_are_mutually_exclusive() {
        let s = scorer();
        let mid = ActivitySnapshot {
            delta_coins: 1500,
            ..Default::default()
        };
        let high = ActivitySnapshot {
            delta_coins: 3000,
            ..Default::default()
        };
        assert_eq!(s.compute(&mid), 25);
        // Only the highest band applies, not 40 + 25.
        assert_eq!(s.compute(&high), 40);
    }

    #[test]
    fn thresholds_are_strict() {
        let at_threshold = ActivitySnapshot {
            delta_coins: 1000,
            actions_per_minute: 15.0,
            jackpot_attempts: 5,
            ..Default::default()
        };
        assert_eq!(scorer().compute(&at_threshold), 0);
    }

    #[test]
    fn documented_example() {
        let activity = ActivitySnapshot {
            delta_coins: 3000,
            actions_per_minute: 10.0,
            ..Default::default()
        };
        assert_eq!(scorer().compute(&activity), 40);
    }

    #[test]
    fn contributions_sum() {
        let activity = ActivitySnapshot {
            delta_xp: 1600,
            actions_per_minute: 20.0,
            store_bursts: 4,
            ..Default::default()
        };
        assert_eq!(scorer().compute(&activity), 30 + 20 + 20);
    }

    #[test]
    fn score_is_clamped() {
        let activity = ActivitySnapshot {
            delta_coins: 10_000,
            delta_xp: 10_000,
            actions_per_minute: 100.0,
            jackpot_attempts: 50,
            store_bursts: 50,
            same_device_users: 10,
            repeated_pattern: true,
            ..Default::default()
        };
        assert_eq!(scorer().compute(&activity), MAX_SCORE);
    }

    #[test]
    fn score_stays_in_range_across_inputs() {
        let s = scorer();
        for coins in [-5000_i64, 0, 999, 1001, 2001, i64::MAX] {
            for apm in [f64::NAN, -1.0, 0.0, 16.0, 31.0, f64::INFINITY] {
                for flag in [false, true] {
                    let activity = ActivitySnapshot {
                        delta_coins: coins,
                        actions_per_minute: apm,
                        repeated_pattern: flag,
                        same_device_users: 3,
                        ..Default::default()
                    };
                    assert!(s.compute(&activity) <= MAX_SCORE);
                }
            }
        }
    }

    #[test]
    fn nan_rate_contributes_nothing() {
        let activity = ActivitySnapshot {
            actions_per_minute: f64::NAN,
            repeated_pattern: true,
            ..Default::default()
        };
        assert_eq!(scorer().compute(&activity), 25);
    }

    #[test]
    fn custom_bands_are_used() {
        let bands = ScoreBands {
            delta_xp: vec![Band { above: 10.0, points: 7 }],
            ..Default::default()
        };
        let activity = ActivitySnapshot {
            delta_xp: 11,
            ..Default::default()
        };
        assert_eq!(BehaviorScorer::new(bands).compute(&activity), 7);
    }
}
