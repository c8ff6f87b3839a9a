//! # behavior-shield
//!
//! Real-time anti-cheat layer. A caller builds an [`ActivitySnapshot`] for a
//! user and asks the [`AdaptiveShield`] for an enforcement tier:
//!
//! 1. **[`scorer`]** -- additive band scoring into a `0..=100` risk score.
//! 2. **[`machine_rules`]** -- independent coded heuristics producing labels.
//! 3. **[`shield`]** -- combines both (after the privileged-role bypass) into
//!    a [`ShieldLevel`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use behavior_shield::{ActivitySnapshot, AdaptiveShield, StandardModel};
//! use integrity_core::{NullSink, User};
//!
//! # fn example(user: &User) {
//! let shield = AdaptiveShield::<StandardModel>::default();
//! let activity = ActivitySnapshot { delta_coins: 3000, ..Default::default() };
//! let decision = shield.evaluate(user, &activity, &NullSink);
//! println!("{:?}", decision.shield);
//! # }
//! ```

pub mod machine_rules;
pub mod scorer;
pub mod shield;
mod snapshot;

pub use machine_rules::{MachineRule, MachineRuleSet, MACHINE_RULES};
pub use scorer::{BehaviorScorer, MAX_SCORE};
pub use shield::{
    AdaptiveShield, BehaviorModel, ShieldDecision, ShieldLevel, StandardModel, SHIELD_CATEGORY,
};
pub use snapshot::ActivitySnapshot;
