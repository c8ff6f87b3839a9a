/// Caller misuse detected by the engine.
///
/// Rule violations are never errors; they are reported as failing
/// [`RuleResult`](crate::RuleResult)s. This type only covers inputs that break
/// a hard precondition.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid {entity}: {reason}")]
    InvalidEntity { entity: &'static str, reason: String },

    #[error("submission '{submission_id}' references unknown mission '{mission_id}'")]
    UnknownMission {
        submission_id: String,
        mission_id: String,
    },

    #[error("invalid forbidden-term set: {0}")]
    InvalidTerm(String),
}

impl EngineError {
    pub fn invalid(entity: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidEntity {
            entity,
            reason: reason.into(),
        }
    }
}
