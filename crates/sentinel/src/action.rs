//! Action sentinel: mission and submission safety rules.

use integrity_core::{
    run_rules, ActionLimits, EngineError, GlobalRiskLevel, Mission, MissionSubmission, Rule,
    RuleResult, Severity, SubjectReport, ValidationReport,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::terms::TermScanner;

pub const VALID_MISSION_FORMAT: &str = "valid_mission_format";
pub const NO_ENGAGEMENT_TERMS: &str = "no_engagement_terms";
pub const VALID_USER_SUBMISSION: &str = "valid_user_submission";
pub const NO_PROOF_REUSE: &str = "no_proof_reuse";
pub const ADMIN_MISSION_CREATION: &str = "admin_mission_creation";
/// Recorded by [`ActionSentinel::scan`] for a submission whose mission is
/// missing from the scanned set.
pub const KNOWN_MISSION: &str = "known_mission";

/// Prefix that marks a proof as an uploaded file rather than a link.
const DATA_URI_PREFIX: &str = "data:";

/// Mission types whose link proofs must point at a specific domain.
const SOCIAL_DOMAINS: &[(&str, &str)] = &[("instagram", "instagram.com"), ("tiktok", "tiktok.com")];

/// A submission together with what its rules need to look at.
pub struct SubmissionCheck<'a> {
    pub submission: &'a MissionSubmission,
    pub mission: &'a Mission,
    /// Every known submission, used by the proof-reuse rule.
    pub all_submissions: &'a [MissionSubmission],
}

/// Result of a full mission/submission scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionScan {
    pub global_risk_level: GlobalRiskLevel,
    pub mission_reports: Vec<SubjectReport>,
    pub submission_reports: Vec<SubjectReport>,
}

/// Validates missions and submissions against the configured limits.
#[derive(Debug)]
pub struct ActionSentinel {
    limits: ActionLimits,
    terms: TermScanner,
}

const MISSION_RULES: &[(&str, Rule<Mission, ActionSentinel>)] = &[
    (VALID_MISSION_FORMAT, rule_valid_mission_format),
    (NO_ENGAGEMENT_TERMS, rule_no_engagement_terms),
];

const ADMIN_MISSION_RULES: &[(&str, Rule<Mission, ActionSentinel>)] = &[
    (VALID_MISSION_FORMAT, rule_valid_mission_format),
    (ADMIN_MISSION_CREATION, rule_admin_mission_creation),
];

fn submission_rules<'a>() -> [(&'static str, Rule<SubmissionCheck<'a>, ActionSentinel>); 2] {
    [
        (VALID_USER_SUBMISSION, rule_valid_user_submission),
        (NO_PROOF_REUSE, rule_no_proof_reuse),
    ]
}

impl ActionSentinel {
    pub fn new(limits: ActionLimits) -> Result<Self, EngineError> {
        let terms = TermScanner::new(&limits.forbidden_terms)?;
        Ok(Self { limits, terms })
    }

    pub fn limits(&self) -> &ActionLimits {
        &self.limits
    }

    /// Validate a mission as stored or edited.
    pub fn validate_mission(&self, mission: &Mission) -> ValidationReport {
        debug!(mission_id = %mission.id, "validating mission");
        run_rules(MISSION_RULES, mission, self)
    }

    /// Validate a mission an admin is creating; applies the stricter
    /// description minimum alongside the term ban.
    pub fn validate_admin_mission(&self, mission: &Mission) -> ValidationReport {
        debug!(mission_id = %mission.id, "validating admin mission creation");
        run_rules(ADMIN_MISSION_RULES, mission, self)
    }

    /// Validate a submission. `all_submissions` should be the complete set
    /// the proof-reuse rule is meant to see.
    ///
    /// Fails with [`EngineError::UnknownMission`] when the submission's
    /// mission is not in `missions`.
    pub fn validate_submission(
        &self,
        submission: &MissionSubmission,
        missions: &[Mission],
        all_submissions: &[MissionSubmission],
    ) -> Result<ValidationReport, EngineError> {
        debug!(submission_id = %submission.id, "validating submission");
        let mission = find_mission(submission, missions)?;
        let check = SubmissionCheck {
            submission,
            mission,
            all_submissions,
        };
        Ok(run_rules(&submission_rules(), &check, self))
    }

    /// Validate every mission and submission, keeping only failing reports.
    ///
    /// A submission that references a mission outside `missions` does not
    /// abort the scan. It is reported as a failing high-severity
    /// [`KNOWN_MISSION`] result and the scan moves on, so one dangling
    /// reference cannot hide the rest of the batch.
    pub fn scan(&self, missions: &[Mission], submissions: &[MissionSubmission]) -> ActionScan {
        let mission_reports: Vec<SubjectReport> = missions
            .iter()
            .filter_map(|m| failing(&m.id, self.validate_mission(m)))
            .collect();

        let submission_reports: Vec<SubjectReport> = submissions
            .iter()
            .filter_map(|s| {
                let report = self
                    .validate_submission(s, missions, submissions)
                    .unwrap_or_else(|err| {
                        warn!(submission_id = %s.id, error = %err, "submission skipped by scan");
                        ValidationReport::from_results(&[RuleResult::fail(
                            KNOWN_MISSION,
                            Severity::High,
                            err.to_string(),
                        )])
                    });
                failing(&s.id, report)
            })
            .collect();

        let global_risk_level = GlobalRiskLevel::classify(
            mission_reports
                .iter()
                .chain(&submission_reports)
                .map(|r| &r.report),
        );

        debug!(
            missions = missions.len(),
            submissions = submissions.len(),
            failing = mission_reports.len() + submission_reports.len(),
            ?global_risk_level,
            "action scan complete"
        );

        ActionScan {
            global_risk_level,
            mission_reports,
            submission_reports,
        }
    }
}

fn find_mission<'a>(
    submission: &MissionSubmission,
    missions: &'a [Mission],
) -> Result<&'a Mission, EngineError> {
    missions
        .iter()
        .find(|m| m.id == submission.mission_id)
        .ok_or_else(|| EngineError::UnknownMission {
            submission_id: submission.id.clone(),
            mission_id: submission.mission_id.clone(),
        })
}

fn failing(subject_id: &str, report: ValidationReport) -> Option<SubjectReport> {
    (!report.ok).then(|| SubjectReport {
        subject_id: subject_id.to_string(),
        report,
    })
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Title and description lengths, and a known mission type.
pub fn rule_valid_mission_format(mission: &Mission, s: &ActionSentinel) -> RuleResult {
    let limits = &s.limits;
    let mut problems = Vec::new();
    let mut severity = Severity::Medium;

    let title_len = mission.title.trim().chars().count();
    if title_len < limits.min_title_len {
        problems.push(format!(
            "title must have at least {} characters (has {title_len})",
            limits.min_title_len
        ));
    }

    let description_len = mission.description.trim().chars().count();
    if description_len < limits.min_description_len {
        problems.push(format!(
            "description must have at least {} characters (has {description_len})",
            limits.min_description_len
        ));
    }

    if !limits
        .allowed_mission_types
        .iter()
        .any(|t| t.eq_ignore_ascii_case(mission.mission_type.trim()))
    {
        problems.push(format!("mission type '{}' is not allowed", mission.mission_type));
        severity = Severity::High;
    }

    if problems.is_empty() {
        RuleResult::pass(VALID_MISSION_FORMAT)
    } else {
        RuleResult::fail(VALID_MISSION_FORMAT, severity, problems.join("; "))
    }
}

/// Missions may not ask for likes, follows, comments or shares.
pub fn rule_no_engagement_terms(mission: &Mission, s: &ActionSentinel) -> RuleResult {
    match engagement_terms_failure(mission, s) {
        Some(details) => RuleResult::fail(NO_ENGAGEMENT_TERMS, Severity::High, details),
        None => RuleResult::pass(NO_ENGAGEMENT_TERMS),
    }
}

fn engagement_terms_failure(mission: &Mission, s: &ActionSentinel) -> Option<String> {
    let hits = s.terms.find_any(&[mission.title.as_str(), mission.description.as_str()]);
    if hits.is_empty() {
        None
    } else {
        Some(format!(
            "mission text contains forbidden engagement terms: {}",
            hits.join(", ")
        ))
    }
}

/// Term ban plus the stricter admin description minimum.
pub fn rule_admin_mission_creation(mission: &Mission, s: &ActionSentinel) -> RuleResult {
    if let Some(details) = engagement_terms_failure(mission, s) {
        return RuleResult::fail(ADMIN_MISSION_CREATION, Severity::High, details);
    }

    let min = s.limits.admin_min_description_len;
    let len = mission.description.trim().chars().count();
    if len < min {
        return RuleResult::fail(
            ADMIN_MISSION_CREATION,
            Severity::Low,
            format!("admin missions should describe the task in at least {min} characters (has {len})"),
        );
    }

    RuleResult::pass(ADMIN_MISSION_CREATION)
}

/// The proof must be present and fit the mission type.
pub fn rule_valid_user_submission(check: &SubmissionCheck<'_>, _: &ActionSentinel) -> RuleResult {
    let proof = check.submission.proof.trim();
    let mission = check.mission;

    if proof.is_empty() {
        return RuleResult::fail(VALID_USER_SUBMISSION, Severity::High, "submission proof is empty");
    }

    if proof.starts_with(DATA_URI_PREFIX) {
        if mission.description.to_lowercase().contains("link") {
            return RuleResult::fail(
                VALID_USER_SUBMISSION,
                Severity::Low,
                "mission asks for a link but a file was uploaded",
            );
        }
        return RuleResult::pass(VALID_USER_SUBMISSION);
    }

    if !proof.starts_with("http") {
        return RuleResult::fail(
            VALID_USER_SUBMISSION,
            Severity::High,
            "proof link must start with http",
        );
    }

    let mission_type = mission.mission_type.trim().to_lowercase();
    if let Some((_, domain)) = SOCIAL_DOMAINS.iter().find(|(t, _)| *t == mission_type) {
        if !proof.to_lowercase().contains(domain) {
            return RuleResult::fail(
                VALID_USER_SUBMISSION,
                Severity::Medium,
                format!("{mission_type} mission proof must link to {domain}"),
            );
        }
    }

    RuleResult::pass(VALID_USER_SUBMISSION)
}

/// The same user may not reuse one proof URL across different missions.
pub fn rule_no_proof_reuse(check: &SubmissionCheck<'_>, s: &ActionSentinel) -> RuleResult {
    let current = check.submission;
    let proof = current.proof.trim();

    if proof.chars().count() <= s.limits.min_reused_proof_len {
        return RuleResult::pass(NO_PROOF_REUSE);
    }

    let reused_on: Vec<&str> = check
        .all_submissions
        .iter()
        .filter(|other| {
            other.id != current.id
                && other.user_id == current.user_id
                && other.mission_id != current.mission_id
                && other.proof.trim() == proof
        })
        .map(|other| other.mission_id.as_str())
        .collect();

    if reused_on.is_empty() {
        RuleResult::pass(NO_PROOF_REUSE)
    } else {
        RuleResult::fail(
            NO_PROOF_REUSE,
            Severity::Medium,
            format!("proof already used for mission(s): {}", reused_on.join(", ")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sentinel() -> ActionSentinel {
        ActionSentinel::new(ActionLimits::default()).expect("default limits are valid")
    }

    fn mission(id: &str, title: &str, description: &str, mission_type: &str) -> Mission {
        Mission {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            mission_type: mission_type.into(),
            reward_coins: 50,
            reward_xp: 10,
            created_by: None,
        }
    }

    fn good_mission() -> Mission {
        mission("m-1", "Weekly photo", "Post a photo of your workout routine", "instagram")
    }

    fn submission(id: &str, mission_id: &str, user_id: &str, proof: &str) -> MissionSubmission {
        MissionSubmission {
            id: id.into(),
            mission_id: mission_id.into(),
            user_id: user_id.into(),
            proof: proof.into(),
            status: Default::default(),
            submitted_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn good_mission_passes() {
        let report = sentinel().validate_mission(&good_mission());
        assert!(report.ok, "{report:?}");
    }

    #[test]
    fn short_title_is_a_single_warning() {
        let m = mission("m-2", "Hi", "ok", "instagram");
        let result = rule_valid_mission_format(&m, &sentinel());
        assert!(!result.passed);
        assert_eq!(result.severity, Severity::Medium);

        let report = sentinel().validate_mission(&m);
        assert!(!report.ok);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn unknown_type_is_an_error() {
        let m = mission("m-3", "Weekly photo", "Post a photo of your workout", "telegram");
        let report = sentinel().validate_mission(&m);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("telegram"));
    }

    #[test]
    fn engagement_terms_are_banned() {
        let m = mission("m-4", "Boost us", "FOLLOW our page and leave a like", "instagram");
        let result = rule_no_engagement_terms(&m, &sentinel());
        assert!(!result.passed);
        assert_eq!(result.severity, Severity::High);
        assert!(result.details.contains("like"));
        assert!(result.details.contains("follow"));
    }

    #[test]
    fn admin_creation_requires_longer_description() {
        let m = mission("m-5", "Quiz time", "Answer the quiz", "quiz");
        let report = sentinel().validate_admin_mission(&m);
        assert!(!report.ok);
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("at least 20"));
    }

    #[test]
    fn admin_creation_reruns_term_ban() {
        let m = mission("m-6", "Share it", "Share this mission with all of your friends", "link");
        let result = rule_admin_mission_creation(&m, &sentinel());
        assert_eq!(result.severity, Severity::High);
        assert!(!result.passed);
    }

    #[test]
    fn instagram_link_passes() {
        let missions = vec![good_mission()];
        let subs = vec![submission("s-1", "m-1", "u-1", "https://instagram.com/p/x")];
        let report = sentinel().validate_submission(&subs[0], &missions, &subs).unwrap();
        assert!(report.ok, "{report:?}");
    }

    #[test]
    fn wrong_domain_is_a_warning() {
        let missions = vec![good_mission()];
        let subs = vec![submission("s-1", "m-1", "u-1", "https://example.com/p/x")];
        let report = sentinel().validate_submission(&subs[0], &missions, &subs).unwrap();
        assert_eq!(report.warnings, vec!["instagram mission proof must link to instagram.com"]);
    }

    #[test]
    fn non_http_link_is_an_error() {
        let missions = vec![good_mission()];
        let subs = vec![submission("s-1", "m-1", "u-1", "instagram.com/p/x")];
        let report = sentinel().validate_submission(&subs[0], &missions, &subs).unwrap();
        assert_eq!(report.errors, vec!["proof link must start with http"]);
    }

    #[test]
    fn empty_proof_is_an_error() {
        let missions = vec![good_mission()];
        let subs = vec![submission("s-1", "m-1", "u-1", "   ")];
        let report = sentinel().validate_submission(&subs[0], &missions, &subs).unwrap();
        assert_eq!(report.errors, vec!["submission proof is empty"]);
    }

    #[test]
    fn uploaded_file_for_link_mission_is_low() {
        let missions = vec![mission("m-7", "Read post", "Send the link to the article", "link")];
        let subs = vec![submission("s-1", "m-7", "u-1", "data:image/png;base64,AAAA")];
        let check = SubmissionCheck {
            submission: &subs[0],
            mission: &missions[0],
            all_submissions: &subs,
        };
        let result = rule_valid_user_submission(&check, &sentinel());
        assert_eq!(result.severity, Severity::Low);
        assert!(!result.passed);
    }

    #[test]
    fn uploaded_file_for_upload_mission_passes() {
        let missions = vec![mission("m-8", "Receipt", "Upload the store receipt", "upload")];
        let subs = vec![submission("s-1", "m-8", "u-1", "data:image/png;base64,AAAA")];
        let report = sentinel().validate_submission(&subs[0], &missions, &subs).unwrap();
        assert!(report.ok);
    }

    #[test]
    fn proof_reuse_across_missions() {
        let proof = "https://instagram.com/p/abcdefghijk";
        let missions = vec![
            good_mission(),
            mission("m-9", "Second photo", "Post another workout photo", "instagram"),
        ];
        let subs = vec![
            submission("s-1", "m-1", "u-1", proof),
            submission("s-2", "m-9", "u-1", proof),
            // Another user with the same proof is not reuse by u-1.
            submission("s-3", "m-9", "u-2", "https://instagram.com/p/zzzzzzzzzzz"),
        ];
        let report = sentinel().validate_submission(&subs[0], &missions, &subs).unwrap();
        assert_eq!(report.warnings, vec!["proof already used for mission(s): m-9"]);
    }

    #[test]
    fn short_proofs_are_never_reuse() {
        let missions = vec![good_mission(), mission("m-9", "Second photo", "Post another photo", "instagram")];
        let subs = vec![
            submission("s-1", "m-1", "u-1", "https://ig.com/p/1"),
            submission("s-2", "m-9", "u-1", "https://ig.com/p/1"),
        ];
        let check = SubmissionCheck {
            submission: &subs[0],
            mission: &missions[0],
            all_submissions: &subs,
        };
        assert!(rule_no_proof_reuse(&check, &sentinel()).passed);
    }

    #[test]
    fn unknown_mission_is_caller_misuse() {
        let subs = vec![submission("s-1", "missing", "u-1", "https://x.io")];
        let err = sentinel().validate_submission(&subs[0], &[], &subs).unwrap_err();
        assert!(matches!(err, EngineError::UnknownMission { .. }));
    }

    #[test]
    fn scan_classifies_globally() {
        let s = sentinel();
        let clean = vec![good_mission()];
        let subs = vec![submission("s-1", "m-1", "u-1", "https://instagram.com/p/x")];
        let scan = s.scan(&clean, &subs);
        assert_eq!(scan.global_risk_level, GlobalRiskLevel::Stable);
        assert!(scan.mission_reports.is_empty());
        assert!(scan.submission_reports.is_empty());

        let warn_only = vec![good_mission(), mission("m-2", "Hi", "ok", "instagram")];
        let scan = s.scan(&warn_only, &subs);
        assert_eq!(scan.global_risk_level, GlobalRiskLevel::Attention);
        assert_eq!(scan.mission_reports.len(), 1);
        assert_eq!(scan.mission_reports[0].subject_id, "m-2");

        let bad_subs = vec![submission("s-2", "m-1", "u-1", "")];
        let scan = s.scan(&warn_only, &bad_subs);
        assert_eq!(scan.global_risk_level, GlobalRiskLevel::Critical);
        assert_eq!(scan.submission_reports.len(), 1);
    }

    #[test]
    fn scan_reports_dangling_submission_and_continues() {
        let missions = vec![good_mission()];
        let subs = vec![
            submission("s-1", "gone", "u-1", "https://instagram.com/p/a"),
            submission("s-2", "m-1", "u-2", ""),
            submission("s-3", "m-1", "u-3", "https://instagram.com/p/c"),
        ];
        let scan = sentinel().scan(&missions, &subs);

        assert_eq!(scan.global_risk_level, GlobalRiskLevel::Critical);
        let ids: Vec<&str> = scan
            .submission_reports
            .iter()
            .map(|r| r.subject_id.as_str())
            .collect();
        assert_eq!(ids, vec!["s-1", "s-2"]);

        let dangling = &scan.submission_reports[0].report;
        assert!(!dangling.ok);
        assert_eq!(
            dangling.errors,
            vec!["submission 's-1' references unknown mission 'gone'"]
        );
    }

    #[test]
    fn blank_forbidden_term_fails_construction() {
        let limits = ActionLimits {
            forbidden_terms: vec!["like".into(), " ".into()],
            ..ActionLimits::default()
        };
        let err = ActionSentinel::new(limits).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTerm(_)));
    }

    #[test]
    fn scan_on_empty_input_is_stable() {
        let scan = sentinel().scan(&[], &[]);
        assert_eq!(scan.global_risk_level, GlobalRiskLevel::Stable);
    }
}
