//! Domain types for the Pathfinder platform, as served by the backend.
//!
//! The client holds no authoritative copy of any of these: everything is a
//! re-fetchable projection of server state. Derived, viewer-relative types
//! ([`JobWithMatch`], [`SkillGapAnalysis`]) are kept separate from the owned
//! entities they decorate so server-computed fields are never persisted back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Users and profiles
// ============================================================================

/// Account role. Immutable after registration from the client's perspective;
/// determines which dashboard is shown and which mutations the server allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Student,
  Employer,
  Advisor,
}

impl Role {
  pub fn label(&self) -> &'static str {
    match self {
      Role::Student => "student",
      Role::Employer => "employer",
      Role::Advisor => "advisor",
    }
  }

  /// All roles, in login-screen cycle order.
  pub const ALL: [Role; 3] = [Role::Student, Role::Employer, Role::Advisor];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id: i64,
  pub email: String,
  pub role: Role,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub profile: Option<Profile>,
  #[serde(default)]
  pub skills: Option<Vec<Skill>>,
}

impl User {
  /// Display name from the profile, falling back to the email address.
  pub fn display_name(&self) -> String {
    match &self.profile {
      Some(p) => format!("{} {}", p.first_name, p.last_name),
      None => self.email.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
  pub id: i64,
  pub user_id: i64,
  pub first_name: String,
  pub last_name: String,
  #[serde(default)]
  pub headline: Option<String>,
  #[serde(default)]
  pub bio: Option<String>,
  #[serde(default)]
  pub academic_background: Option<String>,
  #[serde(default)]
  pub company_name: Option<String>,
  #[serde(default)]
  pub company_description: Option<String>,
  #[serde(default)]
  pub location: Option<String>,
  #[serde(default)]
  pub avatar_url: Option<String>,
  #[serde(default)]
  pub resume_url: Option<String>,
  #[serde(default)]
  pub resume_filename: Option<String>,
}

/// Body for `PUT /users/me/profile`. Only present fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfilePatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub headline: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bio: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub academic_background: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub company_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub company_description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
}

/// Student row in advisor views, with aggregate application stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserWithStats {
  #[serde(flatten)]
  pub user: User,
  #[serde(default)]
  pub avg_match_score: Option<f64>,
  #[serde(default)]
  pub application_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileCompletion {
  pub completion_percentage: f64,
  pub missing_fields: Vec<String>,
  pub has_skills: bool,
  pub skill_count: i64,
  pub can_get_recommendations: bool,
}

// ============================================================================
// Skills
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
  pub id: i64,
  pub name: String,
  /// Technical skills are weighted higher by the server-side match scorer.
  pub is_technical: bool,
  #[serde(default)]
  pub category: Option<String>,
}

/// Payload item for `PUT /users/me/skills-with-proficiency`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillProficiency {
  pub skill_id: i64,
  pub proficiency: i32,
}

/// Response item: a skill plus the student's declared proficiency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillWithProficiency {
  #[serde(flatten)]
  pub skill: Skill,
  pub proficiency: i32,
}

// ============================================================================
// Jobs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
  pub id: i64,
  pub employer_id: i64,
  pub title: String,
  pub description: String,
  #[serde(default)]
  pub location: Option<String>,
  #[serde(default)]
  pub salary_min: Option<i64>,
  #[serde(default)]
  pub salary_max: Option<i64>,
  #[serde(default)]
  pub job_type: Option<String>,
  #[serde(default)]
  pub experience_level: Option<String>,
  #[serde(default)]
  pub deadline: Option<DateTime<Utc>>,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[serde(default)]
  pub required_skills: Vec<Skill>,
}

/// A job decorated with the viewer's server-computed match score.
///
/// Read-only projection, recomputed per viewer; never written back to a
/// [`Job`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobWithMatch {
  #[serde(flatten)]
  pub job: Job,
  pub match_score: f64,
  #[serde(default)]
  pub matched_technical: Vec<String>,
  #[serde(default)]
  pub matched_soft: Vec<String>,
  #[serde(default)]
  pub missing_technical: Vec<String>,
  #[serde(default)]
  pub missing_soft: Vec<String>,
}

/// Body for creating or updating a job posting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobDraft {
  pub title: String,
  pub description: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub salary_min: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub salary_max: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub job_type: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub experience_level: Option<String>,
  /// `None` leaves the posting's skill set alone on update; the server
  /// replaces it whenever the key is present.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub required_skill_ids: Option<Vec<i64>>,
}

// ============================================================================
// Applications
// ============================================================================

/// Server-authoritative application state machine, observed by the client.
///
/// `accepted` and `rejected` are terminal from the UI's perspective; any
/// non-terminal state may move to `rejected`. These helpers gate which
/// actions the UI offers - the real guard lives server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
  Pending,
  Reviewed,
  Interview,
  Rejected,
  Accepted,
}

impl ApplicationStatus {
  pub fn is_terminal(&self) -> bool {
    matches!(self, ApplicationStatus::Accepted | ApplicationStatus::Rejected)
  }

  /// Whether the UI should offer a transition to `target`.
  pub fn can_transition_to(&self, target: ApplicationStatus) -> bool {
    use ApplicationStatus::*;
    if self.is_terminal() || target == *self {
      return false;
    }
    match target {
      // Any non-terminal state can be rejected or accepted outright.
      Rejected | Accepted => true,
      Reviewed => matches!(self, Pending),
      Interview => matches!(self, Pending | Reviewed),
      Pending => false,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      ApplicationStatus::Pending => "pending",
      ApplicationStatus::Reviewed => "reviewed",
      ApplicationStatus::Interview => "interview",
      ApplicationStatus::Rejected => "rejected",
      ApplicationStatus::Accepted => "accepted",
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
  pub id: i64,
  pub job_id: i64,
  pub applicant_id: i64,
  pub status: ApplicationStatus,
  #[serde(default)]
  pub cover_letter: Option<String>,
  /// Match score snapshot taken when the application was submitted.
  #[serde(default)]
  pub match_score: Option<f64>,
  #[serde(default)]
  pub feedback_notes: Option<String>,
  #[serde(default)]
  pub feedback_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[serde(default)]
  pub job: Option<Job>,
  #[serde(default)]
  pub applicant: Option<User>,
}

/// Whether the viewer already applied to `job_id`, given their own
/// application list. Gates the Apply action.
pub fn has_applied(applications: &[Application], job_id: i64) -> bool {
  applications.iter().any(|a| a.job_id == job_id)
}

/// Result of a bulk status update. Partial failure is a normal outcome:
/// callers must branch on `failed_count`, not on an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpdateResult {
  pub updated_count: i64,
  pub failed_count: i64,
  pub failed_ids: Vec<i64>,
  #[serde(default)]
  pub message: String,
}

// ============================================================================
// Notes
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
  pub id: i64,
  pub advisor_id: i64,
  pub student_id: i64,
  pub content: String,
  pub note_type: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Interviews
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewStatus {
  Scheduled,
  Confirmed,
  Completed,
  Cancelled,
  Rescheduled,
}

impl InterviewStatus {
  /// Closed interviews accept no further actions.
  pub fn is_closed(&self) -> bool {
    matches!(self, InterviewStatus::Completed | InterviewStatus::Cancelled)
  }

  pub fn label(&self) -> &'static str {
    match self {
      InterviewStatus::Scheduled => "scheduled",
      InterviewStatus::Confirmed => "confirmed",
      InterviewStatus::Completed => "completed",
      InterviewStatus::Cancelled => "cancelled",
      InterviewStatus::Rescheduled => "rescheduled",
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interview {
  pub id: i64,
  pub application_id: i64,
  pub scheduled_at: DateTime<Utc>,
  pub duration_minutes: i32,
  pub interview_type: String,
  #[serde(default)]
  pub location: Option<String>,
  #[serde(default)]
  pub meeting_link: Option<String>,
  #[serde(default)]
  pub notes: Option<String>,
  pub status: InterviewStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Interview {
  /// Upcoming means the slot is still ahead of us and the record is open.
  pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
    !self.status.is_closed() && self.scheduled_at > now
  }

  /// Reschedule/cancel/confirm are offered only while the interview is
  /// upcoming.
  pub fn can_modify(&self, now: DateTime<Utc>) -> bool {
    self.is_upcoming(now)
  }
}

/// Interview joined with applicant and job context for list views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewWithDetails {
  #[serde(flatten)]
  pub interview: Interview,
  pub applicant_name: String,
  pub applicant_email: String,
  pub job_title: String,
  pub company_name: String,
}

/// Split interviews into upcoming and past. The partition is strict: every
/// record lands in exactly one half.
pub fn partition_interviews(
  interviews: &[InterviewWithDetails],
  now: DateTime<Utc>,
) -> (Vec<&InterviewWithDetails>, Vec<&InterviewWithDetails>) {
  interviews.iter().partition(|i| i.interview.is_upcoming(now))
}

/// Body for `POST /interviews`.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewRequest {
  pub application_id: i64,
  pub scheduled_at: DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub duration_minutes: Option<i32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub interview_type: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub meeting_link: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
}

/// Body for `PATCH /interviews/{id}`. Only present fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InterviewPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub scheduled_at: Option<DateTime<Utc>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub duration_minutes: Option<i32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub interview_type: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub meeting_link: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<InterviewStatus>,
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
  pub id: i64,
  pub user_id: i64,
  pub notification_type: String,
  pub title: String,
  pub message: String,
  #[serde(default)]
  pub link: Option<String>,
  pub is_read: bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCount {
  pub count: i64,
}

// ============================================================================
// Skill gap analysis
// ============================================================================

/// One radar-chart row: candidate strength vs required strength for a skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillGapEntry {
  pub skill: String,
  #[serde(default)]
  pub skill_id: Option<i64>,
  pub candidate: f64,
  pub required: f64,
  pub is_technical: bool,
  pub matched: bool,
}

/// Derived, non-persisted view object: never created or owned client-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillGapAnalysis {
  pub overall_score: f64,
  pub technical_score: f64,
  pub soft_score: f64,
  #[serde(default)]
  pub matched_technical: Vec<String>,
  #[serde(default)]
  pub matched_soft: Vec<String>,
  #[serde(default)]
  pub missing_technical: Vec<String>,
  #[serde(default)]
  pub missing_soft: Vec<String>,
  #[serde(default)]
  pub radar_data: Vec<SkillGapEntry>,
}

// ============================================================================
// Analytics read models
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewStats {
  pub total_students: i64,
  pub total_applications: i64,
  pub total_interviews: i64,
  pub total_offers: i64,
  pub placement_rate: f64,
  pub avg_match_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDemand {
  pub skill_name: String,
  pub demand_count: i64,
  pub is_technical: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationTrend {
  pub status: String,
  pub count: i64,
  pub percentage: f64,
}

// ============================================================================
// Misc responses
// ============================================================================

/// Generic `{ "message": ... }` acknowledgement body.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
  #[serde(default)]
  pub message: String,
}

/// Response from a resume upload.
#[derive(Debug, Clone, Deserialize)]
pub struct ResumeUploadResult {
  #[serde(default)]
  pub message: String,
  pub filename: String,
  pub url: String,
}

// ============================================================================
// Filters
// ============================================================================

/// Query parameters for `GET /jobs`. Absent fields are omitted from the
/// request entirely, never sent as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobFilters {
  pub search: Option<String>,
  pub location: Option<String>,
  pub min_salary: Option<i64>,
  pub max_salary: Option<i64>,
  pub experience_level: Option<String>,
  pub job_type: Option<String>,
  pub min_match_score: Option<f64>,
  pub sort_by: Option<String>,
  pub sort_order: Option<String>,
}

impl JobFilters {
  pub fn is_empty(&self) -> bool {
    *self == JobFilters::default()
  }

  /// Serialize to query pairs, skipping absent fields.
  pub fn to_query(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(s) = &self.search {
      pairs.push(("search", s.clone()));
    }
    if let Some(l) = &self.location {
      pairs.push(("location", l.clone()));
    }
    if let Some(v) = self.min_salary {
      pairs.push(("min_salary", v.to_string()));
    }
    if let Some(v) = self.max_salary {
      pairs.push(("max_salary", v.to_string()));
    }
    if let Some(v) = &self.experience_level {
      pairs.push(("experience_level", v.clone()));
    }
    if let Some(v) = &self.job_type {
      pairs.push(("job_type", v.clone()));
    }
    if let Some(v) = self.min_match_score {
      pairs.push(("min_match_score", v.to_string()));
    }
    if let Some(v) = &self.sort_by {
      pairs.push(("sort_by", v.clone()));
    }
    if let Some(v) = &self.sort_order {
      pairs.push(("sort_order", v.clone()));
    }
    pairs
  }

  /// Local refinement predicate, applied on top of server results so an
  /// edited filter takes effect before the refetch lands.
  ///
  /// Salary bounds compare against the posting's advertised minimum: asking
  /// for at least 100k excludes an 80k-120k range.
  pub fn matches(&self, job: &Job) -> bool {
    if let Some(min) = self.min_salary {
      if job.salary_min.map(|s| s >= min) != Some(true) {
        return false;
      }
    }
    if let Some(max) = self.max_salary {
      if job.salary_max.map(|s| s <= max) != Some(true) {
        return false;
      }
    }
    if let Some(search) = &self.search {
      let needle = search.to_lowercase();
      if !job.title.to_lowercase().contains(&needle)
        && !job.description.to_lowercase().contains(&needle)
      {
        return false;
      }
    }
    if let Some(location) = &self.location {
      let needle = location.to_lowercase();
      match &job.location {
        Some(l) if l.to_lowercase().contains(&needle) => {}
        _ => return false,
      }
    }
    if let Some(level) = &self.experience_level {
      if job.experience_level.as_deref() != Some(level.as_str()) {
        return false;
      }
    }
    if let Some(jt) = &self.job_type {
      if job.job_type.as_deref() != Some(jt.as_str()) {
        return false;
      }
    }
    true
  }
}

/// Query parameters for `GET /skills`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillFilters {
  pub technical_only: Option<bool>,
  pub category: Option<String>,
  pub search: Option<String>,
}

impl SkillFilters {
  pub fn to_query(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(v) = self.technical_only {
      pairs.push(("technical_only", v.to_string()));
    }
    if let Some(v) = &self.category {
      pairs.push(("category", v.clone()));
    }
    if let Some(v) = &self.search {
      pairs.push(("search", v.clone()));
    }
    pairs
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn job(salary_min: Option<i64>, salary_max: Option<i64>) -> Job {
    let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    Job {
      id: 1,
      employer_id: 2,
      title: "Data Engineer".to_string(),
      description: "Pipelines".to_string(),
      location: Some("Remote".to_string()),
      salary_min,
      salary_max,
      job_type: Some("full_time".to_string()),
      experience_level: Some("entry".to_string()),
      deadline: None,
      is_active: true,
      created_at: t,
      updated_at: t,
      required_skills: Vec::new(),
    }
  }

  fn interview(status: InterviewStatus, offset_hours: i64) -> InterviewWithDetails {
    let now = Utc::now();
    let t = now + chrono::Duration::hours(offset_hours);
    InterviewWithDetails {
      interview: Interview {
        id: 1,
        application_id: 1,
        scheduled_at: t,
        duration_minutes: 30,
        interview_type: "video".to_string(),
        location: None,
        meeting_link: None,
        notes: None,
        status,
        created_at: now,
        updated_at: now,
      },
      applicant_name: "Ada".to_string(),
      applicant_email: "ada@example.com".to_string(),
      job_title: "Data Engineer".to_string(),
      company_name: "Initech".to_string(),
    }
  }

  #[test]
  fn test_application_terminal_states() {
    assert!(ApplicationStatus::Accepted.is_terminal());
    assert!(ApplicationStatus::Rejected.is_terminal());
    assert!(!ApplicationStatus::Accepted.can_transition_to(ApplicationStatus::Pending));
    assert!(!ApplicationStatus::Rejected.can_transition_to(ApplicationStatus::Reviewed));
  }

  #[test]
  fn test_application_transitions() {
    use ApplicationStatus::*;
    assert!(Pending.can_transition_to(Reviewed));
    assert!(Pending.can_transition_to(Interview));
    assert!(Pending.can_transition_to(Rejected));
    assert!(Pending.can_transition_to(Accepted));
    assert!(Reviewed.can_transition_to(Interview));
    assert!(Reviewed.can_transition_to(Rejected));
    assert!(Interview.can_transition_to(Rejected));
    assert!(Interview.can_transition_to(Accepted));
    // No going backwards.
    assert!(!Reviewed.can_transition_to(Pending));
    assert!(!Interview.can_transition_to(Reviewed));
  }

  #[test]
  fn test_salary_filter_uses_posting_minimum() {
    let j = job(Some(80_000), Some(120_000));

    let mut filters = JobFilters::default();
    filters.min_salary = Some(100_000);
    assert!(!filters.matches(&j));

    filters.min_salary = Some(70_000);
    assert!(filters.matches(&j));
  }

  #[test]
  fn test_filter_query_omits_absent_fields() {
    let filters = JobFilters {
      search: Some("rust".to_string()),
      min_salary: Some(90_000),
      ..Default::default()
    };
    let pairs = filters.to_query();
    assert_eq!(
      pairs,
      vec![
        ("search", "rust".to_string()),
        ("min_salary", "90000".to_string())
      ]
    );

    assert!(JobFilters::default().to_query().is_empty());
    assert!(JobFilters::default().is_empty());
  }

  #[test]
  fn test_interview_partition_is_exclusive() {
    let interviews = vec![
      interview(InterviewStatus::Scheduled, 24),
      interview(InterviewStatus::Confirmed, 48),
      interview(InterviewStatus::Cancelled, 24), // cancelled but in the future
      interview(InterviewStatus::Completed, -24),
      interview(InterviewStatus::Scheduled, -2), // slot already passed
    ];

    let now = Utc::now();
    let (upcoming, past) = partition_interviews(&interviews, now);
    assert_eq!(upcoming.len(), 2);
    assert_eq!(past.len(), 3);
    assert_eq!(upcoming.len() + past.len(), interviews.len());
  }

  #[test]
  fn test_interview_modify_guard() {
    let now = Utc::now();
    assert!(interview(InterviewStatus::Scheduled, 24).interview.can_modify(now));
    assert!(interview(InterviewStatus::Confirmed, 24).interview.can_modify(now));
    assert!(!interview(InterviewStatus::Cancelled, 24).interview.can_modify(now));
    // Completed is closed even before the slot: no re-completing or cancelling.
    assert!(!interview(InterviewStatus::Completed, 24).interview.can_modify(now));
    assert!(!interview(InterviewStatus::Completed, -1).interview.can_modify(now));
    assert!(!interview(InterviewStatus::Scheduled, -1).interview.can_modify(now));
  }

  #[test]
  fn test_has_applied() {
    let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let app = Application {
      id: 10,
      job_id: 7,
      applicant_id: 3,
      status: ApplicationStatus::Pending,
      cover_letter: None,
      match_score: None,
      feedback_notes: None,
      feedback_at: None,
      created_at: t,
      updated_at: t,
      job: None,
      applicant: None,
    };
    assert!(has_applied(&[app.clone()], 7));
    assert!(!has_applied(&[app], 8));
    assert!(!has_applied(&[], 7));
  }

  #[test]
  fn test_job_draft_without_skill_changes_omits_the_key() {
    // The server replaces the posting's skill set whenever the key is
    // present, so an edit that never touched skills must not send it.
    let draft = JobDraft {
      title: "Data Engineer".to_string(),
      description: "Pipelines".to_string(),
      ..Default::default()
    };
    let body = serde_json::to_value(&draft).unwrap();
    assert!(body.get("required_skill_ids").is_none());

    let draft = JobDraft {
      required_skill_ids: Some(vec![4, 9]),
      ..draft
    };
    let body = serde_json::to_value(&draft).unwrap();
    assert_eq!(body["required_skill_ids"], serde_json::json!([4, 9]));
  }

  #[test]
  fn test_bulk_result_accounts_for_every_id() {
    // Server response for ids=[1,2,3] where id 3 belongs to someone else.
    let body = r#"{"updated_count":2,"failed_count":1,"failed_ids":[3]}"#;
    let result: BulkUpdateResult = serde_json::from_str(body).unwrap();

    assert_eq!(result.updated_count + result.failed_count, 3);
    assert_eq!(result.failed_ids, vec![3]);
    assert!(result.message.is_empty());
  }

  #[test]
  fn test_status_serde_lowercase() {
    assert_eq!(
      serde_json::to_string(&ApplicationStatus::Interview).unwrap(),
      "\"interview\""
    );
    let s: InterviewStatus = serde_json::from_str("\"rescheduled\"").unwrap();
    assert_eq!(s, InterviewStatus::Rescheduled);
  }
}
