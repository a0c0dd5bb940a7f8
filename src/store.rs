//! Cached Pathfinder client.
//!
//! Wraps [`ApiClient`] with the [`QueryCache`]: reads go through resource
//! keys with per-resource staleness windows, writes call the API once and
//! then invalidate their declared set of related key prefixes. The store
//! never applies optimistic changes - state is always re-derived from a
//! post-mutation refetch.

use std::time::Duration;

use crate::api::error::ApiError;
use crate::api::types::{
  Ack, Application, ApplicationStatus, BulkUpdateResult, Interview, InterviewPatch,
  InterviewRequest, Job, JobDraft, JobFilters, Note, Notification, Profile, ProfilePatch,
  ResumeUploadResult, SkillFilters, SkillProficiency, SkillWithProficiency,
};
use crate::api::ApiClient;
use crate::cache::{QueryCache, QueryOptions, Subscription};

/// Staleness windows per resource family.
const JOBS_STALE: Duration = Duration::from_secs(10);
const APPLICATIONS_STALE: Duration = Duration::from_secs(5);
const SKILLS_STALE: Duration = Duration::from_secs(60);
const STUDENTS_STALE: Duration = Duration::from_secs(10);
const NOTES_STALE: Duration = Duration::from_secs(10);
const INTERVIEWS_STALE: Duration = Duration::from_secs(10);
const ANALYTICS_STALE: Duration = Duration::from_secs(60);
const COMPLETION_STALE: Duration = Duration::from_secs(30);
pub const SESSION_STALE: Duration = Duration::from_secs(300);

/// Resource key constructors. Keys are structured tuples so invalidation
/// can target a whole family (`jobs`) or one variant (`jobs/7`).
pub mod keys {
  use crate::api::types::{JobFilters, SkillFilters};
  use crate::cache::ResourceKey;

  pub fn session() -> ResourceKey {
    ResourceKey::root("auth").push("me")
  }

  pub fn users_me() -> ResourceKey {
    ResourceKey::root("users").push("me")
  }

  pub fn profile_completion() -> ResourceKey {
    users_me().push("completion")
  }

  pub fn skills_with_proficiency() -> ResourceKey {
    users_me().push("skills-with-proficiency")
  }

  pub fn jobs_root() -> ResourceKey {
    ResourceKey::root("jobs")
  }

  pub fn jobs(filters: &JobFilters) -> ResourceKey {
    jobs_root().params(filters)
  }

  pub fn my_jobs() -> ResourceKey {
    jobs_root().push("my")
  }

  pub fn job(job_id: i64) -> ResourceKey {
    jobs_root().push(job_id)
  }

  pub fn skill_gap(job_id: i64, user_id: Option<i64>) -> ResourceKey {
    let key = ResourceKey::root("skill-gap").push(job_id);
    match user_id {
      Some(id) => key.push(id),
      None => key.push("me"),
    }
  }

  pub fn applications_root() -> ResourceKey {
    ResourceKey::root("applications")
  }

  pub fn my_applications() -> ResourceKey {
    applications_root().push("my")
  }

  pub fn job_applications(job_id: i64) -> ResourceKey {
    applications_root().push("job").push(job_id)
  }

  pub fn student_applications(student_id: i64) -> ResourceKey {
    applications_root().push("student").push(student_id)
  }

  pub fn skills_root() -> ResourceKey {
    ResourceKey::root("skills")
  }

  pub fn skills(filters: &SkillFilters) -> ResourceKey {
    skills_root().params(filters)
  }

  pub fn skill_categories() -> ResourceKey {
    skills_root().push("categories")
  }

  pub fn notes_root() -> ResourceKey {
    ResourceKey::root("notes")
  }

  pub fn my_notes() -> ResourceKey {
    notes_root().push("my")
  }

  pub fn student_notes(student_id: i64) -> ResourceKey {
    notes_root().push("student").push(student_id)
  }

  pub fn notifications_root() -> ResourceKey {
    ResourceKey::root("notifications")
  }

  pub fn unread_count() -> ResourceKey {
    notifications_root().push("unread")
  }

  pub fn interviews() -> ResourceKey {
    ResourceKey::root("interviews")
  }

  pub fn students_root() -> ResourceKey {
    ResourceKey::root("students")
  }

  pub fn student(student_id: i64) -> ResourceKey {
    students_root().push(student_id)
  }

  pub fn analytics_root() -> ResourceKey {
    ResourceKey::root("analytics")
  }

  pub fn analytics_overview() -> ResourceKey {
    analytics_root().push("overview")
  }

  pub fn skill_demand() -> ResourceKey {
    analytics_root().push("skill-demand")
  }

  pub fn application_trends() -> ResourceKey {
    analytics_root().push("application-trends")
  }
}

/// Pathfinder client with transparent caching.
///
/// Cheap to clone; clones share the HTTP client, cookie store, and cache.
#[derive(Clone)]
pub struct Store {
  api: ApiClient,
  cache: QueryCache,
  /// Notification polling interval while a consumer is subscribed.
  notify_every: Duration,
}

impl Store {
  pub fn new(api: ApiClient, cache: QueryCache, notify_every: Duration) -> Self {
    Self {
      api,
      cache,
      notify_every,
    }
  }

  pub fn api(&self) -> &ApiClient {
    &self.api
  }

  pub fn cache(&self) -> &QueryCache {
    &self.cache
  }

  // ==========================================================================
  // Subscriptions (reads)
  // ==========================================================================

  pub fn watch_jobs(&self, filters: &JobFilters) -> Subscription {
    let api = self.api.clone();
    let filters = filters.clone();
    self.cache.subscribe(
      &keys::jobs(&filters),
      QueryOptions::stale(JOBS_STALE),
      move || {
        let api = api.clone();
        let filters = filters.clone();
        async move { api.jobs(&filters).await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_my_jobs(&self) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::my_jobs(),
      QueryOptions::stale(JOBS_STALE),
      move || {
        let api = api.clone();
        async move { api.my_jobs().await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_job(&self, job_id: i64) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::job(job_id),
      QueryOptions::stale(JOBS_STALE),
      move || {
        let api = api.clone();
        async move { api.job(job_id).await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_skill_gap(&self, job_id: i64, user_id: Option<i64>) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::skill_gap(job_id, user_id),
      QueryOptions::stale(SKILLS_STALE),
      move || {
        let api = api.clone();
        async move { api.skill_gap(job_id, user_id).await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_my_applications(&self) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::my_applications(),
      QueryOptions::stale(APPLICATIONS_STALE),
      move || {
        let api = api.clone();
        async move { api.my_applications().await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_job_applications(&self, job_id: i64) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::job_applications(job_id),
      QueryOptions::stale(APPLICATIONS_STALE),
      move || {
        let api = api.clone();
        async move { api.job_applications(job_id).await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_student_applications(&self, student_id: i64) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::student_applications(student_id),
      QueryOptions::stale(APPLICATIONS_STALE),
      move || {
        let api = api.clone();
        async move {
          api
            .student_applications(student_id)
            .await
            .map_err(|e| e.to_string())
        }
      },
    )
  }

  pub fn watch_skills(&self, filters: &SkillFilters) -> Subscription {
    let api = self.api.clone();
    let filters = filters.clone();
    self.cache.subscribe(
      &keys::skills(&filters),
      QueryOptions::stale(SKILLS_STALE),
      move || {
        let api = api.clone();
        let filters = filters.clone();
        async move { api.skills(&filters).await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_profile_completion(&self) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::profile_completion(),
      QueryOptions::stale(COMPLETION_STALE),
      move || {
        let api = api.clone();
        async move { api.profile_completion().await.map_err(|e| e.to_string()) }
      },
    )
  }

  /// Full profile view of the signed-in user, including skills.
  pub fn watch_me(&self) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::users_me(),
      QueryOptions::stale(COMPLETION_STALE),
      move || {
        let api = api.clone();
        async move { api.my_profile().await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_my_skills(&self) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::skills_with_proficiency(),
      QueryOptions::stale(SKILLS_STALE),
      move || {
        let api = api.clone();
        async move { api.skills_with_proficiency().await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_skill_categories(&self) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::skill_categories(),
      QueryOptions::stale(SKILLS_STALE),
      move || {
        let api = api.clone();
        async move { api.skill_categories().await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_student(&self, student_id: i64) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::student(student_id),
      QueryOptions::stale(STUDENTS_STALE),
      move || {
        let api = api.clone();
        async move { api.student(student_id).await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_my_notes(&self) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::my_notes(),
      QueryOptions::stale(NOTES_STALE),
      move || {
        let api = api.clone();
        async move { api.my_notes().await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_student_notes(&self, student_id: i64) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::student_notes(student_id),
      QueryOptions::stale(NOTES_STALE),
      move || {
        let api = api.clone();
        async move { api.student_notes(student_id).await.map_err(|e| e.to_string()) }
      },
    )
  }

  /// Notifications poll on a fixed interval while subscribed; the timer is
  /// suspended once the last subscriber unmounts.
  pub fn watch_notifications(&self) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::notifications_root(),
      QueryOptions::polled(APPLICATIONS_STALE, self.notify_every),
      move || {
        let api = api.clone();
        async move { api.notifications().await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_unread_count(&self) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::unread_count(),
      QueryOptions::polled(APPLICATIONS_STALE, self.notify_every),
      move || {
        let api = api.clone();
        async move { api.unread_count().await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_interviews(&self) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::interviews(),
      QueryOptions::stale(INTERVIEWS_STALE),
      move || {
        let api = api.clone();
        async move { api.interviews().await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_students(&self) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::students_root(),
      QueryOptions::stale(STUDENTS_STALE),
      move || {
        let api = api.clone();
        async move { api.students().await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_analytics_overview(&self) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::analytics_overview(),
      QueryOptions::stale(ANALYTICS_STALE),
      move || {
        let api = api.clone();
        async move { api.analytics_overview().await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_skill_demand(&self, limit: Option<u32>) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::skill_demand(),
      QueryOptions::stale(ANALYTICS_STALE),
      move || {
        let api = api.clone();
        async move { api.skill_demand(limit).await.map_err(|e| e.to_string()) }
      },
    )
  }

  pub fn watch_application_trends(&self) -> Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::application_trends(),
      QueryOptions::stale(ANALYTICS_STALE),
      move || {
        let api = api.clone();
        async move { api.application_trends().await.map_err(|e| e.to_string()) }
      },
    )
  }

  // ==========================================================================
  // Mutations (writes + invalidation)
  // ==========================================================================

  pub async fn apply(
    &self,
    job_id: i64,
    cover_letter: Option<&str>,
  ) -> Result<Application, ApiError> {
    let application = self.api.apply(job_id, cover_letter).await?;
    // Job listings embed per-viewer application state, so they go stale too.
    self.cache.invalidate(&keys::applications_root());
    self.cache.invalidate(&keys::jobs_root());
    Ok(application)
  }

  pub async fn update_application_status(
    &self,
    application_id: i64,
    status: ApplicationStatus,
    feedback_notes: Option<&str>,
  ) -> Result<Application, ApiError> {
    let application = self
      .api
      .update_application_status(application_id, status, feedback_notes)
      .await?;
    self.cache.invalidate(&keys::applications_root());
    Ok(application)
  }

  pub async fn bulk_update_applications(
    &self,
    application_ids: &[i64],
    status: ApplicationStatus,
    feedback_notes: Option<&str>,
  ) -> Result<BulkUpdateResult, ApiError> {
    let result = self
      .api
      .bulk_update_applications(application_ids, status, feedback_notes)
      .await?;
    self.cache.invalidate(&keys::applications_root());
    Ok(result)
  }

  pub async fn create_job(&self, draft: &JobDraft) -> Result<Job, ApiError> {
    let job = self.api.create_job(draft).await?;
    self.cache.invalidate(&keys::jobs_root());
    Ok(job)
  }

  pub async fn update_job(&self, job_id: i64, draft: &JobDraft) -> Result<Job, ApiError> {
    let job = self.api.update_job(job_id, draft).await?;
    self.cache.invalidate(&keys::jobs_root());
    Ok(job)
  }

  pub async fn delete_job(&self, job_id: i64) -> Result<Ack, ApiError> {
    let ack = self.api.delete_job(job_id).await?;
    self.cache.invalidate(&keys::jobs_root());
    Ok(ack)
  }

  pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<Profile, ApiError> {
    let profile = self.api.update_profile(patch).await?;
    self.cache.invalidate(&keys::session());
    self.cache.invalidate(&keys::users_me());
    Ok(profile)
  }

  pub async fn update_skills_with_proficiency(
    &self,
    skills: &[SkillProficiency],
  ) -> Result<Vec<SkillWithProficiency>, ApiError> {
    let updated = self.api.update_skills_with_proficiency(skills).await?;
    // Skill changes shift every match score.
    self.cache.invalidate(&keys::session());
    self.cache.invalidate(&keys::users_me());
    self.cache.invalidate(&keys::jobs_root());
    Ok(updated)
  }

  pub async fn upload_resume(
    &self,
    filename: &str,
    bytes: Vec<u8>,
  ) -> Result<ResumeUploadResult, ApiError> {
    let result = self.api.upload_resume(filename, bytes).await?;
    self.cache.invalidate(&keys::session());
    self.cache.invalidate(&keys::users_me());
    Ok(result)
  }

  pub async fn delete_resume(&self) -> Result<Ack, ApiError> {
    let ack = self.api.delete_resume().await?;
    self.cache.invalidate(&keys::session());
    self.cache.invalidate(&keys::users_me());
    Ok(ack)
  }

  pub async fn create_note(
    &self,
    student_id: i64,
    content: &str,
    note_type: Option<&str>,
  ) -> Result<Note, ApiError> {
    let note = self.api.create_note(student_id, content, note_type).await?;
    self.cache.invalidate(&keys::notes_root());
    Ok(note)
  }

  pub async fn update_note(
    &self,
    note_id: i64,
    content: Option<&str>,
    note_type: Option<&str>,
  ) -> Result<Note, ApiError> {
    let note = self.api.update_note(note_id, content, note_type).await?;
    self.cache.invalidate(&keys::notes_root());
    Ok(note)
  }

  pub async fn delete_note(&self, note_id: i64) -> Result<Ack, ApiError> {
    let ack = self.api.delete_note(note_id).await?;
    self.cache.invalidate(&keys::notes_root());
    Ok(ack)
  }

  pub async fn mark_notification_read(
    &self,
    notification_id: i64,
  ) -> Result<Notification, ApiError> {
    let notification = self.api.mark_notification_read(notification_id).await?;
    self.cache.invalidate(&keys::notifications_root());
    Ok(notification)
  }

  pub async fn mark_all_notifications_read(&self) -> Result<Ack, ApiError> {
    let ack = self.api.mark_all_notifications_read().await?;
    self.cache.invalidate(&keys::notifications_root());
    Ok(ack)
  }

  pub async fn schedule_interview(
    &self,
    request: &InterviewRequest,
  ) -> Result<Interview, ApiError> {
    let interview = self.api.schedule_interview(request).await?;
    self.cache.invalidate(&keys::interviews());
    Ok(interview)
  }

  pub async fn update_interview(
    &self,
    interview_id: i64,
    patch: &InterviewPatch,
  ) -> Result<Interview, ApiError> {
    let interview = self.api.update_interview(interview_id, patch).await?;
    self.cache.invalidate(&keys::interviews());
    Ok(interview)
  }

  pub async fn cancel_interview(&self, interview_id: i64) -> Result<Interview, ApiError> {
    let interview = self.api.cancel_interview(interview_id).await?;
    self.cache.invalidate(&keys::interviews());
    Ok(interview)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_filter_variants_share_the_jobs_prefix() {
    let all = keys::jobs(&JobFilters::default());
    let filtered = keys::jobs(&JobFilters {
      search: Some("data".to_string()),
      ..Default::default()
    });

    assert_ne!(all, filtered);
    assert!(all.starts_with(&keys::jobs_root()));
    assert!(filtered.starts_with(&keys::jobs_root()));
    assert!(keys::my_jobs().starts_with(&keys::jobs_root()));
    assert!(keys::job(9).starts_with(&keys::jobs_root()));
  }

  #[test]
  fn test_application_keys_are_scoped() {
    assert!(keys::my_applications().starts_with(&keys::applications_root()));
    assert!(keys::job_applications(3).starts_with(&keys::applications_root()));
    assert!(keys::student_applications(4).starts_with(&keys::applications_root()));
    assert!(!keys::my_applications().starts_with(&keys::jobs_root()));
  }

  #[test]
  fn test_unread_count_lives_under_notifications() {
    assert!(keys::unread_count().starts_with(&keys::notifications_root()));
  }
}
