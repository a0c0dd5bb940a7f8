//! HTTP client for the Pathfinder backend.
//!
//! One strongly-typed method per endpoint. All calls carry the session
//! cookie via the client's cookie store, make a single attempt (no retries,
//! no timeouts at this layer), and fail uniformly: a non-2xx response is
//! turned into an [`ApiError`] carrying the server's `detail` message.

use reqwest::multipart;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::api::error::ApiError;
use crate::api::types::{
  Ack, Application, ApplicationStatus, ApplicationTrend, BulkUpdateResult, Interview,
  InterviewPatch, InterviewRequest, InterviewWithDetails, Job, JobDraft, JobFilters, JobWithMatch,
  Note, Notification, OverviewStats, Profile, ProfileCompletion, ProfilePatch, ResumeUploadResult,
  Role, Skill, SkillDemand, SkillFilters, SkillGapAnalysis, SkillProficiency,
  SkillWithProficiency, UnreadCount, User, UserWithStats,
};

/// Error body shape used by the backend for every failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
  detail: String,
}

/// Pathfinder API client.
///
/// Cheap to clone; the underlying connection pool and cookie store are
/// shared between clones, so a login performed through one clone is visible
/// to all of them.
#[derive(Clone)]
pub struct ApiClient {
  http: Client,
  base: Url,
}

impl ApiClient {
  /// Create a client for the given base URL (e.g. `http://host:8000/api`).
  pub fn new(base_url: &str) -> Result<Self, ApiError> {
    let mut base = Url::parse(base_url)?;
    // Url::join treats a path without a trailing slash as a file.
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let http = Client::builder().cookie_store(true).build()?;

    Ok(Self { http, base })
  }

  fn url(&self, path: &str) -> Result<Url, ApiError> {
    Ok(self.base.join(path)?)
  }

  /// Map a non-2xx response to an error with the server-supplied message.
  async fn check(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }

    let message = match resp.json::<ErrorBody>().await {
      Ok(body) => body.detail,
      Err(_) => "Request failed".to_string(),
    };

    Err(ApiError::from_status(status.as_u16(), message))
  }

  async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let bytes = Self::check(resp).await?.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
  }

  async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
    self.get_with(path, &[]).await
  }

  /// GET with query pairs. Absent parameters must already be filtered out;
  /// an empty slice produces no query string at all.
  async fn get_with<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T, ApiError> {
    let mut req = self.http.get(self.url(path)?);
    if !query.is_empty() {
      req = req.query(query);
    }
    Self::decode(req.send().await?).await
  }

  async fn send<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    body: Option<Value>,
  ) -> Result<T, ApiError> {
    let mut req = self.http.request(method, self.url(path)?);
    if let Some(body) = body {
      req = req.json(&body);
    }
    Self::decode(req.send().await?).await
  }

  // ==========================================================================
  // Auth
  // ==========================================================================

  pub async fn register(&self, email: &str, password: &str, role: Role) -> Result<User, ApiError> {
    let body = json!({ "email": email, "password": password, "role": role });
    self.send(Method::POST, "auth/register", Some(body)).await
  }

  pub async fn login(&self, email: &str, password: &str, role: Role) -> Result<User, ApiError> {
    let body = json!({ "email": email, "password": password, "role": role });
    self.send(Method::POST, "auth/login", Some(body)).await
  }

  pub async fn logout(&self) -> Result<Ack, ApiError> {
    self.send(Method::POST, "auth/logout", None).await
  }

  /// Current session, or `ApiError::Unauthorized` when there is none.
  pub async fn me(&self) -> Result<User, ApiError> {
    self.get("auth/me").await
  }

  // ==========================================================================
  // Users
  // ==========================================================================

  pub async fn my_profile(&self) -> Result<User, ApiError> {
    self.get("users/me").await
  }

  pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<Profile, ApiError> {
    let body = serde_json::to_value(patch)?;
    self.send(Method::PUT, "users/me/profile", Some(body)).await
  }

  pub async fn skills_with_proficiency(&self) -> Result<Vec<SkillWithProficiency>, ApiError> {
    self.get("users/me/skills-with-proficiency").await
  }

  pub async fn update_skills_with_proficiency(
    &self,
    skills: &[SkillProficiency],
  ) -> Result<Vec<SkillWithProficiency>, ApiError> {
    let body = json!({ "skills": skills });
    self
      .send(Method::PUT, "users/me/skills-with-proficiency", Some(body))
      .await
  }

  pub async fn profile_completion(&self) -> Result<ProfileCompletion, ApiError> {
    self.get("users/me/profile-completion").await
  }

  /// Resume upload is the one call that bypasses JSON encoding; the error
  /// contract is unchanged.
  pub async fn upload_resume(
    &self,
    filename: &str,
    bytes: Vec<u8>,
  ) -> Result<ResumeUploadResult, ApiError> {
    let part = multipart::Part::bytes(bytes).file_name(filename.to_string());
    let form = multipart::Form::new().part("file", part);

    let resp = self
      .http
      .post(self.url("users/me/resume")?)
      .multipart(form)
      .send()
      .await?;

    Self::decode(resp).await
  }

  pub async fn delete_resume(&self) -> Result<Ack, ApiError> {
    self.send(Method::DELETE, "users/me/resume", None).await
  }

  pub async fn students(&self) -> Result<Vec<UserWithStats>, ApiError> {
    self.get("users/students").await
  }

  pub async fn student(&self, student_id: i64) -> Result<UserWithStats, ApiError> {
    self.get(&format!("users/students/{}", student_id)).await
  }

  // ==========================================================================
  // Jobs
  // ==========================================================================

  pub async fn jobs(&self, filters: &JobFilters) -> Result<Vec<JobWithMatch>, ApiError> {
    self.get_with("jobs", &filters.to_query()).await
  }

  pub async fn my_jobs(&self) -> Result<Vec<Job>, ApiError> {
    self.get("jobs/my-jobs").await
  }

  pub async fn job(&self, job_id: i64) -> Result<JobWithMatch, ApiError> {
    self.get(&format!("jobs/{}", job_id)).await
  }

  pub async fn create_job(&self, draft: &JobDraft) -> Result<Job, ApiError> {
    let body = serde_json::to_value(draft)?;
    self.send(Method::POST, "jobs", Some(body)).await
  }

  pub async fn update_job(&self, job_id: i64, draft: &JobDraft) -> Result<Job, ApiError> {
    let body = serde_json::to_value(draft)?;
    self
      .send(Method::PUT, &format!("jobs/{}", job_id), Some(body))
      .await
  }

  pub async fn delete_job(&self, job_id: i64) -> Result<Ack, ApiError> {
    self
      .send(Method::DELETE, &format!("jobs/{}", job_id), None)
      .await
  }

  pub async fn skill_gap(
    &self,
    job_id: i64,
    user_id: Option<i64>,
  ) -> Result<SkillGapAnalysis, ApiError> {
    let mut query = Vec::new();
    if let Some(id) = user_id {
      query.push(("user_id", id.to_string()));
    }
    self
      .get_with(&format!("jobs/{}/skill-gap", job_id), &query)
      .await
  }

  // ==========================================================================
  // Applications
  // ==========================================================================

  pub async fn my_applications(&self) -> Result<Vec<Application>, ApiError> {
    self.get("applications/my-applications").await
  }

  pub async fn job_applications(&self, job_id: i64) -> Result<Vec<Application>, ApiError> {
    self.get(&format!("applications/job/{}", job_id)).await
  }

  pub async fn student_applications(&self, student_id: i64) -> Result<Vec<Application>, ApiError> {
    self
      .get(&format!("applications/student/{}", student_id))
      .await
  }

  pub async fn apply(
    &self,
    job_id: i64,
    cover_letter: Option<&str>,
  ) -> Result<Application, ApiError> {
    let mut body = json!({ "job_id": job_id });
    if let Some(letter) = cover_letter {
      body["cover_letter"] = json!(letter);
    }
    self.send(Method::POST, "applications", Some(body)).await
  }

  pub async fn update_application_status(
    &self,
    application_id: i64,
    status: ApplicationStatus,
    feedback_notes: Option<&str>,
  ) -> Result<Application, ApiError> {
    let mut body = json!({ "status": status });
    if let Some(notes) = feedback_notes {
      body["feedback_notes"] = json!(notes);
    }
    self
      .send(
        Method::PUT,
        &format!("applications/{}/status", application_id),
        Some(body),
      )
      .await
  }

  /// Bulk status update. Partial failure arrives as a 2xx payload with
  /// `failed_count > 0`, not as an error.
  pub async fn bulk_update_applications(
    &self,
    application_ids: &[i64],
    status: ApplicationStatus,
    feedback_notes: Option<&str>,
  ) -> Result<BulkUpdateResult, ApiError> {
    let mut body = json!({ "application_ids": application_ids, "status": status });
    if let Some(notes) = feedback_notes {
      body["feedback_notes"] = json!(notes);
    }
    self
      .send(Method::PUT, "applications/bulk-update", Some(body))
      .await
  }

  // ==========================================================================
  // Skills
  // ==========================================================================

  pub async fn skills(&self, filters: &SkillFilters) -> Result<Vec<Skill>, ApiError> {
    self.get_with("skills", &filters.to_query()).await
  }

  pub async fn skill_categories(&self) -> Result<Vec<String>, ApiError> {
    self.get("skills/categories").await
  }

  // ==========================================================================
  // Notes
  // ==========================================================================

  pub async fn student_notes(&self, student_id: i64) -> Result<Vec<Note>, ApiError> {
    self.get(&format!("notes/student/{}", student_id)).await
  }

  pub async fn my_notes(&self) -> Result<Vec<Note>, ApiError> {
    self.get("notes/my-notes").await
  }

  pub async fn create_note(
    &self,
    student_id: i64,
    content: &str,
    note_type: Option<&str>,
  ) -> Result<Note, ApiError> {
    let mut body = json!({ "student_id": student_id, "content": content });
    if let Some(t) = note_type {
      body["note_type"] = json!(t);
    }
    self.send(Method::POST, "notes", Some(body)).await
  }

  pub async fn update_note(
    &self,
    note_id: i64,
    content: Option<&str>,
    note_type: Option<&str>,
  ) -> Result<Note, ApiError> {
    let mut body = json!({});
    if let Some(c) = content {
      body["content"] = json!(c);
    }
    if let Some(t) = note_type {
      body["note_type"] = json!(t);
    }
    self
      .send(Method::PUT, &format!("notes/{}", note_id), Some(body))
      .await
  }

  pub async fn delete_note(&self, note_id: i64) -> Result<Ack, ApiError> {
    self
      .send(Method::DELETE, &format!("notes/{}", note_id), None)
      .await
  }

  // ==========================================================================
  // Notifications
  // ==========================================================================

  pub async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
    self.get("notifications").await
  }

  pub async fn unread_count(&self) -> Result<UnreadCount, ApiError> {
    self.get("notifications/unread-count").await
  }

  pub async fn mark_notification_read(
    &self,
    notification_id: i64,
  ) -> Result<Notification, ApiError> {
    self
      .send(
        Method::PUT,
        &format!("notifications/{}/read", notification_id),
        None,
      )
      .await
  }

  pub async fn mark_all_notifications_read(&self) -> Result<Ack, ApiError> {
    self.send(Method::PUT, "notifications/read-all", None).await
  }

  // ==========================================================================
  // Interviews
  // ==========================================================================

  pub async fn interviews(&self) -> Result<Vec<InterviewWithDetails>, ApiError> {
    self.get("interviews").await
  }

  pub async fn schedule_interview(&self, request: &InterviewRequest) -> Result<Interview, ApiError> {
    let body = serde_json::to_value(request)?;
    self.send(Method::POST, "interviews", Some(body)).await
  }

  pub async fn update_interview(
    &self,
    interview_id: i64,
    patch: &InterviewPatch,
  ) -> Result<Interview, ApiError> {
    let body = serde_json::to_value(patch)?;
    self
      .send(
        Method::PATCH,
        &format!("interviews/{}", interview_id),
        Some(body),
      )
      .await
  }

  pub async fn cancel_interview(&self, interview_id: i64) -> Result<Interview, ApiError> {
    self
      .send(Method::DELETE, &format!("interviews/{}", interview_id), None)
      .await
  }

  // ==========================================================================
  // Analytics (read-only aggregates)
  // ==========================================================================

  pub async fn analytics_overview(&self) -> Result<OverviewStats, ApiError> {
    self.get("analytics/overview").await
  }

  pub async fn skill_demand(&self, limit: Option<u32>) -> Result<Vec<SkillDemand>, ApiError> {
    let mut query = Vec::new();
    if let Some(limit) = limit {
      query.push(("limit", limit.to_string()));
    }
    self.get_with("analytics/skill-demand", &query).await
  }

  pub async fn application_trends(&self) -> Result<Vec<ApplicationTrend>, ApiError> {
    self.get("analytics/application-trends").await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_base_url_gets_trailing_slash() {
    let client = ApiClient::new("http://localhost:8000/api").unwrap();
    let url = client.url("jobs/my-jobs").unwrap();
    assert_eq!(url.as_str(), "http://localhost:8000/api/jobs/my-jobs");
  }

  #[test]
  fn test_base_url_rejects_garbage() {
    assert!(ApiClient::new("not a url").is_err());
  }
}
