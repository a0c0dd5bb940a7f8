mod applications;
mod dashboard;
mod interviews;
mod job_detail;
mod job_form;
mod jobs;
mod login;
mod notifications;
mod postings;
mod profile;
mod student_detail;
mod students;

pub use applications::{ApplicationScope, ApplicationsView};
pub use dashboard::DashboardView;
pub use interviews::InterviewsView;
pub use job_detail::JobDetailView;
pub use job_form::JobFormView;
pub use jobs::JobsView;
pub use login::LoginView;
pub use notifications::NotificationsView;
pub use postings::PostingsView;
pub use profile::ProfileView;
pub use student_detail::StudentDetailView;
pub use students::StudentsView;

use crate::api::error::ApiError;
use crate::event::Event;
use std::future::Future;
use tokio::sync::mpsc;

/// Run a mutation in the background. Success shows up through cache
/// invalidation on the next tick; failures go to the status line, except a
/// 401 which means the session died under us.
pub(crate) fn spawn_mutation<T, Fut>(tx: mpsc::UnboundedSender<Event>, fut: Fut)
where
  T: Send + 'static,
  Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
  tokio::spawn(async move {
    if let Err(e) = fut.await {
      let event = if e.is_unauthorized() {
        Event::SessionExpired
      } else {
        Event::Error(e.to_string())
      };
      let _ = tx.send(event);
    }
  });
}
