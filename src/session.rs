//! Authentication state.
//!
//! The session is itself a cached resource under `auth/me`: an HTTP 401 is
//! a valid answer (anonymous), not a failure, so the fetcher folds it into
//! `Ok(None)`. Login and register write the returned user straight into the
//! cache instead of refetching; logout purges the whole cache since every
//! entry was viewer-scoped.

use crate::api::error::ApiError;
use crate::api::types::{Role, User};
use crate::api::ApiClient;
use crate::cache::{CacheSnapshot, QueryCache, QueryOptions};
use crate::store::{keys, SESSION_STALE};

/// Tri-state auth status. `Unknown` before the first `auth/me` round trip
/// has settled, so the UI can hold a splash instead of flashing the login
/// form at an already-authenticated user.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
  Unknown,
  Authenticated(User),
  Anonymous,
}

impl SessionState {
  pub fn is_authenticated(&self) -> bool {
    matches!(self, SessionState::Authenticated(_))
  }

  pub fn user(&self) -> Option<&User> {
    match self {
      SessionState::Authenticated(user) => Some(user),
      _ => None,
    }
  }

  /// Derive the state from the cached `auth/me` entry.
  pub fn from_snapshot(snapshot: &CacheSnapshot<Option<User>>) -> Self {
    match &snapshot.data {
      Some(Some(user)) => SessionState::Authenticated(user.clone()),
      Some(None) => SessionState::Anonymous,
      // A transport or server failure with nothing cached: treat as
      // anonymous so the user can at least reach the login form.
      None if snapshot.error.is_some() && !snapshot.is_fetching => SessionState::Anonymous,
      None => SessionState::Unknown,
    }
  }
}

#[derive(Clone)]
pub struct Session {
  api: ApiClient,
  cache: QueryCache,
}

impl Session {
  pub fn new(api: ApiClient, cache: QueryCache) -> Self {
    Self { api, cache }
  }

  /// Resolve the current user, deduplicated and cached like any other
  /// resource. `Ok(None)` means the server answered and there is no session.
  pub async fn current_user(&self) -> Result<Option<User>, String> {
    let api = self.api.clone();
    self
      .cache
      .fetch(
        &keys::session(),
        QueryOptions::stale(SESSION_STALE),
        move || async move {
          match api.me().await {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.is_unauthorized() => Ok(None),
            Err(e) => Err(e.to_string()),
          }
        },
      )
      .await
  }

  /// Keep the session entry alive and revalidating for the app's lifetime.
  /// Profile mutations invalidate the session key, so the header identity
  /// refreshes through this subscription.
  pub fn watch(&self) -> crate::cache::Subscription {
    let api = self.api.clone();
    self.cache.subscribe(
      &keys::session(),
      QueryOptions::stale(SESSION_STALE),
      move || {
        let api = api.clone();
        async move {
          match api.me().await {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.is_unauthorized() => Ok(None),
            Err(e) => Err(e.to_string()),
          }
        }
      },
    )
  }

  /// Drop the cached session without a server round trip, e.g. after a 401
  /// observed mid-flight.
  pub fn expire(&self) {
    self.cache.set(&keys::session(), &None::<User>);
  }

  /// Non-blocking view of the auth state from whatever is cached.
  pub fn state(&self) -> SessionState {
    SessionState::from_snapshot(&self.cache.peek(&keys::session()))
  }

  pub async fn login(&self, email: &str, password: &str, role: Role) -> Result<User, ApiError> {
    let user = self.api.login(email, password, role).await?;
    self.cache.set(&keys::session(), &Some(user.clone()));
    Ok(user)
  }

  pub async fn register(&self, email: &str, password: &str, role: Role) -> Result<User, ApiError> {
    let user = self.api.register(email, password, role).await?;
    self.cache.set(&keys::session(), &Some(user.clone()));
    Ok(user)
  }

  /// End the session server-side, then drop every cached resource: all of
  /// them were fetched with this viewer's credentials.
  pub async fn logout(&self) -> Result<(), ApiError> {
    self.api.logout().await?;
    self.cache.clear();
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::Role;
  use chrono::Utc;

  fn user(id: i64) -> User {
    User {
      id,
      email: format!("user{id}@test.dev"),
      role: Role::Student,
      created_at: Utc::now(),
      profile: None,
      skills: None,
    }
  }

  fn session() -> Session {
    let api = ApiClient::new("http://localhost:8000/api").unwrap();
    Session::new(api, QueryCache::new())
  }

  #[test]
  fn test_state_unknown_before_first_resolution() {
    assert_eq!(session().state(), SessionState::Unknown);
  }

  #[test]
  fn test_state_follows_cached_session_entry() {
    let session = session();

    session.cache.set(&keys::session(), &Some(user(1)));
    assert!(session.state().is_authenticated());
    assert_eq!(session.state().user().map(|u| u.id), Some(1));

    session.cache.set(&keys::session(), &None::<User>);
    assert_eq!(session.state(), SessionState::Anonymous);
  }

  #[test]
  fn test_cleared_cache_means_not_authenticated() {
    let session = session();
    session.cache.set(&keys::session(), &Some(user(1)));
    assert!(session.state().is_authenticated());

    session.cache.clear();
    assert!(!session.state().is_authenticated());
    assert!(session.cache.is_empty());
  }

  #[test]
  fn test_failed_probe_with_nothing_cached_reads_anonymous() {
    let snapshot = CacheSnapshot::<Option<User>> {
      data: None,
      error: Some("connection refused".to_string()),
      is_fetching: false,
      is_stale: false,
    };
    assert_eq!(
      SessionState::from_snapshot(&snapshot),
      SessionState::Anonymous
    );
  }
}
