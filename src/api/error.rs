//! Error taxonomy for the Pathfinder REST API.

use thiserror::Error;

/// Errors produced by [`crate::api::client::ApiClient`].
///
/// Every non-2xx response is converted into one of these variants, carrying
/// the server-supplied `detail` message where one was present. A 401 is a
/// distinct variant because the session layer treats it as "no session"
/// rather than as a failure.
#[derive(Debug, Error)]
pub enum ApiError {
  /// 401 - no valid session. Terminal "anonymous" result, never retried.
  #[error("not signed in")]
  Unauthorized,

  /// 403 - the current role is not allowed to perform this action.
  #[error("{0}")]
  Forbidden(String),

  /// Other 4xx - the server rejected the request payload.
  #[error("{0}")]
  Validation(String),

  /// 5xx - the server failed.
  #[error("server error ({status}): {message}")]
  Server { status: u16, message: String },

  /// The request never produced a response (DNS, connection, TLS, ...).
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  /// A 2xx response whose body did not match the expected shape.
  #[error("malformed response: {0}")]
  Decode(#[from] serde_json::Error),

  /// The configured base URL could not be parsed.
  #[error("invalid server URL: {0}")]
  BaseUrl(#[from] url::ParseError),
}

impl ApiError {
  /// Build the appropriate variant for a non-2xx status and its message.
  pub fn from_status(status: u16, message: String) -> Self {
    match status {
      401 => ApiError::Unauthorized,
      403 => ApiError::Forbidden(message),
      400..=499 => ApiError::Validation(message),
      _ => ApiError::Server { status, message },
    }
  }

  /// Whether this error means "there is no session", as opposed to a
  /// request that genuinely failed.
  pub fn is_unauthorized(&self) -> bool {
    matches!(self, ApiError::Unauthorized)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_mapping() {
    assert!(ApiError::from_status(401, "x".into()).is_unauthorized());
    assert!(matches!(
      ApiError::from_status(403, "nope".into()),
      ApiError::Forbidden(_)
    ));
    assert!(matches!(
      ApiError::from_status(422, "bad".into()),
      ApiError::Validation(_)
    ));
    assert!(matches!(
      ApiError::from_status(500, "boom".into()),
      ApiError::Server { status: 500, .. }
    ));
  }
}
