//! Structured resource keys.
//!
//! A key is an ordered list of segments, e.g. `["applications", "student",
//! "42"]`. Keeping the structure (instead of hashing) is what makes prefix
//! invalidation possible: invalidating `["jobs"]` hits every filter variant
//! of the job list.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
  segments: Vec<String>,
}

impl ResourceKey {
  /// Start a key at its resource family root, e.g. `"jobs"`.
  pub fn root(name: &str) -> Self {
    Self {
      segments: vec![name.to_string()],
    }
  }

  /// Append a discriminator segment.
  pub fn push(mut self, segment: impl fmt::Display) -> Self {
    self.segments.push(segment.to_string());
    self
  }

  /// Append a filter/params object as a canonical JSON segment, so each
  /// filter combination gets its own entry under the same prefix.
  ///
  /// Struct fields serialize in declaration order, which keeps the segment
  /// stable for equal filters.
  pub fn params<P: Serialize>(mut self, params: &P) -> Self {
    self
      .segments
      .push(serde_json::to_string(params).unwrap_or_default());
    self
  }

  pub fn segments(&self) -> &[String] {
    &self.segments
  }

  /// Prefix match over whole segments: `["jobs"]` covers `["jobs", "{...}"]`
  /// and `["jobs", "7"]`, but `["job"]` covers neither.
  pub fn starts_with(&self, prefix: &ResourceKey) -> bool {
    prefix.segments.len() <= self.segments.len()
      && self.segments[..prefix.segments.len()] == prefix.segments[..]
  }
}

impl fmt::Display for ResourceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.segments.join("/"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_prefix_matching() {
    let jobs = ResourceKey::root("jobs");
    let job_detail = ResourceKey::root("jobs").push(7);
    let student_apps = ResourceKey::root("applications").push("student").push(42);

    assert!(job_detail.starts_with(&jobs));
    assert!(jobs.starts_with(&jobs));
    assert!(!jobs.starts_with(&job_detail));
    assert!(!student_apps.starts_with(&jobs));
    assert!(student_apps.starts_with(&ResourceKey::root("applications").push("student")));
  }

  #[test]
  fn test_prefix_is_whole_segment() {
    let key = ResourceKey::root("jobs").push(7);
    assert!(!key.starts_with(&ResourceKey::root("job")));
  }

  #[test]
  fn test_params_variants_are_distinct_under_one_prefix() {
    #[derive(Serialize)]
    struct Filters {
      search: Option<String>,
    }

    let a = ResourceKey::root("jobs").params(&Filters { search: None });
    let b = ResourceKey::root("jobs").params(&Filters {
      search: Some("rust".to_string()),
    });

    assert_ne!(a, b);
    assert!(a.starts_with(&ResourceKey::root("jobs")));
    assert!(b.starts_with(&ResourceKey::root("jobs")));
  }

  #[test]
  fn test_display() {
    let key = ResourceKey::root("notes").push("student").push(3);
    assert_eq!(key.to_string(), "notes/student/3");
  }
}
