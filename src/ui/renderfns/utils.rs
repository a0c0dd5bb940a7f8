use crate::api::types::{ApplicationStatus, InterviewStatus};
use chrono::{DateTime, Utc};
use ratatui::prelude::Color;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", cut)
  }
}

/// Display color for an application status
pub fn application_status_color(status: ApplicationStatus) -> Color {
  match status {
    ApplicationStatus::Accepted => Color::Green,
    ApplicationStatus::Interview => Color::Cyan,
    ApplicationStatus::Reviewed => Color::Yellow,
    ApplicationStatus::Rejected => Color::Red,
    ApplicationStatus::Pending => Color::White,
  }
}

/// Display color for an interview status
pub fn interview_status_color(status: InterviewStatus) -> Color {
  match status {
    InterviewStatus::Confirmed => Color::Green,
    InterviewStatus::Scheduled | InterviewStatus::Rescheduled => Color::Yellow,
    InterviewStatus::Completed => Color::DarkGray,
    InterviewStatus::Cancelled => Color::Red,
  }
}

/// Display color for a 0-100 match score
pub fn match_score_color(score: f64) -> Color {
  if score >= 75.0 {
    Color::Green
  } else if score >= 50.0 {
    Color::Yellow
  } else {
    Color::Red
  }
}

/// Salary range like "$80k-$120k", or a dash when the posting omits it
pub fn format_salary(min: Option<i64>, max: Option<i64>) -> String {
  fn k(v: i64) -> String {
    if v >= 1000 && v % 1000 == 0 {
      format!("${}k", v / 1000)
    } else {
      format!("${}", v)
    }
  }
  match (min, max) {
    (Some(lo), Some(hi)) => format!("{}-{}", k(lo), k(hi)),
    (Some(lo), None) => format!("{}+", k(lo)),
    (None, Some(hi)) => format!("up to {}", k(hi)),
    (None, None) => "-".to_string(),
  }
}

/// Timestamp for list rows, in local wall-clock terms
pub fn format_datetime(dt: DateTime<Utc>) -> String {
  dt.format("%Y-%m-%d %H:%M").to_string()
}

pub fn format_date(dt: DateTime<Utc>) -> String {
  dt.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_status_colors() {
    assert_eq!(
      application_status_color(ApplicationStatus::Accepted),
      Color::Green
    );
    assert_eq!(
      application_status_color(ApplicationStatus::Rejected),
      Color::Red
    );
    assert_eq!(
      interview_status_color(InterviewStatus::Cancelled),
      Color::Red
    );
  }

  #[test]
  fn test_format_salary() {
    assert_eq!(format_salary(Some(80_000), Some(120_000)), "$80k-$120k");
    assert_eq!(format_salary(Some(95_500), None), "$95500+");
    assert_eq!(format_salary(None, Some(60_000)), "up to $60k");
    assert_eq!(format_salary(None, None), "-");
  }

  #[test]
  fn test_match_score_color_bands() {
    assert_eq!(match_score_color(80.0), Color::Green);
    assert_eq!(match_score_color(50.0), Color::Yellow);
    assert_eq!(match_score_color(20.0), Color::Red);
  }
}
