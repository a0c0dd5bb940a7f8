use crate::api::types::{
  partition_interviews, Application, ApplicationStatus, ApplicationTrend, InterviewWithDetails,
  Job, Note, OverviewStats, ProfileCompletion, Role, SkillDemand, User, UserWithStats,
};
use crate::cache::{CacheSnapshot, Subscription};
use crate::store::Store;
use crate::ui::renderfns::match_score_color;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Per-role data panel. The variant is picked once from the session role
/// when the dashboard is built; a role change means a new session and a new
/// dashboard.
enum RolePanel {
  Student {
    completion_sub: Subscription,
    apps_sub: Subscription,
    notes_sub: Subscription,
    completion: Option<ProfileCompletion>,
    applications: Vec<Application>,
    notes: Vec<Note>,
  },
  Employer {
    jobs_sub: Subscription,
    interviews_sub: Subscription,
    jobs: Vec<Job>,
    interviews: Vec<InterviewWithDetails>,
  },
  Advisor {
    students_sub: Subscription,
    overview_sub: Subscription,
    demand_sub: Subscription,
    trends_sub: Subscription,
    students: Vec<UserWithStats>,
    overview: Option<OverviewStats>,
    demand: Vec<SkillDemand>,
    trends: Vec<ApplicationTrend>,
  },
}

/// Landing view after login, dispatched on the viewer's role.
pub struct DashboardView {
  user: User,
  panel: RolePanel,
}

impl DashboardView {
  pub fn new(store: Store, user: User) -> Self {
    let panel = match user.role {
      Role::Student => RolePanel::Student {
        completion_sub: store.watch_profile_completion(),
        apps_sub: store.watch_my_applications(),
        notes_sub: store.watch_my_notes(),
        completion: None,
        applications: Vec::new(),
        notes: Vec::new(),
      },
      Role::Employer => RolePanel::Employer {
        jobs_sub: store.watch_my_jobs(),
        interviews_sub: store.watch_interviews(),
        jobs: Vec::new(),
        interviews: Vec::new(),
      },
      Role::Advisor => RolePanel::Advisor {
        students_sub: store.watch_students(),
        overview_sub: store.watch_analytics_overview(),
        demand_sub: store.watch_skill_demand(Some(5)),
        trends_sub: store.watch_application_trends(),
        students: Vec::new(),
        overview: None,
        demand: Vec::new(),
        trends: Vec::new(),
      },
    };
    Self { user, panel }
  }

  fn status_count(applications: &[Application], status: ApplicationStatus) -> usize {
    applications.iter().filter(|a| a.status == status).count()
  }

  fn student_lines(
    completion: &Option<ProfileCompletion>,
    applications: &[Application],
    notes: &[Note],
  ) -> Vec<Line<'static>> {
    let mut lines = vec![Line::raw("")];

    match completion {
      Some(c) => {
        lines.push(Line::from(vec![
          Span::styled("  profile     ", Style::default().fg(Color::DarkGray)),
          Span::styled(
            format!("{:.0}% complete", c.completion_percentage),
            Style::default()
              .fg(match_score_color(c.completion_percentage))
              .bold(),
          ),
        ]));
        if !c.missing_fields.is_empty() {
          lines.push(Line::from(vec![
            Span::styled("  missing     ", Style::default().fg(Color::DarkGray)),
            Span::styled(c.missing_fields.join(", "), Style::default().fg(Color::Yellow)),
          ]));
        }
        if !c.can_get_recommendations {
          lines.push(Line::styled(
            "  add skills to unlock job recommendations",
            Style::default().fg(Color::Yellow),
          ));
        }
      }
      None => lines.push(Line::styled(
        "  loading profile...",
        Style::default().fg(Color::DarkGray),
      )),
    }

    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
      Span::styled("  applications ", Style::default().fg(Color::DarkGray)),
      Span::raw(format!("{} total", applications.len())),
    ]));
    for status in [
      ApplicationStatus::Pending,
      ApplicationStatus::Reviewed,
      ApplicationStatus::Interview,
      ApplicationStatus::Accepted,
      ApplicationStatus::Rejected,
    ] {
      let count = Self::status_count(applications, status);
      if count > 0 {
        lines.push(Line::from(vec![
          Span::raw("    "),
          Span::styled(
            format!("{:<10}", status.label()),
            Style::default().fg(crate::ui::renderfns::application_status_color(status)),
          ),
          Span::raw(count.to_string()),
        ]));
      }
    }
    if !notes.is_empty() {
      lines.push(Line::from(vec![
        Span::styled("  advisor notes ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{} shared with you", notes.len())),
      ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
      "  :jobs to browse openings, :applications to track them",
      Style::default().fg(Color::DarkGray),
    ));
    lines
  }

  fn employer_lines(jobs: &[Job], interviews: &[InterviewWithDetails]) -> Vec<Line<'static>> {
    let open = jobs.iter().filter(|j| j.is_active).count();
    let (upcoming, _) = partition_interviews(interviews, Utc::now());

    vec![
      Line::raw(""),
      Line::from(vec![
        Span::styled("  postings    ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{} total, {} open", jobs.len(), open)),
      ]),
      Line::from(vec![
        Span::styled("  interviews  ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{} upcoming", upcoming.len())),
      ]),
      Line::raw(""),
      Line::styled(
        "  :postings to manage jobs, :interviews for the schedule",
        Style::default().fg(Color::DarkGray),
      ),
    ]
  }

  fn advisor_lines(
    students: &[UserWithStats],
    overview: &Option<OverviewStats>,
    demand: &[SkillDemand],
    trends: &[ApplicationTrend],
  ) -> Vec<Line<'static>> {
    let mut lines = vec![
      Line::raw(""),
      Line::from(vec![
        Span::styled("  students    ", Style::default().fg(Color::DarkGray)),
        Span::raw(students.len().to_string()),
      ]),
    ];
    match overview {
      Some(o) => {
        lines.push(Line::from(vec![
          Span::styled("  pipeline    ", Style::default().fg(Color::DarkGray)),
          Span::raw(format!(
            "{} applications, {} interviews, {} offers",
            o.total_applications, o.total_interviews, o.total_offers
          )),
        ]));
        lines.push(Line::from(vec![
          Span::styled("  placement   ", Style::default().fg(Color::DarkGray)),
          Span::styled(
            format!("{:.0}%", o.placement_rate),
            Style::default().fg(match_score_color(o.placement_rate)).bold(),
          ),
          Span::styled(
            format!("  avg match {:.0}%", o.avg_match_score),
            Style::default().fg(Color::Gray),
          ),
        ]));
      }
      None => lines.push(Line::styled(
        "  loading analytics...",
        Style::default().fg(Color::DarkGray),
      )),
    }
    if !trends.is_empty() {
      let funnel: Vec<String> = trends
        .iter()
        .map(|t| format!("{} {:.0}%", t.status, t.percentage))
        .collect();
      lines.push(Line::from(vec![
        Span::styled("  funnel      ", Style::default().fg(Color::DarkGray)),
        Span::raw(funnel.join("  ")),
      ]));
    }
    if !demand.is_empty() {
      let names: Vec<&str> = demand.iter().map(|d| d.skill_name.as_str()).collect();
      lines.push(Line::from(vec![
        Span::styled("  in demand   ", Style::default().fg(Color::DarkGray)),
        Span::styled(names.join(", "), Style::default().fg(Color::Cyan)),
      ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
      "  :students for the roster, :jobs to browse on their behalf",
      Style::default().fg(Color::DarkGray),
    ));
    lines
  }
}

impl View for DashboardView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let KeyCode::Char('r') = key.code {
      match &self.panel {
        RolePanel::Student {
          completion_sub,
          apps_sub,
          notes_sub,
          ..
        } => {
          completion_sub.refresh();
          apps_sub.refresh();
          notes_sub.refresh();
        }
        RolePanel::Employer {
          jobs_sub,
          interviews_sub,
          ..
        } => {
          jobs_sub.refresh();
          interviews_sub.refresh();
        }
        RolePanel::Advisor {
          students_sub,
          overview_sub,
          demand_sub,
          trends_sub,
          ..
        } => {
          students_sub.refresh();
          overview_sub.refresh();
          demand_sub.refresh();
          trends_sub.refresh();
        }
      }
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = format!(
      " {} - {} dashboard ",
      self.user.display_name(),
      self.user.role.label()
    );
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let lines = match &self.panel {
      RolePanel::Student {
        completion,
        applications,
        notes,
        ..
      } => Self::student_lines(completion, applications, notes),
      RolePanel::Employer {
        jobs, interviews, ..
      } => Self::employer_lines(jobs, interviews),
      RolePanel::Advisor {
        students,
        overview,
        demand,
        trends,
        ..
      } => Self::advisor_lines(students, overview, demand, trends),
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn breadcrumb_label(&self) -> String {
    "Dashboard".to_string()
  }

  fn tick(&mut self) {
    match &mut self.panel {
      RolePanel::Student {
        completion_sub,
        apps_sub,
        notes_sub,
        completion,
        applications,
        notes,
      } => {
        let snap: CacheSnapshot<ProfileCompletion> = completion_sub.snapshot();
        if snap.data.is_some() {
          *completion = snap.data;
        }
        let apps: CacheSnapshot<Vec<Application>> = apps_sub.snapshot();
        if let Some(data) = apps.data {
          *applications = data;
        }
        let snap: CacheSnapshot<Vec<Note>> = notes_sub.snapshot();
        if let Some(data) = snap.data {
          *notes = data;
        }
      }
      RolePanel::Employer {
        jobs_sub,
        interviews_sub,
        jobs,
        interviews,
      } => {
        let snap: CacheSnapshot<Vec<Job>> = jobs_sub.snapshot();
        if let Some(data) = snap.data {
          *jobs = data;
        }
        let ivs: CacheSnapshot<Vec<InterviewWithDetails>> = interviews_sub.snapshot();
        if let Some(data) = ivs.data {
          *interviews = data;
        }
      }
      RolePanel::Advisor {
        students_sub,
        overview_sub,
        demand_sub,
        trends_sub,
        students,
        overview,
        demand,
        trends,
      } => {
        let snap: CacheSnapshot<Vec<UserWithStats>> = students_sub.snapshot();
        if let Some(data) = snap.data {
          *students = data;
        }
        let stats: CacheSnapshot<OverviewStats> = overview_sub.snapshot();
        if stats.data.is_some() {
          *overview = stats.data;
        }
        let snap: CacheSnapshot<Vec<SkillDemand>> = demand_sub.snapshot();
        if let Some(data) = snap.data {
          *demand = data;
        }
        let snap: CacheSnapshot<Vec<ApplicationTrend>> = trends_sub.snapshot();
        if let Some(data) = snap.data {
          *trends = data;
        }
      }
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("r", "refresh").with_priority(20),
    ]
  }
}
