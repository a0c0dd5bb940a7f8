use crate::api::types::{has_applied, Application, JobWithMatch, SkillGapAnalysis};
use crate::cache::{CacheSnapshot, Subscription};
use crate::event::Event;
use crate::store::Store;
use crate::ui::renderfns::{format_date, format_salary, match_score_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::spawn_mutation;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tokio::sync::mpsc;

/// Single job posting with the viewer's skill gap analysis alongside.
pub struct JobDetailView {
  store: Store,
  tx: mpsc::UnboundedSender<Event>,
  job_id: i64,
  job_sub: Subscription,
  gap_sub: Subscription,
  apps_sub: Subscription,
  job: Option<JobWithMatch>,
  gap: Option<SkillGapAnalysis>,
  my_applications: Vec<Application>,
  fetching: bool,
  error: Option<String>,
  scroll: u16,
}

impl JobDetailView {
  pub fn new(store: Store, tx: mpsc::UnboundedSender<Event>, job_id: i64) -> Self {
    let job_sub = store.watch_job(job_id);
    let gap_sub = store.watch_skill_gap(job_id, None);
    let apps_sub = store.watch_my_applications();
    Self {
      store,
      tx,
      job_id,
      job_sub,
      gap_sub,
      apps_sub,
      job: None,
      gap: None,
      my_applications: Vec::new(),
      fetching: false,
      error: None,
      scroll: 0,
    }
  }

  fn already_applied(&self) -> bool {
    has_applied(&self.my_applications, self.job_id)
  }

  fn apply(&mut self) {
    if self.already_applied() {
      let _ = self.tx.send(Event::Error("already applied to this job".to_string()));
      return;
    }
    let store = self.store.clone();
    let job_id = self.job_id;
    spawn_mutation(self.tx.clone(), async move {
      store.apply(job_id, None).await
    });
  }

  fn render_job(&self, frame: &mut Frame, area: Rect) {
    let title = match &self.job {
      Some(j) => format!(" {} ", truncate(&j.job.title, (area.width as usize).saturating_sub(4))),
      None if self.fetching => " loading... ".to_string(),
      None => " Job ".to_string(),
    };

    let block = Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(with_match) = &self.job else {
      let msg = match &self.error {
        Some(e) => format!("Failed to load job: {}", e),
        None => "Loading...".to_string(),
      };
      frame.render_widget(
        Paragraph::new(msg)
          .block(block)
          .style(Style::default().fg(Color::DarkGray)),
        area,
      );
      return;
    };
    let job = &with_match.job;

    let mut lines = vec![
      Line::from(vec![
        Span::styled("location  ", Style::default().fg(Color::DarkGray)),
        Span::raw(job.location.clone().unwrap_or_else(|| "-".to_string())),
      ]),
      Line::from(vec![
        Span::styled("salary    ", Style::default().fg(Color::DarkGray)),
        Span::raw(format_salary(job.salary_min, job.salary_max)),
      ]),
      Line::from(vec![
        Span::styled("type      ", Style::default().fg(Color::DarkGray)),
        Span::raw(job.job_type.clone().unwrap_or_else(|| "-".to_string())),
        Span::raw("  "),
        Span::styled("level  ", Style::default().fg(Color::DarkGray)),
        Span::raw(job.experience_level.clone().unwrap_or_else(|| "-".to_string())),
      ]),
    ];
    if let Some(deadline) = job.deadline {
      lines.push(Line::from(vec![
        Span::styled("deadline  ", Style::default().fg(Color::DarkGray)),
        Span::raw(format_date(deadline)),
      ]));
    }
    if !job.required_skills.is_empty() {
      let names: Vec<&str> = job.required_skills.iter().map(|s| s.name.as_str()).collect();
      lines.push(Line::from(vec![
        Span::styled("skills    ", Style::default().fg(Color::DarkGray)),
        Span::raw(names.join(", ")),
      ]));
    }
    if self.already_applied() {
      lines.push(Line::styled(
        "✓ application submitted",
        Style::default().fg(Color::Green),
      ));
    }
    lines.push(Line::raw(""));
    for text_line in job.description.lines() {
      lines.push(Line::raw(text_line.to_string()));
    }

    let paragraph = Paragraph::new(lines)
      .block(block)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0));
    frame.render_widget(paragraph, area);
  }

  fn render_gap(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Skill gap ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(gap) = &self.gap else {
      frame.render_widget(
        Paragraph::new("Computing skill gap...")
          .block(block)
          .style(Style::default().fg(Color::DarkGray)),
        area,
      );
      return;
    };

    let mut lines = vec![
      Line::from(vec![
        Span::styled("overall   ", Style::default().fg(Color::DarkGray)),
        Span::styled(
          format!("{:.0}%", gap.overall_score),
          Style::default().fg(match_score_color(gap.overall_score)).bold(),
        ),
        Span::styled(
          format!("  tech {:.0}%  soft {:.0}%", gap.technical_score, gap.soft_score),
          Style::default().fg(Color::Gray),
        ),
      ]),
      Line::raw(""),
    ];

    for entry in &gap.radar_data {
      let bar_len = (entry.candidate / 10.0).round().clamp(0.0, 10.0) as usize;
      let req_len = (entry.required / 10.0).round().clamp(0.0, 10.0) as usize;
      let color = if entry.matched { Color::Green } else { Color::Red };
      lines.push(Line::from(vec![
        Span::styled(format!("{:<18}", truncate(&entry.skill, 18)), Style::default().fg(color)),
        Span::styled("█".repeat(bar_len), Style::default().fg(color)),
        Span::styled(
          "░".repeat(req_len.saturating_sub(bar_len)),
          Style::default().fg(Color::DarkGray),
        ),
      ]));
    }

    if !gap.missing_technical.is_empty() {
      lines.push(Line::raw(""));
      lines.push(Line::from(vec![
        Span::styled("missing   ", Style::default().fg(Color::DarkGray)),
        Span::styled(gap.missing_technical.join(", "), Style::default().fg(Color::Red)),
      ]));
    }

    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
  }
}

impl View for JobDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
      KeyCode::Char('a') => self.apply(),
      KeyCode::Char('r') => {
        self.job_sub.refresh();
        self.gap_sub.refresh();
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
      .split(area);

    self.render_job(frame, chunks[0]);
    self.render_gap(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    match &self.job {
      Some(j) => truncate(&j.job.title, 24),
      None => format!("Job #{}", self.job_id),
    }
  }

  fn tick(&mut self) {
    let job: CacheSnapshot<JobWithMatch> = self.job_sub.snapshot();
    if job.data.is_some() {
      self.job = job.data;
    }
    self.fetching = job.is_fetching;
    self.error = job.error;

    let gap: CacheSnapshot<SkillGapAnalysis> = self.gap_sub.snapshot();
    if gap.data.is_some() {
      self.gap = gap.data;
    }

    let apps: CacheSnapshot<Vec<Application>> = self.apps_sub.snapshot();
    if let Some(applications) = apps.data {
      self.my_applications = applications;
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("a", "apply").with_priority(10),
      ShortcutInfo::new("j/k", "scroll").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(30),
    ]
  }
}
