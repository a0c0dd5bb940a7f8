use crate::api::types::{Application, ApplicationStatus, InterviewRequest};
use crate::cache::{CacheSnapshot, Subscription};
use crate::event::Event;
use crate::store::Store;
use crate::ui::components::{InputResult, TextInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{application_status_color, format_datetime, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::spawn_mutation;
use chrono::{NaiveDateTime, TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use std::collections::HashSet;
use tokio::sync::mpsc;

/// Whose applications this view lists. Status mutations are offered only in
/// the per-job scope, which is the employer's review queue.
#[derive(Debug, Clone)]
pub enum ApplicationScope {
  Mine,
  Job { job_id: i64, title: String },
  Student { student_id: i64, name: String },
}

pub struct ApplicationsView {
  store: Store,
  tx: mpsc::UnboundedSender<Event>,
  scope: ApplicationScope,
  sub: Subscription,
  applications: Vec<Application>,
  error: Option<String>,
  fetching: bool,
  list_state: ListState,
  /// Multi-select for bulk updates (per-job scope only)
  selected_ids: HashSet<i64>,
  /// Open when scheduling an interview for the highlighted application
  schedule_prompt: Option<TextInput>,
}

impl ApplicationsView {
  pub fn new(store: Store, tx: mpsc::UnboundedSender<Event>, scope: ApplicationScope) -> Self {
    let sub = match &scope {
      ApplicationScope::Mine => store.watch_my_applications(),
      ApplicationScope::Job { job_id, .. } => store.watch_job_applications(*job_id),
      ApplicationScope::Student { student_id, .. } => store.watch_student_applications(*student_id),
    };
    Self {
      store,
      tx,
      scope,
      sub,
      applications: Vec::new(),
      error: None,
      fetching: false,
      list_state: ListState::default(),
      selected_ids: HashSet::new(),
      schedule_prompt: None,
    }
  }

  fn reviewing(&self) -> bool {
    matches!(self.scope, ApplicationScope::Job { .. })
  }

  fn highlighted(&self) -> Option<&Application> {
    self.list_state.selected().and_then(|i| self.applications.get(i))
  }

  fn toggle_select(&mut self) {
    if !self.reviewing() {
      return;
    }
    if let Some(app) = self.highlighted() {
      let id = app.id;
      if !self.selected_ids.insert(id) {
        self.selected_ids.remove(&id);
      }
    }
  }

  /// Move the highlighted application (or the whole selection) to `target`.
  /// Terminal states and repeats are filtered out before the request.
  fn set_status(&mut self, target: ApplicationStatus) {
    if !self.reviewing() {
      return;
    }

    if self.selected_ids.len() > 1 {
      self.bulk_update(target);
      return;
    }

    let Some(app) = self.highlighted() else {
      return;
    };
    if !app.status.can_transition_to(target) {
      let _ = self.tx.send(Event::Error(format!(
        "cannot move a {} application to {}",
        app.status.label(),
        target.label()
      )));
      return;
    }
    let store = self.store.clone();
    let id = app.id;
    spawn_mutation(self.tx.clone(), async move {
      store.update_application_status(id, target, None).await
    });
  }

  /// Bulk update treats partial failure as a normal outcome: the counts go
  /// to the status line, not the error path.
  fn bulk_update(&mut self, target: ApplicationStatus) {
    let ids: Vec<i64> = self.selected_ids.iter().copied().collect();
    self.selected_ids.clear();

    let store = self.store.clone();
    let tx = self.tx.clone();
    tokio::spawn(async move {
      match store.bulk_update_applications(&ids, target, None).await {
        Ok(result) if result.failed_count > 0 => {
          let _ = tx.send(Event::Error(format!(
            "bulk update: {} updated, {} failed (ids {:?})",
            result.updated_count, result.failed_count, result.failed_ids
          )));
        }
        Ok(_) => {}
        Err(e) => {
          let _ = tx.send(Event::Error(e.to_string()));
        }
      }
    });
  }

  fn open_schedule_prompt(&mut self) {
    if !self.reviewing() || self.highlighted().is_none() {
      return;
    }
    self.schedule_prompt = Some(TextInput::new());
  }

  /// Parse "YYYY-MM-DD HH:MM" and schedule. Slots in the past are rejected
  /// here at the form layer.
  fn submit_schedule(&mut self, text: &str) {
    let Some(app) = self.highlighted() else {
      return;
    };
    let parsed = NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%d %H:%M");
    let scheduled_at = match parsed {
      Ok(naive) => Utc.from_utc_datetime(&naive),
      Err(_) => {
        let _ = self
          .tx
          .send(Event::Error("expected YYYY-MM-DD HH:MM".to_string()));
        return;
      }
    };
    if scheduled_at <= Utc::now() {
      let _ = self
        .tx
        .send(Event::Error("interview time must be in the future".to_string()));
      return;
    }

    let request = InterviewRequest {
      application_id: app.id,
      scheduled_at,
      duration_minutes: None,
      interview_type: None,
      location: None,
      meeting_link: None,
      notes: None,
    };
    let store = self.store.clone();
    spawn_mutation(self.tx.clone(), async move {
      store.schedule_interview(&request).await
    });
  }

  fn row(&self, app: &Application) -> Line<'static> {
    let marker = if self.selected_ids.contains(&app.id) {
      "◉ "
    } else {
      "  "
    };
    let job_title = app
      .job
      .as_ref()
      .map(|j| j.title.clone())
      .unwrap_or_else(|| format!("job #{}", app.job_id));
    let who = app
      .applicant
      .as_ref()
      .map(|u| u.display_name())
      .unwrap_or_default();

    let mut spans = vec![
      Span::styled(marker.to_string(), Style::default().fg(Color::Magenta)),
      Span::styled(
        format!("{:<10}", app.status.label()),
        Style::default().fg(application_status_color(app.status)),
      ),
      Span::raw(format!("{:<34}", truncate(&job_title, 34))),
    ];
    if self.reviewing() {
      spans.push(Span::styled(
        format!("{:<24}", truncate(&who, 24)),
        Style::default().fg(Color::Gray),
      ));
      if let Some(score) = app.match_score {
        spans.push(Span::styled(
          format!("{:>3.0}%", score),
          Style::default().fg(Color::Cyan),
        ));
      }
    } else {
      spans.push(Span::styled(
        format_datetime(app.created_at),
        Style::default().fg(Color::DarkGray),
      ));
    }
    Line::from(spans)
  }

  fn render_schedule_prompt(&self, frame: &mut Frame, area: Rect) {
    let Some(prompt) = &self.schedule_prompt else {
      return;
    };
    let width = (area.width * 60 / 100).clamp(34, 60);
    let overlay = Rect::new(area.x + 1, area.y + 1, width, 3);
    frame.render_widget(Clear, overlay);
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Schedule interview (YYYY-MM-DD HH:MM) ");
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);
    if inner.height > 0 {
      let line = Line::from(vec![
        Span::raw(prompt.value().to_string()),
        Span::styled("_", Style::default().fg(Color::Yellow)),
      ]);
      frame.render_widget(Paragraph::new(line), inner);
    }
  }
}

impl View for ApplicationsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some(prompt) = &mut self.schedule_prompt {
      match prompt.handle_key(key) {
        InputResult::Submitted(text) => {
          self.schedule_prompt = None;
          self.submit_schedule(&text);
        }
        InputResult::Cancelled => self.schedule_prompt = None,
        _ => {}
      }
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char(' ') => self.toggle_select(),
      KeyCode::Char('1') => self.set_status(ApplicationStatus::Reviewed),
      KeyCode::Char('2') => self.set_status(ApplicationStatus::Interview),
      KeyCode::Char('3') => self.set_status(ApplicationStatus::Accepted),
      KeyCode::Char('4') => self.set_status(ApplicationStatus::Rejected),
      KeyCode::Char('i') => self.open_schedule_prompt(),
      KeyCode::Char('r') => self.sub.refresh(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.applications.len();
    ensure_valid_selection(&mut self.list_state, len);

    let mut title = match &self.scope {
      ApplicationScope::Mine => format!(" My applications ({}) ", len),
      ApplicationScope::Job { title, .. } => {
        format!(" Applications for {} ({}) ", truncate(title, 28), len)
      }
      ApplicationScope::Student { name, .. } => {
        format!(" {}'s applications ({}) ", truncate(name, 24), len)
      }
    };
    if !self.selected_ids.is_empty() {
      title = format!("{}[{} selected] ", title, self.selected_ids.len());
    }
    if self.fetching {
      title.push('~');
    }

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      let content = if self.fetching {
        "Loading applications..."
      } else if let Some(e) = &self.error {
        return frame.render_widget(
          Paragraph::new(format!("Failed to load: {}", e))
            .block(block)
            .style(Style::default().fg(Color::Red)),
          area,
        );
      } else {
        "No applications yet."
      };
      frame.render_widget(
        Paragraph::new(content)
          .block(block)
          .style(Style::default().fg(Color::DarkGray)),
        area,
      );
      return;
    }

    let items: Vec<ListItem> = self.applications.iter().map(|a| ListItem::new(self.row(a))).collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
    self.render_schedule_prompt(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    match &self.scope {
      ApplicationScope::Mine => "Applications".to_string(),
      ApplicationScope::Job { title, .. } => format!("Applicants [{}]", truncate(title, 18)),
      ApplicationScope::Student { name, .. } => format!("Applications [{}]", truncate(name, 18)),
    }
  }

  fn tick(&mut self) {
    let snap: CacheSnapshot<Vec<Application>> = self.sub.snapshot();
    if let Some(applications) = snap.data {
      // Drop selections that no longer exist (e.g. after a bulk update).
      let live: HashSet<i64> = applications.iter().map(|a| a.id).collect();
      self.selected_ids.retain(|id| live.contains(id));
      self.applications = applications;
    }
    self.error = snap.error;
    self.fetching = snap.is_fetching;
  }

  fn wants_text_input(&self) -> bool {
    self.schedule_prompt.is_some()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    if self.reviewing() {
      vec![
        ShortcutInfo::new("1-4", "status").with_priority(10),
        ShortcutInfo::new("Space", "select").with_priority(20),
        ShortcutInfo::new("i", "interview").with_priority(30),
      ]
    } else {
      vec![ShortcutInfo::new("r", "refresh").with_priority(10)]
    }
  }
}
