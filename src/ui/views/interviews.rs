use crate::api::types::{
  partition_interviews, InterviewPatch, InterviewStatus, InterviewWithDetails, Role,
};
use crate::cache::{CacheSnapshot, Subscription};
use crate::event::Event;
use crate::store::Store;
use crate::ui::components::{InputResult, TextInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_datetime, interview_status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::spawn_mutation;
use chrono::{NaiveDateTime, TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Half {
  Upcoming,
  Past,
}

/// Interview schedule, split strictly into upcoming and past. Confirm,
/// cancel, and reschedule are offered only on the upcoming half; marking an
/// interview completed is the employer's call.
pub struct InterviewsView {
  store: Store,
  tx: mpsc::UnboundedSender<Event>,
  role: Role,
  sub: Subscription,
  interviews: Vec<InterviewWithDetails>,
  error: Option<String>,
  fetching: bool,
  half: Half,
  list_state: ListState,
  reschedule_prompt: Option<TextInput>,
}

impl InterviewsView {
  pub fn new(store: Store, tx: mpsc::UnboundedSender<Event>, role: Role) -> Self {
    let sub = store.watch_interviews();
    Self {
      store,
      tx,
      role,
      sub,
      interviews: Vec::new(),
      error: None,
      fetching: false,
      half: Half::Upcoming,
      list_state: ListState::default(),
      reschedule_prompt: None,
    }
  }

  fn current_half(&self) -> Vec<&InterviewWithDetails> {
    let (upcoming, past) = partition_interviews(&self.interviews, Utc::now());
    match self.half {
      Half::Upcoming => upcoming,
      Half::Past => past,
    }
  }

  fn highlighted(&self) -> Option<&InterviewWithDetails> {
    let half = self.current_half();
    self.list_state.selected().and_then(|i| half.get(i).copied())
  }

  /// Confirm or cancel the highlighted interview. No-op once the slot has
  /// passed or the record is closed.
  fn set_status(&mut self, status: InterviewStatus) {
    let Some(item) = self.highlighted() else {
      return;
    };
    if !item.interview.can_modify(Utc::now()) {
      let _ = self
        .tx
        .send(Event::Error("this interview can no longer be changed".to_string()));
      return;
    }
    let id = item.interview.id;
    let store = self.store.clone();
    if status == InterviewStatus::Cancelled {
      spawn_mutation(self.tx.clone(), async move { store.cancel_interview(id).await });
    } else {
      let patch = InterviewPatch {
        status: Some(status),
        ..Default::default()
      };
      spawn_mutation(self.tx.clone(), async move {
        store.update_interview(id, &patch).await
      });
    }
  }

  fn open_reschedule_prompt(&mut self) {
    let Some(item) = self.highlighted() else {
      return;
    };
    if !item.interview.can_modify(Utc::now()) {
      let _ = self
        .tx
        .send(Event::Error("this interview can no longer be changed".to_string()));
      return;
    }
    self.reschedule_prompt = Some(TextInput::new());
  }

  fn submit_reschedule(&mut self, text: &str) {
    let Some(item) = self.highlighted() else {
      return;
    };
    let scheduled_at = match NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%d %H:%M") {
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

    let id = item.interview.id;
    let patch = InterviewPatch {
      scheduled_at: Some(scheduled_at),
      status: Some(InterviewStatus::Rescheduled),
      ..Default::default()
    };
    let store = self.store.clone();
    spawn_mutation(self.tx.clone(), async move {
      store.update_interview(id, &patch).await
    });
  }

  fn row(item: &InterviewWithDetails) -> Line<'static> {
    let iv = &item.interview;
    Line::from(vec![
      Span::styled(
        format!("{:<16}", format_datetime(iv.scheduled_at)),
        Style::default().fg(Color::Cyan),
      ),
      Span::styled(
        format!("{:<12}", iv.status.label()),
        Style::default().fg(interview_status_color(iv.status)),
      ),
      Span::raw(format!("{:<26}", truncate(&item.job_title, 26))),
      Span::styled(
        format!("{:<22}", truncate(&item.applicant_name, 22)),
        Style::default().fg(Color::Gray),
      ),
      Span::styled(
        format!("{}min {}", iv.duration_minutes, iv.interview_type),
        Style::default().fg(Color::DarkGray),
      ),
    ])
  }
}

impl View for InterviewsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some(prompt) = &mut self.reschedule_prompt {
      match prompt.handle_key(key) {
        InputResult::Submitted(text) => {
          self.reschedule_prompt = None;
          self.submit_reschedule(&text);
        }
        InputResult::Cancelled => self.reschedule_prompt = None,
        _ => {}
      }
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Tab => {
        self.half = match self.half {
          Half::Upcoming => Half::Past,
          Half::Past => Half::Upcoming,
        };
        self.list_state.select(Some(0));
      }
      KeyCode::Char('c') => self.set_status(InterviewStatus::Confirmed),
      KeyCode::Char('m') if self.role == Role::Employer => {
        self.set_status(InterviewStatus::Completed)
      }
      KeyCode::Char('x') => self.set_status(InterviewStatus::Cancelled),
      KeyCode::Char('e') => self.open_reschedule_prompt(),
      KeyCode::Char('r') => self.sub.refresh(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(1), Constraint::Min(1)])
      .split(area);

    let (upcoming, past) = partition_interviews(&self.interviews, Utc::now());
    let titles = vec![
      format!("Upcoming ({})", upcoming.len()),
      format!("Past ({})", past.len()),
    ];
    let selected_tab = match self.half {
      Half::Upcoming => 0,
      Half::Past => 1,
    };
    let tabs = Tabs::new(titles)
      .select(selected_tab)
      .highlight_style(Style::default().fg(Color::Cyan).bold())
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(tabs, chunks[0]);

    let rows: Vec<Line> = self.current_half().iter().map(|i| Self::row(i)).collect();
    let len = rows.len();
    ensure_valid_selection(&mut self.list_state, len);

    let mut title = format!(" Interviews ({}) ", self.interviews.len());
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
        "Loading interviews...".to_string()
      } else if let Some(e) = &self.error {
        format!("Failed to load: {}", e)
      } else {
        match self.half {
          Half::Upcoming => "No upcoming interviews.".to_string(),
          Half::Past => "No past interviews.".to_string(),
        }
      };
      frame.render_widget(
        Paragraph::new(content)
          .block(block)
          .style(Style::default().fg(Color::DarkGray)),
        chunks[1],
      );
      return;
    }

    let items: Vec<ListItem> = rows.into_iter().map(ListItem::new).collect();
    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[1], &mut self.list_state);

    if let Some(prompt) = &self.reschedule_prompt {
      let width = (area.width * 60 / 100).clamp(34, 60);
      let overlay = Rect::new(area.x + 1, area.y + 2, width, 3);
      frame.render_widget(Clear, overlay);
      let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Reschedule (YYYY-MM-DD HH:MM) ");
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

  fn breadcrumb_label(&self) -> String {
    "Interviews".to_string()
  }

  fn tick(&mut self) {
    let snap: CacheSnapshot<Vec<InterviewWithDetails>> = self.sub.snapshot();
    if let Some(interviews) = snap.data {
      self.interviews = interviews;
    }
    self.error = snap.error;
    self.fetching = snap.is_fetching;
  }

  fn wants_text_input(&self) -> bool {
    self.reschedule_prompt.is_some()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = vec![
      ShortcutInfo::new("Tab", "upcoming/past").with_priority(10),
      ShortcutInfo::new("c", "confirm").with_priority(20),
      ShortcutInfo::new("e", "reschedule").with_priority(30),
      ShortcutInfo::new("x", "cancel").with_priority(40),
    ];
    if self.role == Role::Employer {
      shortcuts.push(ShortcutInfo::new("m", "complete").with_priority(50));
    }
    shortcuts
  }
}
