use crate::api::types::UserWithStats;
use crate::cache::{CacheSnapshot, Subscription};
use crate::event::Event;
use crate::store::Store;
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{match_score_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::StudentDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use tokio::sync::mpsc;

/// Advisor roster: students with application counts and average match score.
pub struct StudentsView {
  store: Store,
  tx: mpsc::UnboundedSender<Event>,
  sub: Subscription,
  students: Vec<UserWithStats>,
  error: Option<String>,
  fetching: bool,
  list_state: ListState,
  search: SearchInput,
  filter: String,
}

impl StudentsView {
  pub fn new(store: Store, tx: mpsc::UnboundedSender<Event>) -> Self {
    let sub = store.watch_students();
    Self {
      store,
      tx,
      sub,
      students: Vec::new(),
      error: None,
      fetching: false,
      list_state: ListState::default(),
      search: SearchInput::new(),
      filter: String::new(),
    }
  }

  fn visible(&self) -> Vec<&UserWithStats> {
    if self.filter.is_empty() {
      return self.students.iter().collect();
    }
    let needle = self.filter.to_lowercase();
    self
      .students
      .iter()
      .filter(|s| {
        s.user.display_name().to_lowercase().contains(&needle)
          || s.user.email.to_lowercase().contains(&needle)
      })
      .collect()
  }
}

impl View for StudentsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.search.handle_key(key) {
      KeyResult::Handled => return ViewAction::None,
      KeyResult::Event(SearchEvent::Changed(text)) => {
        self.filter = text;
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted) => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => self.sub.refresh(),
      KeyCode::Enter => {
        let visible = self.visible();
        if let Some(student) = self.list_state.selected().and_then(|i| visible.get(i)) {
          return ViewAction::Push(Box::new(StudentDetailView::new(
            self.store.clone(),
            self.tx.clone(),
            student.user.id,
            student.user.display_name(),
          )));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let visible = self.visible();
    let len = visible.len();

    let mut title = format!(" Students ({}) ", len);
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
        "Loading students...".to_string()
      } else if let Some(e) = &self.error {
        format!("Failed to load: {}", e)
      } else {
        "No students found.".to_string()
      };
      frame.render_widget(
        Paragraph::new(content)
          .block(block)
          .style(Style::default().fg(Color::DarkGray)),
        area,
      );
      return;
    }

    let items: Vec<ListItem> = visible
      .iter()
      .map(|s| {
        let score = s.avg_match_score.unwrap_or(0.0);
        let line = Line::from(vec![
          Span::raw(format!("{:<28}", truncate(&s.user.display_name(), 28))),
          Span::styled(
            format!("{:<30}", truncate(&s.user.email, 30)),
            Style::default().fg(Color::Gray),
          ),
          Span::styled(
            format!("{:>3} apps  ", s.application_count),
            Style::default().fg(Color::Cyan),
          ),
          Span::styled(
            format!("avg {:>3.0}%", score),
            Style::default().fg(match_score_color(score)),
          ),
        ]);
        ListItem::new(line)
      })
      .collect();

    ensure_valid_selection(&mut self.list_state, len);

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Students".to_string()
  }

  fn tick(&mut self) {
    let snap: CacheSnapshot<Vec<UserWithStats>> = self.sub.snapshot();
    if let Some(students) = snap.data {
      self.students = students;
    }
    self.error = snap.error;
    self.fetching = snap.is_fetching;
  }

  fn wants_text_input(&self) -> bool {
    self.search.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("Enter", "detail").with_priority(10),
      ShortcutInfo::new("/", "filter").with_priority(20),
    ]
  }
}
