use crate::api::types::{Application, Note, UserWithStats};
use crate::cache::{CacheSnapshot, Subscription};
use crate::event::Event;
use crate::store::Store;
use crate::ui::components::{InputResult, TextInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{application_status_color, format_date, match_score_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::spawn_mutation;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
  Applications,
  Notes,
}

/// One advisee: their application pipeline and the advisor's notes on them.
pub struct StudentDetailView {
  store: Store,
  tx: mpsc::UnboundedSender<Event>,
  student_id: i64,
  student_name: String,
  student_sub: Subscription,
  apps_sub: Subscription,
  notes_sub: Subscription,
  student: Option<UserWithStats>,
  applications: Vec<Application>,
  notes: Vec<Note>,
  pane: Pane,
  apps_state: ListState,
  notes_state: ListState,
  note_prompt: Option<TextInput>,
  /// Note being edited when the prompt is open; `None` means a new note
  editing_note: Option<i64>,
}

impl StudentDetailView {
  pub fn new(
    store: Store,
    tx: mpsc::UnboundedSender<Event>,
    student_id: i64,
    student_name: String,
  ) -> Self {
    let student_sub = store.watch_student(student_id);
    let apps_sub = store.watch_student_applications(student_id);
    let notes_sub = store.watch_student_notes(student_id);
    Self {
      store,
      tx,
      student_id,
      student_name,
      student_sub,
      apps_sub,
      notes_sub,
      student: None,
      applications: Vec::new(),
      notes: Vec::new(),
      pane: Pane::Applications,
      apps_state: ListState::default(),
      notes_state: ListState::default(),
      note_prompt: None,
      editing_note: None,
    }
  }

  fn submit_note(&mut self, content: &str) {
    let content = content.trim();
    if content.is_empty() {
      return;
    }
    let store = self.store.clone();
    let student_id = self.student_id;
    let content = content.to_string();
    match self.editing_note.take() {
      Some(note_id) => spawn_mutation(self.tx.clone(), async move {
        store.update_note(note_id, Some(&content), None).await
      }),
      None => spawn_mutation(self.tx.clone(), async move {
        store.create_note(student_id, &content, None).await
      }),
    }
  }

  fn edit_highlighted_note(&mut self) {
    if self.pane != Pane::Notes {
      return;
    }
    let Some(note) = self.notes_state.selected().and_then(|i| self.notes.get(i)) else {
      return;
    };
    self.editing_note = Some(note.id);
    self.note_prompt = Some(TextInput::with_value(&note.content));
  }

  fn delete_highlighted_note(&mut self) {
    if self.pane != Pane::Notes {
      return;
    }
    let Some(note) = self.notes_state.selected().and_then(|i| self.notes.get(i)) else {
      return;
    };
    let id = note.id;
    let store = self.store.clone();
    spawn_mutation(self.tx.clone(), async move { store.delete_note(id).await });
  }

  fn render_applications(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.applications.len();
    ensure_valid_selection(&mut self.apps_state, len);

    let focused = self.pane == Pane::Applications;
    let border = if focused { Color::Blue } else { Color::DarkGray };
    let block = Block::default()
      .title(format!(" Applications ({}) ", len))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border));

    if len == 0 {
      frame.render_widget(
        Paragraph::new("No applications.")
          .block(block)
          .style(Style::default().fg(Color::DarkGray)),
        area,
      );
      return;
    }

    let items: Vec<ListItem> = self
      .applications
      .iter()
      .map(|a| {
        let job_title = a
          .job
          .as_ref()
          .map(|j| j.title.clone())
          .unwrap_or_else(|| format!("job #{}", a.job_id));
        let line = Line::from(vec![
          Span::styled(
            format!("{:<10}", a.status.label()),
            Style::default().fg(application_status_color(a.status)),
          ),
          Span::raw(format!("{:<32}", truncate(&job_title, 32))),
          Span::styled(format_date(a.created_at), Style::default().fg(Color::DarkGray)),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::DarkGray))
      .highlight_symbol(if focused { "> " } else { "  " });

    frame.render_stateful_widget(list, area, &mut self.apps_state);
  }

  fn render_notes(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.notes.len();
    ensure_valid_selection(&mut self.notes_state, len);

    let focused = self.pane == Pane::Notes;
    let border = if focused { Color::Blue } else { Color::DarkGray };
    let block = Block::default()
      .title(format!(" Notes ({}) ", len))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border));

    if len == 0 {
      frame.render_widget(
        Paragraph::new("No notes yet. Press 'n' to add one.")
          .block(block)
          .style(Style::default().fg(Color::DarkGray)),
        area,
      );
      return;
    }

    let items: Vec<ListItem> = self
      .notes
      .iter()
      .map(|n| {
        let line = Line::from(vec![
          Span::styled(
            format!("{:<10}", format_date(n.created_at)),
            Style::default().fg(Color::DarkGray),
          ),
          Span::styled(format!("[{}] ", n.note_type), Style::default().fg(Color::Magenta)),
          Span::raw(truncate(&n.content, 60)),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::DarkGray))
      .highlight_symbol(if focused { "> " } else { "  " });

    frame.render_stateful_widget(list, area, &mut self.notes_state);
  }
}

impl View for StudentDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some(prompt) = &mut self.note_prompt {
      match prompt.handle_key(key) {
        InputResult::Submitted(text) => {
          self.note_prompt = None;
          self.submit_note(&text);
        }
        InputResult::Cancelled => {
          self.note_prompt = None;
          self.editing_note = None;
        }
        _ => {}
      }
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Tab => {
        self.pane = match self.pane {
          Pane::Applications => Pane::Notes,
          Pane::Notes => Pane::Applications,
        };
      }
      KeyCode::Char('j') | KeyCode::Down => match self.pane {
        Pane::Applications => self.apps_state.select_next(),
        Pane::Notes => self.notes_state.select_next(),
      },
      KeyCode::Char('k') | KeyCode::Up => match self.pane {
        Pane::Applications => self.apps_state.select_previous(),
        Pane::Notes => self.notes_state.select_previous(),
      },
      KeyCode::Char('n') => {
        self.editing_note = None;
        self.note_prompt = Some(TextInput::new());
      }
      KeyCode::Char('e') => self.edit_highlighted_note(),
      KeyCode::Char('d') => self.delete_highlighted_note(),
      KeyCode::Char('r') => {
        self.student_sub.refresh();
        self.apps_sub.refresh();
        self.notes_sub.refresh();
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1),
        Constraint::Percentage(55),
        Constraint::Percentage(45),
      ])
      .split(area);

    let summary = match &self.student {
      Some(s) => {
        let mut spans = vec![
          Span::styled(
            format!(" {} ", self.student_name),
            Style::default().fg(Color::Yellow).bold(),
          ),
          Span::styled(
            format!("{}  ", s.user.email),
            Style::default().fg(Color::DarkGray),
          ),
          Span::raw(format!("{} applications", s.application_count)),
        ];
        if let Some(score) = s.avg_match_score {
          spans.push(Span::styled(
            format!("  avg match {:.0}%", score),
            Style::default().fg(match_score_color(score)),
          ));
        }
        Line::from(spans)
      }
      None => Line::styled(
        format!(" {} ", self.student_name),
        Style::default().fg(Color::Yellow).bold(),
      ),
    };
    frame.render_widget(Paragraph::new(summary), chunks[0]);

    self.render_applications(frame, chunks[1]);
    self.render_notes(frame, chunks[2]);

    if let Some(prompt) = &self.note_prompt {
      let width = (area.width * 70 / 100).clamp(40, 80);
      let overlay = Rect::new(area.x + 1, area.y + 1, width, 3);
      frame.render_widget(Clear, overlay);
      let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(if self.editing_note.is_some() {
          " Edit note "
        } else {
          " New note "
        });
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
    truncate(&self.student_name, 24)
  }

  fn tick(&mut self) {
    let student: CacheSnapshot<UserWithStats> = self.student_sub.snapshot();
    if student.data.is_some() {
      self.student = student.data;
    }
    let apps: CacheSnapshot<Vec<Application>> = self.apps_sub.snapshot();
    if let Some(applications) = apps.data {
      self.applications = applications;
    }
    let notes: CacheSnapshot<Vec<Note>> = self.notes_sub.snapshot();
    if let Some(notes) = notes.data {
      self.notes = notes;
    }
  }

  fn wants_text_input(&self) -> bool {
    self.note_prompt.is_some()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("Tab", "pane").with_priority(10),
      ShortcutInfo::new("n", "note").with_priority(20),
      ShortcutInfo::new("e", "edit note").with_priority(30),
      ShortcutInfo::new("d", "delete note").with_priority(40),
    ]
  }
}
