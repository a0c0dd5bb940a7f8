use crate::api::types::Role;
use crate::session::Session;
use crate::ui::components::{InputResult, TextInput};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Email,
  Password,
  Role,
}

/// Sign-in / sign-up form shown as the root view while anonymous.
///
/// Submits in the background; the app swaps this view for the dashboard
/// once the session state turns authenticated.
pub struct LoginView {
  session: Session,
  email: TextInput,
  password: TextInput,
  role_idx: usize,
  field: Field,
  register_mode: bool,
  submitting: bool,
  error: Option<String>,
  /// Written by the background submit task, drained in tick()
  feedback: Arc<Mutex<Option<String>>>,
}

impl LoginView {
  pub fn new(session: Session, prefill_email: Option<&str>, prefill_password: Option<&str>) -> Self {
    let email = match prefill_email {
      Some(e) => TextInput::with_value(e),
      None => TextInput::new(),
    };
    let mut password = TextInput::masked();
    if let Some(p) = prefill_password {
      password = password.with_initial(p);
    }
    Self {
      session,
      email,
      password,
      role_idx: 0,
      field: Field::Email,
      register_mode: false,
      submitting: false,
      error: None,
      feedback: Arc::new(Mutex::new(None)),
    }
  }

  fn role(&self) -> Role {
    Role::ALL[self.role_idx % Role::ALL.len()]
  }

  fn next_field(&mut self) {
    self.field = match self.field {
      Field::Email => Field::Password,
      Field::Password => Field::Role,
      Field::Role => Field::Email,
    };
  }

  fn prev_field(&mut self) {
    self.field = match self.field {
      Field::Email => Field::Role,
      Field::Password => Field::Email,
      Field::Role => Field::Password,
    };
  }

  fn submit(&mut self) {
    if self.submitting {
      return;
    }
    if self.email.is_empty() || self.password.is_empty() {
      self.error = Some("email and password are required".to_string());
      return;
    }

    self.submitting = true;
    self.error = None;

    let session = self.session.clone();
    let email = self.email.value().to_string();
    let password = self.password.value().to_string();
    let role = self.role();
    let register = self.register_mode;
    let feedback = self.feedback.clone();

    tokio::spawn(async move {
      let result = if register {
        session.register(&email, &password, role).await
      } else {
        session.login(&email, &password, role).await
      };
      if let Err(e) = result {
        if let Ok(mut slot) = feedback.lock() {
          *slot = Some(e.to_string());
        }
      }
      // On success the cached session entry flips and the app swaps views.
    });
  }

  fn field_line<'a>(&self, label: &'a str, value: String, focused: bool) -> Line<'a> {
    let marker = if focused { "> " } else { "  " };
    let value_style = if focused {
      Style::default().fg(Color::White)
    } else {
      Style::default().fg(Color::Gray)
    };
    Line::from(vec![
      Span::styled(marker, Style::default().fg(Color::Cyan)),
      Span::styled(format!("{:<10}", label), Style::default().fg(Color::DarkGray)),
      Span::styled(value, value_style),
      if focused {
        Span::styled("_", Style::default().fg(Color::Yellow))
      } else {
        Span::raw("")
      },
    ])
  }
}

impl View for LoginView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Tab | KeyCode::Down => {
        self.next_field();
        return ViewAction::None;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.prev_field();
        return ViewAction::None;
      }
      KeyCode::Enter => {
        self.submit();
        return ViewAction::None;
      }
      _ => {}
    }

    match self.field {
      Field::Email => {
        if let InputResult::Cancelled = self.email.handle_key(key) {
          return ViewAction::Pop;
        }
      }
      Field::Password => {
        if let InputResult::Cancelled = self.password.handle_key(key) {
          return ViewAction::Pop;
        }
      }
      Field::Role => match key.code {
        KeyCode::Left | KeyCode::Char('h') => {
          self.role_idx = (self.role_idx + Role::ALL.len() - 1) % Role::ALL.len();
        }
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
          self.role_idx = (self.role_idx + 1) % Role::ALL.len();
        }
        KeyCode::Char('r') => {
          self.register_mode = !self.register_mode;
        }
        KeyCode::Esc => return ViewAction::Pop,
        _ => {}
      },
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = if self.register_mode {
      " Create account "
    } else {
      " Sign in "
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    // Center a small form box
    let width = area.width.min(60);
    let height = 10u16.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let form_area = Rect::new(x, y, width, height);

    let mut lines = vec![
      Line::raw(""),
      self.field_line("email", self.email.display_value(), self.field == Field::Email),
      self.field_line(
        "password",
        self.password.display_value(),
        self.field == Field::Password,
      ),
      self.field_line(
        "role",
        format!("< {} >", self.role().label()),
        self.field == Field::Role,
      ),
      Line::raw(""),
    ];

    if self.submitting {
      lines.push(Line::styled(
        "  signing in...",
        Style::default().fg(Color::Yellow),
      ));
    } else if let Some(error) = &self.error {
      lines.push(Line::styled(
        format!("  {}", error),
        Style::default().fg(Color::Red),
      ));
    } else {
      lines.push(Line::styled(
        "  Enter: submit   Tab: next field   r (on role): toggle sign-up",
        Style::default().fg(Color::DarkGray),
      ));
    }

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, form_area);
  }

  fn breadcrumb_label(&self) -> String {
    if self.register_mode {
      "Register".to_string()
    } else {
      "Login".to_string()
    }
  }

  fn tick(&mut self) {
    let taken = self.feedback.lock().ok().and_then(|mut slot| slot.take());
    if let Some(message) = taken {
      self.error = Some(message);
      self.submitting = false;
    }
  }

  fn wants_text_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("Tab", "next field").with_priority(10),
      ShortcutInfo::new("Enter", "submit").with_priority(20),
    ]
  }
}
