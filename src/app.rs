use crate::api::types::{Role, UnreadCount, User};
use crate::api::ApiClient;
use crate::cache::{CacheSnapshot, QueryCache, Subscription};
use crate::commands;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::session::{Session, SessionState};
use crate::store::Store;
use crate::ui::components::draw_command_overlay;
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{
  spawn_mutation, ApplicationScope, ApplicationsView, DashboardView, InterviewsView, JobsView,
  LoginView, NotificationsView, PostingsView, ProfileView, StudentsView,
};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::info;

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
}

/// How long a status-line message stays visible
const STATUS_TTL: Duration = Duration::from_secs(6);

/// Main application state
pub struct App {
  config: Config,
  store: Store,
  session: Session,

  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Role of the signed-in viewer; `None` while the login form is the root
  viewer_role: Option<Role>,

  /// Keeps the session cache entry alive and revalidating
  session_sub: Option<Subscription>,

  /// Unread badge for the header, polled while signed in
  unread_sub: Option<Subscription>,

  /// Current input mode
  mode: Mode,

  /// Command input buffer (after pressing :)
  command_input: String,

  /// Selected autocomplete suggestion index
  selected_suggestion: usize,

  /// Transient status-line message
  status: Option<(String, Instant)>,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let api = ApiClient::new(&config.server.base_url)?;
    let cache = QueryCache::new().with_gc_after(config.polling.cache_gc_after());
    let store = Store::new(
      api.clone(),
      cache.clone(),
      config.polling.notifications_interval(),
    );
    let session = Session::new(api, cache);
    let (tx, _rx) = mpsc::unbounded_channel();

    Ok(Self {
      config,
      store,
      session,
      view_stack: Vec::new(),
      viewer_role: None,
      session_sub: None,
      unread_sub: None,
      mode: Mode::Normal,
      command_input: String::new(),
      selected_suggestion: 0,
      status: None,
      event_tx: tx,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));
    self.event_tx = events.sender();

    // Probe the session; until it resolves the login form is the root.
    self.session_sub = Some(self.session.watch());
    self.reset_to_login();

    // Main loop
    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn reset_to_login(&mut self) {
    // The password only ever comes from the environment, never from disk.
    let password = Config::get_password().ok();
    self.view_stack = vec![Box::new(LoginView::new(
      self.session.clone(),
      self.config.server.email.as_deref(),
      password.as_deref(),
    ))];
    self.viewer_role = None;
    self.unread_sub = None;
    self.mode = Mode::Normal;
  }

  fn enter_session(&mut self, user: User) {
    info!(user = %user.email, role = user.role.label(), "session established");
    self.viewer_role = Some(user.role);
    self.unread_sub = Some(self.store.watch_unread_count());
    self.view_stack = vec![Box::new(DashboardView::new(self.store.clone(), user))];
  }

  /// Swap the root view when the cached session flips between anonymous
  /// and authenticated underneath us.
  fn reconcile_session(&mut self) {
    match self.session.state() {
      SessionState::Authenticated(user) => {
        if self.viewer_role.is_none() {
          self.enter_session(user);
        }
      }
      SessionState::Anonymous | SessionState::Unknown => {
        if self.viewer_role.is_some() {
          info!("session ended, returning to login");
          self.reset_to_login();
          // Re-probe so a stale cookie can sign us straight back in.
          self.session_sub = Some(self.session.watch());
        }
      }
    }
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.handle_tick(),
      Event::SessionExpired => self.session.expire(),
      Event::Error(message) => {
        info!(message = %message, "status line message");
        self.status = Some((message, Instant::now()));
      }
    }
  }

  fn handle_tick(&mut self) {
    self.reconcile_session();

    if let Some(view) = self.view_stack.last_mut() {
      view.tick();
    }

    if let Some((_, since)) = &self.status {
      if since.elapsed() > STATUS_TTL {
        self.status = None;
      }
    }

    self.store.cache().collect_garbage();
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.mode {
      Mode::Command => self.handle_command_mode_key(key),
      Mode::Normal => self.handle_normal_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: KeyEvent) {
    let in_text_input = self
      .view_stack
      .last()
      .map(|v| v.wants_text_input())
      .unwrap_or(false);

    // The command palette needs a signed-in role and a view that is not
    // capturing text.
    if key.code == KeyCode::Char(':') && self.viewer_role.is_some() && !in_text_input {
      self.mode = Mode::Command;
      self.command_input.clear();
      self.selected_suggestion = 0;
      return;
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };

    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn handle_command_mode_key(&mut self, key: KeyEvent) {
    let role = match self.viewer_role {
      Some(role) => role,
      None => {
        self.mode = Mode::Normal;
        return;
      }
    };

    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      KeyCode::Enter => {
        self.execute_command(role);
        self.mode = Mode::Normal;
        self.selected_suggestion = 0;
      }
      KeyCode::Tab | KeyCode::Down => {
        let suggestions = commands::get_suggestions(&self.command_input, role);
        if !suggestions.is_empty() {
          self.selected_suggestion = (self.selected_suggestion + 1) % suggestions.len();
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        let suggestions = commands::get_suggestions(&self.command_input, role);
        if !suggestions.is_empty() {
          self.selected_suggestion = if self.selected_suggestion == 0 {
            suggestions.len() - 1
          } else {
            self.selected_suggestion - 1
          };
        }
      }
      KeyCode::Backspace => {
        self.command_input.pop();
        self.selected_suggestion = 0; // Reset selection on input change
      }
      KeyCode::Char(c) => {
        self.command_input.push(c);
        self.selected_suggestion = 0; // Reset selection on input change
      }
      _ => {}
    }
  }

  fn execute_command(&mut self, role: Role) {
    // Get the command to execute - either from selected suggestion or direct input
    let suggestions = commands::get_suggestions(&self.command_input, role);
    let cmd = if !suggestions.is_empty() && self.selected_suggestion < suggestions.len() {
      suggestions[self.selected_suggestion].name.to_string()
    } else {
      self.command_input.trim().to_lowercase()
    };
    self.command_input.clear();

    let store = self.store.clone();
    let tx = self.event_tx.clone();

    match cmd.as_str() {
      "dashboard" => {
        if let SessionState::Authenticated(user) = self.session.state() {
          self.set_root(Box::new(DashboardView::new(store, user)));
        }
      }
      "jobs" => self.set_root(Box::new(JobsView::new(store, tx))),
      "postings" => self.set_root(Box::new(PostingsView::new(store, tx))),
      "applications" => match role {
        // Students track their own pipeline; employers review per posting;
        // advisors go through a student.
        Role::Student => {
          self.set_root(Box::new(ApplicationsView::new(
            store,
            tx,
            ApplicationScope::Mine,
          )));
        }
        Role::Employer => self.set_root(Box::new(PostingsView::new(store, tx))),
        Role::Advisor => self.set_root(Box::new(StudentsView::new(store, tx))),
      },
      "profile" => self.set_root(Box::new(ProfileView::new(store, tx, role))),
      "interviews" => self.set_root(Box::new(InterviewsView::new(store, tx, role))),
      "notifications" => self.set_root(Box::new(NotificationsView::new(store, tx))),
      "students" => self.set_root(Box::new(StudentsView::new(store, tx))),
      "logout" => {
        let session = self.session.clone();
        // The cache purge flips the session state; reconcile_session does
        // the rest on the next tick.
        spawn_mutation(tx, async move { session.logout().await.map(|_| ()) });
      }
      "quit" => self.should_quit = true,
      _ => {
        self.status = Some((format!("unknown command: {}", cmd), Instant::now()));
      }
    }
  }

  fn set_root(&mut self, view: Box<dyn View>) {
    self.view_stack = vec![view];
  }

  fn unread_count(&self) -> Option<i64> {
    let sub = self.unread_sub.as_ref()?;
    let snap: CacheSnapshot<UnreadCount> = sub.snapshot();
    snap.data.map(|u| u.count)
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Header
        Constraint::Min(1),    // Main content
        Constraint::Length(1), // Footer
      ])
      .split(frame.area());

    let state = self.session.state();
    let viewer = state.user().map(|u| (u.display_name(), u.role));
    draw_header(
      frame,
      chunks[0],
      &self.config.display_title(),
      viewer.as_ref().map(|(name, role)| (name.as_str(), *role)),
      self.unread_count(),
    );

    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, chunks[1]);
    }

    if self.mode == Mode::Command {
      if let Some(role) = self.viewer_role {
        let suggestions = commands::get_suggestions(&self.command_input, role);
        draw_command_overlay(
          frame,
          chunks[1],
          &self.command_input,
          &suggestions,
          self.selected_suggestion,
        );
      }
    }

    let breadcrumb: Vec<String> = self.view_stack.iter().map(|v| v.breadcrumb_label()).collect();
    let status = self.status.as_ref().map(|(m, _)| m.as_str());
    draw_footer(frame, chunks[2], &breadcrumb, status);
  }
}
