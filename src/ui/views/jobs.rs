use crate::api::types::{has_applied, Application, JobFilters, JobWithMatch};
use crate::cache::{CacheSnapshot, Subscription};
use crate::event::Event;
use crate::store::Store;
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_salary, match_score_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{spawn_mutation, JobDetailView};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use tokio::sync::mpsc;

/// Job board for students and advisors: server-filtered listing with local
/// refinement while a refetch is in flight.
pub struct JobsView {
  store: Store,
  tx: mpsc::UnboundedSender<Event>,
  filters: JobFilters,
  jobs_sub: Subscription,
  apps_sub: Subscription,
  jobs: Vec<JobWithMatch>,
  my_applications: Vec<Application>,
  error: Option<String>,
  fetching: bool,
  list_state: ListState,
  search: SearchInput,
}

impl JobsView {
  pub fn new(store: Store, tx: mpsc::UnboundedSender<Event>) -> Self {
    let filters = JobFilters::default();
    let jobs_sub = store.watch_jobs(&filters);
    let apps_sub = store.watch_my_applications();
    Self {
      store,
      tx,
      filters,
      jobs_sub,
      apps_sub,
      jobs: Vec::new(),
      my_applications: Vec::new(),
      error: None,
      fetching: false,
      list_state: ListState::default(),
      search: SearchInput::new(),
    }
  }

  /// Swap the jobs subscription after a filter edit. The old cache entry
  /// stays behind for GC; the new key fetches in the background while the
  /// local refinement below keeps the list responsive.
  fn apply_filters(&mut self) {
    self.jobs_sub = self.store.watch_jobs(&self.filters);
  }

  /// Server results refined by the current filters, so an edit takes
  /// effect before the refetch lands.
  fn visible(&self) -> Vec<&JobWithMatch> {
    self
      .jobs
      .iter()
      .filter(|j| self.filters.matches(&j.job))
      .collect()
  }

  fn selected_job_id(&self) -> Option<i64> {
    let visible = self.visible();
    self
      .list_state
      .selected()
      .and_then(|i| visible.get(i))
      .map(|j| j.job.id)
  }

  fn apply_to_selected(&mut self) {
    let Some(job_id) = self.selected_job_id() else {
      return;
    };
    if has_applied(&self.my_applications, job_id) {
      let _ = self.tx.send(Event::Error("already applied to this job".to_string()));
      return;
    }
    let store = self.store.clone();
    spawn_mutation(self.tx.clone(), async move {
      store.apply(job_id, None).await
    });
  }
}

impl View for JobsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.search.handle_key(key) {
      KeyResult::Handled => return ViewAction::None,
      KeyResult::Event(SearchEvent::Changed(text)) => {
        self.filters.search = if text.is_empty() { None } else { Some(text) };
        self.apply_filters();
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted) => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => self.jobs_sub.refresh(),
      KeyCode::Char('a') => self.apply_to_selected(),
      KeyCode::Enter => {
        if let Some(job_id) = self.selected_job_id() {
          return ViewAction::Push(Box::new(JobDetailView::new(
            self.store.clone(),
            self.tx.clone(),
            job_id,
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

    let title = if self.fetching {
      format!(" Jobs ({}) ~ ", len)
    } else if let Some(e) = &self.error {
      format!(" Jobs (error: {}) ", truncate(e, 40))
    } else {
      format!(" Jobs ({}) ", len)
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      let content = if self.fetching {
        "Loading jobs..."
      } else if self.error.is_some() {
        "Failed to load jobs. Press 'r' to retry."
      } else {
        "No jobs match the current filters."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let applications = &self.my_applications;
    let items: Vec<ListItem> = visible
      .iter()
      .map(|j| {
        let applied = has_applied(applications, j.job.id);
        let line = Line::from(vec![
          Span::styled(
            format!("{:>3.0}% ", j.match_score),
            Style::default().fg(match_score_color(j.match_score)),
          ),
          Span::raw(format!("{:<40}", truncate(&j.job.title, 40))),
          Span::styled(
            format!("{:<16}", truncate(j.job.location.as_deref().unwrap_or("-"), 16)),
            Style::default().fg(Color::Gray),
          ),
          Span::styled(
            format!("{:<14}", format_salary(j.job.salary_min, j.job.salary_max)),
            Style::default().fg(Color::Gray),
          ),
          if applied {
            Span::styled("applied", Style::default().fg(Color::Green))
          } else {
            Span::raw("")
          },
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
    match &self.filters.search {
      Some(s) => format!("Jobs [{}]", s),
      None => "Jobs".to_string(),
    }
  }

  fn tick(&mut self) {
    let snap: CacheSnapshot<Vec<JobWithMatch>> = self.jobs_sub.snapshot();
    if let Some(jobs) = snap.data {
      self.jobs = jobs;
    }
    self.error = snap.error;
    self.fetching = snap.is_fetching;

    let apps: CacheSnapshot<Vec<Application>> = self.apps_sub.snapshot();
    if let Some(applications) = apps.data {
      self.my_applications = applications;
    }
  }

  fn wants_text_input(&self) -> bool {
    self.search.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("a", "apply").with_priority(10),
      ShortcutInfo::new("Enter", "detail").with_priority(20),
      ShortcutInfo::new("/", "filter").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(40),
    ]
  }
}
