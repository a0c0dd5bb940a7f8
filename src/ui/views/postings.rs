use crate::api::types::Job;
use crate::cache::{CacheSnapshot, Subscription};
use crate::event::Event;
use crate::store::Store;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_salary, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{spawn_mutation, ApplicationScope, ApplicationsView, JobFormView};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use tokio::sync::mpsc;

/// Employer's own postings. Enter opens the applicant queue for a posting.
pub struct PostingsView {
  store: Store,
  tx: mpsc::UnboundedSender<Event>,
  sub: Subscription,
  jobs: Vec<Job>,
  error: Option<String>,
  fetching: bool,
  list_state: ListState,
}

impl PostingsView {
  pub fn new(store: Store, tx: mpsc::UnboundedSender<Event>) -> Self {
    let sub = store.watch_my_jobs();
    Self {
      store,
      tx,
      sub,
      jobs: Vec::new(),
      error: None,
      fetching: false,
      list_state: ListState::default(),
    }
  }

  fn highlighted(&self) -> Option<&Job> {
    self.list_state.selected().and_then(|i| self.jobs.get(i))
  }

  fn delete_highlighted(&mut self) {
    let Some(job) = self.highlighted() else {
      return;
    };
    let id = job.id;
    let store = self.store.clone();
    spawn_mutation(self.tx.clone(), async move { store.delete_job(id).await });
  }
}

impl View for PostingsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('n') => {
        return ViewAction::Push(Box::new(JobFormView::create(
          self.store.clone(),
          self.tx.clone(),
        )));
      }
      KeyCode::Char('e') => {
        if let Some(job) = self.highlighted() {
          return ViewAction::Push(Box::new(JobFormView::edit(
            self.store.clone(),
            self.tx.clone(),
            job,
          )));
        }
      }
      KeyCode::Char('d') => self.delete_highlighted(),
      KeyCode::Char('r') => self.sub.refresh(),
      KeyCode::Enter => {
        if let Some(job) = self.highlighted() {
          return ViewAction::Push(Box::new(ApplicationsView::new(
            self.store.clone(),
            self.tx.clone(),
            ApplicationScope::Job {
              job_id: job.id,
              title: job.title.clone(),
            },
          )));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.jobs.len();
    ensure_valid_selection(&mut self.list_state, len);

    let mut title = format!(" My postings ({}) ", len);
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
        "Loading postings...".to_string()
      } else if let Some(e) = &self.error {
        format!("Failed to load: {}", e)
      } else {
        "No postings yet. Press 'n' to create one.".to_string()
      };
      frame.render_widget(
        Paragraph::new(content)
          .block(block)
          .style(Style::default().fg(Color::DarkGray)),
        area,
      );
      return;
    }

    let items: Vec<ListItem> = self
      .jobs
      .iter()
      .map(|j| {
        let active = if j.is_active { "open" } else { "closed" };
        let active_color = if j.is_active { Color::Green } else { Color::Red };
        let line = Line::from(vec![
          Span::raw(format!("{:<40}", truncate(&j.title, 40))),
          Span::styled(format!("{:<8}", active), Style::default().fg(active_color)),
          Span::styled(
            format!("{:<14}", format_salary(j.salary_min, j.salary_max)),
            Style::default().fg(Color::Gray),
          ),
          Span::styled(
            truncate(j.location.as_deref().unwrap_or("-"), 18),
            Style::default().fg(Color::DarkGray),
          ),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn breadcrumb_label(&self) -> String {
    "Postings".to_string()
  }

  fn tick(&mut self) {
    let snap: CacheSnapshot<Vec<Job>> = self.sub.snapshot();
    if let Some(jobs) = snap.data {
      self.jobs = jobs;
    }
    self.error = snap.error;
    self.fetching = snap.is_fetching;
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("Enter", "applicants").with_priority(10),
      ShortcutInfo::new("n", "new").with_priority(20),
      ShortcutInfo::new("e", "edit").with_priority(30),
      ShortcutInfo::new("d", "delete").with_priority(40),
    ]
  }
}
