use crate::api::types::{Job, JobDraft, Skill, SkillFilters};
use crate::cache::{CacheSnapshot, Subscription};
use crate::event::Event;
use crate::store::Store;
use crate::ui::components::TextInput;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::truncate;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::spawn_mutation;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use std::collections::HashSet;
use tokio::sync::mpsc;

const FIELDS: [&str; 7] = [
  "title",
  "description",
  "location",
  "salary min",
  "salary max",
  "job type",
  "level",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
  Fields,
  Skills,
}

/// Create or edit a job posting: a flat field list plus the required-skill
/// picker. An untouched picker keeps the posting's current skill set.
pub struct JobFormView {
  store: Store,
  tx: mpsc::UnboundedSender<Event>,
  /// Some(id) when editing an existing posting
  job_id: Option<i64>,
  inputs: Vec<TextInput>,
  field: usize,
  pane: Pane,
  skills_sub: Subscription,
  catalogue: Vec<Skill>,
  selected_skills: HashSet<i64>,
  /// Set on the first toggle; until then the draft omits the skill set so
  /// an edit cannot erase it.
  skills_touched: bool,
  skills_state: ListState,
  error: Option<String>,
  submitted: bool,
}

impl JobFormView {
  pub fn create(store: Store, tx: mpsc::UnboundedSender<Event>) -> Self {
    let skills_sub = store.watch_skills(&SkillFilters::default());
    Self {
      store,
      tx,
      job_id: None,
      inputs: (0..FIELDS.len()).map(|_| TextInput::new()).collect(),
      field: 0,
      pane: Pane::Fields,
      skills_sub,
      catalogue: Vec::new(),
      selected_skills: HashSet::new(),
      skills_touched: false,
      skills_state: ListState::default(),
      error: None,
      submitted: false,
    }
  }

  pub fn edit(store: Store, tx: mpsc::UnboundedSender<Event>, job: &Job) -> Self {
    let values = [
      job.title.clone(),
      job.description.clone(),
      job.location.clone().unwrap_or_default(),
      job.salary_min.map(|v| v.to_string()).unwrap_or_default(),
      job.salary_max.map(|v| v.to_string()).unwrap_or_default(),
      job.job_type.clone().unwrap_or_default(),
      job.experience_level.clone().unwrap_or_default(),
    ];
    let skills_sub = store.watch_skills(&SkillFilters::default());
    Self {
      store,
      tx,
      job_id: Some(job.id),
      inputs: values.iter().map(|v| TextInput::with_value(v)).collect(),
      field: 0,
      pane: Pane::Fields,
      skills_sub,
      catalogue: Vec::new(),
      selected_skills: job.required_skills.iter().map(|s| s.id).collect(),
      skills_touched: false,
      skills_state: ListState::default(),
      error: None,
      submitted: false,
    }
  }

  fn opt(&self, idx: usize) -> Option<String> {
    let value = self.inputs[idx].value().trim();
    if value.is_empty() {
      None
    } else {
      Some(value.to_string())
    }
  }

  fn parse_salary(&self, idx: usize) -> Result<Option<i64>, String> {
    match self.opt(idx) {
      None => Ok(None),
      Some(text) => text
        .parse::<i64>()
        .map(Some)
        .map_err(|_| format!("{} must be a number", FIELDS[idx])),
    }
  }

  fn build_draft(&self) -> Result<JobDraft, String> {
    let title = self.inputs[0].value().trim().to_string();
    let description = self.inputs[1].value().trim().to_string();
    if title.is_empty() || description.is_empty() {
      return Err("title and description are required".to_string());
    }
    let salary_min = self.parse_salary(3)?;
    let salary_max = self.parse_salary(4)?;
    if let (Some(lo), Some(hi)) = (salary_min, salary_max) {
      if lo > hi {
        return Err("salary min exceeds salary max".to_string());
      }
    }
    let required_skill_ids = self.skills_touched.then(|| {
      let mut ids: Vec<i64> = self.selected_skills.iter().copied().collect();
      ids.sort_unstable();
      ids
    });
    Ok(JobDraft {
      title,
      description,
      location: self.opt(2),
      salary_min,
      salary_max,
      job_type: self.opt(5),
      experience_level: self.opt(6),
      required_skill_ids,
    })
  }

  fn toggle_skill(&mut self) {
    let Some(skill) = self.skills_state.selected().and_then(|i| self.catalogue.get(i)) else {
      return;
    };
    if !self.selected_skills.remove(&skill.id) {
      self.selected_skills.insert(skill.id);
    }
    self.skills_touched = true;
  }

  fn submit(&mut self) {
    let draft = match self.build_draft() {
      Ok(draft) => draft,
      Err(message) => {
        self.error = Some(message);
        return;
      }
    };
    self.error = None;
    self.submitted = true;

    let store = self.store.clone();
    match self.job_id {
      Some(id) => spawn_mutation(self.tx.clone(), async move {
        store.update_job(id, &draft).await
      }),
      None => spawn_mutation(self.tx.clone(), async move {
        store.create_job(&draft).await
      }),
    }
  }

  fn handle_fields_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Down => {
        self.field = (self.field + 1) % FIELDS.len();
        return ViewAction::None;
      }
      KeyCode::Up => {
        self.field = (self.field + FIELDS.len() - 1) % FIELDS.len();
        return ViewAction::None;
      }
      KeyCode::Enter => {
        self.submit();
        // The posting list picks the change up via invalidation.
        if self.submitted {
          return ViewAction::Pop;
        }
        return ViewAction::None;
      }
      KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    self.inputs[self.field].handle_key(key);
    ViewAction::None
  }

  fn handle_skills_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.skills_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.skills_state.select_previous(),
      KeyCode::Char(' ') => self.toggle_skill(),
      KeyCode::Enter => {
        self.submit();
        if self.submitted {
          return ViewAction::Pop;
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render_fields(&mut self, frame: &mut Frame, area: Rect) {
    let title = match self.job_id {
      Some(id) => format!(" Edit posting #{} ", id),
      None => " New posting ".to_string(),
    };
    let focused = self.pane == Pane::Fields;
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(if focused { Color::Blue } else { Color::DarkGray }));

    let mut lines = vec![Line::raw("")];
    for (i, label) in FIELDS.iter().enumerate() {
      let marker = if focused && i == self.field { "> " } else { "  " };
      lines.push(Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Cyan)),
        Span::styled(format!("{:<12}", label), Style::default().fg(Color::DarkGray)),
        Span::raw(self.inputs[i].value().to_string()),
        if focused && i == self.field {
          Span::styled("_", Style::default().fg(Color::Yellow))
        } else {
          Span::raw("")
        },
      ]));
    }
    lines.push(Line::raw(""));
    if let Some(error) = &self.error {
      lines.push(Line::styled(
        format!("  {}", error),
        Style::default().fg(Color::Red),
      ));
    } else {
      lines.push(Line::styled(
        "  Enter: save   Tab: skills   Esc: discard",
        Style::default().fg(Color::DarkGray),
      ));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn render_skills(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.catalogue.len();
    ensure_valid_selection(&mut self.skills_state, len);

    let focused = self.pane == Pane::Skills;
    let block = Block::default()
      .title(format!(" Required skills ({}) ", self.selected_skills.len()))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(if focused { Color::Blue } else { Color::DarkGray }));

    if len == 0 {
      frame.render_widget(
        Paragraph::new("Loading skill catalogue...")
          .block(block)
          .style(Style::default().fg(Color::DarkGray)),
        area,
      );
      return;
    }

    let items: Vec<ListItem> = self
      .catalogue
      .iter()
      .map(|skill| {
        let picked = self.selected_skills.contains(&skill.id);
        let marker = if picked { "[x] " } else { "[ ] " };
        // Technical skills carry double weight in the match scorer.
        let kind = if skill.is_technical { "tech (2x)" } else { "soft" };
        let line = Line::from(vec![
          Span::styled(
            marker,
            if picked {
              Style::default().fg(Color::Green)
            } else {
              Style::default().fg(Color::DarkGray)
            },
          ),
          Span::raw(format!("{:<28}", truncate(&skill.name, 28))),
          Span::styled(kind, Style::default().fg(Color::DarkGray)),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::DarkGray))
      .highlight_symbol(if focused { "> " } else { "  " });

    frame.render_stateful_widget(list, area, &mut self.skills_state);
  }
}

impl View for JobFormView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if key.code == KeyCode::Tab {
      self.pane = match self.pane {
        Pane::Fields => Pane::Skills,
        Pane::Skills => Pane::Fields,
      };
      return ViewAction::None;
    }

    match self.pane {
      Pane::Fields => self.handle_fields_key(key),
      Pane::Skills => self.handle_skills_key(key),
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(FIELDS.len() as u16 + 5), Constraint::Min(1)])
      .split(area);

    self.render_fields(frame, chunks[0]);
    self.render_skills(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    match self.job_id {
      Some(_) => "Edit posting".to_string(),
      None => "New posting".to_string(),
    }
  }

  fn tick(&mut self) {
    let snap: CacheSnapshot<Vec<Skill>> = self.skills_sub.snapshot();
    if let Some(skills) = snap.data {
      self.catalogue = skills;
    }
  }

  fn wants_text_input(&self) -> bool {
    self.pane == Pane::Fields
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    match self.pane {
      Pane::Fields => vec![
        ShortcutInfo::new("Enter", "save").with_priority(10),
        ShortcutInfo::new("Tab", "skills").with_priority(20),
        ShortcutInfo::new("Esc", "discard").with_priority(30),
      ],
      Pane::Skills => vec![
        ShortcutInfo::new("Space", "toggle").with_priority(10),
        ShortcutInfo::new("Enter", "save").with_priority(20),
        ShortcutInfo::new("Tab", "fields").with_priority(30),
      ],
    }
  }
}
