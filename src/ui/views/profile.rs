use crate::api::types::{
  ProfileCompletion, ProfilePatch, Role, SkillFilters, SkillProficiency, SkillWithProficiency,
  Skill, User,
};
use crate::cache::{CacheSnapshot, Subscription};
use crate::event::Event;
use crate::store::Store;
use crate::ui::components::{InputResult, TextInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{match_score_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::spawn_mutation;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
  Details,
  Skills,
  Resume,
}

#[derive(Debug, Clone, Copy)]
enum FieldId {
  First,
  Last,
  Headline,
  Bio,
  Academic,
  Company,
  CompanyDesc,
  Location,
}

/// Which profile fields a role actually edits.
fn fields_for(role: Role) -> &'static [(&'static str, FieldId)] {
  match role {
    Role::Student => &[
      ("first name", FieldId::First),
      ("last name", FieldId::Last),
      ("headline", FieldId::Headline),
      ("bio", FieldId::Bio),
      ("academics", FieldId::Academic),
      ("location", FieldId::Location),
    ],
    Role::Employer => &[
      ("first name", FieldId::First),
      ("last name", FieldId::Last),
      ("company", FieldId::Company),
      ("about us", FieldId::CompanyDesc),
      ("location", FieldId::Location),
    ],
    Role::Advisor => &[
      ("first name", FieldId::First),
      ("last name", FieldId::Last),
      ("headline", FieldId::Headline),
      ("bio", FieldId::Bio),
      ("location", FieldId::Location),
    ],
  }
}

/// Own profile: editable details, the skill inventory with proficiency
/// (students), and the resume slot (students).
pub struct ProfileView {
  store: Store,
  tx: mpsc::UnboundedSender<Event>,
  role: Role,
  pane: Pane,

  me_sub: Subscription,
  me: Option<User>,
  prefilled: bool,

  completion_sub: Option<Subscription>,
  completion: Option<ProfileCompletion>,

  inputs: Vec<TextInput>,
  field: usize,
  error: Option<String>,

  catalogue_sub: Option<Subscription>,
  my_skills_sub: Option<Subscription>,
  categories_sub: Option<Subscription>,
  catalogue: Vec<Skill>,
  categories: Vec<String>,
  cat_idx: Option<usize>,
  /// skill id -> declared proficiency, edited locally until saved
  chosen: HashMap<i64, i32>,
  chosen_init: bool,
  skills_state: ListState,

  path_prompt: Option<TextInput>,
}

impl ProfileView {
  pub fn new(store: Store, tx: mpsc::UnboundedSender<Event>, role: Role) -> Self {
    let me_sub = store.watch_me();
    let student = role == Role::Student;
    let completion_sub = student.then(|| store.watch_profile_completion());
    let catalogue_sub = student.then(|| store.watch_skills(&SkillFilters::default()));
    let my_skills_sub = student.then(|| store.watch_my_skills());
    let categories_sub = student.then(|| store.watch_skill_categories());
    Self {
      tx,
      role,
      pane: Pane::Details,
      me_sub,
      me: None,
      prefilled: false,
      completion_sub,
      completion: None,
      inputs: (0..fields_for(role).len()).map(|_| TextInput::new()).collect(),
      field: 0,
      error: None,
      catalogue_sub,
      my_skills_sub,
      categories_sub,
      catalogue: Vec::new(),
      categories: Vec::new(),
      cat_idx: None,
      chosen: HashMap::new(),
      chosen_init: false,
      skills_state: ListState::default(),
      path_prompt: None,
      store,
    }
  }

  fn panes(&self) -> &'static [Pane] {
    match self.role {
      Role::Student => &[Pane::Details, Pane::Skills, Pane::Resume],
      _ => &[Pane::Details],
    }
  }

  fn next_pane(&mut self) {
    let panes = self.panes();
    let idx = panes.iter().position(|p| *p == self.pane).unwrap_or(0);
    self.pane = panes[(idx + 1) % panes.len()];
  }

  fn prefill(&mut self, user: &User) {
    let Some(profile) = &user.profile else {
      return;
    };
    for (i, (_, id)) in fields_for(self.role).iter().enumerate() {
      let value = match id {
        FieldId::First => Some(profile.first_name.clone()),
        FieldId::Last => Some(profile.last_name.clone()),
        FieldId::Headline => profile.headline.clone(),
        FieldId::Bio => profile.bio.clone(),
        FieldId::Academic => profile.academic_background.clone(),
        FieldId::Company => profile.company_name.clone(),
        FieldId::CompanyDesc => profile.company_description.clone(),
        FieldId::Location => profile.location.clone(),
      };
      if let Some(value) = value {
        self.inputs[i] = TextInput::with_value(&value);
      }
    }
  }

  fn build_patch(&self) -> Result<ProfilePatch, String> {
    let mut patch = ProfilePatch::default();
    for (i, (label, id)) in fields_for(self.role).iter().enumerate() {
      let value = self.inputs[i].value().trim().to_string();
      match id {
        FieldId::First | FieldId::Last => {
          if value.is_empty() {
            return Err(format!("{} is required", label));
          }
        }
        _ => {}
      }
      let opt = (!value.is_empty()).then_some(value);
      match id {
        FieldId::First => patch.first_name = opt,
        FieldId::Last => patch.last_name = opt,
        FieldId::Headline => patch.headline = opt,
        FieldId::Bio => patch.bio = opt,
        FieldId::Academic => patch.academic_background = opt,
        FieldId::Company => patch.company_name = opt,
        FieldId::CompanyDesc => patch.company_description = opt,
        FieldId::Location => patch.location = opt,
      }
    }
    Ok(patch)
  }

  fn save_details(&mut self) {
    let patch = match self.build_patch() {
      Ok(patch) => patch,
      Err(message) => {
        self.error = Some(message);
        return;
      }
    };
    self.error = None;
    let store = self.store.clone();
    spawn_mutation(self.tx.clone(), async move {
      store.update_profile(&patch).await
    });
  }

  fn save_skills(&mut self) {
    let skills: Vec<SkillProficiency> = self
      .chosen
      .iter()
      .map(|(&skill_id, &proficiency)| SkillProficiency {
        skill_id,
        proficiency,
      })
      .collect();
    let store = self.store.clone();
    spawn_mutation(self.tx.clone(), async move {
      store.update_skills_with_proficiency(&skills).await
    });
    // Reload from the server response once it lands.
    self.chosen_init = false;
  }

  fn toggle_skill(&mut self) {
    let Some(skill) = self.skills_state.selected().and_then(|i| self.catalogue.get(i)) else {
      return;
    };
    if self.chosen.remove(&skill.id).is_none() {
      self.chosen.insert(skill.id, 3);
    }
  }

  fn adjust_proficiency(&mut self, delta: i32) {
    let Some(skill) = self.skills_state.selected().and_then(|i| self.catalogue.get(i)) else {
      return;
    };
    if let Some(p) = self.chosen.get_mut(&skill.id) {
      *p = (*p + delta).clamp(1, 5);
    }
  }

  fn cycle_category(&mut self) {
    if self.categories.is_empty() {
      return;
    }
    self.cat_idx = match self.cat_idx {
      None => Some(0),
      Some(i) if i + 1 < self.categories.len() => Some(i + 1),
      Some(_) => None,
    };
    let filters = SkillFilters {
      category: self.cat_idx.map(|i| self.categories[i].clone()),
      ..Default::default()
    };
    self.catalogue_sub = Some(self.store.watch_skills(&filters));
  }

  fn upload_resume(&mut self, path_text: &str) {
    let path_text = path_text.trim().to_string();
    if path_text.is_empty() {
      return;
    }
    let filename = Path::new(&path_text)
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| path_text.clone());
    let store = self.store.clone();
    let tx = self.tx.clone();
    tokio::spawn(async move {
      match tokio::fs::read(&path_text).await {
        Ok(bytes) => {
          if let Err(e) = store.upload_resume(&filename, bytes).await {
            let event = if e.is_unauthorized() {
              Event::SessionExpired
            } else {
              Event::Error(e.to_string())
            };
            let _ = tx.send(event);
          }
        }
        Err(e) => {
          let _ = tx.send(Event::Error(format!("cannot read {}: {}", path_text, e)));
        }
      }
    });
  }

  fn delete_resume(&mut self) {
    let store = self.store.clone();
    spawn_mutation(self.tx.clone(), async move { store.delete_resume().await });
  }

  fn handle_details_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Down => {
        self.field = (self.field + 1) % self.inputs.len();
        return ViewAction::None;
      }
      KeyCode::Up => {
        self.field = (self.field + self.inputs.len() - 1) % self.inputs.len();
        return ViewAction::None;
      }
      KeyCode::Enter => {
        self.save_details();
        return ViewAction::None;
      }
      _ => {}
    }
    if let InputResult::Cancelled = self.inputs[self.field].handle_key(key) {
      return ViewAction::Pop;
    }
    ViewAction::None
  }

  fn handle_skills_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.skills_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.skills_state.select_previous(),
      KeyCode::Char(' ') => self.toggle_skill(),
      KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_proficiency(1),
      KeyCode::Char('-') => self.adjust_proficiency(-1),
      KeyCode::Char('c') => self.cycle_category(),
      KeyCode::Enter | KeyCode::Char('s') => self.save_skills(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn handle_resume_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('u') => self.path_prompt = Some(TextInput::new()),
      KeyCode::Char('d') => self.delete_resume(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn summary_line(&self) -> Line<'static> {
    let mut spans = Vec::new();
    for pane in self.panes() {
      let label = match pane {
        Pane::Details => " details ",
        Pane::Skills => " skills ",
        Pane::Resume => " resume ",
      };
      let style = if *pane == self.pane {
        Style::default().fg(Color::Black).bg(Color::Blue)
      } else {
        Style::default().fg(Color::Gray)
      };
      spans.push(Span::styled(label, style));
      spans.push(Span::raw(" "));
    }
    if let Some(c) = &self.completion {
      spans.push(Span::styled(
        format!("  profile {:.0}% complete", c.completion_percentage),
        Style::default().fg(match_score_color(c.completion_percentage)),
      ));
    }
    Line::from(spans)
  }

  fn render_details(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Profile ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let mut lines = vec![Line::raw("")];
    for (i, (label, _)) in fields_for(self.role).iter().enumerate() {
      let focused = i == self.field;
      let marker = if focused { "> " } else { "  " };
      lines.push(Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Cyan)),
        Span::styled(format!("{:<12}", *label), Style::default().fg(Color::DarkGray)),
        Span::raw(self.inputs[i].value().to_string()),
        if focused {
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
        "  Enter: save   Up/Down: field   Tab: pane   Esc: back",
        Style::default().fg(Color::DarkGray),
      ));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn render_skills(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.catalogue.len();
    ensure_valid_selection(&mut self.skills_state, len);

    let category = match self.cat_idx {
      Some(i) => self.categories.get(i).cloned().unwrap_or_default(),
      None => "all".to_string(),
    };
    let block = Block::default()
      .title(format!(" Skills ({}) - {} ", self.chosen.len(), category))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      frame.render_widget(
        Paragraph::new("No skills in this category.")
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
        let proficiency = self.chosen.get(&skill.id).copied();
        let marker = if proficiency.is_some() { "[x] " } else { "[ ] " };
        let stars = match proficiency {
          Some(p) => {
            let p = p.clamp(1, 5) as usize;
            format!("{}{}", "★".repeat(p), "☆".repeat(5 - p))
          }
          None => "     ".to_string(),
        };
        let kind = if skill.is_technical { "tech" } else { "soft" };
        let line = Line::from(vec![
          Span::styled(
            marker,
            if proficiency.is_some() {
              Style::default().fg(Color::Green)
            } else {
              Style::default().fg(Color::DarkGray)
            },
          ),
          Span::raw(format!("{:<26}", truncate(&skill.name, 26))),
          Span::styled(stars, Style::default().fg(Color::Yellow)),
          Span::styled(format!("  {}", kind), Style::default().fg(Color::DarkGray)),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::DarkGray))
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.skills_state);
  }

  fn render_resume(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Resume ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let current = self
      .me
      .as_ref()
      .and_then(|u| u.profile.as_ref())
      .and_then(|p| p.resume_filename.clone());

    let mut lines = vec![Line::raw("")];
    match current {
      Some(filename) => lines.push(Line::from(vec![
        Span::styled("  on file     ", Style::default().fg(Color::DarkGray)),
        Span::styled(filename, Style::default().fg(Color::Green)),
      ])),
      None => lines.push(Line::styled(
        "  no resume uploaded",
        Style::default().fg(Color::DarkGray),
      )),
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
      "  u: upload from path   d: delete   Tab: pane   Esc: back",
      Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(lines).block(block), area);

    if let Some(prompt) = &self.path_prompt {
      let width = (area.width * 70 / 100).clamp(40, 80);
      let overlay = Rect::new(area.x + 1, area.y + 1, width, 3);
      frame.render_widget(Clear, overlay);
      let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Path to resume file ");
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
}

impl View for ProfileView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some(prompt) = &mut self.path_prompt {
      match prompt.handle_key(key) {
        InputResult::Submitted(path) => {
          self.path_prompt = None;
          self.upload_resume(&path);
        }
        InputResult::Cancelled => self.path_prompt = None,
        _ => {}
      }
      return ViewAction::None;
    }

    if key.code == KeyCode::Tab {
      self.next_pane();
      return ViewAction::None;
    }

    match self.pane {
      Pane::Details => self.handle_details_key(key),
      Pane::Skills => self.handle_skills_key(key),
      Pane::Resume => self.handle_resume_key(key),
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(1), Constraint::Min(1)])
      .split(area);

    frame.render_widget(Paragraph::new(self.summary_line()), chunks[0]);

    match self.pane {
      Pane::Details => self.render_details(frame, chunks[1]),
      Pane::Skills => self.render_skills(frame, chunks[1]),
      Pane::Resume => self.render_resume(frame, chunks[1]),
    }
  }

  fn breadcrumb_label(&self) -> String {
    "Profile".to_string()
  }

  fn tick(&mut self) {
    let me: CacheSnapshot<User> = self.me_sub.snapshot();
    if let Some(user) = me.data {
      if !self.prefilled {
        self.prefill(&user);
        self.prefilled = true;
      }
      self.me = Some(user);
    }

    if let Some(sub) = &self.completion_sub {
      let snap: CacheSnapshot<ProfileCompletion> = sub.snapshot();
      if snap.data.is_some() {
        self.completion = snap.data;
      }
    }
    if let Some(sub) = &self.catalogue_sub {
      let snap: CacheSnapshot<Vec<Skill>> = sub.snapshot();
      if let Some(skills) = snap.data {
        self.catalogue = skills;
      }
    }
    if let Some(sub) = &self.categories_sub {
      let snap: CacheSnapshot<Vec<String>> = sub.snapshot();
      if let Some(categories) = snap.data {
        self.categories = categories;
      }
    }
    if let Some(sub) = &self.my_skills_sub {
      let snap: CacheSnapshot<Vec<SkillWithProficiency>> = sub.snapshot();
      if let Some(mine) = snap.data {
        if !self.chosen_init {
          self.chosen = mine
            .iter()
            .map(|s| (s.skill.id, s.proficiency))
            .collect();
          self.chosen_init = true;
        }
      }
    }
  }

  fn wants_text_input(&self) -> bool {
    self.pane == Pane::Details || self.path_prompt.is_some()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    match self.pane {
      Pane::Details => vec![
        ShortcutInfo::new("Enter", "save").with_priority(10),
        ShortcutInfo::new("Tab", "pane").with_priority(20),
      ],
      Pane::Skills => vec![
        ShortcutInfo::new("Space", "toggle").with_priority(10),
        ShortcutInfo::new("+/-", "proficiency").with_priority(20),
        ShortcutInfo::new("c", "category").with_priority(30),
        ShortcutInfo::new("Enter", "save").with_priority(40),
      ],
      Pane::Resume => vec![
        ShortcutInfo::new("u", "upload").with_priority(10),
        ShortcutInfo::new("d", "delete").with_priority(20),
      ],
    }
  }
}
