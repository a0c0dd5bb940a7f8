use crate::api::types::Notification;
use crate::cache::{CacheSnapshot, Subscription};
use crate::event::Event;
use crate::store::Store;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_datetime, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::spawn_mutation;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use tokio::sync::mpsc;

/// Notification inbox. The subscription polls while this view is open and
/// the poll timer stops when it closes.
pub struct NotificationsView {
  store: Store,
  tx: mpsc::UnboundedSender<Event>,
  sub: Subscription,
  notifications: Vec<Notification>,
  error: Option<String>,
  fetching: bool,
  list_state: ListState,
}

impl NotificationsView {
  pub fn new(store: Store, tx: mpsc::UnboundedSender<Event>) -> Self {
    let sub = store.watch_notifications();
    Self {
      store,
      tx,
      sub,
      notifications: Vec::new(),
      error: None,
      fetching: false,
      list_state: ListState::default(),
    }
  }

  fn mark_highlighted_read(&mut self) {
    let Some(notification) = self
      .list_state
      .selected()
      .and_then(|i| self.notifications.get(i))
    else {
      return;
    };
    if notification.is_read {
      return;
    }
    let id = notification.id;
    let store = self.store.clone();
    spawn_mutation(self.tx.clone(), async move {
      store.mark_notification_read(id).await
    });
  }

  fn mark_all_read(&mut self) {
    if self.notifications.iter().all(|n| n.is_read) {
      return;
    }
    let store = self.store.clone();
    spawn_mutation(self.tx.clone(), async move {
      store.mark_all_notifications_read().await
    });
  }
}

impl View for NotificationsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Enter => self.mark_highlighted_read(),
      KeyCode::Char('a') => self.mark_all_read(),
      KeyCode::Char('r') => self.sub.refresh(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.notifications.len();
    ensure_valid_selection(&mut self.list_state, len);

    let unread = self.notifications.iter().filter(|n| !n.is_read).count();
    let mut title = format!(" Notifications ({} unread) ", unread);
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
        "Loading notifications...".to_string()
      } else if let Some(e) = &self.error {
        format!("Failed to load: {}", e)
      } else {
        "Inbox zero.".to_string()
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
      .notifications
      .iter()
      .map(|n| {
        let (dot, title_style) = if n.is_read {
          ("  ", Style::default().fg(Color::Gray))
        } else {
          ("● ", Style::default().fg(Color::White).bold())
        };
        let line = Line::from(vec![
          Span::styled(dot, Style::default().fg(Color::Magenta)),
          Span::styled(format!("{:<30}", truncate(&n.title, 30)), title_style),
          Span::styled(
            format!("{:<44}", truncate(&n.message, 44)),
            Style::default().fg(Color::Gray),
          ),
          Span::styled(format_datetime(n.created_at), Style::default().fg(Color::DarkGray)),
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
    "Notifications".to_string()
  }

  fn tick(&mut self) {
    let snap: CacheSnapshot<Vec<Notification>> = self.sub.snapshot();
    if let Some(notifications) = snap.data {
      self.notifications = notifications;
    }
    self.error = snap.error;
    self.fetching = snap.is_fetching;
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("Enter", "mark read").with_priority(10),
      ShortcutInfo::new("a", "mark all").with_priority(20),
    ]
  }
}
