use crate::api::types::Role;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with title, viewer identity, unread badge, and
/// global shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  viewer: Option<(&str, Role)>,
  unread: Option<i64>,
) {
  let mut spans = vec![
    Span::styled(" pathfinder ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", title), Style::default().fg(Color::White)),
  ];

  if let Some((name, role)) = viewer {
    spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(
      format!(" {} ", name),
      Style::default().fg(Color::Yellow).bold(),
    ));
    spans.push(Span::styled(
      format!("({}) ", role.label()),
      Style::default().fg(Color::DarkGray),
    ));
  }

  if let Some(count) = unread {
    if count > 0 {
      spans.push(Span::styled(
        format!(" 🔔{} ", count),
        Style::default().fg(Color::Magenta).bold(),
      ));
    }
  }

  spans.push(Span::raw("  "));
  // Shortcuts - keys highlighted, descriptions dimmed
  spans.push(Span::styled("<:>", Style::default().fg(Color::Cyan)));
  spans.push(Span::styled(" command", Style::default().fg(Color::DarkGray)));
  spans.push(Span::raw("   "));
  spans.push(Span::styled("</>", Style::default().fg(Color::Cyan)));
  spans.push(Span::styled(" filter", Style::default().fg(Color::DarkGray)));
  spans.push(Span::raw("   "));
  spans.push(Span::styled("<q>", Style::default().fg(Color::Cyan)));
  spans.push(Span::styled(" back", Style::default().fg(Color::DarkGray)));

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}
