use ratatui::{
    prelude::*,
    widgets::Paragraph,
};

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    // A transient notice takes over the whole bar
    if let Some(ref notice) = app.notice {
        let style = if notice.error {
            Style::default().fg(Color::White).bg(Color::Red)
        } else {
            Style::default().fg(Color::Yellow).bg(Color::DarkGray)
        };
        let line = Line::from(vec![Span::styled(
            format!(" {} ", notice.message),
            style,
        )]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let item_count = app.current_item_count();
    let position = if item_count > 0 {
        format!("{}/{}", app.item_cursor + 1, item_count)
    } else {
        "0/0".to_string()
    };

    let mut spans = Vec::new();

    spans.push(Span::styled(
        format!(" {} ", app.module.title()),
        Style::default().fg(Color::White).bg(Color::DarkGray),
    ));

    spans.push(Span::styled(
        format!(" {} items ", item_count),
        Style::default().fg(Color::Gray),
    ));

    let help_text = format!(
        " {} | Tab:module m:list Enter:open s/t:tag e:edit n/p:untagged r:reload x:export q:quit ",
        position
    );

    let content_len: usize = spans.iter().map(|s| s.content.len()).sum();
    let help_len = help_text.len();
    let available = area.width as usize;
    if available > content_len + help_len {
        let spacing = " ".repeat(available - content_len - help_len);
        spans.push(Span::raw(spacing));
    }

    spans.push(Span::styled(
        help_text,
        Style::default().fg(Color::White).bg(Color::DarkGray),
    ));

    let line = Line::from(spans);
    frame.render_widget(Paragraph::new(line), area);
}
