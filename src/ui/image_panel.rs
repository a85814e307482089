use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::{App, FocusPane};
use crate::tagging::{parse_filename, TaggedFile};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(10)])
        .split(area);

    render_image_list(frame, app, chunks[0]);
    render_info(frame, app, chunks[1]);
}

fn render_image_list(frame: &mut Frame, app: &App, area: Rect) {
    let border_color = if app.focus == FocusPane::Images {
        Color::Blue
    } else {
        Color::DarkGray
    };

    let title = if app.is_loading_images() {
        "Images (loading...)".to_string()
    } else {
        format!("Images ({})", app.current_images().len())
    };

    let items: Vec<ListItem> = app
        .current_images()
        .iter()
        .map(image_to_list_item)
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !app.current_images().is_empty() {
        state.select(Some(app.image_cursor));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn image_to_list_item(file: &TaggedFile) -> ListItem<'static> {
    let parsed = parse_filename(&file.name);

    let mut spans = vec![Span::raw(file.name.clone())];
    if !parsed.tag.is_empty() {
        spans.push(Span::styled(
            format!("  +{}", parsed.tag),
            Style::default().fg(Color::Green),
        ));
    }
    if parsed.edit {
        spans.push(Span::styled(" (edit)", Style::default().fg(Color::Magenta)));
    }

    ListItem::new(Line::from(spans))
}

fn render_info(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title("Info");

    let Some(file) = app.current_image() else {
        let paragraph = Paragraph::new("No selection")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
        return;
    };

    let mut info_lines = vec![Line::from(vec![
        Span::styled("File: ", Style::default().fg(Color::DarkGray)),
        Span::raw(file.name.clone()),
    ])];

    if let Ok(meta) = std::fs::metadata(&file.path) {
        info_lines.push(Line::from(vec![
            Span::styled("Size: ", Style::default().fg(Color::DarkGray)),
            Span::raw(format_size(meta.len())),
        ]));
    }

    // Try to get image dimensions
    if let Ok(reader) = image::ImageReader::open(&file.path) {
        if let Ok((width, height)) = reader.into_dimensions() {
            info_lines.push(Line::from(vec![
                Span::styled("Dimensions: ", Style::default().fg(Color::DarkGray)),
                Span::raw(format!("{}x{}", width, height)),
            ]));
        }
    }

    // Try to get EXIF data
    if let Ok(handle) = std::fs::File::open(&file.path) {
        let mut bufreader = std::io::BufReader::new(&handle);
        if let Ok(exif) = exif::Reader::new().read_from_container(&mut bufreader) {
            if let Some(field) = exif.get_field(exif::Tag::Make, exif::In::PRIMARY) {
                info_lines.push(Line::from(vec![
                    Span::styled("Camera: ", Style::default().fg(Color::DarkGray)),
                    Span::raw(field.display_value().to_string()),
                ]));
            }
            if let Some(field) = exif.get_field(exif::Tag::DateTimeOriginal, exif::In::PRIMARY) {
                info_lines.push(Line::from(vec![
                    Span::styled("Taken: ", Style::default().fg(Color::DarkGray)),
                    Span::raw(field.display_value().to_string()),
                ]));
            }
        }
    }

    let parsed = parse_filename(&file.name);
    if !parsed.tag.is_empty() {
        info_lines.push(Line::from(vec![
            Span::styled("Tags: ", Style::default().fg(Color::DarkGray)),
            Span::styled(parsed.tag, Style::default().fg(Color::Green)),
        ]));
    }

    let text = Text::from(info_lines);
    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.1} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.1} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.1} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
