use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState},
};

use crate::app::{App, FocusPane, FolderListKind, Module, TaxaListKind};
use crate::selector::SelectorItem;
use crate::taxonomy::taxon_display_name;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let (title, items) = match app.module {
        Module::SpecimenPhotos => (folder_title(app), folder_items(app)),
        Module::TaxaPhotos => (taxa_title(app), taxa_items(app)),
    };

    let border_color = if app.focus == FocusPane::Items {
        Color::Blue
    } else {
        Color::DarkGray
    };

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
    if app.current_item_count() > 0 {
        state.select(Some(app.item_cursor));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn folder_title(app: &App) -> String {
    let kind = match app.folder_list_kind {
        FolderListKind::Matched => "matched",
        FolderListKind::Unmatched => "unmatched",
    };
    format!("Specimen folders ({kind})")
}

fn taxa_title(app: &App) -> String {
    let kind = match app.taxa_list_kind {
        TaxaListKind::Photographed => "photographed",
        TaxaListKind::WithoutPhotos => "without photos",
    };
    format!("Taxa ({kind})")
}

fn folder_items(app: &App) -> Vec<ListItem<'static>> {
    let letter = app.folder_selector.tag_letter();
    app.folder_items()
        .iter()
        .map(|folder| {
            let count = app.folder_selector.counts.get(&folder.key(), letter);
            let marker = if folder.has_images { " " } else { "∅" };
            let selected = app.selected_item_key() == Some(folder.key().as_str());

            let mut spans = vec![
                Span::raw(format!("{marker} ")),
                Span::raw(folder.folder_name.clone()),
            ];
            if folder.has_images {
                let style = if count > 0 {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                spans.push(Span::styled(format!("  [{letter}:{count}]"), style));
            }

            let mut item = ListItem::new(Line::from(spans));
            if selected {
                item = item.style(Style::default().add_modifier(Modifier::UNDERLINED));
            }
            item
        })
        .collect()
}

fn taxa_items(app: &App) -> Vec<ListItem<'static>> {
    let s_letter = app.folder_selector.tag_letter();
    let t_letter = app.taxa_selector.tag_letter();
    app.taxa_items()
        .iter()
        .map(|taxon| {
            let key = SelectorItem::key(taxon);
            let selected = app.selected_item_key() == Some(key.as_str());
            let s_count = app.taxa_selector.counts.get(&key, s_letter);
            let t_count = app.taxa_selector.counts.get(&key, t_letter);

            let mut spans = vec![Span::raw(taxon_display_name(&taxon.taxonomy))];
            if !taxon.folders.is_empty() {
                let style = if t_count > 0 {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                spans.push(Span::styled(
                    format!("  [{s_letter}:{s_count} {t_letter}:{t_count}]"),
                    style,
                ));
                spans.push(Span::styled(
                    format!(" ({} folders)", taxon.folders.len()),
                    Style::default().fg(Color::Cyan),
                ));
            }

            let mut item = ListItem::new(Line::from(spans));
            if selected {
                item = item.style(Style::default().add_modifier(Modifier::UNDERLINED));
            }
            item
        })
        .collect()
}
