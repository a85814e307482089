mod image_panel;
mod item_list;
mod status_bar;

use ratatui::prelude::*;

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Main layout: content area + status bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    // Two-column layout: item list on the left, images on the right
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(main_chunks[0]);

    item_list::render(frame, app, columns[0]);
    image_panel::render(frame, app, columns[1]);

    status_bar::render(frame, app, main_chunks[1]);
}
