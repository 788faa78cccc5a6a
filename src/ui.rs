pub mod map;
pub mod screen;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::{ui::map::MapView, ui::screen::current_panel, App};

/// Columns reserved for the menu / quiz panel.
const PANEL_WIDTH: u16 = 46;

/// Splits the frame into (panel, map, footer).
pub fn layout(area: Rect) -> (Rect, Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(PANEL_WIDTH), Constraint::Min(1)])
        .split(rows[0]);
    (columns[0], columns[1], rows[1])
}

/// The cells the map canvas is drawn in, inside its border.
pub fn map_canvas_area(area: Rect) -> Rect {
    let (_, map, _) = layout(area);
    Block::default().borders(Borders::ALL).inner(map)
}

pub fn draw(app: &App, f: &mut Frame) {
    let (panel_area, map_area, footer_area) = layout(f.area());

    let panel = current_panel(&app.screen());
    panel.render(app, f, panel_area);

    f.render_widget(
        MapView {
            map: &app.map,
            title: "Map",
        },
        map_area,
    );

    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let footer = match &app.notice {
        Some(notice) => Line::from(vec![
            Span::styled(
                format!("{notice}  "),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(panel.legend(), italic_style),
        ]),
        None => Line::from(Span::styled(panel.legend(), italic_style)),
    };
    f.render_widget(Paragraph::new(footer), footer_area);
}
